use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const STEP_ACCOUNT: i32 = 1;
pub const STEP_ORGANIZATION: i32 = 2;
pub const STEP_LOCATIONS: i32 = 3;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftStatus {
    InProgress,
    /// Claimed by a submit that is waiting on the main API.
    Submitting,
    Completed,
    Failed,
}

impl DraftStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Submitting => "SUBMITTING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// `IN_PROGRESS` and `SUBMITTING` drafts are the user's open draft.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::InProgress | Self::Submitting)
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "IN_PROGRESS" => Some(Self::InProgress),
            "SUBMITTING" => Some(Self::Submitting),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrganization {
    pub name: String,
    pub inn: String,
    pub kpp: String,
    pub director: String,
    pub phone_number: String,
    pub plan: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DraftLocation {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub active_places: i32,
}

/// A draft together with its organization and locations.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDraft {
    pub id: Uuid,
    pub ext_user_id: String,
    pub status: DraftStatus,
    pub current_step: i32,
    pub org_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
    pub organization: Option<DraftOrganization>,
    pub locations: Vec<DraftLocation>,
}

/// Body of `POST /api/onboarding/organization`.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationForm {
    #[serde(default)]
    pub draft_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inn: String,
    #[serde(default)]
    pub kpp: String,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub plan: String,
}

impl OrganizationForm {
    #[must_use]
    pub fn organization(&self) -> DraftOrganization {
        DraftOrganization {
            name: self.name.trim().to_string(),
            inn: self.inn.trim().to_string(),
            kpp: self.kpp.trim().to_string(),
            director: self.director.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            plan: self.plan.trim().to_string(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LocationItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub active_places: i64,
}

/// Body of `POST /api/onboarding/locations`.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LocationsForm {
    #[serde(default)]
    pub draft_id: String,
    #[serde(default)]
    pub locations: Vec<LocationItem>,
}

impl LocationsForm {
    /// Locations ready for storage; call after validation.
    #[must_use]
    pub fn locations(&self) -> Vec<DraftLocation> {
        self.locations
            .iter()
            .map(|item| DraftLocation {
                name: item.name.trim().to_string(),
                address: item.address.trim().to_string(),
                phone: item
                    .phone
                    .as_deref()
                    .map(str::trim)
                    .filter(|phone| !phone.is_empty())
                    .map(str::to_string),
                active_places: i32::try_from(item.active_places).unwrap_or(i32::MAX),
            })
            .collect()
    }
}
