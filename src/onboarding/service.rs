use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::storage::DraftStore;
use super::types::{
    DraftLocation, DraftOrganization, DraftStatus, RegistrationDraft, STEP_LOCATIONS,
    STEP_ORGANIZATION,
};
use crate::upstream::main_api::{OrgRegistration, RegistrationOutcome};
use crate::upstream::{MainApiClient, UpstreamError};

#[derive(Debug, Error)]
pub enum OnboardingError {
    /// Unknown id, someone else's draft, or a draft that is no longer open.
    #[error("Draft not found")]
    NotFound,
    #[error("{0}")]
    Incomplete(&'static str),
    #[error("Organization is already registered")]
    AlreadyCompleted,
    /// Another submit holds the draft.
    #[error("Registration is already in progress")]
    Submitting,
    /// The main API answered `success: false`.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl OnboardingError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Incomplete(_) | Self::Rejected(_) => StatusCode::BAD_REQUEST,
            Self::AlreadyCompleted | Self::Submitting => StatusCode::CONFLICT,
            Self::Upstream(err) => err.status,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Clone)]
pub struct OnboardingService {
    store: Arc<dyn DraftStore>,
    main_api: MainApiClient,
}

impl OnboardingService {
    #[must_use]
    pub fn new(store: Arc<dyn DraftStore>, main_api: MainApiClient) -> Self {
        Self { store, main_api }
    }

    #[must_use]
    pub fn store(&self) -> &dyn DraftStore {
        self.store.as_ref()
    }

    /// The user's completed draft if there is one, else the open draft, else a
    /// fresh one.
    ///
    /// # Errors
    /// Returns `OnboardingError::Store` on storage failures.
    #[instrument(skip(self))]
    pub async fn get_or_create_draft(&self, user_id: &str) -> Result<RegistrationDraft, OnboardingError> {
        if let Some(draft) = self.store.find_completed_by_user(user_id).await? {
            return Ok(draft);
        }
        if let Some(draft) = self.store.find_active_by_user(user_id).await? {
            return Ok(draft);
        }
        Ok(self.store.create(user_id).await?)
    }

    /// Resolve a draft id sent by the browser to an open draft owned by `user_id`.
    async fn open_draft(&self, user_id: &str, draft_id: &str) -> Result<RegistrationDraft, OnboardingError> {
        let Ok(id) = Uuid::parse_str(draft_id.trim()) else {
            return Err(OnboardingError::NotFound);
        };
        match self.store.find_by_id(id).await? {
            Some(draft) if draft.ext_user_id == user_id && draft.status == DraftStatus::InProgress => {
                Ok(draft)
            }
            Some(draft) => {
                warn!(draft = %draft.id, status = draft.status.as_str(), "draft is not writable for this user");
                Err(OnboardingError::NotFound)
            }
            None => Err(OnboardingError::NotFound),
        }
    }

    /// # Errors
    /// `NotFound` unless the draft is open and owned by `user_id`.
    #[instrument(skip(self, org))]
    pub async fn save_organization(
        &self,
        user_id: &str,
        draft_id: &str,
        org: &DraftOrganization,
    ) -> Result<(), OnboardingError> {
        let draft = self.open_draft(user_id, draft_id).await?;
        self.store.upsert_organization(draft.id, org).await?;
        self.store.update_step(draft.id, STEP_ORGANIZATION).await?;
        Ok(())
    }

    /// # Errors
    /// `NotFound` unless the draft is open and owned by `user_id`.
    #[instrument(skip(self, locations), fields(count = locations.len()))]
    pub async fn save_locations(
        &self,
        user_id: &str,
        draft_id: &str,
        locations: &[DraftLocation],
    ) -> Result<(), OnboardingError> {
        let draft = self.open_draft(user_id, draft_id).await?;
        self.store.replace_locations(draft.id, locations).await?;
        self.store.update_step(draft.id, STEP_LOCATIONS).await?;
        Ok(())
    }

    /// # Errors
    /// Returns `OnboardingError::Store` on storage failures.
    pub async fn mark_completed(&self, draft_id: Uuid, org_id: i64) -> Result<(), OnboardingError> {
        Ok(self
            .store
            .update_status(draft_id, DraftStatus::Completed, Some(org_id))
            .await?)
    }

    /// # Errors
    /// Returns `OnboardingError::Store` on storage failures.
    pub async fn mark_failed(&self, draft_id: Uuid) -> Result<(), OnboardingError> {
        Ok(self
            .store
            .update_status(draft_id, DraftStatus::Failed, None)
            .await?)
    }

    /// Register the organization collected by the user's draft and return the
    /// new organization id.
    ///
    /// # Errors
    /// `Incomplete` when a step is missing, `AlreadyCompleted` for a finished
    /// draft, `Submitting` while another submit holds it, `Rejected` when the
    /// main API refuses the organization and `Upstream` when the call itself
    /// fails.
    #[instrument(skip(self, access_token))]
    pub async fn submit(&self, user_id: &str, access_token: &str) -> Result<i64, OnboardingError> {
        let draft = self.get_or_create_draft(user_id).await?;

        match draft.status {
            DraftStatus::Completed => return Err(OnboardingError::AlreadyCompleted),
            DraftStatus::Submitting => return Err(OnboardingError::Submitting),
            DraftStatus::InProgress | DraftStatus::Failed => {}
        }
        let Some(organization) = draft.organization.as_ref() else {
            return Err(OnboardingError::Incomplete("Organization details are missing"));
        };
        if draft.locations.is_empty() {
            return Err(OnboardingError::Incomplete("Add at least one location"));
        }
        if draft.current_step < STEP_LOCATIONS {
            return Err(OnboardingError::Incomplete("Not all steps are complete"));
        }

        // Only the caller that moves the draft to SUBMITTING may register it.
        if !self.store.claim_for_submit(draft.id).await? {
            warn!(draft = %draft.id, "draft was claimed by another submit");
            return Err(OnboardingError::Submitting);
        }

        let registration = OrgRegistration::from(organization);
        let outcome = match self.main_api.register_org(access_token, &registration).await {
            Ok(outcome) => outcome,
            Err(err) => {
                if let Err(reopen) = self
                    .store
                    .update_status(draft.id, DraftStatus::InProgress, None)
                    .await
                {
                    error!(draft = %draft.id, "failed to reopen draft: {reopen:#}");
                }
                return Err(err.into());
            }
        };

        match outcome {
            RegistrationOutcome::Registered { org_id } => {
                self.mark_completed(draft.id, org_id).await?;
                info!(draft = %draft.id, org_id, "onboarding completed");
                Ok(org_id)
            }
            RegistrationOutcome::Rejected { message } => {
                self.mark_failed(draft.id).await?;
                Err(OnboardingError::Rejected(
                    message.unwrap_or_else(|| "Failed to create organization".to_string()),
                ))
            }
        }
    }
}
