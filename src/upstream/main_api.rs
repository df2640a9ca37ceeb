//! Client for the main API (plans and organization registration).

use super::{build_client, endpoint, send_json, UpstreamError};
use crate::onboarding::DraftOrganization;
use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, instrument, warn};

const ERROR_KEYS: &[&str] = &["message"];

/// Body of `POST /orgs/register`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OrgRegistration {
    pub name: String,
    pub inn: String,
    pub kpp: String,
    pub director: String,
    pub phone_number: String,
    pub plan: String,
}

impl From<&DraftOrganization> for OrgRegistration {
    fn from(org: &DraftOrganization) -> Self {
        Self {
            name: org.name.clone(),
            inn: org.inn.clone(),
            kpp: org.kpp.clone(),
            director: org.director.clone(),
            phone_number: org.phone_number.clone(),
            plan: org.plan.clone(),
        }
    }
}

#[derive(Deserialize)]
struct RegisteredOrg {
    id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered { org_id: i64 },
    /// The main API answered `success: false`.
    Rejected { message: Option<String> },
}

#[derive(Clone, Debug)]
pub struct MainApiClient {
    client: Client,
    base_url: String,
}

impl MainApiClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    /// Available subscription plans, passed through untouched.
    ///
    /// # Errors
    /// Returns the upstream error.
    #[instrument(skip(self))]
    pub async fn plans(&self) -> Result<Value, UpstreamError> {
        let request = self.client.get(endpoint(&self.base_url, "/plans"));
        let envelope = send_json::<Value>(request, ERROR_KEYS, "Failed to load plans").await?;
        Ok(envelope.data.unwrap_or(Value::Null))
    }

    /// Register the organization collected by the onboarding draft.
    ///
    /// # Errors
    /// Returns the upstream status and `message` when the request fails.
    #[instrument(skip(self, access_token), fields(org = %org.name))]
    pub async fn register_org(
        &self,
        access_token: &str,
        org: &OrgRegistration,
    ) -> Result<RegistrationOutcome, UpstreamError> {
        let request = self
            .client
            .post(endpoint(&self.base_url, "/orgs/register"))
            .bearer_auth(access_token)
            .json(org);
        let envelope =
            send_json::<RegisteredOrg>(request, ERROR_KEYS, "Request to main API failed").await?;

        if !envelope.success {
            warn!(message = ?envelope.message, "organization registration rejected");
            return Ok(RegistrationOutcome::Rejected {
                message: envelope.message,
            });
        }

        let org_id = envelope
            .data
            .map(|data| data.id)
            .ok_or_else(|| UpstreamError::bad_gateway("Main API did not return an organization id"))?;

        info!(org_id, "organization registered");

        Ok(RegistrationOutcome::Registered { org_id })
    }
}
