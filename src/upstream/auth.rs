//! Client for the external identity service.

use super::{
    build_client, endpoint, error_from_response, error_from_transport, send_json, UpstreamError,
};
use crate::token::UserData;
use anyhow::Result;
use axum::http::StatusCode;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

const ERROR_KEYS: &[&str] = &["error", "message"];
const REGISTER_ERROR_KEYS: &[&str] = &["message", "error"];

/// Role given to accounts created through self-service registration.
const REGISTER_ROLE: &str = "Admin";

#[derive(ToSchema, Serialize, Deserialize, Clone, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

/// Returns the first problem with a login form, if any.
#[must_use]
pub fn validate_login(request: &LoginRequest) -> Option<&'static str> {
    if request.login.trim().is_empty() || request.password.trim().is_empty() {
        return Some("Login and password required");
    }
    None
}

#[derive(ToSchema, Serialize, Deserialize, Clone, Default)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("login", &self.login)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Token pair as sent by the identity service.
#[derive(Deserialize)]
struct RawAuthTokens {
    access_token: String,
    refresh_token: String,
}

#[derive(Deserialize)]
struct TokensData {
    tokens: RawAuthTokens,
}

/// Token pair held by the session cookies.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthTokens { .. }")
    }
}

impl From<RawAuthTokens> for AuthTokens {
    fn from(raw: RawAuthTokens) -> Self {
        Self {
            access_token: raw.access_token,
            refresh_token: raw.refresh_token,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserPermission {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// The permissions endpoint answers with either a list or `{ permissions: [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum PermissionsPayload {
    List(Vec<UserPermission>),
    Wrapped {
        #[serde(default)]
        permissions: Vec<UserPermission>,
    },
}

impl From<PermissionsPayload> for Vec<UserPermission> {
    fn from(payload: PermissionsPayload) -> Self {
        match payload {
            PermissionsPayload::List(list) | PermissionsPayload::Wrapped { permissions: list } => {
                list
            }
        }
    }
}

/// Failed pass-through call: status plus the upstream body, if it had one.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayError {
    pub status: StatusCode,
    pub body: Option<Value>,
}

#[derive(Clone, Debug)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange credentials for a token pair.
    ///
    /// # Errors
    /// `401 Authentication failed` when the identity service reports
    /// `success: false`, otherwise the upstream status and message.
    #[instrument(skip(self))]
    pub async fn authenticate(&self, credentials: &LoginRequest) -> Result<AuthTokens, UpstreamError> {
        let request = self
            .client
            .post(endpoint(&self.base_url, "/auth/login"))
            .json(credentials);
        let envelope = send_json::<TokensData>(request, ERROR_KEYS, "Authentication failed").await?;

        match envelope.data {
            Some(data) if envelope.success => Ok(data.tokens.into()),
            _ => Err(UpstreamError::unauthorized("Authentication failed")),
        }
    }

    /// Rotate the token pair using a refresh token.
    ///
    /// # Errors
    /// `401 Refresh failed` on `success: false`, otherwise the upstream error.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, UpstreamError> {
        let request = self
            .client
            .post(endpoint(&self.base_url, "/auth/refresh"))
            .json(&json!({ "refresh_token": refresh_token }));
        let envelope = send_json::<TokensData>(request, ERROR_KEYS, "Refresh failed").await?;

        match envelope.data {
            Some(data) if envelope.success => Ok(data.tokens.into()),
            _ => Err(UpstreamError::unauthorized("Refresh failed")),
        }
    }

    /// End the session on the identity service.
    ///
    /// # Errors
    /// Returns the upstream status and message.
    #[instrument(skip_all)]
    pub async fn logout(&self, access_token: &str) -> Result<(), UpstreamError> {
        let response = self
            .client
            .delete(endpoint(&self.base_url, "/auth/logout"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|err| error_from_transport(&err, "Logout failed"))?;

        if !response.status().is_success() {
            return Err(error_from_response(response, ERROR_KEYS, "Logout failed").await);
        }

        Ok(())
    }

    /// Fetch the current user and confirm the session still exists upstream.
    ///
    /// # Errors
    /// `401 Session not found` on `success: false`, otherwise the upstream error.
    #[instrument(skip_all)]
    pub async fn me(&self, access_token: &str) -> Result<UserData, UpstreamError> {
        let request = self
            .client
            .get(endpoint(&self.base_url, "/user/me"))
            .bearer_auth(access_token);
        let envelope =
            send_json::<Map<String, Value>>(request, ERROR_KEYS, "Session not found").await?;

        match envelope.data {
            Some(raw) if envelope.success => Ok(user_data_from_raw(&raw)),
            _ => Err(UpstreamError::unauthorized("Session not found")),
        }
    }

    /// Create an account. Returns the token pair of the new session.
    ///
    /// # Errors
    /// `400 Registration failed` on `success: false`, otherwise the upstream
    /// status with its `message`/`error`.
    #[instrument(skip(self))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthTokens, UpstreamError> {
        let body = json!({
            "name": request.name,
            "login": request.login,
            "email": request.email,
            "password": request.password,
            "confirm_password": request.confirm_password,
            "role": REGISTER_ROLE,
        });
        let request = self
            .client
            .post(endpoint(&self.base_url, "/auth/register"))
            .json(&body);
        let envelope =
            send_json::<TokensData>(request, REGISTER_ERROR_KEYS, "Registration failed").await?;

        match envelope.data {
            Some(data) if envelope.success => Ok(data.tokens.into()),
            _ => Err(UpstreamError::new(
                "Registration failed",
                StatusCode::BAD_REQUEST,
            )),
        }
    }

    /// List the permissions of the current user.
    ///
    /// # Errors
    /// Returns the upstream status and message.
    #[instrument(skip_all)]
    pub async fn permissions(&self, access_token: &str) -> Result<Vec<UserPermission>, UpstreamError> {
        let request = self
            .client
            .get(endpoint(&self.base_url, "/user/permissions"))
            .bearer_auth(access_token);
        let envelope =
            send_json::<PermissionsPayload>(request, ERROR_KEYS, "Failed to load permissions")
                .await?;

        debug!(success = envelope.success, "permissions fetched");

        Ok(envelope.data.map(Vec::from).unwrap_or_default())
    }

    /// Forward a password-change verification and return the upstream body as is.
    ///
    /// # Errors
    /// Returns a `RelayError` with the upstream status and body.
    #[instrument(skip_all)]
    pub async fn change_password_verify(
        &self,
        access_token: &str,
        body: &Value,
    ) -> Result<Value, RelayError> {
        let response = self
            .client
            .post(endpoint(&self.base_url, "/auth/change-password/verify"))
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                error!("change-password verify request failed: {err}");
                RelayError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: None,
                }
            })?;

        let status = response.status();
        let body: Option<Value> = response.json().await.ok();

        if status.is_success() {
            body.ok_or(RelayError {
                status: StatusCode::BAD_GATEWAY,
                body: None,
            })
        } else {
            Err(RelayError { status, body })
        }
    }
}

fn string_field(raw: &Map<String, Value>, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(value) => Some(value.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// The identity service may send `sub` instead of `userId`.
fn user_data_from_raw(raw: &Map<String, Value>) -> UserData {
    UserData {
        user_id: string_field(raw, "userId")
            .or_else(|| string_field(raw, "sub"))
            .unwrap_or_default(),
        email: string_field(raw, "email").unwrap_or_default(),
        login: string_field(raw, "login").unwrap_or_default(),
        name: string_field(raw, "name").unwrap_or_default(),
        role: string_field(raw, "role").unwrap_or_default(),
        active: string_field(raw, "active"),
    }
}
