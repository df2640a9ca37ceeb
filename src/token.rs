//! Local handling of identity-service access tokens.
//!
//! Tokens are HS256 JWTs signed with a secret shared with the identity
//! service. `decode` only parses the payload (used right after login, when the
//! token comes straight from the identity service); `TokenVerifier::verify`
//! checks the signature and expiry before a request is trusted.

use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default)]
    pub iat: i64,
    /// `0` when absent. `TokenVerifier::verify` still requires it.
    #[serde(default)]
    pub exp: i64,
}

/// User profile exposed to the browser.
#[derive(ToSchema, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub user_id: String,
    pub email: String,
    pub login: String,
    pub name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token secret is not configured")]
    MissingSecret,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::Malformed,
        }
    }
}

/// Parse the claims of a token without checking signature or expiry.
///
/// # Errors
/// Returns `TokenError::Malformed` if the token is not a decodable JWT.
pub fn decode(token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|err| {
            debug!("JWT decode error: {err}");
            TokenError::Malformed
        })
}

#[must_use]
pub fn extract_user_data(claims: &Claims) -> UserData {
    UserData {
        user_id: claims.sub.clone(),
        email: claims.email.clone(),
        login: claims.login.clone(),
        name: claims.name.clone(),
        role: claims.role.clone(),
        active: claims.active.clone(),
    }
}

/// Decode a freshly issued token and extract its user profile.
///
/// # Errors
/// Returns `TokenError::Malformed` if the token cannot be decoded.
pub fn user_data_from_token(token: &str) -> Result<UserData, TokenError> {
    decode(token).map(|claims| extract_user_data(&claims))
}

/// `true` once `exp` is strictly in the past.
#[must_use]
pub fn is_expired(claims: &Claims, now_unix_seconds: i64) -> bool {
    claims.exp < now_unix_seconds
}

#[must_use]
pub fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

/// Verifies access tokens against the shared HS256 secret.
pub struct TokenVerifier {
    secret: SecretString,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("secret", &"***")
            .finish()
    }
}

impl TokenVerifier {
    /// # Errors
    /// Returns `TokenError::MissingSecret` when the secret is empty.
    pub fn new(secret: SecretString) -> Result<Self, TokenError> {
        if secret.expose_secret().trim().is_empty() {
            return Err(TokenError::MissingSecret);
        }
        Ok(Self { secret })
    }

    /// Check signature and expiry (no leeway) and return the claims.
    ///
    /// # Errors
    /// `Expired`, `InvalidSignature` or `Malformed` depending on what failed.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;

        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        jsonwebtoken::decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                debug!("JWT verification error: {err}");
                TokenError::from(err)
            })
    }
}
