use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use regex::Regex;
use tracing::instrument;

use super::{signed_in, upstream_failure};
use crate::api::handlers::{failure, invalid_body, session::SessionConfig, MessageEnvelope, UserEnvelope};
use crate::upstream::{auth::RegisterRequest, AuthClient};

/// Counted in Unicode scalar values, so an emoji counts once.
const MIN_PASSWORD_CHARS: usize = 8;
const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").is_ok_and(|re| re.is_match(email))
}

/// Returns the first problem with a registration form, if any.
#[must_use]
pub fn validate_register(request: &RegisterRequest) -> Option<&'static str> {
    if request.name.trim().is_empty() {
        return Some("Enter your name");
    }
    if request.login.trim().is_empty() {
        return Some("Enter a login");
    }
    if request.email.trim().is_empty() {
        return Some("Enter an email");
    }
    if !valid_email(&request.email) {
        return Some("Invalid email");
    }
    if request.password.trim().is_empty() {
        return Some("Enter a password");
    }
    if request.password.chars().count() < MIN_PASSWORD_CHARS {
        return Some("Password must be at least 8 characters");
    }
    if !request.password.chars().any(|c| c.is_ascii_digit()) {
        return Some("Password must contain a digit");
    }
    if !request
        .password
        .chars()
        .any(|c| PASSWORD_SPECIAL_CHARS.contains(c))
    {
        return Some("Password must contain a special character");
    }
    if request.password != request.confirm_password {
        return Some("Passwords do not match");
    }
    None
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created, session cookies set", body = UserEnvelope),
        (status = 400, description = "Invalid form or registration refused", body = MessageEnvelope)
    ),
    tag = "auth"
)]
#[instrument(skip(auth, session_config, payload))]
pub async fn register(
    auth: Extension<AuthClient>,
    session_config: Extension<SessionConfig>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return invalid_body();
    };

    if let Some(message) = validate_register(&request) {
        return failure(StatusCode::BAD_REQUEST, message);
    }

    match auth.register(&request).await {
        Ok(tokens) => signed_in(&tokens, &session_config),
        Err(err) => upstream_failure(&err),
    }
}
