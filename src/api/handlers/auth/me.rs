use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::api::handlers::{
    failure,
    session::{access_token, cleared, token_error_message, SessionConfig},
    success, MessageEnvelope, UserEnvelope,
};
use crate::token::TokenVerifier;
use crate::upstream::AuthClient;

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserEnvelope),
        (status = 401, description = "No session, or session rejected (cookies cleared)", body = MessageEnvelope),
        (status = 429, description = "Identity service is rate limiting", body = MessageEnvelope),
        (status = 503, description = "Identity service unavailable", body = MessageEnvelope)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn me(
    headers: HeaderMap,
    auth: Extension<AuthClient>,
    verifier: Extension<Arc<TokenVerifier>>,
    session_config: Extension<SessionConfig>,
) -> impl IntoResponse {
    let Some(token) = access_token(&headers) else {
        return failure(StatusCode::UNAUTHORIZED, "Not authenticated");
    };

    if let Err(err) = verifier.verify(&token) {
        return cleared(
            failure(StatusCode::UNAUTHORIZED, token_error_message(&err)),
            &session_config,
        );
    }

    match auth.me(&token).await {
        Ok(user) => success(user),
        Err(err) if matches!(err.status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            cleared(
                failure(StatusCode::UNAUTHORIZED, "Session expired or invalid"),
                &session_config,
            )
        }
        // The cookies are kept: the session may still be valid.
        Err(err) if err.status == StatusCode::TOO_MANY_REQUESTS => {
            failure(StatusCode::TOO_MANY_REQUESTS, "Too many requests")
        }
        Err(err) => {
            warn!("Failed to verify session upstream: {err}");
            failure(StatusCode::SERVICE_UNAVAILABLE, "Failed to verify session")
        }
    }
}
