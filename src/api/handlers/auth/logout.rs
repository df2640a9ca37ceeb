use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::{info, instrument};

use super::upstream_failure;
use crate::api::handlers::{
    session::{access_token, cleared, SessionConfig},
    success, MessageEnvelope,
};
use crate::upstream::AuthClient;

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Signed out, cookies cleared", body = MessageEnvelope),
        (status = 500, description = "Identity service failed, cookies cleared anyway", body = MessageEnvelope)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn logout(
    headers: HeaderMap,
    auth: Extension<AuthClient>,
    session_config: Extension<SessionConfig>,
) -> impl IntoResponse {
    // Cookies are cleared on every path.
    let Some(token) = access_token(&headers) else {
        return cleared(success("Already logged out"), &session_config);
    };

    let response = match auth.logout(&token).await {
        Ok(()) => {
            info!("user logged out");
            success("Logged out")
        }
        Err(err) if err.status == StatusCode::UNAUTHORIZED => success("Session already expired"),
        Err(err) => upstream_failure(&err),
    };
    cleared(response, &session_config)
}
