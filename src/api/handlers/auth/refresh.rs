use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::{debug, instrument};

use super::upstream_failure;
use crate::api::handlers::{
    failure,
    session::{cleared, refresh_token, set_auth_tokens, SessionConfig},
    success, MessageEnvelope,
};
use crate::upstream::AuthClient;

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "New token pair stored in cookies", body = MessageEnvelope),
        (status = 401, description = "Missing or rejected refresh token, cookies cleared", body = MessageEnvelope)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn refresh(
    headers: HeaderMap,
    auth: Extension<AuthClient>,
    session_config: Extension<SessionConfig>,
) -> impl IntoResponse {
    let Some(token) = refresh_token(&headers) else {
        return cleared(
            failure(StatusCode::UNAUTHORIZED, "No refresh token"),
            &session_config,
        );
    };

    match auth.refresh(&token).await {
        Ok(tokens) => {
            debug!("session tokens refreshed");
            let mut response = success("Tokens refreshed");
            set_auth_tokens(response.headers_mut(), &session_config, &tokens);
            response
        }
        Err(err) => cleared(upstream_failure(&err), &session_config),
    }
}
