use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::instrument;

use super::{signed_in, upstream_failure};
use crate::api::handlers::{failure, invalid_body, session::SessionConfig, MessageEnvelope, UserEnvelope};
use crate::upstream::{
    auth::{validate_login, LoginRequest},
    AuthClient,
};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in, session cookies set", body = UserEnvelope),
        (status = 400, description = "Missing login or password", body = MessageEnvelope),
        (status = 401, description = "Credentials rejected", body = MessageEnvelope)
    ),
    tag = "auth"
)]
#[instrument(skip(auth, session_config, payload))]
pub async fn login(
    auth: Extension<AuthClient>,
    session_config: Extension<SessionConfig>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(credentials)) = payload else {
        return invalid_body();
    };

    if let Some(message) = validate_login(&credentials) {
        return failure(StatusCode::BAD_REQUEST, message);
    }

    match auth.authenticate(&credentials).await {
        Ok(tokens) => signed_in(&tokens, &session_config),
        Err(err) => upstream_failure(&err),
    }
}
