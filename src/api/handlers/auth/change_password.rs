use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};
use tracing::instrument;

use crate::api::handlers::{failure, invalid_body, session::access_token, MessageEnvelope};
use crate::upstream::{auth::RelayError, AuthClient};

#[utoipa::path(
    post,
    path = "/api/auth/change-password/verify",
    responses(
        (status = 200, description = "Identity service answer, forwarded as is"),
        (status = 401, description = "No session", body = MessageEnvelope)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn change_password_verify(
    headers: HeaderMap,
    auth: Extension<AuthClient>,
    payload: Option<Json<Value>>,
) -> impl IntoResponse {
    let Some(token) = access_token(&headers) else {
        return failure(StatusCode::UNAUTHORIZED, "Not authenticated");
    };
    let Some(Json(body)) = payload else {
        return invalid_body();
    };

    match auth.change_password_verify(&token, &body).await {
        Ok(answer) => (StatusCode::OK, Json(answer)).into_response(),
        Err(RelayError { status, body }) => {
            let body = body.unwrap_or_else(|| json!({"success": false, "data": "Verification failed"}));
            (status, Json(body)).into_response()
        }
    }
}
