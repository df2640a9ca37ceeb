use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tracing::warn;

use super::{session::access_token, Envelope, PermissionsEnvelope};
use crate::upstream::{auth::UserPermission, AuthClient};

fn permissions_response(status: StatusCode, success: bool, data: Vec<UserPermission>) -> Response {
    (status, Json(Envelope { success, data })).into_response()
}

#[utoipa::path(
    get,
    path = "/api/users/permissions",
    responses(
        (status = 200, description = "Permissions of the current user", body = PermissionsEnvelope),
        (status = 401, description = "No session or session rejected", body = PermissionsEnvelope),
        (status = 403, description = "Session not allowed to list permissions", body = PermissionsEnvelope),
        (status = 500, description = "Identity service unavailable", body = PermissionsEnvelope)
    ),
    tag = "users"
)]
pub async fn permissions(headers: HeaderMap, auth: Extension<AuthClient>) -> impl IntoResponse {
    let Some(token) = access_token(&headers) else {
        return permissions_response(StatusCode::UNAUTHORIZED, false, Vec::new());
    };

    match auth.permissions(&token).await {
        Ok(list) => permissions_response(StatusCode::OK, true, list),
        Err(err) if matches!(err.status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            permissions_response(err.status, false, Vec::new())
        }
        Err(err) => {
            warn!("Failed to load permissions: {err}");
            permissions_response(StatusCode::INTERNAL_SERVER_ERROR, false, Vec::new())
        }
    }
}
