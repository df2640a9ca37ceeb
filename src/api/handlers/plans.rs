use axum::{extract::Extension, http::StatusCode, response::IntoResponse};
use tracing::error;

use super::{failure, success, MessageEnvelope, PlansEnvelope};
use crate::upstream::MainApiClient;

#[utoipa::path(
    get,
    path = "/api/plans",
    responses(
        (status = 200, description = "Plans offered by the main API", body = PlansEnvelope),
        (status = 500, description = "Main API unavailable", body = MessageEnvelope)
    ),
    tag = "onboarding"
)]
pub async fn plans(main_api: Extension<MainApiClient>) -> impl IntoResponse {
    match main_api.plans().await {
        Ok(plans) => success(plans),
        Err(err) => {
            error!("Failed to load plans: {err}");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load plans")
        }
    }
}
