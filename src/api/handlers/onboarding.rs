//! Onboarding wizard endpoints. All of them require a verified access cookie;
//! drafts are always looked up for the user in the token.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, instrument};

use super::{
    failure, invalid_body, session::authenticate, success, DraftEnvelope, MessageEnvelope,
};
use crate::onboarding::{
    validate_locations, validate_organization, LocationsForm, OnboardingError,
    OnboardingService, OrganizationForm,
};
use crate::token::TokenVerifier;

fn onboarding_failure(err: &OnboardingError) -> Response {
    match err {
        OnboardingError::Store(source) => {
            error!("Onboarding storage error: {source:#}");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
        err => failure(err.status(), err.to_string()),
    }
}

#[utoipa::path(
    get,
    path = "/api/onboarding/draft",
    responses(
        (status = 200, description = "Completed, open or freshly created draft", body = DraftEnvelope),
        (status = 401, description = "No valid session", body = MessageEnvelope)
    ),
    tag = "onboarding"
)]
#[instrument(skip_all)]
pub async fn draft(
    headers: HeaderMap,
    verifier: Extension<Arc<TokenVerifier>>,
    onboarding: Extension<OnboardingService>,
) -> impl IntoResponse {
    let (_, claims) = match authenticate(&headers, &verifier) {
        Ok(session) => session,
        Err(response) => return response,
    };

    match onboarding.get_or_create_draft(&claims.sub).await {
        Ok(draft) => success(draft),
        Err(err) => onboarding_failure(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/onboarding/organization",
    request_body = OrganizationForm,
    responses(
        (status = 200, description = "Organization saved, draft at step 2 or later", body = MessageEnvelope),
        (status = 400, description = "Invalid form", body = MessageEnvelope),
        (status = 401, description = "No valid session", body = MessageEnvelope),
        (status = 404, description = "No open draft with this id for the user", body = MessageEnvelope)
    ),
    tag = "onboarding"
)]
#[instrument(skip_all)]
pub async fn organization(
    headers: HeaderMap,
    verifier: Extension<Arc<TokenVerifier>>,
    onboarding: Extension<OnboardingService>,
    payload: Option<Json<OrganizationForm>>,
) -> impl IntoResponse {
    let (_, claims) = match authenticate(&headers, &verifier) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let Some(Json(form)) = payload else {
        return invalid_body();
    };

    if let Some(message) = validate_organization(&form) {
        return failure(StatusCode::BAD_REQUEST, message);
    }

    match onboarding
        .save_organization(&claims.sub, &form.draft_id, &form.organization())
        .await
    {
        Ok(()) => success("Organization saved"),
        Err(err) => onboarding_failure(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/onboarding/locations",
    request_body = LocationsForm,
    responses(
        (status = 200, description = "Locations replaced, draft at step 3", body = MessageEnvelope),
        (status = 400, description = "Invalid form", body = MessageEnvelope),
        (status = 401, description = "No valid session", body = MessageEnvelope),
        (status = 404, description = "No open draft with this id for the user", body = MessageEnvelope)
    ),
    tag = "onboarding"
)]
#[instrument(skip_all)]
pub async fn locations(
    headers: HeaderMap,
    verifier: Extension<Arc<TokenVerifier>>,
    onboarding: Extension<OnboardingService>,
    payload: Option<Json<LocationsForm>>,
) -> impl IntoResponse {
    let (_, claims) = match authenticate(&headers, &verifier) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let Some(Json(form)) = payload else {
        return invalid_body();
    };

    if let Some(message) = validate_locations(&form) {
        return failure(StatusCode::BAD_REQUEST, message);
    }

    match onboarding
        .save_locations(&claims.sub, &form.draft_id, &form.locations())
        .await
    {
        Ok(()) => success("Locations saved"),
        Err(err) => onboarding_failure(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/onboarding/submit",
    responses(
        (status = 200, description = "Organization registered with the main API", body = MessageEnvelope),
        (status = 400, description = "Draft incomplete or refused by the main API", body = MessageEnvelope),
        (status = 401, description = "No valid session", body = MessageEnvelope),
        (status = 409, description = "Organization already registered", body = MessageEnvelope)
    ),
    tag = "onboarding"
)]
#[instrument(skip_all)]
pub async fn submit(
    headers: HeaderMap,
    verifier: Extension<Arc<TokenVerifier>>,
    onboarding: Extension<OnboardingService>,
) -> impl IntoResponse {
    let (token, claims) = match authenticate(&headers, &verifier) {
        Ok(session) => session,
        Err(response) => return response,
    };

    match onboarding.submit(&claims.sub, &token).await {
        Ok(_) => success("Organization registered"),
        Err(err) => onboarding_failure(&err),
    }
}
