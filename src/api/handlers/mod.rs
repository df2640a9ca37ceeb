//! Route handlers and the response envelope they share.
//!
//! Every JSON answer has the shape `{ "success": bool, "data": T }`. On
//! failures `data` carries a human readable message (or an empty list for
//! list endpoints).

pub mod auth;
pub mod guard;
pub mod health;
pub mod onboarding;
pub mod plans;
pub mod session;
pub mod users;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::onboarding::RegistrationDraft;
use crate::token::UserData;
use crate::upstream::auth::UserPermission;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

// Envelope shapes as they appear in the OpenAPI document.

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageEnvelope {
    pub success: bool,
    pub data: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserEnvelope {
    pub success: bool,
    pub data: UserData,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct PermissionsEnvelope {
    pub success: bool,
    pub data: Vec<UserPermission>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct DraftEnvelope {
    pub success: bool,
    pub data: RegistrationDraft,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct PlansEnvelope {
    pub success: bool,
    #[schema(value_type = Object)]
    pub data: Value,
}

/// `200` with `{ success: true, data }`.
pub(crate) fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(Envelope { success: true, data })).into_response()
}

/// `{ success: false, data: message }` with the given status.
pub(crate) fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(Envelope {
            success: false,
            data: message.into(),
        }),
    )
        .into_response()
}

/// Handlers accept `Option<Json<T>>` so an unreadable body maps to this.
pub(crate) fn invalid_body() -> Response {
    failure(StatusCode::BAD_REQUEST, "Invalid request body")
}
