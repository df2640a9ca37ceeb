//! HTTP clients for the services behind the BFF.
//!
//! Both upstreams answer with a `{ "success": bool, "data": ... }` envelope.
//! Failures of any kind (transport, non-2xx, `success: false`) surface as an
//! [`UpstreamError`] carrying the message and status the handlers relay to the
//! browser.

pub mod auth;
pub mod main_api;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

pub use auth::AuthClient;
pub use main_api::MainApiClient;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{status}: {message}")]
pub struct UpstreamError {
    pub message: String,
    pub status: StatusCode,
}

impl UpstreamError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::UNAUTHORIZED)
    }

    pub(crate) fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_GATEWAY)
    }
}

/// Envelope returned by both upstreams.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(crate::APP_USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed to build upstream HTTP client")
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

/// First string found under `keys` in a JSON error body.
pub(crate) fn message_from_body(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Map a non-2xx response into an `UpstreamError`, keeping its status.
pub(crate) async fn error_from_response(
    response: Response,
    keys: &[&str],
    fallback: &str,
) -> UpstreamError {
    let status = response.status();
    let body: Option<Value> = response.json().await.ok();
    let message = body
        .as_ref()
        .and_then(|body| message_from_body(body, keys))
        .unwrap_or_else(|| fallback.to_string());

    warn!(status = %status, message = %message, "upstream returned an error");

    UpstreamError::new(message, status)
}

/// Requests that never got a response are reported as `500`.
pub(crate) fn error_from_transport(err: &reqwest::Error, fallback: &str) -> UpstreamError {
    error!("upstream request failed: {err}");
    UpstreamError::new(fallback, StatusCode::INTERNAL_SERVER_ERROR)
}

/// Send a request and decode a 2xx JSON envelope.
pub(crate) async fn send_json<T: for<'de> Deserialize<'de>>(
    request: reqwest::RequestBuilder,
    keys: &[&str],
    fallback: &str,
) -> Result<Envelope<T>, UpstreamError> {
    let response = request
        .send()
        .await
        .map_err(|err| error_from_transport(&err, fallback))?;

    if !response.status().is_success() {
        return Err(error_from_response(response, keys, fallback).await);
    }

    response.json::<Envelope<T>>().await.map_err(|err| {
        error!("invalid upstream response body: {err}");
        UpstreamError::bad_gateway(fallback)
    })
}
