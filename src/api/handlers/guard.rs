//! Redirects for page routes based on the access cookie.
//!
//! `/dashboard` and everything below it needs a session whose role may use
//! the dashboard; `/login` and `/register` are skipped once signed in. Other
//! paths, including the API, are passed through.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::session::access_token;
use crate::roles;
use crate::token::TokenVerifier;

const DASHBOARD: &str = "/dashboard";
const LOGIN: &str = "/login";
const REGISTER: &str = "/register";
const FORBIDDEN: &str = "/forbidden";

fn is_dashboard(path: &str) -> bool {
    path == DASHBOARD
        || path
            .strip_prefix(DASHBOARD)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Where a page request should be sent instead, if anywhere.
#[must_use]
pub fn redirect_for(path: &str, token: Option<&str>, verifier: &TokenVerifier) -> Option<&'static str> {
    if is_dashboard(path) {
        let Some(token) = token else {
            return Some(LOGIN);
        };
        // An unverifiable token is left for the API calls to reject and refresh.
        if let Ok(claims) = verifier.verify(token) {
            if !roles::is_allowed(&claims.role) {
                debug!(role = %claims.role, "role not allowed on dashboard");
                return Some(FORBIDDEN);
            }
        }
        return None;
    }

    if (path == LOGIN || path == REGISTER) && token.is_some() {
        return Some(DASHBOARD);
    }

    None
}

pub async fn page_guard(
    State(verifier): State<Arc<TokenVerifier>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let token = access_token(request.headers());
    match redirect_for(request.uri().path(), token.as_deref(), &verifier) {
        Some(location) => Redirect::temporary(location).into_response(),
        None => next.run(request).await,
    }
}
