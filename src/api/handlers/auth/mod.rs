//! Session endpoints backed by the identity service.
//!
//! Login, register and refresh store the returned token pair in cookies;
//! logout and failed refreshes clear them. `/me` checks the access token
//! locally before asking the identity service whether the session is alive.

pub mod change_password;
pub mod login;
pub mod logout;
pub mod me;
pub mod refresh;
pub mod register;

use axum::{http::StatusCode, response::Response};
use tracing::warn;

use super::{failure, session, success};
use crate::token::user_data_from_token;
use crate::upstream::{auth::AuthTokens, UpstreamError};

fn upstream_failure(err: &UpstreamError) -> Response {
    failure(err.status, err.message.clone())
}

/// Answer a fresh token pair with the user it belongs to and store it in cookies.
fn signed_in(tokens: &AuthTokens, config: &session::SessionConfig) -> Response {
    let user = match user_data_from_token(&tokens.access_token) {
        Ok(user) => user,
        Err(err) => {
            warn!("Identity service issued an unreadable access token: {err}");
            return failure(StatusCode::UNAUTHORIZED, "Invalid token");
        }
    };
    let mut response = success(user);
    session::set_auth_tokens(response.headers_mut(), config, tokens);
    response
}

#[cfg(test)]
mod tests;
