//! Session cookies.
//!
//! The browser never sees the tokens: both are stored in `HttpOnly` cookies
//! scoped to `/` with `SameSite=Lax`.

use axum::{
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::Response,
};
use tracing::{debug, error};

use super::failure;
use crate::token::{Claims, TokenError, TokenVerifier};
use crate::upstream::auth::AuthTokens;

pub const ACCESS_COOKIE_NAME: &str = "access_token";
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

const DEFAULT_ACCESS_MAX_AGE_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_MAX_AGE_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    secure: bool,
    access_max_age_seconds: i64,
    refresh_max_age_seconds: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secure: false,
            access_max_age_seconds: DEFAULT_ACCESS_MAX_AGE_SECONDS,
            refresh_max_age_seconds: DEFAULT_REFRESH_MAX_AGE_SECONDS,
        }
    }
}

impl SessionConfig {
    /// Mark cookies `Secure`; enable when the frontend is served over HTTPS.
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_access_max_age_seconds(mut self, seconds: i64) -> Self {
        self.access_max_age_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_max_age_seconds(mut self, seconds: i64) -> Self {
        self.refresh_max_age_seconds = seconds;
        self
    }

    #[must_use]
    pub fn secure(&self) -> bool {
        self.secure
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| cookie::Cookie::parse(pair.trim()).ok())
        .find(|cookie| cookie.name() == name && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}

#[must_use]
pub fn access_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, ACCESS_COOKIE_NAME)
}

#[must_use]
pub fn refresh_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, REFRESH_COOKIE_NAME)
}

fn session_cookie(
    config: &SessionConfig,
    name: &str,
    value: &str,
    max_age_seconds: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}");
    if config.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn append_cookie(headers: &mut HeaderMap, cookie: Result<HeaderValue, InvalidHeaderValue>) {
    match cookie {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(err) => error!("Failed to build session cookie: {err}"),
    }
}

/// Add the `Set-Cookie` headers storing both tokens.
pub fn set_auth_tokens(headers: &mut HeaderMap, config: &SessionConfig, tokens: &AuthTokens) {
    append_cookie(
        headers,
        session_cookie(
            config,
            ACCESS_COOKIE_NAME,
            &tokens.access_token,
            config.access_max_age_seconds,
        ),
    );
    append_cookie(
        headers,
        session_cookie(
            config,
            REFRESH_COOKIE_NAME,
            &tokens.refresh_token,
            config.refresh_max_age_seconds,
        ),
    );
}

/// Add `Set-Cookie` headers expiring both tokens.
pub fn clear_auth_tokens(headers: &mut HeaderMap, config: &SessionConfig) {
    append_cookie(headers, session_cookie(config, ACCESS_COOKIE_NAME, "", 0));
    append_cookie(headers, session_cookie(config, REFRESH_COOKIE_NAME, "", 0));
}

/// Apply `clear_auth_tokens` to an already built response.
pub(crate) fn cleared(mut response: Response, config: &SessionConfig) -> Response {
    clear_auth_tokens(response.headers_mut(), config);
    response
}

/// Message reported to the browser when local verification fails.
pub(crate) fn token_error_message(err: &TokenError) -> &'static str {
    match err {
        TokenError::Expired => "Token expired",
        _ => "Invalid token",
    }
}

/// The access cookie and its claims, once verified.
///
/// # Errors
/// `401 Not authenticated` without a cookie, `401 Token expired` or
/// `401 Invalid token` when verification fails. Cookies are left untouched.
pub fn authenticate(headers: &HeaderMap, verifier: &TokenVerifier) -> Result<(String, Claims), Response> {
    let Some(token) = access_token(headers) else {
        return Err(failure(StatusCode::UNAUTHORIZED, "Not authenticated"));
    };
    match verifier.verify(&token) {
        Ok(claims) => Ok((token, claims)),
        Err(err) => {
            debug!("Access token rejected: {err}");
            Err(failure(StatusCode::UNAUTHORIZED, token_error_message(&err)))
        }
    }
}
