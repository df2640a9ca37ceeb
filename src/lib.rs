//! # Concierge (venue backend-for-frontend)
//!
//! `concierge` sits between the browser and the services behind the venue
//! product. It never issues credentials itself: the identity service owns
//! users and tokens, the main API owns organizations and plans.
//!
//! ## Session
//!
//! Access and refresh tokens live in `HttpOnly` cookies (`access_token`,
//! `refresh_token`). Access tokens are HS256 JWTs verified locally with a secret
//! shared with the identity service; only login, refresh, logout and `/me`
//! reach the identity service.
//!
//! ## Onboarding
//!
//! New accounts walk through three steps (account, organization, locations).
//! Progress is stored as a per-user draft in Postgres and the final submit
//! registers the organization with the main API.
//!
//! Every JSON response uses the `{ "success": bool, "data": ... }` envelope the
//! frontend expects.

pub mod api;
pub mod cli;
pub mod onboarding;
pub mod roles;
pub mod token;
pub mod upstream;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
