use crate::api::SessionConfig;
use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_COOKIE_SECURE: &str = "cookie-secure";
pub const ARG_ACCESS_TOKEN_MAX_AGE: &str = "access-token-max-age";
pub const ARG_REFRESH_TOKEN_MAX_AGE: &str = "refresh-token-max-age";

pub struct Options {
    pub jwt_secret: SecretString,
    pub session: SessionConfig,
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("jwt_secret", &"***")
            .field("session", &self.session)
            .finish()
    }
}

impl Options {
    /// Parse session arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the JWT secret is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let jwt_secret = matches
            .get_one::<String>(ARG_JWT_SECRET)
            .filter(|v| !v.trim().is_empty())
            .map(|v| SecretString::from(v.as_str()))
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_JWT_SECRET}"))?;

        let mut session = SessionConfig::default().with_secure(
            matches
                .get_one::<bool>(ARG_COOKIE_SECURE)
                .copied()
                .unwrap_or(false),
        );
        if let Some(seconds) = matches.get_one::<i64>(ARG_ACCESS_TOKEN_MAX_AGE) {
            session = session.with_access_max_age_seconds(*seconds);
        }
        if let Some(seconds) = matches.get_one::<i64>(ARG_REFRESH_TOKEN_MAX_AGE) {
            session = session.with_refresh_max_age_seconds(*seconds);
        }

        Ok(Self {
            jwt_secret,
            session,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("HS256 secret shared with the identity service")
                .env("CONCIERGE_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_COOKIE_SECURE)
                .long(ARG_COOKIE_SECURE)
                .help("Mark session cookies as Secure (enable behind HTTPS)")
                .env("CONCIERGE_COOKIE_SECURE")
                .action(ArgAction::Set)
                .num_args(0..=1)
                .default_value("false")
                .default_missing_value("true")
                .value_parser(clap::value_parser!(bool)),
        )
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_MAX_AGE)
                .long(ARG_ACCESS_TOKEN_MAX_AGE)
                .help("Max-Age of the access token cookie in seconds")
                .env("CONCIERGE_ACCESS_TOKEN_MAX_AGE")
                .default_value("900")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TOKEN_MAX_AGE)
                .long(ARG_REFRESH_TOKEN_MAX_AGE)
                .help("Max-Age of the refresh token cookie in seconds")
                .env("CONCIERGE_REFRESH_TOKEN_MAX_AGE")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
}
