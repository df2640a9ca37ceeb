use clap::{Arg, ArgMatches, Command};
use std::time::Duration;

pub const ARG_AUTH_API_URL: &str = "auth-api-url";
pub const ARG_MAIN_API_URL: &str = "main-api-url";
pub const ARG_UPSTREAM_TIMEOUT_SECONDS: &str = "upstream-timeout-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub auth_api_url: String,
    pub main_api_url: String,
    pub timeout: Duration,
}

impl Options {
    /// Parse upstream service arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a base URL is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let read_required = |id: &str| -> anyhow::Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        Ok(Self {
            auth_api_url: read_required(ARG_AUTH_API_URL)?,
            main_api_url: read_required(ARG_MAIN_API_URL)?,
            timeout: Duration::from_secs(
                matches
                    .get_one::<u64>(ARG_UPSTREAM_TIMEOUT_SECONDS)
                    .copied()
                    .unwrap_or(10),
            ),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_AUTH_API_URL)
                .long(ARG_AUTH_API_URL)
                .help("Identity service base URL, example: https://auth.venue.tld")
                .env("CONCIERGE_AUTH_API_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_MAIN_API_URL)
                .long(ARG_MAIN_API_URL)
                .help("Main API base URL, example: https://api.venue.tld")
                .env("CONCIERGE_MAIN_API_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_TIMEOUT_SECONDS)
                .long(ARG_UPSTREAM_TIMEOUT_SECONDS)
                .help("Timeout for calls to the identity service and the main API")
                .env("CONCIERGE_UPSTREAM_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
