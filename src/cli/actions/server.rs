use crate::api::{self, ServerConfig, SessionConfig};
use anyhow::Result;
use secrecy::SecretString;
use std::time::Duration;
use tracing::debug;

pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_base_url: String,
    pub auth_api_url: String,
    pub main_api_url: String,
    pub upstream_timeout: Duration,
    pub jwt_secret: SecretString,
    pub session: SessionConfig,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("dsn", &"***")
            .field("frontend_base_url", &self.frontend_base_url)
            .field("auth_api_url", &self.auth_api_url)
            .field("main_api_url", &self.main_api_url)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("jwt_secret", &"***")
            .field("session", &self.session)
            .finish()
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let config = ServerConfig {
        auth_api_url: args.auth_api_url,
        main_api_url: args.main_api_url,
        jwt_secret: args.jwt_secret,
        frontend_base_url: args.frontend_base_url,
        upstream_timeout: args.upstream_timeout,
        session: args.session,
    };

    api::new(args.port, args.dsn, config).await
}
