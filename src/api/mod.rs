use crate::{
    api::handlers::{failure, guard::page_guard, health},
    onboarding::{OnboardingService, PgDraftStore},
    token::TokenVerifier,
    upstream::{AuthClient, MainApiClient},
};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware,
    response::Response,
    routing::options,
    Extension, Router,
};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa_axum::router::OpenApiRouter;

pub(crate) mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use handlers::session::SessionConfig;
pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Runtime settings for the HTTP server.
#[derive(Debug)]
pub struct ServerConfig {
    pub auth_api_url: String,
    pub main_api_url: String,
    pub jwt_secret: SecretString,
    pub frontend_base_url: String,
    pub upstream_timeout: Duration,
    pub session: SessionConfig,
}

/// Everything the handlers pull out of request extensions.
#[derive(Clone)]
pub(crate) struct Services {
    pub(crate) verifier: Arc<TokenVerifier>,
    pub(crate) session: SessionConfig,
    pub(crate) auth: AuthClient,
    pub(crate) main_api: MainApiClient,
    pub(crate) onboarding: OnboardingService,
}

/// Routes plus the layers every request goes through, except CORS.
pub(crate) fn app(services: Services) -> Router {
    // Documented routes come from openapi.rs; preflight-only `OPTIONS /health`
    // is added here and stays out of the document.
    let (router, _openapi) = router().split_for_parts();
    router
        .route("/health", options(health::health))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            services.verifier.clone(),
            page_guard,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(services.verifier))
                .layer(Extension(services.session))
                .layer(Extension(services.auth))
                .layer(Extension(services.main_api))
                .layer(Extension(services.onboarding)),
        )
}

/// Start the server
/// # Errors
/// Return error if the configuration is invalid or the server fails to start
pub async fn new(port: u16, dsn: String, config: ServerConfig) -> Result<()> {
    let verifier = Arc::new(
        TokenVerifier::new(config.jwt_secret).context("Failed to configure token verifier")?,
    );

    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let auth = AuthClient::new(config.auth_api_url, config.upstream_timeout)?;
    let main_api = MainApiClient::new(config.main_api_url, config.upstream_timeout)?;
    let onboarding = OnboardingService::new(Arc::new(PgDraftStore::new(pool)), main_api.clone());

    let frontend_origin = frontend_origin(&config.frontend_base_url)?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_origin(AllowOrigin::exact(frontend_origin))
        .allow_credentials(true);

    let app = app(Services {
        verifier,
        session: config.session,
        auth,
        main_api,
        onboarding,
    })
    .layer(cors);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

async fn not_found() -> Response {
    failure(StatusCode::NOT_FOUND, "Not found")
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn frontend_origin(frontend_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_base_url)
        .with_context(|| format!("Invalid frontend base URL: {frontend_base_url}"))?;
    let host = parsed.host_str().ok_or_else(|| {
        anyhow!("Frontend base URL must include a valid host: {frontend_base_url}")
    })?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}
