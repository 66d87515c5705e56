//! # landgen: Landscape Concept Generator
//!
//! `landgen` serves a single-page form where a homeowner enters a property address, picks a
//! budget, adds free-text goals and optionally attaches a photo of the site. Submitting the form
//! calls one server route that turns the submission into a prompt, forwards it to an AI API and
//! returns the generated concept.
//!
//! ## Overview
//!
//! The server holds the upstream credential so the browser never sees it. It is stateless: no
//! request leaves anything behind, and every response carries a fresh random `id`.
//!
//! ### Request Flow
//!
//! `POST /api/generate` parses the body, validates it (address present, budget a non-negative
//! number, photo an image), classifies the budget into a [`generation::BudgetTier`] and hands the
//! resulting [`generation::ConceptBrief`] to the backend picked at startup:
//!
//! - **structured** (default): the Responses API with a strict JSON Schema, so the model's text
//!   output parses straight into the concept.
//! - **demo**: no network at all; a deterministic concept is synthesized from the tier after a
//!   short artificial delay.
//! - **image**: image generation, or an edit of the uploaded photo when one is supplied.
//!
//! Validation failures are 400s and never reach the upstream. A missing API key is a 500 and
//! never reaches the upstream either. Upstream failures keep the upstream status where it is an
//! error status and echo a truncated copy of the upstream body as `raw`.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) holds the handlers and wire models. The **generation layer**
//! ([`generation`]) holds the [`generation::ConceptGenerator`] trait, its implementations and the
//! upstream client. The **form** module ([`form`]) renders the page and owns the input rules
//! shared with it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use landgen::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = landgen::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     landgen::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config)?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See [`config`] for the YAML layout and the `LANDGEN_` environment overrides. The upstream key
//! is read from `OPENAI_API_KEY`.

pub mod api;
pub mod config;
pub mod errors;
pub mod form;
pub mod generation;
mod metrics;
mod openapi;
mod static_assets;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

use crate::config::CorsOrigin;
use crate::generation::Backend;
use crate::openapi::ApiDoc;
use axum::extract::DefaultBodyLimit;
use axum::http::{self, HeaderValue};
use axum::{
    Json, Router,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .backend(backend)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub backend: Backend,
}

/// Build the HTTP client shared by every upstream call.
///
/// reqwest is built without a bundled crypto provider, so the aws-lc-rs provider is installed
/// first. Installing twice is harmless and the second attempt is ignored.
pub fn build_http_client() -> anyhow::Result<reqwest::Client> {
    // Err means a provider is already installed
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    let client = reqwest::Client::builder()
        .user_agent(concat!("landgen/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Create CORS layer from configuration
///
/// A `*` entry allows any origin; tower-http rejects `*` inside an explicit origin list.
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allow_origin = if config.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            // Url normalizes to a trailing slash, browsers send the origin without one
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST])
        .allow_headers([http::header::CONTENT_TYPE]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// - `GET /` form page, `GET /healthz`
/// - `POST /api/generate` with the configured body limit
/// - `GET /api/openapi.json` and the Scalar UI at `/api/docs`
/// - `GET /internal/metrics` when metrics are enabled
/// - embedded static assets for everything else
///
/// # Errors
///
/// Returns an error if the CORS configuration cannot be turned into header values.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Body limit only applies to the generation route
    let api_routes = Router::new()
        .route("/api/generate", post(api::handlers::generate::generate))
        .layer(DefaultBodyLimit::max(state.config.limits.max_body_bytes));

    let router = Router::new()
        .route("/", get(api::handlers::page::index))
        .route("/healthz", get(|| async { "OK" }))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(api_routes)
        .with_state(state.clone())
        .merge(Scalar::with_url("/api/docs", ApiDoc::openapi()))
        .fallback(api::handlers::static_assets::serve_embedded_asset);

    // Apply middleware layers, outermost last
    let cors_layer = create_cors_layer(&state.config)?;
    let mut router = router.layer(cors_layer);

    if state.config.enable_metrics {
        // Installs the global recorder that the generation counters report into
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    // Trace layer goes last so it wraps every other layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct.
///
/// 1. **Create**: [`Application::new`] builds the HTTP client, the generation backend and the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests until shutdown
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting landgen with configuration: {:#?}", config);

        // One client shared by every upstream call, so connections are pooled
        let http = build_http_client()?;
        let backend = generation::create_backend(&config, http);
        info!(mode = %backend.mode(), "Generation backend ready");

        // Not fatal: the form still renders and generation answers 500 until a key is set
        if backend.mode() != config::GenerationMode::Demo && config.openai.api_key.is_none() {
            tracing::warn!("No OPENAI_API_KEY configured; generation requests will fail until one is set");
        }

        let app_state = AppState::builder().config(config.clone()).backend(backend).build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "landgen listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Serve until the shutdown future resolves, then drain in-flight requests
        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
