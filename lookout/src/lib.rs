//! # lookout: project management API for an error monitoring platform
//!
//! `lookout` serves the project scoped management endpoints of an error monitoring product:
//! editing and deleting the CODEOWNERS files synced from source control, and generating a
//! sample event so a fresh project has something to look at. It also carries the client for
//! the Vercel REST API used by the deployment integration.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum), persistence is PostgreSQL via
//! sqlx. Every request runs in one transaction: the handler resolves the project from the
//! organization and project slugs, checks the caller's organization role, does its work
//! through the repositories in [`db::handlers`] and commits.
//!
//! - [`api`]: handlers and request/response models under `/api/0`
//! - [`auth`]: trusted proxy header authentication and role based permissions
//! - [`ownership`]: CODEOWNERS parsing, conversion to issue owner rules and validation
//! - [`samples`]: embedded sample event fixtures per platform
//! - [`integrations::vercel`]: paginated Vercel API client
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use lookout::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = lookout::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     lookout::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! Migrations in `migrations/` run on startup, see [`migrator`].

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod integrations;
mod openapi;
pub mod ownership;
pub mod samples;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use axum::{
    Json, Router, http,
    http::HeaderValue,
    routing::{get, post, put},
};
use bon::Builder;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;
use config::CorsOrigin;
use openapi::ApiDoc;
use ownership::{OwnershipLookup, PostgresOwnershipLookup};

/// Product name used in user facing messages and third party registrations
pub const PRODUCT_NAME: &str = "Lookout";

/// Shared state handed to every handler.
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    #[builder(default = Arc::new(PostgresOwnershipLookup) as Arc<dyn OwnershipLookup>)]
    pub ownership: Arc<dyn OwnershipLookup>,
}

/// Get the lookout database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allow_origin = if config.cors.allowed_origins.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard)) {
        if config.cors.allow_credentials {
            anyhow::bail!("CORS cannot use wildcard origin '*' with allow_credentials=true");
        }
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PUT, http::Method::DELETE])
        .allow_headers([
            http::header::CONTENT_TYPE,
            http::HeaderName::from_bytes(config.auth.proxy_header.header_name.as_bytes())?,
        ])
        .allow_credentials(config.cors.allow_credentials);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router: the `/api/0` endpoints, their OpenAPI docs, a health check,
/// CORS and request tracing.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        .route(
            "/projects/{organization_slug}/{project_slug}/codeowners/{codeowners_id}/",
            put(api::handlers::code_owners::update_code_owners).delete(api::handlers::code_owners::delete_code_owners),
        )
        .route(
            "/projects/{organization_slug}/{project_slug}/create-sample/",
            post(api::handlers::samples::create_sample),
        )
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/0", api_routes)
        .merge(Scalar::with_url("/api/0/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;
    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Connect to postgres and bring the schema up to date
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    info!("Connecting to database");
    let pool = config.database.pool.pool_options().connect(&config.database.url).await?;
    migrator().run(&pool).await?;
    Ok(pool)
}

pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance, connecting to the configured database
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create a new application instance, reusing `pool` if given (tests hand one in)
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting lookout with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => {
                migrator().run(&pool).await?;
                pool
            }
            None => setup_database(&config).await?,
        };

        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Lookout listening on http://{}, available at {}", bind_addr, self.config.url_prefix);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
