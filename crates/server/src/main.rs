use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod state;

use mindbridge_core::config::{Config, LoggingConfig, ServerConfig};
use state::AppState;

/// Routes that work without any backing services, used by tests and as a
/// smoke surface.
fn create_app() -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
}

fn create_app_with_state(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/health/database", get(handlers::database_health))
        .route("/metrics", get(handlers::metrics))
        .route("/documents", post(handlers::ingest_document))
        .route("/search", post(handlers::search))
        .route(
            "/repositories",
            post(handlers::create_repository).get(handlers::list_repositories),
        )
        .with_state(app_state)
}

fn build_cors_layer(config: &ServerConfig) -> Result<CorsLayer> {
    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any))
}

fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    if config.format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load_from_env().context("Failed to load configuration")?;

    init_tracing(&config.logging);
    tracing::info!("Starting mindbridge server");

    let cors = build_cors_layer(&config.server)?;
    let bind_addr = config.server.bind.clone();

    let app_state = Arc::new(AppState::initialize(config).await?);
    let app = create_app_with_state(app_state).layer(cors);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    tracing::info!(addr = %bind_addr, "Server listening");

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
