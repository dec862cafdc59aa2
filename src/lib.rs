//! Poll and whitelist service.
//!
//! Clients create yes/no polls, vote (one ballot per user, changeable),
//! comment, and request whitelist membership. An operator holding the shared
//! secret approves or rejects requests, curates the whitelist and deletes
//! polls.
//!
//! All state lives in one [`StateStore`](state::StateStore) snapshot that is
//! written through to a file, SQLite or Postgres backend after every change.

use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use once_cell::sync::Lazy;
use serde_json::json;
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod controllers;
pub mod db;
pub mod engine;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

use config::Config;
use db::{init_backend, FileBackend};
use middleware::operator::OPERATOR_HEADER;
use state::{AppState, HydrateOptions, StateStore};
use utils::error::{AppError, AppResult};

static START_TIME: Lazy<std::time::Instant> = Lazy::new(std::time::Instant::now);

pub fn app(state: AppState) -> AppResult<Router> {
    let cors = cors_layer(&state.config)?;
    let static_dir = state.config.static_dir.clone();

    let mut router = Router::new()
        .route("/health", get(health))
        .merge(routes::poll_routes::poll_routes(&state))
        .merge(routes::whitelist_routes::whitelist_routes(&state));

    if let Some(dir) = static_dir {
        info!("Serving static files from {}", dir.display());
        router = router.fallback_service(ServeDir::new(dir));
    }

    Ok(router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

fn cors_layer(config: &Config) -> AppResult<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(OPERATOR_HEADER)])
        .max_age(Duration::from_secs(60 * 60));

    match &config.cors_origin {
        Some(origin) => {
            let origin = origin.parse::<HeaderValue>().map_err(|_| {
                AppError::InternalError(format!("Failed to parse CORS origin: {origin}"))
            })?;
            Ok(cors.allow_origin(origin))
        }
        None => Ok(cors.allow_origin(Any)),
    }
}

pub async fn build_state(config: Config) -> AppResult<AppState> {
    let backend = init_backend(&config).await?;

    let options = HydrateOptions {
        legacy: backend
            .is_relational()
            .then(|| FileBackend::new(&config.legacy_data_file)),
        seed_whitelist: config.seed_whitelist.clone(),
        durability: config.durability,
    };
    let store = StateStore::hydrate(backend, options).await;

    Ok(AppState::new(store, config))
}

pub async fn start_server() -> AppResult<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    Lazy::force(&START_TIME);

    let config = Config::load()?;
    let address = config.server_addr.clone();

    info!("Initializing state...");
    let state = build_state(config).await?;
    let app = app(state)?;

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to bind to {address}: {e}")))?;
    info!("Server running on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::InternalError(format!("Server error: {e}")))?;

    info!("Server shut down");
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    let seconds = START_TIME.elapsed().as_secs();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    let uptime = if days > 0 {
        format!("{}d {}h {}m {}s", days, hours % 24, minutes % 60, seconds % 60)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes % 60, seconds % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    };

    Json(json!({
        "status": "ok",
        "uptime": uptime
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
