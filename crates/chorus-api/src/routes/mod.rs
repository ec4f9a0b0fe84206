//! Route definitions
//!
//! The debug routes sit behind the rate limiter. Carrier webhooks never do:
//! the carrier must always get a 200.

use axum::{
    routing::{get, post},
    Router,
};
use chorus_common::{AppConfig, StorageBackend};
use tower_http::services::ServeDir;

use crate::handlers::{debug, health, sms};
use crate::middleware::rate_limit;
use crate::state::AppState;

/// Create the main router with all routes
pub fn create_router(config: &AppConfig) -> Router<AppState> {
    let router = Router::new()
        .merge(webhook_routes())
        .merge(health_routes())
        .merge(debug_routes(config));

    match config.storage.backend {
        StorageBackend::Filesystem => router.merge(media_routes(config)),
        StorageBackend::Http => router,
    }
}

/// Carrier webhook routes
fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/sms/incoming", post(sms::incoming))
        .route("/sms/status", post(sms::status_callback))
}

/// Health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// Debug routes
fn debug_routes(config: &AppConfig) -> Router<AppState> {
    let router = Router::new().route("/debug/stats", get(debug::stats));

    rate_limit(router, &config.rate_limit)
}

/// Relocated media written by the filesystem store
///
/// The store writes `{upload_dir}/{key}` and publishes
/// `{public_base_url}/{key}`, so `/media` maps onto the upload directory.
fn media_routes(config: &AppConfig) -> Router<AppState> {
    Router::new().nest_service("/media", ServeDir::new(&config.storage.upload_dir))
}
