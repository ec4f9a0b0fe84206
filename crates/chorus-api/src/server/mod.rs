//! Server setup and initialization
//!
//! Provides the main application builder and server runner.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use chorus_common::{AppConfig, AppError, AppResult};
use chorus_db::{
    create_pool, run_migrations, PgDeliveryLogRepository, PgGroupRepository,
    PgMaintenanceRepository, PgMediaRepository, PgMemberRepository, PgMessageRepository,
};
use chorus_providers::{build_object_store, HttpMediaFetcher, TwilioGateway};
use chorus_service::{RosterSeeder, ServiceContextBuilder};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::middleware::apply_middleware;
use crate::routes::create_router;
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let router = create_router(state.config());
    let router = apply_middleware(router);
    router.with_state(state)
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> AppResult<AppState> {
    // Create database pool
    info!("Connecting to PostgreSQL...");
    let db_config = chorus_db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        ..Default::default()
    };
    let pool = create_pool(&db_config)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    run_migrations(&pool)
        .await
        .map_err(|e| AppError::Migration(e.to_string()))?;
    info!("Migrations applied");

    // Create repositories
    let member_repo = Arc::new(PgMemberRepository::new(pool.clone()));
    let group_repo = Arc::new(PgGroupRepository::new(pool.clone()));
    let message_repo = Arc::new(PgMessageRepository::new(pool.clone()));
    let media_repo = Arc::new(PgMediaRepository::new(pool.clone()));
    let delivery_log_repo = Arc::new(PgDeliveryLogRepository::new(pool.clone()));
    let maintenance_repo = Arc::new(PgMaintenanceRepository::new(pool));

    // Create providers
    let sms_gateway = Arc::new(
        TwilioGateway::new(config.sms.clone(), config.relay.send_timeout())
            .map_err(|e| AppError::Provider(e.to_string()))?,
    );
    if !config.sms.is_configured() {
        warn!("SMS credentials missing; outbound messages will fail until configured");
    }

    let media_fetcher = Arc::new(
        HttpMediaFetcher::new(
            config.relay.download_timeout(),
            config.storage.max_file_size_bytes(),
        )
        .map_err(|e| AppError::Provider(e.to_string()))?
        .with_carrier_auth(&config.sms),
    );

    let object_store =
        build_object_store(&config.storage).map_err(|e| AppError::Config(e.to_string()))?;
    info!(backend = ?config.storage.backend, "Object store ready");

    // Build service context
    let service_context = ServiceContextBuilder::new()
        .member_repo(member_repo)
        .group_repo(group_repo)
        .message_repo(message_repo)
        .media_repo(media_repo)
        .delivery_log_repo(delivery_log_repo)
        .maintenance_repo(maintenance_repo)
        .sms_gateway(sms_gateway)
        .media_fetcher(media_fetcher)
        .object_store(object_store)
        .relay(config.relay.clone())
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    // Import the roster, if one is configured
    if let Some(path) = &config.relay.seed_file {
        let report = RosterSeeder::new(&service_context).seed_file(path).await?;
        info!(
            members_created = report.members_created,
            groups_created = report.groups_created,
            "Roster file applied"
        );
    }

    Ok(AppState::new(service_context, config))
}

/// Run the HTTP server until Ctrl-C or SIGTERM
pub async fn run_server(app: Router, addr: SocketAddr) -> AppResult<()> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Server(format!("failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> AppResult<()> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid listen address: {e}")))?;

    // Create app state
    let state = create_app_state(config).await?;

    // Build application
    let app = create_app(state);

    // Run server
    run_server(app, addr).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
