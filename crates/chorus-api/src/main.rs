//! Chorus relay server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p chorus-api
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use chorus_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Run the server
    if let Err(e) = run().await {
        error!(error = %e, "Server failed to start");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env()?;

    // Initialize tracing
    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        port = config.api.port,
        storage = ?config.storage.backend,
        sms_configured = config.sms.is_configured(),
        "Configuration loaded"
    );

    // Run the server
    chorus_api::run(config).await?;

    Ok(())
}
