//! Test helpers for integration tests
//!
//! Provides utilities for spawning test servers, posting carrier webhooks,
//! and waiting for the background work a webhook triggers.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use chorus_api::{create_app, create_app_state, AppState};
use chorus_common::AppConfig;
use chorus_service::testing::TestHarness;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Account id the test config expects on inbound webhooks
pub const TEST_ACCOUNT_SID: &str = "ACtest0000000000000000000000000000";

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server over the harness's in-memory stores and fake providers
    pub async fn start(harness: &TestHarness) -> Result<Self> {
        let state = AppState::new(harness.ctx.clone(), test_config()?);
        Self::serve(state).await
    }

    /// Start a server wired to PostgreSQL from the environment
    pub async fn start_with_database() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("Config error: {e}"))?;
        let state = create_app_state(config).await?;
        Self::serve(state).await
    }

    async fn serve(state: AppState) -> Result<Self> {
        let app = create_app(state);

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// POST a form-encoded webhook body
    pub async fn post_form(&self, path: &str, form: &[(String, String)]) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).form(form).send().await?)
    }
}

/// Configuration for servers running over in-memory stores
pub fn test_config() -> Result<AppConfig> {
    AppConfig::from_lookup(|key| match key {
        "API_PORT" => Some("0".to_string()),
        "DATABASE_URL" => Some("postgres://unused/chorus".to_string()),
        "TWILIO_ACCOUNT_SID" => Some(TEST_ACCOUNT_SID.to_string()),
        "RATE_LIMIT_BURST" => Some("1000".to_string()),
        _ => None,
    })
    .map_err(|e| anyhow::anyhow!("Config error: {e}"))
}

/// Helper to check if a database is available
pub fn check_test_env() -> bool {
    dotenvy::dotenv().ok();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("Skipping test: DATABASE_URL not set");
        return false;
    }
    true
}

/// Poll until `condition` holds; webhook work runs after the response
pub async fn wait_until<F: Fn() -> bool>(condition: F) -> Result<()> {
    for _ in 0..400 {
        if condition() {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    anyhow::bail!("condition not reached within 2s")
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected_status: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(())
}
