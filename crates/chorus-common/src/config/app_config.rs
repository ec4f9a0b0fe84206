//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub database: DatabaseConfig,
    pub sms: SmsConfig,
    pub storage: StorageConfig,
    pub relay: RelayConfig,
    pub rate_limit: RateLimitConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// SMS gateway (Twilio-compatible REST API) credentials
#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default)]
    pub from_number: String,
    #[serde(default = "default_sms_api_base")]
    pub api_base: String,
}

impl SmsConfig {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty() && !self.from_number.is_empty()
    }
}

/// Where relocated media is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files on local disk, served by the relay under `/media`
    #[default]
    Filesystem,
    /// `PUT` to an HTTP blob endpoint
    Http,
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Prefix of every public media URL (no trailing slash)
    pub public_base_url: String,
    pub http_endpoint: Option<String>,
    pub http_token: Option<String>,
    #[serde(default = "default_max_file_size")]
    pub max_file_size_mb: u32,
}

impl StorageConfig {
    #[must_use]
    pub fn max_file_size_bytes(&self) -> u64 {
        u64::from(self.max_file_size_mb) * 1024 * 1024
    }
}

/// Broadcast relay tuning
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_max_send_attempts")]
    pub max_send_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    #[serde(default = "default_empty_placeholder")]
    pub empty_placeholder: String,
    #[serde(default = "default_stale_after_minutes")]
    pub stale_after_minutes: i64,
    pub seed_file: Option<String>,
}

impl RelayConfig {
    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    #[must_use]
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    #[must_use]
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_send_attempts: default_max_send_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            send_timeout_secs: default_send_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            empty_placeholder: default_empty_placeholder(),
            stale_after_minutes: default_stale_after_minutes(),
            seed_file: None,
        }
    }
}

/// Rate limiting configuration for the webhook routes
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

// Default value functions
fn default_app_name() -> String {
    "chorus".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

fn default_sms_api_base() -> String {
    "https://api.twilio.com".to_string()
}

fn default_upload_dir() -> String {
    "./uploads".to_string()
}

fn default_max_file_size() -> u32 {
    10
}

fn default_max_send_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_send_timeout_secs() -> u64 {
    15
}

fn default_download_timeout_secs() -> u64 {
    60
}

fn default_empty_placeholder() -> String {
    "[empty message]".to_string()
}

fn default_stale_after_minutes() -> i64 {
    60
}

fn default_requests_per_second() -> u32 {
    20
}

fn default_burst() -> u32 {
    100
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let parsed = |key: &'static str| -> Result<Option<u64>, ConfigError> {
            var(key)
                .map(|s| {
                    s.trim()
                        .parse::<u64>()
                        .map_err(|_| ConfigError::InvalidValue(key, s.clone()))
                })
                .transpose()
        };

        let port: u16 = var("API_PORT")
            .ok_or(ConfigError::MissingVar("API_PORT"))?
            .parse()
            .map_err(|_| ConfigError::InvalidValue("API_PORT", var("API_PORT").unwrap_or_default()))?;

        let backend = match var("STORAGE_BACKEND").map(|s| s.to_lowercase()).as_deref() {
            None | Some("filesystem" | "fs") => StorageBackend::Filesystem,
            Some("http") => StorageBackend::Http,
            Some(other) => return Err(ConfigError::InvalidValue("STORAGE_BACKEND", other.to_string())),
        };
        let http_endpoint = var("STORAGE_HTTP_ENDPOINT");
        if backend == StorageBackend::Http && http_endpoint.is_none() {
            return Err(ConfigError::MissingVar("STORAGE_HTTP_ENDPOINT"));
        }

        Ok(Self {
            app: AppSettings {
                name: var("APP_NAME").unwrap_or_else(default_app_name),
                env: var("APP_ENV")
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            api: ServerConfig {
                host: var("API_HOST").unwrap_or_else(default_host),
                port,
            },
            database: DatabaseConfig {
                url: var("DATABASE_URL").ok_or(ConfigError::MissingVar("DATABASE_URL"))?,
                max_connections: parsed("DATABASE_MAX_CONNECTIONS")?
                    .map_or_else(default_max_connections, |v| v as u32),
                min_connections: parsed("DATABASE_MIN_CONNECTIONS")?
                    .map_or_else(default_min_connections, |v| v as u32),
            },
            sms: SmsConfig {
                account_sid: var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
                auth_token: var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
                from_number: var("TWILIO_FROM_NUMBER").unwrap_or_default(),
                api_base: var("TWILIO_API_BASE").unwrap_or_else(default_sms_api_base),
            },
            storage: StorageConfig {
                backend,
                upload_dir: var("UPLOAD_DIR").unwrap_or_else(default_upload_dir),
                public_base_url: var("MEDIA_PUBLIC_BASE_URL")
                    .map(|s| s.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| format!("http://localhost:{port}/media")),
                http_endpoint,
                http_token: var("STORAGE_HTTP_TOKEN"),
                max_file_size_mb: parsed("MAX_FILE_SIZE_MB")?
                    .map_or_else(default_max_file_size, |v| v as u32),
            },
            relay: RelayConfig {
                max_send_attempts: parsed("SEND_MAX_ATTEMPTS")?
                    .map_or_else(default_max_send_attempts, |v| (v as u32).max(1)),
                retry_backoff_ms: parsed("SEND_RETRY_BACKOFF_MS")?
                    .unwrap_or_else(default_retry_backoff_ms),
                send_timeout_secs: parsed("SEND_TIMEOUT_SECS")?
                    .unwrap_or_else(default_send_timeout_secs),
                download_timeout_secs: parsed("MEDIA_DOWNLOAD_TIMEOUT_SECS")?
                    .unwrap_or_else(default_download_timeout_secs),
                empty_placeholder: var("EMPTY_MESSAGE_PLACEHOLDER")
                    .unwrap_or_else(default_empty_placeholder),
                stale_after_minutes: parsed("STALE_BROADCAST_MINUTES")?
                    .map_or_else(default_stale_after_minutes, |v| v as i64),
                seed_file: var("ROSTER_SEED_FILE"),
            },
            rate_limit: RateLimitConfig {
                requests_per_second: parsed("RATE_LIMIT_REQUESTS_PER_SECOND")?
                    .map_or_else(default_requests_per_second, |v| v as u32),
                burst: parsed("RATE_LIMIT_BURST")?.map_or_else(default_burst, |v| v as u32),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
