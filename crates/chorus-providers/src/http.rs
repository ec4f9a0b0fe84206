//! Shared reqwest helpers

use std::time::Duration;

use chorus_core::error::ProviderError;
use reqwest::Client;

/// Build a client with a whole-request timeout
pub(crate) fn client_with_timeout(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ProviderError::transport)
}

/// Classify a reqwest failure
pub(crate) fn map_reqwest_error(e: &reqwest::Error, timeout: Duration) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(timeout.as_secs())
    } else {
        ProviderError::transport(e)
    }
}
