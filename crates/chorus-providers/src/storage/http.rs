//! HTTP `PUT` blob store

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, LOCATION};
use reqwest::Client;
use tracing::{debug, instrument};

use chorus_core::error::ProviderError;
use chorus_core::traits::ObjectStore;

use super::validate_key;
use crate::http::{client_with_timeout, map_reqwest_error};

/// Uploads objects with `PUT {endpoint}/{key}`
///
/// The public URL is the response `Location` header when present, otherwise
/// `{public_base_url}/{key}`.
pub struct HttpObjectStore {
    client: Client,
    endpoint: String,
    bearer: Option<String>,
    public_base_url: String,
    timeout: Duration,
}

impl HttpObjectStore {
    pub fn new(
        endpoint: &str,
        bearer: Option<String>,
        public_base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: client_with_timeout(timeout)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bearer: bearer.filter(|t| !t.is_empty()),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn auth_headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.bearer {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ProviderError::storage(format!("invalid auth header: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, ProviderError> {
        validate_key(key)?;

        let response = self
            .client
            .put(format!("{}/{key}", self.endpoint))
            .headers(self.auth_headers()?)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message: format!("upload of {key} refused"),
            });
        }

        let url = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map_or_else(|| format!("{}/{key}", self.public_base_url), str::to_string);

        debug!(%url, "Object uploaded");
        Ok(url)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let response = self
            .client
            .head(&self.endpoint)
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e, self.timeout))?;

        if response.status().is_server_error() {
            return Err(ProviderError::Rejected {
                status: response.status().as_u16(),
                message: "storage endpoint unhealthy".to_string(),
            });
        }
        Ok(())
    }
}
