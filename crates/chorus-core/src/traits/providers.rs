//! Provider traits (ports) - the external services the relay depends on

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ProviderError;
use crate::value_objects::PhoneNumber;

/// One outbound text (optionally with media) to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundSms {
    pub to: PhoneNumber,
    pub body: String,
    pub media_urls: Vec<String>,
}

impl OutboundSms {
    pub fn text(to: PhoneNumber, body: impl Into<String>) -> Self {
        Self {
            to,
            body: body.into(),
            media_urls: Vec::new(),
        }
    }

    pub fn with_media(mut self, media_urls: Vec<String>) -> Self {
        self.media_urls = media_urls;
        self
    }
}

/// SMS/MMS gateway
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Send one message, returning the provider's message id
    async fn send(&self, message: &OutboundSms) -> Result<String, ProviderError>;

    /// True when credentials are present
    fn is_configured(&self) -> bool;
}

/// Downloaded attachment
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// Downloads sender attachments from the carrier
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedMedia, ProviderError>;
}

/// Object storage with public URLs
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, returning the permanent public URL
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str)
        -> Result<String, ProviderError>;

    /// Connectivity check
    async fn health_check(&self) -> Result<(), ProviderError>;
}
