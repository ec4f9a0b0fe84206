//! HTTP attachment fetcher

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use reqwest::{Client, Url};
use tracing::{debug, instrument};

use chorus_common::SmsConfig;
use chorus_core::error::ProviderError;
use chorus_core::traits::{FetchedMedia, MediaFetcher};

use crate::http::{client_with_timeout, map_reqwest_error};

/// Downloads carrier-hosted media over HTTP
///
/// Carrier media behind the SMS API host is fetched with the gateway's basic
/// auth credentials; any other host is fetched anonymously.
pub struct HttpMediaFetcher {
    client: Client,
    timeout: Duration,
    max_bytes: u64,
    credentials: Option<Credentials>,
}

struct Credentials {
    host: String,
    username: String,
    password: String,
}

impl HttpMediaFetcher {
    pub fn new(timeout: Duration, max_bytes: u64) -> Result<Self, ProviderError> {
        Ok(Self {
            client: client_with_timeout(timeout)?,
            timeout,
            max_bytes,
            credentials: None,
        })
    }

    /// Authenticate requests to the SMS API host
    pub fn with_carrier_auth(mut self, sms: &SmsConfig) -> Self {
        let host = Url::parse(&sms.api_base)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase));
        if let (Some(host), true) = (host, sms.is_configured()) {
            self.credentials = Some(Credentials {
                host,
                username: sms.account_sid.clone(),
                password: sms.auth_token.clone(),
            });
        }
        self
    }

    fn credentials_for(&self, url: &Url) -> Option<&Credentials> {
        let host = url.host_str()?.to_ascii_lowercase();
        self.credentials.as_ref().filter(|c| c.host == host)
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedMedia, ProviderError> {
        let parsed = Url::parse(url)
            .map_err(|e| ProviderError::transport(format!("invalid media url: {e}")))?;

        let mut request = self.client.get(parsed.clone());
        if let Some(creds) = self.credentials_for(&parsed) {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let mut response = request
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message: format!("media download failed for {url}"),
            });
        }

        if let Some(size) = response.content_length() {
            if size > self.max_bytes {
                return Err(ProviderError::TooLarge {
                    size,
                    max: self.max_bytes,
                });
            }
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

        // chunked bodies carry no length, so the cap is enforced while reading
        let mut buf = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| map_reqwest_error(&e, self.timeout))?
        {
            let size = (buf.len() + chunk.len()) as u64;
            if size > self.max_bytes {
                return Err(ProviderError::TooLarge {
                    size,
                    max: self.max_bytes,
                });
            }
            buf.extend_from_slice(&chunk);
        }

        debug!(size = buf.len(), content_type = ?content_type, "Media downloaded");
        Ok(FetchedMedia {
            bytes: buf.freeze(),
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::Router;

    async fn spawn_carrier() -> String {
        let app = Router::new()
            .route(
                "/small.jpg",
                get(|| async { ([(header::CONTENT_TYPE, "image/jpeg")], vec![7u8; 16]) }),
            )
            .route(
                "/big.png",
                get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![0u8; 4096]) }),
            )
            .route(
                "/streamed.mp4",
                get(|| async {
                    let chunks = (0..8).map(|_| Ok::<_, std::io::Error>(vec![0u8; 512]));
                    Body::from_stream(futures::stream::iter(chunks))
                }),
            )
            .route(
                "/private.gif",
                get(|headers: HeaderMap| async move {
                    if headers.contains_key(header::AUTHORIZATION) {
                        (StatusCode::OK, vec![1u8; 4])
                    } else {
                        (StatusCode::UNAUTHORIZED, Vec::new())
                    }
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_fetch_reads_body_and_content_type() {
        let base = spawn_carrier().await;
        let fetcher = HttpMediaFetcher::new(Duration::from_secs(5), 1024).unwrap();

        let media = fetcher.fetch(&format!("{base}/small.jpg")).await.unwrap();
        assert_eq!(media.bytes.len(), 16);
        assert_eq!(media.content_type.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn test_oversized_media_is_refused() {
        let base = spawn_carrier().await;
        let fetcher = HttpMediaFetcher::new(Duration::from_secs(5), 1024).unwrap();

        let err = fetcher.fetch(&format!("{base}/big.png")).await.unwrap_err();
        assert!(matches!(err, ProviderError::TooLarge { size: 4096, max: 1024 }));
    }

    #[tokio::test]
    async fn test_oversized_stream_without_length_is_refused() {
        let base = spawn_carrier().await;
        let fetcher = HttpMediaFetcher::new(Duration::from_secs(5), 1024).unwrap();

        let err = fetcher.fetch(&format!("{base}/streamed.mp4")).await.unwrap_err();
        match err {
            ProviderError::TooLarge { size, max } => {
                assert_eq!(max, 1024);
                assert!(size > 1024);
            }
            other => panic!("expected TooLarge, got {other:?}"),
        }

        let roomy = HttpMediaFetcher::new(Duration::from_secs(5), 8192).unwrap();
        let media = roomy.fetch(&format!("{base}/streamed.mp4")).await.unwrap();
        assert_eq!(media.bytes.len(), 4096);
    }

    #[tokio::test]
    async fn test_carrier_auth_only_for_api_host() {
        let base = spawn_carrier().await;
        let url = format!("{base}/private.gif");

        let anonymous = HttpMediaFetcher::new(Duration::from_secs(5), 1024).unwrap();
        let err = anonymous.fetch(&url).await.unwrap_err();
        assert!(matches!(err, ProviderError::Rejected { status: 401, .. }));

        let sms = SmsConfig {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            from_number: "+15550001111".to_string(),
            api_base: base.clone(),
        };
        let authed = HttpMediaFetcher::new(Duration::from_secs(5), 1024)
            .unwrap()
            .with_carrier_auth(&sms);
        assert_eq!(authed.fetch(&url).await.unwrap().bytes.len(), 4);
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let fetcher = HttpMediaFetcher::new(Duration::from_secs(1), 1024).unwrap();
        assert!(matches!(
            fetcher.fetch("not a url").await,
            Err(ProviderError::Transport(_))
        ));
    }
}
