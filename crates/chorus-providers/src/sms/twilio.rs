//! Twilio-compatible Messages API client
//!
//! Sends `POST {api_base}/2010-04-01/Accounts/{sid}/Messages.json` as a form
//! with HTTP basic auth (`account_sid:auth_token`). A success response carries
//! the provider message id in `sid`; an error response carries `message`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use chorus_common::SmsConfig;
use chorus_core::error::ProviderError;
use chorus_core::traits::{OutboundSms, SmsGateway};

use crate::http::{client_with_timeout, map_reqwest_error};

#[derive(Debug, Deserialize)]
struct MessageCreated {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ApiFailure {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// SMS gateway speaking the Twilio REST dialect
pub struct TwilioGateway {
    client: Client,
    config: SmsConfig,
    timeout: Duration,
}

impl TwilioGateway {
    /// Create a gateway; `timeout` bounds each HTTP request
    pub fn new(config: SmsConfig, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: client_with_timeout(timeout)?,
            config,
            timeout,
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        )
    }
}

#[async_trait]
impl SmsGateway for TwilioGateway {
    #[instrument(skip(self, sms), fields(to = %sms.to.tail(), media = sms.media_urls.len()))]
    async fn send(&self, sms: &OutboundSms) -> Result<String, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured("sms gateway"));
        }

        let mut form: Vec<(&str, &str)> = vec![
            ("To", sms.to.as_str()),
            ("From", self.config.from_number.as_str()),
            ("Body", sms.body.as_str()),
        ];
        form.extend(sms.media_urls.iter().map(|url| ("MediaUrl", url.as_str())));

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e, self.timeout))?;

        let status = response.status();
        if status.is_success() {
            let created: MessageCreated = response
                .json()
                .await
                .map_err(|e| ProviderError::transport(format!("malformed response: {e}")))?;
            debug!(sid = %created.sid, "Message accepted");
            return Ok(created.sid);
        }

        let failure = response.json::<ApiFailure>().await.ok();
        let message = match failure {
            Some(ApiFailure {
                code: Some(code),
                message: Some(message),
            }) => format!("{message} (code {code})"),
            Some(ApiFailure {
                message: Some(message),
                ..
            }) => message,
            _ => status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        };

        Err(ProviderError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }
}
