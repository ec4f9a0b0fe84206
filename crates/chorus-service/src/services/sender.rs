//! Outbound sender
//!
//! Wraps the SMS gateway with a bounded per-attempt timeout and linear
//! backoff (`attempt * retry_backoff`) between attempts.

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use chorus_core::error::ProviderError;
use chorus_core::traits::OutboundSms;

use super::context::ServiceContext;

/// Result of sending one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SendOutcome {
    Sent {
        provider_id: String,
        attempts: u32,
        elapsed_ms: i64,
    },
    Failed {
        error: String,
        attempts: u32,
        elapsed_ms: i64,
    },
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Sent { attempts, .. } | Self::Failed { attempts, .. } => *attempts,
        }
    }

    pub fn elapsed_ms(&self) -> i64 {
        match self {
            Self::Sent { elapsed_ms, .. } | Self::Failed { elapsed_ms, .. } => *elapsed_ms,
        }
    }
}

/// Outbound sender service
pub struct OutboundSender<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> OutboundSender<'a> {
    /// Create a new OutboundSender
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Send with the configured attempt limit
    pub async fn send(&self, sms: &OutboundSms) -> SendOutcome {
        self.send_with_attempts(sms, self.ctx.relay().max_send_attempts)
            .await
    }

    /// Send, retrying up to `max_attempts` times. Never errors: the last
    /// failure is reported in the outcome.
    #[instrument(skip(self, sms), fields(to = %sms.to.tail()))]
    pub async fn send_with_attempts(&self, sms: &OutboundSms, max_attempts: u32) -> SendOutcome {
        let relay = self.ctx.relay();
        let max_attempts = max_attempts.max(1);
        let started = Instant::now();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            let result =
                match tokio::time::timeout(relay.send_timeout(), self.ctx.sms_gateway().send(sms))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout(relay.send_timeout_secs)),
                };

            match result {
                Ok(provider_id) => {
                    debug!(attempt, provider_id = %provider_id, "Message sent");
                    return SendOutcome::Sent {
                        provider_id,
                        attempts: attempt,
                        elapsed_ms: elapsed_ms(started),
                    };
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < max_attempts {
                        warn!(attempt, error = %e, "Send attempt failed, retrying");
                        tokio::time::sleep(relay.retry_backoff() * attempt).await;
                    }
                }
            }
        }

        warn!(attempts = max_attempts, error = %last_error, "Send failed");
        SendOutcome::Failed {
            error: last_error,
            attempts: max_attempts,
            elapsed_ms: elapsed_ms(started),
        }
    }
}

fn elapsed_ms(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
}
