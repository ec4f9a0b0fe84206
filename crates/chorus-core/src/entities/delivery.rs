//! Delivery log entity - one row per (broadcast, recipient) pair

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::PhoneNumber;

/// Final outcome of sending a broadcast to one recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Sent,
    Failed,
}

impl DeliveryOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl From<&str> for DeliveryOutcome {
    fn from(value: &str) -> Self {
        match value {
            "sent" => Self::Sent,
            _ => Self::Failed,
        }
    }
}

/// Delivery log entity (append-only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryLog {
    pub id: Uuid,
    pub message_id: Uuid,
    pub member_id: Uuid,
    pub to_phone: PhoneNumber,
    pub status: DeliveryOutcome,
    pub provider_message_id: Option<String>,
    pub error_message: Option<String>,
    pub delivery_time_ms: i64,
    pub created_at: DateTime<Utc>,
}

impl DeliveryLog {
    pub fn sent(
        message_id: Uuid,
        member_id: Uuid,
        to_phone: PhoneNumber,
        provider_message_id: impl Into<String>,
        delivery_time_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            message_id,
            member_id,
            to_phone,
            status: DeliveryOutcome::Sent,
            provider_message_id: Some(provider_message_id.into()),
            error_message: None,
            delivery_time_ms,
            created_at: Utc::now(),
        }
    }

    pub fn failed(
        message_id: Uuid,
        member_id: Uuid,
        to_phone: PhoneNumber,
        error: impl Into<String>,
        delivery_time_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            message_id,
            member_id,
            to_phone,
            status: DeliveryOutcome::Failed,
            provider_message_id: None,
            error_message: Some(error.into()),
            delivery_time_ms,
            created_at: Utc::now(),
        }
    }

    #[inline]
    pub fn is_sent(&self) -> bool {
        self.status == DeliveryOutcome::Sent
    }
}
