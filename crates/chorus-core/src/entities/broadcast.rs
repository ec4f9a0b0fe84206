//! Broadcast message entity - one inbound text fanned out to the roster

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::PhoneNumber;

/// Media processing state of a broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl From<&str> for ProcessingStatus {
    fn from(value: &str) -> Self {
        match value {
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// Fan-out state of a broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl DeliveryStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Completed and failed broadcasts are never touched again
    #[inline]
    #[must_use]
    pub fn is_final(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl From<&str> for DeliveryStatus {
    fn from(value: &str) -> Self {
        match value {
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// Broadcast message entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub id: Uuid,
    pub from_phone: PhoneNumber,
    pub from_name: String,
    pub original_text: String,
    pub processed_text: String,
    pub has_media: bool,
    pub media_count: i32,
    pub processing_status: ProcessingStatus,
    pub delivery_status: DeliveryStatus,
    pub sent_at: DateTime<Utc>,
}

impl BroadcastMessage {
    /// Create a broadcast about to be fanned out
    pub fn new(
        from_phone: PhoneNumber,
        from_name: impl Into<String>,
        original_text: impl Into<String>,
        processed_text: impl Into<String>,
        media_count: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_phone,
            from_name: from_name.into(),
            original_text: original_text.into(),
            processed_text: processed_text.into(),
            has_media: media_count > 0,
            media_count: i32::try_from(media_count).unwrap_or(i32::MAX),
            processing_status: if media_count > 0 {
                ProcessingStatus::Processing
            } else {
                ProcessingStatus::Completed
            },
            delivery_status: DeliveryStatus::Processing,
            sent_at: Utc::now(),
        }
    }
}
