//! Media file entity - an attachment relocated to permanent storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of relocating one attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploaded,
    Failed,
}

impl UploadStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Failed => "failed",
        }
    }
}

impl From<&str> for UploadStatus {
    fn from(value: &str) -> Self {
        match value {
            "uploaded" => Self::Uploaded,
            _ => Self::Failed,
        }
    }
}

/// Media file entity, owned by a broadcast message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub id: Uuid,
    pub message_id: Uuid,
    /// Attachment index within the inbound message
    pub position: i32,
    pub original_url: String,
    pub relocated_url: Option<String>,
    pub mime_type: String,
    pub size: i64,
    pub hash: Option<String>,
    pub upload_status: UploadStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MediaFile {
    /// Record a successfully relocated attachment
    pub fn uploaded(
        message_id: Uuid,
        position: i32,
        original_url: impl Into<String>,
        relocated_url: impl Into<String>,
        mime_type: impl Into<String>,
        size: i64,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            message_id,
            position,
            original_url: original_url.into(),
            relocated_url: Some(relocated_url.into()),
            mime_type: mime_type.into(),
            size,
            hash: Some(hash.into()),
            upload_status: UploadStatus::Uploaded,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    /// Record an attachment that could not be relocated
    pub fn failed(
        message_id: Uuid,
        position: i32,
        original_url: impl Into<String>,
        mime_type: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            message_id,
            position,
            original_url: original_url.into(),
            relocated_url: None,
            mime_type: mime_type.into(),
            size: 0,
            hash: None,
            upload_status: UploadStatus::Failed,
            error_message: Some(error.into()),
            created_at: Utc::now(),
        }
    }

    #[inline]
    pub fn is_uploaded(&self) -> bool {
        self.upload_status == UploadStatus::Uploaded
    }
}
