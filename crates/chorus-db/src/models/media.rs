//! Media file database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for media_files table
#[derive(Debug, Clone, FromRow)]
pub struct MediaFileModel {
    pub id: Uuid,
    pub message_id: Uuid,
    pub position: i32,
    pub original_url: String,
    pub relocated_url: Option<String>,
    pub mime_type: String,
    pub size: i64,
    pub hash: Option<String>,
    pub upload_status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}
