//! Broadcast message database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for broadcast_messages table
#[derive(Debug, Clone, FromRow)]
pub struct BroadcastMessageModel {
    pub id: Uuid,
    pub from_phone: String,
    pub from_name: String,
    pub original_text: String,
    pub processed_text: String,
    pub has_media: bool,
    pub media_count: i32,
    pub processing_status: String,
    pub delivery_status: String,
    pub sent_at: DateTime<Utc>,
}
