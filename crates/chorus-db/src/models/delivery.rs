//! Delivery log database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for delivery_logs table
#[derive(Debug, Clone, FromRow)]
pub struct DeliveryLogModel {
    pub id: Uuid,
    pub message_id: Uuid,
    pub member_id: Uuid,
    pub to_phone: String,
    pub status: String,
    pub provider_message_id: Option<String>,
    pub error_message: Option<String>,
    pub delivery_time_ms: i64,
    pub created_at: DateTime<Utc>,
}
