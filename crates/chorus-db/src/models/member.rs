//! Member database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for members table
#[derive(Debug, Clone, FromRow)]
pub struct MemberModel {
    pub id: Uuid,
    pub phone_number: String,
    pub name: String,
    pub is_admin: bool,
    pub active: bool,
    pub message_count: i64,
    pub last_activity: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for member_groups junction table
#[derive(Debug, Clone, FromRow)]
pub struct MemberGroupModel {
    pub member_id: Uuid,
    pub group_id: Uuid,
}
