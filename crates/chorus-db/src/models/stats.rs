//! Aggregate row counts

use sqlx::FromRow;

/// One-row result of the stats query
#[derive(Debug, Clone, Copy, FromRow)]
pub struct StatsModel {
    pub members: i64,
    pub active_members: i64,
    pub admins: i64,
    pub groups: i64,
    pub messages: i64,
    pub messages_in_flight: i64,
    pub delivery_logs: i64,
    pub failed_deliveries: i64,
}
