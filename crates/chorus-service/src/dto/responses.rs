//! Response DTOs for the health and debug endpoints

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use chorus_core::entities::BroadcastMessage;
use chorus_core::traits::DirectoryStats;

/// Basic health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// State of one dependency
#[derive(Debug, Clone, Serialize)]
pub struct ComponentStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComponentStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            detail: None,
        }
    }

    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            status: "unhealthy".to_string(),
            detail: Some(detail.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Health check status for each dependency
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessChecks {
    pub database: ComponentStatus,
    pub sms_gateway: ComponentStatus,
    pub storage: ComponentStatus,
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: ReadinessChecks,
}

impl ReadinessResponse {
    pub fn from_checks(checks: ReadinessChecks) -> Self {
        let all_healthy = checks.database.is_healthy()
            && checks.sms_gateway.is_healthy()
            && checks.storage.is_healthy();
        Self {
            status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
            timestamp: Utc::now(),
            checks,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}

/// Summary of one recent broadcast
#[derive(Debug, Clone, Serialize)]
pub struct RecentBroadcast {
    pub id: Uuid,
    pub from_name: String,
    pub media_count: i32,
    pub processing_status: String,
    pub delivery_status: String,
    pub sent_at: DateTime<Utc>,
}

impl From<BroadcastMessage> for RecentBroadcast {
    fn from(message: BroadcastMessage) -> Self {
        Self {
            id: message.id,
            from_name: message.from_name,
            media_count: message.media_count,
            processing_status: message.processing_status.as_str().to_string(),
            delivery_status: message.delivery_status.as_str().to_string(),
            sent_at: message.sent_at,
        }
    }
}

/// Debug statistics response
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub counts: DirectoryStats,
    pub recent_broadcasts: Vec<RecentBroadcast>,
    pub timestamp: DateTime<Utc>,
}
