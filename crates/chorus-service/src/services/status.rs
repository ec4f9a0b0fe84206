//! Health, statistics, and carrier status callbacks

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::dto::{
    ComponentStatus, ReadinessChecks, ReadinessResponse, RecentBroadcast, StatsResponse,
    StatusCallback,
};

use super::context::ServiceContext;
use super::error::ServiceResult;

const RECENT_BROADCASTS: i64 = 10;

/// Status service
pub struct StatusService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> StatusService<'a> {
    /// Create a new StatusService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Check the database, SMS gateway configuration, and object store
    pub async fn readiness(&self) -> ReadinessResponse {
        let database = match self.ctx.maintenance_repo().ping().await {
            Ok(()) => ComponentStatus::healthy(),
            Err(e) => ComponentStatus::unhealthy(e.to_string()),
        };

        let sms_gateway = if self.ctx.sms_gateway().is_configured() {
            ComponentStatus::healthy()
        } else {
            ComponentStatus::unhealthy("SMS credentials are not configured")
        };

        let storage = match self.ctx.object_store().health_check().await {
            Ok(()) => ComponentStatus::healthy(),
            Err(e) => ComponentStatus::unhealthy(e.to_string()),
        };

        ReadinessResponse::from_checks(ReadinessChecks {
            database,
            sms_gateway,
            storage,
        })
    }

    /// Row counts plus the most recent broadcasts
    pub async fn stats(&self) -> ServiceResult<StatsResponse> {
        let counts = self.ctx.maintenance_repo().stats().await?;
        let recent = self.ctx.message_repo().recent(RECENT_BROADCASTS).await?;

        Ok(StatsResponse {
            counts,
            recent_broadcasts: recent.into_iter().map(RecentBroadcast::from).collect(),
            timestamp: Utc::now(),
        })
    }

    /// Log a delivery status callback against the delivery it belongs to
    #[instrument(skip_all, fields(sid = %callback.message_sid, status = %callback.message_status))]
    pub async fn record_status_callback(&self, callback: &StatusCallback) -> ServiceResult<()> {
        let log = self
            .ctx
            .delivery_log_repo()
            .find_by_provider_id(&callback.message_sid)
            .await?;

        match log {
            Some(log) if callback.is_failure() => warn!(
                message_id = %log.message_id,
                member_id = %log.member_id,
                error_code = callback.error_code.as_deref().unwrap_or("-"),
                "Carrier reported delivery failure"
            ),
            Some(log) => info!(message_id = %log.message_id, member_id = %log.member_id, "Delivery status"),
            None => debug!("Status callback for unknown message"),
        }
        Ok(())
    }
}
