//! PostgreSQL implementation of DeliveryLogRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use chorus_core::entities::DeliveryLog;
use chorus_core::traits::{DeliveryLogRepository, RepoResult};

use crate::models::DeliveryLogModel;

use super::error::map_db_error;

/// PostgreSQL implementation of DeliveryLogRepository
#[derive(Clone)]
pub struct PgDeliveryLogRepository {
    pool: PgPool,
}

impl PgDeliveryLogRepository {
    /// Create a new PgDeliveryLogRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryLogRepository for PgDeliveryLogRepository {
    #[instrument(skip(self, log), fields(message_id = %log.message_id, status = log.status.as_str()))]
    async fn create(&self, log: &DeliveryLog) -> RepoResult<()> {
        // A retried broadcast overwrites the earlier attempt for the same recipient.
        sqlx::query(
            r"
            INSERT INTO delivery_logs (id, message_id, member_id, to_phone, status,
                                       provider_message_id, error_message, delivery_time_ms,
                                       created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (message_id, member_id) DO UPDATE
            SET status = EXCLUDED.status,
                provider_message_id = EXCLUDED.provider_message_id,
                error_message = EXCLUDED.error_message,
                delivery_time_ms = EXCLUDED.delivery_time_ms,
                created_at = EXCLUDED.created_at
            ",
        )
        .bind(log.id)
        .bind(log.message_id)
        .bind(log.member_id)
        .bind(log.to_phone.as_str())
        .bind(log.status.as_str())
        .bind(&log.provider_message_id)
        .bind(&log.error_message)
        .bind(log.delivery_time_ms)
        .bind(log.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_message(&self, message_id: Uuid) -> RepoResult<Vec<DeliveryLog>> {
        let rows = sqlx::query_as::<_, DeliveryLogModel>(
            r"
            SELECT id, message_id, member_id, to_phone, status, provider_message_id,
                   error_message, delivery_time_ms, created_at
            FROM delivery_logs
            WHERE message_id = $1
            ORDER BY created_at ASC
            ",
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(DeliveryLog::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_provider_id(
        &self,
        provider_message_id: &str,
    ) -> RepoResult<Option<DeliveryLog>> {
        let result = sqlx::query_as::<_, DeliveryLogModel>(
            r"
            SELECT id, message_id, member_id, to_phone, status, provider_message_id,
                   error_message, delivery_time_ms, created_at
            FROM delivery_logs
            WHERE provider_message_id = $1
            ",
        )
        .bind(provider_message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(DeliveryLog::from))
    }
}
