//! PostgreSQL implementation of MessageRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use chorus_core::entities::{BroadcastMessage, DeliveryStatus, ProcessingStatus};
use chorus_core::traits::{MessageRepository, RepoResult};

use crate::models::BroadcastMessageModel;

use super::error::{map_db_error, message_not_found};

/// PostgreSQL implementation of MessageRepository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn set_status(&self, id: Uuid, column: &'static str, value: &str) -> RepoResult<()> {
        let result = sqlx::query(&format!(
            "UPDATE broadcast_messages SET {column} = $2, updated_at = NOW() WHERE id = $1"
        ))
        .bind(id)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(message_not_found(id));
        }

        Ok(())
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<BroadcastMessage>> {
        let result = sqlx::query_as::<_, BroadcastMessageModel>(
            r"
            SELECT id, from_phone, from_name, original_text, processed_text, has_media,
                   media_count, processing_status, delivery_status, sent_at
            FROM broadcast_messages
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(BroadcastMessage::from))
    }

    #[instrument(skip(self, message), fields(message_id = %message.id))]
    async fn create(&self, message: &BroadcastMessage) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO broadcast_messages (id, from_phone, from_name, original_text,
                                            processed_text, has_media, media_count,
                                            processing_status, delivery_status, sent_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(message.id)
        .bind(message.from_phone.as_str())
        .bind(&message.from_name)
        .bind(&message.original_text)
        .bind(&message.processed_text)
        .bind(message.has_media)
        .bind(message.media_count)
        .bind(message.processing_status.as_str())
        .bind(message.delivery_status.as_str())
        .bind(message.sent_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_delivery_status(&self, id: Uuid, status: DeliveryStatus) -> RepoResult<()> {
        self.set_status(id, "delivery_status", status.as_str()).await
    }

    #[instrument(skip(self))]
    async fn update_processing_status(
        &self,
        id: Uuid,
        status: ProcessingStatus,
    ) -> RepoResult<()> {
        self.set_status(id, "processing_status", status.as_str()).await
    }

    #[instrument(skip(self))]
    async fn recent(&self, limit: i64) -> RepoResult<Vec<BroadcastMessage>> {
        let rows = sqlx::query_as::<_, BroadcastMessageModel>(
            r"
            SELECT id, from_phone, from_name, original_text, processed_text, has_media,
                   media_count, processing_status, delivery_status, sent_at
            FROM broadcast_messages
            ORDER BY sent_at DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(BroadcastMessage::from).collect())
    }
}
