//! PostgreSQL implementation of MediaRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use chorus_core::entities::MediaFile;
use chorus_core::traits::{MediaRepository, RepoResult};

use crate::models::MediaFileModel;

use super::error::map_db_error;

/// PostgreSQL implementation of MediaRepository
#[derive(Clone)]
pub struct PgMediaRepository {
    pool: PgPool,
}

impl PgMediaRepository {
    /// Create a new PgMediaRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaRepository for PgMediaRepository {
    #[instrument(skip(self, media), fields(message_id = %media.message_id, position = media.position))]
    async fn create(&self, media: &MediaFile) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO media_files (id, message_id, position, original_url, relocated_url,
                                     mime_type, size, hash, upload_status, error_message,
                                     created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(media.id)
        .bind(media.message_id)
        .bind(media.position)
        .bind(&media.original_url)
        .bind(&media.relocated_url)
        .bind(&media.mime_type)
        .bind(media.size)
        .bind(&media.hash)
        .bind(media.upload_status.as_str())
        .bind(&media.error_message)
        .bind(media.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_message(&self, message_id: Uuid) -> RepoResult<Vec<MediaFile>> {
        let rows = sqlx::query_as::<_, MediaFileModel>(
            r"
            SELECT id, message_id, position, original_url, relocated_url, mime_type, size,
                   hash, upload_status, error_message, created_at
            FROM media_files
            WHERE message_id = $1
            ORDER BY position ASC
            ",
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(MediaFile::from).collect())
    }
}
