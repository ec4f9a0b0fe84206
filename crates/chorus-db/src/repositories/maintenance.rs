//! PostgreSQL implementation of MaintenanceRepository
//!
//! Operations here span several tables. Multi-statement deletes run inside a
//! single transaction so a failure leaves the roster untouched.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument};

use chorus_core::traits::{
    DirectoryStats, MaintenanceRepository, PurgeSummary, RepoResult, WipeSummary,
};
use chorus_core::value_objects::PhoneNumber;

use crate::models::StatsModel;

use super::error::map_db_error;

/// PostgreSQL implementation of MaintenanceRepository
#[derive(Clone)]
pub struct PgMaintenanceRepository {
    pool: PgPool,
}

impl PgMaintenanceRepository {
    /// Create a new PgMaintenanceRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Run one statement inside the transaction and report affected rows
async fn exec(tx: &mut Transaction<'_, Postgres>, sql: &str) -> RepoResult<u64> {
    let result = sqlx::query(sql)
        .execute(&mut **tx)
        .await
        .map_err(map_db_error)?;
    Ok(result.rows_affected())
}

async fn exec_with_phone(
    tx: &mut Transaction<'_, Postgres>,
    sql: &str,
    phone: &str,
) -> RepoResult<u64> {
    let result = sqlx::query(sql)
        .bind(phone)
        .execute(&mut **tx)
        .await
        .map_err(map_db_error)?;
    Ok(result.rows_affected())
}

#[async_trait]
impl MaintenanceRepository for PgMaintenanceRepository {
    #[instrument(skip(self, phone), fields(phone = %phone.tail()))]
    async fn purge_phone(&self, phone: &PhoneNumber) -> RepoResult<PurgeSummary> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        let phone = phone.as_str();

        let delivery_logs = exec_with_phone(
            &mut tx,
            r"
            DELETE FROM delivery_logs
            WHERE to_phone = $1
               OR message_id IN (SELECT id FROM broadcast_messages WHERE from_phone = $1)
            ",
            phone,
        )
        .await?;

        let media_files = exec_with_phone(
            &mut tx,
            r"
            DELETE FROM media_files
            WHERE message_id IN (SELECT id FROM broadcast_messages WHERE from_phone = $1)
            ",
            phone,
        )
        .await?;

        let messages = exec_with_phone(
            &mut tx,
            "DELETE FROM broadcast_messages WHERE from_phone = $1",
            phone,
        )
        .await?;

        let members =
            exec_with_phone(&mut tx, "DELETE FROM members WHERE phone_number = $1", phone).await?;

        tx.commit().await.map_err(map_db_error)?;

        let summary = PurgeSummary {
            members,
            messages,
            media_files,
            delivery_logs,
        };
        info!(?summary, "Phone purged");
        Ok(summary)
    }

    #[instrument(skip(self))]
    async fn wipe_all(&self) -> RepoResult<WipeSummary> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let delivery_logs = exec(&mut tx, "DELETE FROM delivery_logs").await?;
        let media_files = exec(&mut tx, "DELETE FROM media_files").await?;
        let messages = exec(&mut tx, "DELETE FROM broadcast_messages").await?;
        exec(&mut tx, "DELETE FROM member_groups").await?;
        let members = exec(&mut tx, "DELETE FROM members").await?;
        let groups = exec(&mut tx, "DELETE FROM groups").await?;

        tx.commit().await.map_err(map_db_error)?;

        let summary = WipeSummary {
            members,
            groups,
            messages,
            media_files,
            delivery_logs,
        };
        info!(total = summary.total(), "Database wiped");
        Ok(summary)
    }

    #[instrument(skip(self))]
    async fn delete_orphans(&self) -> RepoResult<(u64, u64)> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let media = exec(
            &mut tx,
            r"
            DELETE FROM media_files m
            WHERE NOT EXISTS (SELECT 1 FROM broadcast_messages b WHERE b.id = m.message_id)
            ",
        )
        .await?;

        let logs = exec(
            &mut tx,
            r"
            DELETE FROM delivery_logs l
            WHERE NOT EXISTS (SELECT 1 FROM broadcast_messages b WHERE b.id = l.message_id)
            ",
        )
        .await?;

        tx.commit().await.map_err(map_db_error)?;
        Ok((media, logs))
    }

    #[instrument(skip(self))]
    async fn fail_stale_broadcasts(&self, cutoff: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE broadcast_messages
            SET delivery_status = 'failed',
                processing_status = CASE
                    WHEN processing_status = 'processing' THEN 'failed'
                    ELSE processing_status
                END,
                updated_at = NOW()
            WHERE (delivery_status = 'processing' OR processing_status = 'processing')
              AND sent_at < $1
            ",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn stats(&self) -> RepoResult<DirectoryStats> {
        let row = sqlx::query_as::<_, StatsModel>(
            r"
            SELECT
                (SELECT COUNT(*) FROM members) AS members,
                (SELECT COUNT(*) FROM members WHERE active) AS active_members,
                (SELECT COUNT(*) FROM members WHERE is_admin) AS admins,
                (SELECT COUNT(*) FROM groups) AS groups,
                (SELECT COUNT(*) FROM broadcast_messages) AS messages,
                (SELECT COUNT(*) FROM broadcast_messages
                    WHERE delivery_status = 'processing') AS messages_in_flight,
                (SELECT COUNT(*) FROM delivery_logs) AS delivery_logs,
                (SELECT COUNT(*) FROM delivery_logs WHERE status = 'failed') AS failed_deliveries
            ",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(DirectoryStats {
            members: row.members,
            active_members: row.active_members,
            admins: row.admins,
            groups: row.groups,
            messages: row.messages,
            messages_in_flight: row.messages_in_flight,
            delivery_logs: row.delivery_logs,
            failed_deliveries: row.failed_deliveries,
        })
    }

    async fn ping(&self) -> RepoResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }
}
