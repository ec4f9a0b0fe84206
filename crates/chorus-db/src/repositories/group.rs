//! PostgreSQL implementation of GroupRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use chorus_core::entities::Group;
use chorus_core::error::DomainError;
use chorus_core::traits::{GroupRepository, RepoResult};

use crate::models::GroupModel;

use super::error::{map_db_error, map_unique_violation};

/// PostgreSQL implementation of GroupRepository
#[derive(Clone)]
pub struct PgGroupRepository {
    pool: PgPool,
}

impl PgGroupRepository {
    /// Create a new PgGroupRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    #[instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Group>> {
        let result = sqlx::query_as::<_, GroupModel>(
            r"
            SELECT id, name, description, created_at
            FROM groups
            WHERE LOWER(name) = LOWER($1)
            ",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Group::from))
    }

    #[instrument(skip(self))]
    async fn list(&self) -> RepoResult<Vec<Group>> {
        let rows = sqlx::query_as::<_, GroupModel>(
            r"
            SELECT id, name, description, created_at
            FROM groups
            ORDER BY name ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(Group::from).collect())
    }

    #[instrument(skip(self, group), fields(group = %group.name))]
    async fn create(&self, group: &Group) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO groups (id, name, description, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(group.id)
        .bind(&group.name)
        .bind(&group.description)
        .bind(group.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || {
                DomainError::validation(format!("Group {} already exists", group.name))
            })
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_member(&self, group_id: Uuid, member_id: Uuid) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO member_groups (member_id, group_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(member_id)
        .bind(group_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}
