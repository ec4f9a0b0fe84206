//! PostgreSQL implementation of MemberRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use chorus_core::entities::Member;
use chorus_core::error::DomainError;
use chorus_core::traits::{MemberRepository, RepoResult};
use chorus_core::value_objects::PhoneNumber;

use crate::mappers::member_with_groups;
use crate::models::{MemberGroupModel, MemberModel};

use super::error::{is_unique_violation, map_db_error, member_not_found};

const MEMBER_COLUMNS: &str = "id, phone_number, name, is_admin, active, message_count, \
                              last_activity, created_at, updated_at";

/// PostgreSQL implementation of MemberRepository
#[derive(Clone)]
pub struct PgMemberRepository {
    pool: PgPool,
}

impl PgMemberRepository {
    /// Create a new PgMemberRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load group tags for a batch of member rows
    async fn with_groups(&self, rows: Vec<MemberModel>) -> RepoResult<Vec<Member>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|m| m.id).collect();
        let memberships = sqlx::query_as::<_, MemberGroupModel>(
            r"
            SELECT member_id, group_id
            FROM member_groups
            WHERE member_id = ANY($1)
            ",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(member_with_groups(rows, memberships))
    }

    async fn one_with_groups(&self, row: Option<MemberModel>) -> RepoResult<Option<Member>> {
        match row {
            Some(row) => Ok(self.with_groups(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Build the duplicate error, naming whoever already holds the phone
    async fn duplicate(&self, phone: &PhoneNumber) -> DomainError {
        let holder = sqlx::query_scalar::<_, String>(
            "SELECT name FROM members WHERE phone_number = $1",
        )
        .bind(phone.as_str())
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();

        DomainError::DuplicateKey {
            phone: phone.to_string(),
            name: holder,
        }
    }
}

#[async_trait]
impl MemberRepository for PgMemberRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Member>> {
        let row = sqlx::query_as::<_, MemberModel>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        self.one_with_groups(row).await
    }

    #[instrument(skip(self, phone), fields(phone = %phone.tail()))]
    async fn find_by_phone(&self, phone: &PhoneNumber) -> RepoResult<Option<Member>> {
        let row = sqlx::query_as::<_, MemberModel>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE phone_number = $1"
        ))
        .bind(phone.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        self.one_with_groups(row).await
    }

    #[instrument(skip(self))]
    async fn list_active(&self, excluding: Option<&PhoneNumber>) -> RepoResult<Vec<Member>> {
        let rows = sqlx::query_as::<_, MemberModel>(&format!(
            r"
            SELECT {MEMBER_COLUMNS}
            FROM members
            WHERE active AND ($1::text IS NULL OR phone_number <> $1)
            ORDER BY created_at ASC
            "
        ))
        .bind(excluding.map(PhoneNumber::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        self.with_groups(rows).await
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> RepoResult<Vec<Member>> {
        let rows = sqlx::query_as::<_, MemberModel>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        self.with_groups(rows).await
    }

    #[instrument(skip(self, member), fields(member_id = %member.id))]
    async fn create(&self, member: &Member) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let inserted = sqlx::query(
            r"
            INSERT INTO members (id, phone_number, name, is_admin, active, message_count,
                                 last_activity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(member.id)
        .bind(member.phone_number.as_str())
        .bind(&member.name)
        .bind(member.is_admin)
        .bind(member.active)
        .bind(member.message_count)
        .bind(member.last_activity)
        .bind(member.created_at)
        .bind(member.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if is_unique_violation(&e) {
                drop(tx);
                return Err(self.duplicate(&member.phone_number).await);
            }
            return Err(map_db_error(e));
        }

        for group_id in &member.group_ids {
            sqlx::query(
                r"
                INSERT INTO member_groups (member_id, group_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(member.id)
            .bind(group_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_admin(&self, id: Uuid, is_admin: bool) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE members
            SET is_admin = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(is_admin)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(member_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn record_activity(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE members
            SET message_count = message_count + 1, last_activity = NOW(), updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(member_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self, phone))]
    async fn update_phone(&self, id: Uuid, phone: &PhoneNumber) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE members
            SET phone_number = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(phone.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(member_not_found(id)),
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(self.duplicate(phone).await),
            Err(e) => Err(map_db_error(e)),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(member_not_found(id));
        }

        Ok(())
    }
}
