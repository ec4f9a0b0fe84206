//! Member directory
//!
//! Every operation here takes raw phone input and normalizes it before it
//! reaches a repository, so lookups and writes only ever see canonical
//! numbers.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use chorus_core::entities::{Member, NewMember};
use chorus_core::traits::{CleanupReport, DirectoryStats, PurgeSummary, WipeSummary};
use chorus_core::value_objects::PhoneNumber;
use chorus_core::DomainError;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Member directory service
pub struct MemberDirectory<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MemberDirectory<'a> {
    /// Create a new MemberDirectory
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Look up a member by raw phone input
    #[instrument(skip(self, raw))]
    pub async fn find_by_phone(&self, raw: &str) -> ServiceResult<Option<Member>> {
        let phone = PhoneNumber::parse(raw);
        Ok(self.ctx.member_repo().find_by_phone(&phone).await?)
    }

    /// Look up a member, failing with `MemberNotFound` on a miss
    pub async fn require_member(&self, raw: &str) -> ServiceResult<Member> {
        let phone = PhoneNumber::parse(raw);
        self.ctx
            .member_repo()
            .find_by_phone(&phone)
            .await?
            .ok_or_else(|| DomainError::MemberNotFound(phone.into_inner()).into())
    }

    /// Active members, optionally leaving one phone out
    pub async fn list_active(&self, excluding: Option<&PhoneNumber>) -> ServiceResult<Vec<Member>> {
        Ok(self.ctx.member_repo().list_active(excluding).await?)
    }

    /// Bump the member's message count and last activity
    pub async fn record_activity(&self, id: Uuid) -> ServiceResult<()> {
        Ok(self.ctx.member_repo().record_activity(id).await?)
    }

    /// Register a new member
    #[instrument(skip(self, data), fields(phone = %data.phone_number.tail()))]
    pub async fn create(&self, data: NewMember) -> ServiceResult<Member> {
        data.validate()?;
        if data.phone_number.is_suspect() {
            return Err(ServiceError::validation(format!(
                "Invalid phone number: {}",
                data.phone_number
            )));
        }

        if let Some(existing) = self
            .ctx
            .member_repo()
            .find_by_phone(&data.phone_number)
            .await?
        {
            return Err(DomainError::DuplicateKey {
                phone: existing.phone_number.into_inner(),
                name: existing.name,
            }
            .into());
        }

        let member = Member::from_new(data);
        self.ctx.member_repo().create(&member).await?;

        info!(member_id = %member.id, is_admin = member.is_admin, "Member registered");
        Ok(member)
    }

    /// Grant or revoke admin rights
    #[instrument(skip(self, raw))]
    pub async fn set_admin(&self, raw: &str, is_admin: bool) -> ServiceResult<Member> {
        let mut member = self.require_member(raw).await?;
        self.ctx.member_repo().set_admin(member.id, is_admin).await?;
        member.is_admin = is_admin;

        info!(member_id = %member.id, is_admin, "Admin flag changed");
        Ok(member)
    }

    /// Delete a member together with every broadcast they sent and every
    /// delivery log addressed to them
    #[instrument(skip(self, raw))]
    pub async fn purge(&self, raw: &str) -> ServiceResult<(Member, PurgeSummary)> {
        let member = self.require_member(raw).await?;
        let summary = self
            .ctx
            .maintenance_repo()
            .purge_phone(&member.phone_number)
            .await?;

        warn!(
            member_id = %member.id,
            messages = summary.messages,
            delivery_logs = summary.delivery_logs,
            "Member purged"
        );
        Ok((member, summary))
    }

    /// Empty every table
    #[instrument(skip(self))]
    pub async fn wipe_all(&self) -> ServiceResult<WipeSummary> {
        let summary = self.ctx.maintenance_repo().wipe_all().await?;
        warn!(rows = summary.total(), "Directory wiped");
        Ok(summary)
    }

    /// Row counts
    pub async fn stats(&self) -> ServiceResult<DirectoryStats> {
        Ok(self.ctx.maintenance_repo().stats().await?)
    }

    /// Repair the roster and sweep leftovers.
    ///
    /// Members whose stored phones normalize to the same number are merged
    /// into the oldest one (admin flag and groups carry over), stored phones
    /// are rewritten to canonical form, orphan media and log rows are
    /// deleted, and broadcasts stuck in processing are marked failed.
    #[instrument(skip(self))]
    pub async fn cleanup(&self) -> ServiceResult<CleanupReport> {
        let mut report = CleanupReport::default();
        let repo = self.ctx.member_repo();

        let mut by_phone: BTreeMap<String, Vec<Member>> = BTreeMap::new();
        for member in repo.list_all().await? {
            let canonical = PhoneNumber::parse(member.phone_number.as_str()).into_inner();
            by_phone.entry(canonical).or_default().push(member);
        }

        for (canonical, members) in by_phone {
            let mut members = members.into_iter();
            let Some(survivor) = members.next() else {
                continue;
            };

            let mut make_admin = false;
            for duplicate in members {
                make_admin |= duplicate.is_admin;
                for group_id in &duplicate.group_ids {
                    if !survivor.in_group(*group_id) {
                        self.ctx.group_repo().add_member(*group_id, survivor.id).await?;
                    }
                }
                repo.delete(duplicate.id).await?;
                report.duplicates_merged += 1;
                info!(survivor = %survivor.id, merged = %duplicate.id, "Duplicate member merged");
            }

            if make_admin && !survivor.is_admin {
                repo.set_admin(survivor.id, true).await?;
            }

            if survivor.phone_number.as_str() != canonical {
                repo.update_phone(survivor.id, &PhoneNumber::parse(&canonical))
                    .await?;
                report.phones_renormalized += 1;
            }
        }

        let (orphan_media, orphan_logs) = self.ctx.maintenance_repo().delete_orphans().await?;
        report.orphan_media = orphan_media;
        report.orphan_logs = orphan_logs;

        let cutoff = Utc::now() - Duration::minutes(self.ctx.relay().stale_after_minutes);
        report.stale_broadcasts = self
            .ctx
            .maintenance_repo()
            .fail_stale_broadcasts(cutoff)
            .await?;

        info!(?report, "Cleanup finished");
        Ok(report)
    }
}
