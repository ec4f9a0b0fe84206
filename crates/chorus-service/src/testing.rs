//! In-memory repositories and scripted providers
//!
//! Compiled for unit tests and, with the `test-support` feature, for the
//! integration test crate. [`MemoryStore`] implements every repository trait
//! over shared vectors so cross-table operations (purge, wipe, orphan sweep)
//! behave like the PostgreSQL implementation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use chorus_common::RelayConfig;
use chorus_core::entities::{
    BroadcastMessage, DeliveryLog, DeliveryStatus, Group, MediaFile, Member, ProcessingStatus,
};
use chorus_core::error::{DomainError, ProviderError};
use chorus_core::traits::{
    DeliveryLogRepository, DirectoryStats, FetchedMedia, GroupRepository, MaintenanceRepository,
    MediaFetcher, MediaRepository, MemberRepository, MessageRepository, ObjectStore, OutboundSms,
    PurgeSummary, RepoResult, SmsGateway, WipeSummary,
};
use chorus_core::value_objects::PhoneNumber;

use crate::services::ServiceContext;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Repositories
// ============================================================================

#[derive(Default)]
struct Tables {
    members: Vec<Member>,
    groups: Vec<Group>,
    messages: Vec<BroadcastMessage>,
    media: Vec<MediaFile>,
    logs: Vec<DeliveryLog>,
}

/// Every repository over one set of in-memory tables
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_listing: AtomicBool,
    fail_message_insert: AtomicBool,
    fail_media_insert: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a member directly, bypassing duplicate checks
    pub fn insert_member(&self, member: Member) {
        lock(&self.tables).members.push(member);
    }

    /// Insert a broadcast directly
    pub fn insert_message(&self, message: BroadcastMessage) {
        lock(&self.tables).messages.push(message);
    }

    /// Insert a delivery log directly
    pub fn insert_log(&self, log: DeliveryLog) {
        lock(&self.tables).logs.push(log);
    }

    /// Make `list_active` fail
    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Make `MessageRepository::create` fail
    pub fn fail_message_insert(&self, fail: bool) {
        self.fail_message_insert.store(fail, Ordering::SeqCst);
    }

    /// Make `MediaRepository::create` fail
    pub fn fail_media_insert(&self, fail: bool) {
        self.fail_media_insert.store(fail, Ordering::SeqCst);
    }

    pub fn members(&self) -> Vec<Member> {
        lock(&self.tables).members.clone()
    }

    pub fn groups(&self) -> Vec<Group> {
        lock(&self.tables).groups.clone()
    }

    pub fn messages(&self) -> Vec<BroadcastMessage> {
        lock(&self.tables).messages.clone()
    }

    pub fn media(&self) -> Vec<MediaFile> {
        lock(&self.tables).media.clone()
    }

    pub fn logs(&self) -> Vec<DeliveryLog> {
        lock(&self.tables).logs.clone()
    }

    pub fn member_by_phone(&self, phone: &str) -> Option<Member> {
        let phone = PhoneNumber::parse(phone);
        lock(&self.tables)
            .members
            .iter()
            .find(|m| m.phone_number == phone)
            .cloned()
    }
}

#[async_trait]
impl MemberRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Member>> {
        Ok(lock(&self.tables).members.iter().find(|m| m.id == id).cloned())
    }

    async fn find_by_phone(&self, phone: &PhoneNumber) -> RepoResult<Option<Member>> {
        Ok(lock(&self.tables)
            .members
            .iter()
            .find(|m| m.phone_number.as_str() == phone.as_str())
            .cloned())
    }

    async fn list_active(&self, excluding: Option<&PhoneNumber>) -> RepoResult<Vec<Member>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("listing unavailable".to_string()));
        }
        Ok(lock(&self.tables)
            .members
            .iter()
            .filter(|m| m.active)
            .filter(|m| excluding.map_or(true, |p| m.phone_number.as_str() != p.as_str()))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> RepoResult<Vec<Member>> {
        let mut members = lock(&self.tables).members.clone();
        members.sort_by_key(|m| m.created_at);
        Ok(members)
    }

    async fn create(&self, member: &Member) -> RepoResult<()> {
        let mut tables = lock(&self.tables);
        if let Some(existing) = tables
            .members
            .iter()
            .find(|m| m.phone_number.as_str() == member.phone_number.as_str())
        {
            return Err(DomainError::DuplicateKey {
                phone: member.phone_number.to_string(),
                name: existing.name.clone(),
            });
        }
        tables.members.push(member.clone());
        Ok(())
    }

    async fn set_admin(&self, id: Uuid, is_admin: bool) -> RepoResult<()> {
        let mut tables = lock(&self.tables);
        let member = tables
            .members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| DomainError::MemberNotFound(id.to_string()))?;
        member.is_admin = is_admin;
        member.updated_at = Utc::now();
        Ok(())
    }

    async fn record_activity(&self, id: Uuid) -> RepoResult<()> {
        let mut tables = lock(&self.tables);
        let member = tables
            .members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| DomainError::MemberNotFound(id.to_string()))?;
        member.touch();
        Ok(())
    }

    async fn update_phone(&self, id: Uuid, phone: &PhoneNumber) -> RepoResult<()> {
        let mut tables = lock(&self.tables);
        if let Some(holder) = tables
            .members
            .iter()
            .find(|m| m.id != id && m.phone_number.as_str() == phone.as_str())
        {
            return Err(DomainError::DuplicateKey {
                phone: phone.to_string(),
                name: holder.name.clone(),
            });
        }
        let member = tables
            .members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| DomainError::MemberNotFound(id.to_string()))?;
        member.phone_number = phone.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let mut tables = lock(&self.tables);
        let before = tables.members.len();
        tables.members.retain(|m| m.id != id);
        if tables.members.len() == before {
            return Err(DomainError::MemberNotFound(id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Group>> {
        Ok(lock(&self.tables)
            .groups
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list(&self) -> RepoResult<Vec<Group>> {
        Ok(lock(&self.tables).groups.clone())
    }

    async fn create(&self, group: &Group) -> RepoResult<()> {
        let mut tables = lock(&self.tables);
        if tables.groups.iter().any(|g| g.name.eq_ignore_ascii_case(&group.name)) {
            return Err(DomainError::validation(format!(
                "Group {} already exists",
                group.name
            )));
        }
        tables.groups.push(group.clone());
        Ok(())
    }

    async fn add_member(&self, group_id: Uuid, member_id: Uuid) -> RepoResult<()> {
        let mut tables = lock(&self.tables);
        if let Some(member) = tables.members.iter_mut().find(|m| m.id == member_id) {
            if !member.in_group(group_id) {
                member.group_ids.push(group_id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<BroadcastMessage>> {
        Ok(lock(&self.tables).messages.iter().find(|m| m.id == id).cloned())
    }

    async fn create(&self, message: &BroadcastMessage) -> RepoResult<()> {
        if self.fail_message_insert.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("insert refused".to_string()));
        }
        lock(&self.tables).messages.push(message.clone());
        Ok(())
    }

    async fn update_delivery_status(&self, id: Uuid, status: DeliveryStatus) -> RepoResult<()> {
        let mut tables = lock(&self.tables);
        let message = tables
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(DomainError::MessageNotFound(id))?;
        message.delivery_status = status;
        Ok(())
    }

    async fn update_processing_status(
        &self,
        id: Uuid,
        status: ProcessingStatus,
    ) -> RepoResult<()> {
        let mut tables = lock(&self.tables);
        let message = tables
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(DomainError::MessageNotFound(id))?;
        message.processing_status = status;
        Ok(())
    }

    async fn recent(&self, limit: i64) -> RepoResult<Vec<BroadcastMessage>> {
        let mut messages = lock(&self.tables).messages.clone();
        messages.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        messages.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(messages)
    }
}

#[async_trait]
impl MediaRepository for MemoryStore {
    async fn create(&self, media: &MediaFile) -> RepoResult<()> {
        if self.fail_media_insert.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("media insert failed".to_string()));
        }
        lock(&self.tables).media.push(media.clone());
        Ok(())
    }

    async fn find_by_message(&self, message_id: Uuid) -> RepoResult<Vec<MediaFile>> {
        let mut files: Vec<MediaFile> = lock(&self.tables)
            .media
            .iter()
            .filter(|m| m.message_id == message_id)
            .cloned()
            .collect();
        files.sort_by_key(|m| m.position);
        Ok(files)
    }
}

#[async_trait]
impl DeliveryLogRepository for MemoryStore {
    async fn create(&self, log: &DeliveryLog) -> RepoResult<()> {
        let mut tables = lock(&self.tables);
        tables
            .logs
            .retain(|l| !(l.message_id == log.message_id && l.member_id == log.member_id));
        tables.logs.push(log.clone());
        Ok(())
    }

    async fn find_by_message(&self, message_id: Uuid) -> RepoResult<Vec<DeliveryLog>> {
        Ok(lock(&self.tables)
            .logs
            .iter()
            .filter(|l| l.message_id == message_id)
            .cloned()
            .collect())
    }

    async fn find_by_provider_id(
        &self,
        provider_message_id: &str,
    ) -> RepoResult<Option<DeliveryLog>> {
        Ok(lock(&self.tables)
            .logs
            .iter()
            .find(|l| l.provider_message_id.as_deref() == Some(provider_message_id))
            .cloned())
    }
}

#[async_trait]
impl MaintenanceRepository for MemoryStore {
    async fn purge_phone(&self, phone: &PhoneNumber) -> RepoResult<PurgeSummary> {
        let mut tables = lock(&self.tables);
        let phone = phone.as_str();

        let sent: HashSet<Uuid> = tables
            .messages
            .iter()
            .filter(|m| m.from_phone.as_str() == phone)
            .map(|m| m.id)
            .collect();

        let logs_before = tables.logs.len();
        tables
            .logs
            .retain(|l| l.to_phone.as_str() != phone && !sent.contains(&l.message_id));
        let media_before = tables.media.len();
        tables.media.retain(|m| !sent.contains(&m.message_id));
        let messages_before = tables.messages.len();
        tables.messages.retain(|m| !sent.contains(&m.id));
        let members_before = tables.members.len();
        tables.members.retain(|m| m.phone_number.as_str() != phone);

        Ok(PurgeSummary {
            members: (members_before - tables.members.len()) as u64,
            messages: (messages_before - tables.messages.len()) as u64,
            media_files: (media_before - tables.media.len()) as u64,
            delivery_logs: (logs_before - tables.logs.len()) as u64,
        })
    }

    async fn wipe_all(&self) -> RepoResult<WipeSummary> {
        let mut tables = lock(&self.tables);
        let summary = WipeSummary {
            members: tables.members.len() as u64,
            groups: tables.groups.len() as u64,
            messages: tables.messages.len() as u64,
            media_files: tables.media.len() as u64,
            delivery_logs: tables.logs.len() as u64,
        };
        *tables = Tables::default();
        Ok(summary)
    }

    async fn delete_orphans(&self) -> RepoResult<(u64, u64)> {
        let mut tables = lock(&self.tables);
        let ids: HashSet<Uuid> = tables.messages.iter().map(|m| m.id).collect();

        let media_before = tables.media.len();
        tables.media.retain(|m| ids.contains(&m.message_id));
        let logs_before = tables.logs.len();
        tables.logs.retain(|l| ids.contains(&l.message_id));

        Ok((
            (media_before - tables.media.len()) as u64,
            (logs_before - tables.logs.len()) as u64,
        ))
    }

    async fn fail_stale_broadcasts(&self, cutoff: DateTime<Utc>) -> RepoResult<u64> {
        let mut tables = lock(&self.tables);
        let mut failed = 0;
        for message in &mut tables.messages {
            let stuck = message.delivery_status == DeliveryStatus::Processing
                || message.processing_status == ProcessingStatus::Processing;
            if stuck && message.sent_at < cutoff {
                message.delivery_status = DeliveryStatus::Failed;
                if message.processing_status == ProcessingStatus::Processing {
                    message.processing_status = ProcessingStatus::Failed;
                }
                failed += 1;
            }
        }
        Ok(failed)
    }

    async fn stats(&self) -> RepoResult<DirectoryStats> {
        let tables = lock(&self.tables);
        let count = |n: usize| n as i64;
        Ok(DirectoryStats {
            members: count(tables.members.len()),
            active_members: count(tables.members.iter().filter(|m| m.active).count()),
            admins: count(tables.members.iter().filter(|m| m.is_admin).count()),
            groups: count(tables.groups.len()),
            messages: count(tables.messages.len()),
            messages_in_flight: count(
                tables
                    .messages
                    .iter()
                    .filter(|m| m.delivery_status == DeliveryStatus::Processing)
                    .count(),
            ),
            delivery_logs: count(tables.logs.len()),
            failed_deliveries: count(tables.logs.iter().filter(|l| !l.is_sent()).count()),
        })
    }

    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }
}

// ============================================================================
// Providers
// ============================================================================

/// SMS gateway that records every send and fails on request
#[derive(Default)]
pub struct RecordingSmsGateway {
    sent: Mutex<Vec<OutboundSms>>,
    attempts: Mutex<HashMap<String, u32>>,
    // phone -> number of leading attempts that fail
    flaky: Mutex<HashMap<String, u32>>,
    broken: Mutex<HashSet<String>>,
    slow: Mutex<HashMap<String, Duration>>,
    counter: AtomicU64,
    unconfigured: AtomicBool,
}

impl RecordingSmsGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `failures` attempts to `phone`, then succeed
    pub fn fail_first(&self, phone: &str, failures: u32) {
        lock(&self.flaky).insert(PhoneNumber::parse(phone).into_inner(), failures);
    }

    /// Fail every attempt to `phone`
    pub fn always_fail(&self, phone: &str) {
        lock(&self.broken).insert(PhoneNumber::parse(phone).into_inner());
    }

    /// Hold every send to `phone` for `delay` before answering
    pub fn delay(&self, phone: &str, delay: Duration) {
        lock(&self.slow).insert(PhoneNumber::parse(phone).into_inner(), delay);
    }

    pub fn set_configured(&self, configured: bool) {
        self.unconfigured.store(!configured, Ordering::SeqCst);
    }

    /// Successfully sent messages, in send order
    pub fn sent(&self) -> Vec<OutboundSms> {
        lock(&self.sent).clone()
    }

    /// Successfully sent messages to one phone
    pub fn sent_to(&self, phone: &str) -> Vec<OutboundSms> {
        let phone = PhoneNumber::parse(phone);
        self.sent().into_iter().filter(|s| s.to == phone).collect()
    }

    /// Attempts made to one phone, successful or not
    pub fn attempts_to(&self, phone: &str) -> u32 {
        let phone = PhoneNumber::parse(phone).into_inner();
        lock(&self.attempts).get(&phone).copied().unwrap_or(0)
    }
}

#[async_trait]
impl SmsGateway for RecordingSmsGateway {
    async fn send(&self, message: &OutboundSms) -> Result<String, ProviderError> {
        let to = message.to.as_str().to_string();
        let attempt = {
            let mut attempts = lock(&self.attempts);
            let entry = attempts.entry(to.clone()).or_insert(0);
            *entry += 1;
            *entry
        };

        let delay = lock(&self.slow).get(&to).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if lock(&self.broken).contains(&to) {
            return Err(ProviderError::Rejected {
                status: 400,
                message: format!("attempt {attempt}: unreachable handset"),
            });
        }
        if lock(&self.flaky).get(&to).is_some_and(|&fails| attempt <= fails) {
            return Err(ProviderError::transport(format!(
                "attempt {attempt}: connection reset"
            )));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.sent).push(message.clone());
        Ok(format!("SM{n:032}"))
    }

    fn is_configured(&self) -> bool {
        !self.unconfigured.load(Ordering::SeqCst)
    }
}

/// Media fetcher serving canned responses by URL
#[derive(Default)]
pub struct StaticMediaFetcher {
    responses: Mutex<HashMap<String, Result<FetchedMedia, ProviderError>>>,
}

impl StaticMediaFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, bytes: &'static [u8], content_type: &str) {
        lock(&self.responses).insert(
            url.to_string(),
            Ok(FetchedMedia {
                bytes: Bytes::from_static(bytes),
                content_type: Some(content_type.to_string()),
            }),
        );
    }

    pub fn fail(&self, url: &str, error: ProviderError) {
        lock(&self.responses).insert(url.to_string(), Err(error));
    }
}

#[async_trait]
impl MediaFetcher for StaticMediaFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedMedia, ProviderError> {
        lock(&self.responses)
            .get(url)
            .cloned()
            .unwrap_or_else(|| {
                Err(ProviderError::Rejected {
                    status: 404,
                    message: format!("no media at {url}"),
                })
            })
    }
}

/// Object store keeping uploads in memory
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
    broken: AtomicBool,
}

impl MemoryObjectStore {
    pub const BASE_URL: &'static str = "https://media.test";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.objects).keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, ProviderError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(ProviderError::storage("bucket unavailable"));
        }
        lock(&self.objects).insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(format!("{}/{key}", Self::BASE_URL))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(ProviderError::storage("bucket unavailable"));
        }
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A service context wired to in-memory collaborators
pub struct TestHarness {
    pub ctx: ServiceContext,
    pub store: Arc<MemoryStore>,
    pub sms: Arc<RecordingSmsGateway>,
    pub fetcher: Arc<StaticMediaFetcher>,
    pub objects: Arc<MemoryObjectStore>,
}

impl TestHarness {
    /// Default relay settings with millisecond retry backoff
    pub fn new() -> Self {
        Self::with_relay(RelayConfig {
            retry_backoff_ms: 1,
            ..RelayConfig::default()
        })
    }

    pub fn with_relay(relay: RelayConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let sms = Arc::new(RecordingSmsGateway::new());
        let fetcher = Arc::new(StaticMediaFetcher::new());
        let objects = Arc::new(MemoryObjectStore::new());

        let ctx = ServiceContext::builder()
            .member_repo(store.clone())
            .group_repo(store.clone())
            .message_repo(store.clone())
            .media_repo(store.clone())
            .delivery_log_repo(store.clone())
            .maintenance_repo(store.clone())
            .sms_gateway(sms.clone())
            .media_fetcher(fetcher.clone())
            .object_store(objects.clone())
            .relay(relay)
            .build()
            .unwrap_or_else(|e| panic!("harness context: {e}"));

        Self {
            ctx,
            store,
            sms,
            fetcher,
            objects,
        }
    }

    /// Register a member and return it
    pub fn member(&self, phone: &str, name: &str) -> Member {
        let member = Member::new(PhoneNumber::parse(phone), name);
        self.store.insert_member(member.clone());
        member
    }

    /// Register an admin and return it
    pub fn admin(&self, phone: &str, name: &str) -> Member {
        let mut member = Member::new(PhoneNumber::parse(phone), name);
        member.is_admin = true;
        self.store.insert_member(member.clone());
        member
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
