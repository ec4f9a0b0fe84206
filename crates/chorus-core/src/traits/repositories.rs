//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation. Every phone argument is an already
//! normalized [`PhoneNumber`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{
    BroadcastMessage, DeliveryLog, DeliveryStatus, Group, MediaFile, Member, ProcessingStatus,
};
use crate::error::DomainError;
use crate::value_objects::PhoneNumber;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Member Repository
// ============================================================================

#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Find member by ID
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Member>>;

    /// Find member by canonical phone
    async fn find_by_phone(&self, phone: &PhoneNumber) -> RepoResult<Option<Member>>;

    /// List active members, optionally leaving one phone out
    async fn list_active(&self, excluding: Option<&PhoneNumber>) -> RepoResult<Vec<Member>>;

    /// List every member, oldest first
    async fn list_all(&self) -> RepoResult<Vec<Member>>;

    /// Insert a member. Fails with `DuplicateKey` when the phone is taken.
    async fn create(&self, member: &Member) -> RepoResult<()>;

    /// Grant or revoke admin rights
    async fn set_admin(&self, id: Uuid, is_admin: bool) -> RepoResult<()>;

    /// Bump message count and last activity
    async fn record_activity(&self, id: Uuid) -> RepoResult<()>;

    /// Rewrite a stored phone (used when re-normalizing legacy rows)
    async fn update_phone(&self, id: Uuid, phone: &PhoneNumber) -> RepoResult<()>;

    /// Delete a single member row
    async fn delete(&self, id: Uuid) -> RepoResult<()>;
}

// ============================================================================
// Group Repository
// ============================================================================

#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Find group by name (case-insensitive)
    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Group>>;

    /// List all groups
    async fn list(&self) -> RepoResult<Vec<Group>>;

    /// Create a new group
    async fn create(&self, group: &Group) -> RepoResult<()>;

    /// Tag a member with a group (no-op when already tagged)
    async fn add_member(&self, group_id: Uuid, member_id: Uuid) -> RepoResult<()>;
}

// ============================================================================
// Broadcast Message Repository
// ============================================================================

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find broadcast by ID
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<BroadcastMessage>>;

    /// Persist a new broadcast
    async fn create(&self, message: &BroadcastMessage) -> RepoResult<()>;

    /// Update the fan-out state
    async fn update_delivery_status(&self, id: Uuid, status: DeliveryStatus) -> RepoResult<()>;

    /// Update the media processing state
    async fn update_processing_status(&self, id: Uuid, status: ProcessingStatus)
        -> RepoResult<()>;

    /// Most recent broadcasts, newest first
    async fn recent(&self, limit: i64) -> RepoResult<Vec<BroadcastMessage>>;
}

// ============================================================================
// Media Repository
// ============================================================================

#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// Persist a media record
    async fn create(&self, media: &MediaFile) -> RepoResult<()>;

    /// Media records of a broadcast, in attachment order
    async fn find_by_message(&self, message_id: Uuid) -> RepoResult<Vec<MediaFile>>;
}

// ============================================================================
// Delivery Log Repository
// ============================================================================

#[async_trait]
pub trait DeliveryLogRepository: Send + Sync {
    /// Append a delivery log row
    async fn create(&self, log: &DeliveryLog) -> RepoResult<()>;

    /// All rows of a broadcast
    async fn find_by_message(&self, message_id: Uuid) -> RepoResult<Vec<DeliveryLog>>;

    /// Row for a provider message id (status callbacks)
    async fn find_by_provider_id(&self, provider_message_id: &str)
        -> RepoResult<Option<DeliveryLog>>;
}

// ============================================================================
// Maintenance Repository
// ============================================================================

/// Rows removed by a phone purge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeSummary {
    pub members: u64,
    pub messages: u64,
    pub media_files: u64,
    pub delivery_logs: u64,
}

/// Rows removed by a full wipe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WipeSummary {
    pub members: u64,
    pub groups: u64,
    pub messages: u64,
    pub media_files: u64,
    pub delivery_logs: u64,
}

impl WipeSummary {
    pub fn total(&self) -> u64 {
        self.members + self.groups + self.messages + self.media_files + self.delivery_logs
    }
}

/// Result of a roster cleanup pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub phones_renormalized: u64,
    pub duplicates_merged: u64,
    pub orphan_media: u64,
    pub orphan_logs: u64,
    pub stale_broadcasts: u64,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Row counts reported by the debug endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryStats {
    pub members: i64,
    pub active_members: i64,
    pub admins: i64,
    pub groups: i64,
    pub messages: i64,
    pub messages_in_flight: i64,
    pub delivery_logs: i64,
    pub failed_deliveries: i64,
}

/// Cross-table operations: cascades, wipes, orphan sweeps, and counts
#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    /// Delete a member plus every broadcast sent from and log addressed to the phone
    async fn purge_phone(&self, phone: &PhoneNumber) -> RepoResult<PurgeSummary>;

    /// Delete everything
    async fn wipe_all(&self) -> RepoResult<WipeSummary>;

    /// Delete media and log rows whose broadcast no longer exists.
    /// Returns (media rows, log rows).
    async fn delete_orphans(&self) -> RepoResult<(u64, u64)>;

    /// Mark broadcasts stuck in `processing` since before `cutoff` as failed
    async fn fail_stale_broadcasts(&self, cutoff: DateTime<Utc>) -> RepoResult<u64>;

    /// Row counts
    async fn stats(&self) -> RepoResult<DirectoryStats>;

    /// Connectivity check
    async fn ping(&self) -> RepoResult<()>;
}
