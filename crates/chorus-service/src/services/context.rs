//! Service context - dependency container for services
//!
//! Holds all repositories, outbound providers, and relay tuning needed by
//! services. Built once at startup and shared behind an `Arc`.

use std::sync::Arc;

use chorus_common::RelayConfig;
use chorus_core::traits::{
    DeliveryLogRepository, GroupRepository, MaintenanceRepository, MediaFetcher, MediaRepository,
    MemberRepository, MessageRepository, ObjectStore, SmsGateway,
};

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
///
/// This is the main dependency container that gets passed to all services.
/// It provides access to:
/// - Database repositories
/// - The SMS gateway, media fetcher, and object store
/// - Relay tuning (retries, timeouts, placeholder text)
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    member_repo: Arc<dyn MemberRepository>,
    group_repo: Arc<dyn GroupRepository>,
    message_repo: Arc<dyn MessageRepository>,
    media_repo: Arc<dyn MediaRepository>,
    delivery_log_repo: Arc<dyn DeliveryLogRepository>,
    maintenance_repo: Arc<dyn MaintenanceRepository>,

    // Providers
    sms_gateway: Arc<dyn SmsGateway>,
    media_fetcher: Arc<dyn MediaFetcher>,
    object_store: Arc<dyn ObjectStore>,

    relay: RelayConfig,
}

impl ServiceContext {
    /// Start building a context
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    // === Repositories ===

    /// Get the member repository
    pub fn member_repo(&self) -> &dyn MemberRepository {
        self.member_repo.as_ref()
    }

    /// Get the group repository
    pub fn group_repo(&self) -> &dyn GroupRepository {
        self.group_repo.as_ref()
    }

    /// Get the broadcast message repository
    pub fn message_repo(&self) -> &dyn MessageRepository {
        self.message_repo.as_ref()
    }

    /// Get the media file repository
    pub fn media_repo(&self) -> &dyn MediaRepository {
        self.media_repo.as_ref()
    }

    /// Get the delivery log repository
    pub fn delivery_log_repo(&self) -> &dyn DeliveryLogRepository {
        self.delivery_log_repo.as_ref()
    }

    /// Get the maintenance repository
    pub fn maintenance_repo(&self) -> &dyn MaintenanceRepository {
        self.maintenance_repo.as_ref()
    }

    // === Providers ===

    /// Get the SMS gateway
    pub fn sms_gateway(&self) -> &dyn SmsGateway {
        self.sms_gateway.as_ref()
    }

    /// Get the media fetcher
    pub fn media_fetcher(&self) -> &dyn MediaFetcher {
        self.media_fetcher.as_ref()
    }

    /// Get the object store
    pub fn object_store(&self) -> &dyn ObjectStore {
        self.object_store.as_ref()
    }

    // === Settings ===

    /// Relay tuning
    pub fn relay(&self) -> &RelayConfig {
        &self.relay
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("providers", &"...")
            .field("relay", &self.relay)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    member_repo: Option<Arc<dyn MemberRepository>>,
    group_repo: Option<Arc<dyn GroupRepository>>,
    message_repo: Option<Arc<dyn MessageRepository>>,
    media_repo: Option<Arc<dyn MediaRepository>>,
    delivery_log_repo: Option<Arc<dyn DeliveryLogRepository>>,
    maintenance_repo: Option<Arc<dyn MaintenanceRepository>>,
    sms_gateway: Option<Arc<dyn SmsGateway>>,
    media_fetcher: Option<Arc<dyn MediaFetcher>>,
    object_store: Option<Arc<dyn ObjectStore>>,
    relay: Option<RelayConfig>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn member_repo(mut self, repo: Arc<dyn MemberRepository>) -> Self {
        self.member_repo = Some(repo);
        self
    }

    pub fn group_repo(mut self, repo: Arc<dyn GroupRepository>) -> Self {
        self.group_repo = Some(repo);
        self
    }

    pub fn message_repo(mut self, repo: Arc<dyn MessageRepository>) -> Self {
        self.message_repo = Some(repo);
        self
    }

    pub fn media_repo(mut self, repo: Arc<dyn MediaRepository>) -> Self {
        self.media_repo = Some(repo);
        self
    }

    pub fn delivery_log_repo(mut self, repo: Arc<dyn DeliveryLogRepository>) -> Self {
        self.delivery_log_repo = Some(repo);
        self
    }

    pub fn maintenance_repo(mut self, repo: Arc<dyn MaintenanceRepository>) -> Self {
        self.maintenance_repo = Some(repo);
        self
    }

    pub fn sms_gateway(mut self, gateway: Arc<dyn SmsGateway>) -> Self {
        self.sms_gateway = Some(gateway);
        self
    }

    pub fn media_fetcher(mut self, fetcher: Arc<dyn MediaFetcher>) -> Self {
        self.media_fetcher = Some(fetcher);
        self
    }

    pub fn object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.object_store = Some(store);
        self
    }

    /// Relay tuning; defaults apply when not set
    pub fn relay(mut self, relay: RelayConfig) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext {
            member_repo: self.member_repo.ok_or_else(|| required("member_repo"))?,
            group_repo: self.group_repo.ok_or_else(|| required("group_repo"))?,
            message_repo: self.message_repo.ok_or_else(|| required("message_repo"))?,
            media_repo: self.media_repo.ok_or_else(|| required("media_repo"))?,
            delivery_log_repo: self
                .delivery_log_repo
                .ok_or_else(|| required("delivery_log_repo"))?,
            maintenance_repo: self
                .maintenance_repo
                .ok_or_else(|| required("maintenance_repo"))?,
            sms_gateway: self.sms_gateway.ok_or_else(|| required("sms_gateway"))?,
            media_fetcher: self.media_fetcher.ok_or_else(|| required("media_fetcher"))?,
            object_store: self.object_store.ok_or_else(|| required("object_store"))?,
            relay: self.relay.unwrap_or_default(),
        })
    }
}

fn required(name: &str) -> ServiceError {
    ServiceError::validation(format!("{name} is required"))
}
