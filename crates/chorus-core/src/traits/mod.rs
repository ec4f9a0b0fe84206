//! Ports - repository and provider traits implemented by infrastructure crates

mod providers;
mod repositories;

pub use providers::{FetchedMedia, MediaFetcher, ObjectStore, OutboundSms, SmsGateway};
pub use repositories::{
    CleanupReport, DeliveryLogRepository, DirectoryStats, GroupRepository, MaintenanceRepository,
    MediaRepository, MemberRepository, MessageRepository, PurgeSummary, RepoResult, WipeSummary,
};
