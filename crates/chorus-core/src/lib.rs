//! # chorus-core
//!
//! Domain layer containing entities, the phone number value object, admin
//! command parsing, repository traits, and ports for external providers.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod commands;
pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use commands::Command;
pub use entities::{
    BroadcastMessage, DeliveryLog, DeliveryOutcome, DeliveryStatus, Group, MediaFile, Member,
    NewMember, ProcessingStatus, UploadStatus,
};
pub use error::{DomainError, ProviderError};
pub use traits::{
    CleanupReport, DeliveryLogRepository, DirectoryStats, FetchedMedia,
    GroupRepository, MaintenanceRepository, MediaFetcher, MediaRepository, MemberRepository,
    MessageRepository, ObjectStore, OutboundSms, PurgeSummary, RepoResult, SmsGateway,
    WipeSummary,
};
pub use value_objects::PhoneNumber;
