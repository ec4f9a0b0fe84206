//! Business logic services
//!
//! This module contains the relay's service layer: the member directory,
//! outbound sending with retries, media relocation, broadcast fan-out, admin
//! commands, inbound routing, roster seeding, and status reporting.

pub mod broadcast;
pub mod commands;
pub mod context;
pub mod directory;
pub mod error;
pub mod inbound;
pub mod media;
pub mod seed;
pub mod sender;
pub mod status;

// Re-export all services for convenience
pub use broadcast::{BroadcastReport, BroadcastService};
pub use commands::CommandDispatcher;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use directory::MemberDirectory;
pub use error::{ServiceError, ServiceResult};
pub use inbound::InboundRouter;
pub use media::{MediaRelocator, RelocationReport};
pub use seed::{RosterFile, RosterSeeder, SeedGroup, SeedMember, SeedReport};
pub use sender::{OutboundSender, SendOutcome};
pub use status::StatusService;
