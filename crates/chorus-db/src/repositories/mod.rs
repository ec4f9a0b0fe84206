//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in chorus-core.
//! Each repository handles database operations for a specific domain entity.

mod delivery;
mod error;
mod group;
mod maintenance;
mod media;
mod member;
mod message;

pub use delivery::PgDeliveryLogRepository;
pub use group::PgGroupRepository;
pub use maintenance::PgMaintenanceRepository;
pub use media::PgMediaRepository;
pub use member::PgMemberRepository;
pub use message::PgMessageRepository;
