//! Database models - SQLx-compatible structs for PostgreSQL tables

mod broadcast;
mod delivery;
mod group;
mod media;
mod member;
mod stats;

pub use broadcast::BroadcastMessageModel;
pub use delivery::DeliveryLogModel;
pub use group::GroupModel;
pub use media::MediaFileModel;
pub use member::{MemberGroupModel, MemberModel};
pub use stats::StatsModel;
