//! Domain entities - core business objects

mod broadcast;
mod delivery;
mod group;
mod media;
mod member;

pub use broadcast::{BroadcastMessage, DeliveryStatus, ProcessingStatus};
pub use delivery::{DeliveryLog, DeliveryOutcome};
pub use group::Group;
pub use media::{MediaFile, UploadStatus};
pub use member::{Member, NewMember};
