//! # chorus-providers
//!
//! Implementations of the outbound ports declared in `chorus-core`:
//!
//! - [`TwilioGateway`]: Twilio-compatible REST client for sending SMS/MMS
//! - [`HttpMediaFetcher`]: downloads carrier-hosted attachments
//! - [`FsObjectStore`]: writes media to local disk, served by the relay
//! - [`HttpObjectStore`]: `PUT`s media to an HTTP blob endpoint
//!
//! [`build_object_store`] picks the store for the configured backend.

mod http;
pub mod media;
pub mod sms;
pub mod storage;

pub use media::HttpMediaFetcher;
pub use sms::TwilioGateway;
pub use storage::{build_object_store, FsObjectStore, HttpObjectStore};
