//! Data transfer objects for webhook inputs and JSON outputs
//!
//! This module provides:
//! - Request DTOs parsed from the carrier's form-encoded webhooks
//! - Response DTOs for the health and debug endpoints

pub mod requests;
pub mod responses;

pub use requests::{Attachment, InboundSms, StatusCallback};
pub use responses::{
    ComponentStatus, HealthResponse, ReadinessChecks, ReadinessResponse, RecentBroadcast,
    StatsResponse,
};
