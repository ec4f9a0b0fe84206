//! # chorus-service
//!
//! Application layer: the member directory, outbound sender, media relocator,
//! broadcast orchestrator, command dispatcher, and the inbound router that
//! ties them together. Services borrow a [`ServiceContext`] holding every
//! repository and provider behind a trait object.

pub mod dto;
pub mod services;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use services::{
    BroadcastReport, BroadcastService, CommandDispatcher, InboundRouter, MediaRelocator,
    MemberDirectory, OutboundSender, RelocationReport, RosterFile, RosterSeeder, SeedReport,
    SendOutcome, ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult,
    StatusService,
};
