//! Integration test utilities for the relay
//!
//! This crate provides helpers for running end-to-end tests against the
//! HTTP server, either over in-memory stores or a real PostgreSQL database.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
