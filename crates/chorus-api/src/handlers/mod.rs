//! HTTP request handlers
//!
//! This module contains the handlers for all API endpoints.

pub mod debug;
pub mod health;
pub mod sms;
