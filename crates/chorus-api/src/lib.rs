//! # chorus-api
//!
//! HTTP edge of the relay built with Axum: the carrier webhooks, health
//! checks, debug statistics, and static serving of relocated media.

pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, create_app_state, run, run_server};
pub use state::AppState;
