//! # chorus-db
//!
//! Database layer implementing repository traits with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! This crate provides PostgreSQL implementations for all repository traits
//! defined in `chorus-core`. It handles:
//!
//! - Connection pool management and schema migrations
//! - Database models with SQLx `FromRow` derives
//! - Model -> entity mappers
//! - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chorus_db::{create_pool, run_migrations, DatabaseConfig, PgMemberRepository};
//! use chorus_core::{MemberRepository, PhoneNumber};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::from_env()).await?;
//!     run_migrations(&pool).await?;
//!     let members = PgMemberRepository::new(pool);
//!     let jane = members.find_by_phone(&PhoneNumber::parse("2065551234")).await?;
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, create_pool_from_env, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{
    PgDeliveryLogRepository, PgGroupRepository, PgMaintenanceRepository, PgMediaRepository,
    PgMemberRepository, PgMessageRepository,
};
