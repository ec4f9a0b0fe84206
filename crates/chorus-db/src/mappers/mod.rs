//! Entity to model mappers
//!
//! `From<Model> for Entity` converts database rows into domain objects.
//! Stored phones are wrapped without re-normalizing so the cleanup pass can
//! still see legacy formats.

mod broadcast;
mod delivery;
mod group;
mod media;
mod member;

pub use member::member_with_groups;
