//! Error handling utilities for repositories

use chorus_core::error::DomainError;
use sqlx::Error as SqlxError;
use uuid::Uuid;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Check for unique violation and return appropriate error or fallback
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if is_unique_violation(&e) {
        return on_unique();
    }
    DomainError::DatabaseError(e.to_string())
}

/// True when the error is a unique constraint violation
pub fn is_unique_violation(e: &SqlxError) -> bool {
    e.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// Create a "member not found" error
pub fn member_not_found(id: Uuid) -> DomainError {
    DomainError::MemberNotFound(id.to_string())
}

/// Create a "message not found" error
pub fn message_not_found(id: Uuid) -> DomainError {
    DomainError::MessageNotFound(id)
}
