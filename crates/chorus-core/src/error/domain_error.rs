//! Domain errors - error types for the domain layer

use thiserror::Error;
use uuid::Uuid;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Sender is not registered: {0}")]
    UnregisteredSender(String),

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Broadcast message not found: {0}")]
    MessageNotFound(Uuid),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("{0}")]
    ValidationError(String),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Admin privileges required")]
    AdminRequired,

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Phone {phone} is already registered to {name}")]
    DuplicateKey { phone: String, name: String },

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Downstream service unavailable: {0}")]
    DownstreamUnavailable(String),

    #[error("Broadcast failed: {0}")]
    OrchestrationFailure(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnregisteredSender(_) => "UNREGISTERED_SENDER",
            Self::MemberNotFound(_) => "UNKNOWN_MEMBER",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::AdminRequired => "ADMIN_REQUIRED",
            Self::DuplicateKey { .. } => "DUPLICATE_KEY",
            Self::DownstreamUnavailable(_) => "DOWNSTREAM_UNAVAILABLE",
            Self::OrchestrationFailure(_) => "ORCHESTRATION_FAILURE",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnregisteredSender(_) | Self::MemberNotFound(_) | Self::MessageNotFound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_))
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::AdminRequired)
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    /// Check if an external provider was unreachable
    pub fn is_downstream(&self) -> bool {
        matches!(self, Self::DownstreamUnavailable(_))
    }
}

/// Failures reported by external providers (SMS gateway, object storage,
/// media host). All of them classify as `DownstreamUnavailable`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("payload too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("provider not configured: {0}")]
    NotConfigured(&'static str),
}

impl ProviderError {
    pub fn transport(msg: impl std::fmt::Display) -> Self {
        Self::Transport(msg.to_string())
    }

    pub fn storage(msg: impl std::fmt::Display) -> Self {
        Self::Storage(msg.to_string())
    }
}

impl From<ProviderError> for DomainError {
    fn from(err: ProviderError) -> Self {
        Self::DownstreamUnavailable(err.to_string())
    }
}
