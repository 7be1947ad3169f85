//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every failure here returns control to the caller with enough information
/// to display a message and re-enable a retry affordance; none is fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was missing or malformed (reported before any
    /// persistence attempt; the user corrects and resubmits).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced record no longer exists, typically because a concurrent
    /// delete won the race. The operation is abandoned, never retried.
    #[error("not found")]
    NotFound,

    /// The persistence layer was unreachable or rejected the operation.
    /// Surfaced unmodified; there is no retry layer in the core.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}
