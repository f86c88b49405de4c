//! Error types for the core module

use crate::{AccountId, MailboxId};
use thiserror::Error;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Mailbox not found
    #[error("Mailbox not found: {0}")]
    MailboxNotFound(MailboxId),

    /// A store lookup failed or resolved to nothing usable
    #[error("Lookup failed: {0}")]
    LookupFailure(String),

    /// The operation was cancelled before it completed
    #[error("Operation cancelled")]
    Cancelled,

    /// An id was missing or out of range
    #[error("Invalid id: {0}")]
    InvalidId(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CoreError {
    /// Whether this error should abandon a refresh silently instead of surfacing
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            CoreError::LookupFailure(_)
                | CoreError::Cancelled
                | CoreError::AccountNotFound(_)
                | CoreError::MailboxNotFound(_)
        )
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(e: sqlx::Error) -> Self {
        CoreError::DatabaseError(e.to_string())
    }
}
