// Domain error taxonomy shared by the repositories and the aggregation engine

use thiserror::Error;

/// Errors surfaced by ledger operations.
///
/// Every variant except `Internal` is a user-facing failure whose message is
/// safe to print. `Internal` keeps the storage error as its source for logging
/// but displays an opaque message.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A required field is missing or malformed. Nothing was written.
    #[error("{0}")]
    Validation(String),

    /// The entity does not exist or is not owned by the caller.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The operation conflicts with the current state (duplicate timer,
    /// stopping an idle timer).
    #[error("{0}")]
    Conflict(String),

    /// Storage failure.
    #[error("internal storage error")]
    Internal(#[from] rusqlite::Error),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        LedgerError::NotFound { entity, id }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        LedgerError::Conflict(message.into())
    }

    /// True for failures the caller cannot fix by changing the request.
    pub fn is_internal(&self) -> bool {
        matches!(self, LedgerError::Internal(_))
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
