//! # Service Error Types
//!
//! The taxonomy every operation in this crate returns. UI layers match on
//! these variants; they never see raw storage or bcrypt errors.
//!
//! ## Retryability
//! A commit failure is either retryable (the store was unreachable, a
//! correlative collided) or not (the draft itself is bad). The checkout
//! module parks retryable failures; [`PosError::failure_kind`] is the single
//! place that classification lives.

use thiserror::Error;

use maracuya_core::{CoreError, FailureKind, Role};
use maracuya_db::DbError;

/// Service operation errors.
#[derive(Debug, Error)]
pub enum PosError {
    /// The store is unreachable, timed out, or mid-transaction failure.
    /// Retryable; checkout parks the draft.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The draft or input is invalid. Never retryable.
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// Correlative allocation produced a number that already exists.
    /// Retryable with a fresh allocation.
    #[error("Duplicate correlative: {0}")]
    DuplicateCorrelative(String),

    /// A unique business key other than the correlative collided.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Wrong code or PIN. Deliberately does not say which.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// The session's role does not allow the operation.
    #[error("'{action}' requires the {required:?} role")]
    PermissionDenied { action: String, required: Role },

    /// Another commit is already running on this terminal.
    #[error("A sale commit is already in progress")]
    CommitInFlight,

    /// The operation was cancelled before reaching storage.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PosError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        PosError::NotFound { entity: entity.into(), id: id.into() }
    }

    /// Whether retrying the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PosError::StorageUnavailable(_)
                | PosError::DuplicateCorrelative(_)
                | PosError::CommitInFlight
        )
    }

    /// Classifies a commit failure for the parked-sales table.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            PosError::StorageUnavailable(_) => FailureKind::Network,
            PosError::DuplicateCorrelative(_) => FailureKind::Correlative,
            PosError::Validation(_) => FailureKind::Validation,
            _ => FailureKind::Other,
        }
    }
}

/// Storage errors surface with their connectivity/uniqueness classification
/// already applied.
impl From<DbError> for PosError {
    fn from(err: DbError) -> Self {
        if err.is_unavailable() {
            return PosError::StorageUnavailable(err.to_string());
        }
        if err.is_unique_violation_on("sales.correlative")
            || err.is_unique_violation_on("lunch_orders.correlative")
        {
            return PosError::DuplicateCorrelative(err.to_string());
        }
        match err {
            DbError::NotFound { entity, id } => PosError::NotFound { entity, id },
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                PosError::Conflict(err.to_string())
            }
            other => PosError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for PosError {
    fn from(err: serde_json::Error) -> Self {
        PosError::Internal(format!("JSON error: {}", err))
    }
}

impl From<bcrypt::BcryptError> for PosError {
    fn from(err: bcrypt::BcryptError) -> Self {
        PosError::Internal(format!("PIN hashing error: {}", err))
    }
}

/// Result type for service operations.
pub type PosResult<T> = Result<T, PosError>;

// =============================================================================
// Unit Tests
// =============================================================================
