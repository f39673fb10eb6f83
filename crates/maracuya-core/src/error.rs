//! # Error Types
//!
//! Domain-specific error types for maracuya-core.
//!
//! ## Error Hierarchy
//! ```text
//! maracuya-core (this file)
//! ├── CoreError        - Business rule violations
//! └── ValidationError  - Input validation failures
//!
//! maracuya-db
//! └── DbError          - Storage operation failures
//!
//! maracuya-pos
//! └── PosError         - Service-level taxonomy the UI translates
//!                        (StorageUnavailable, ValidationFailed,
//!                         DuplicateCorrelative, Cancelled, ...)
//! ```
//!
//! ## Design Principles
//! 1. `thiserror` derives, no manual Display impls
//! 2. Context in the message (product id, quantity, limit)
//! 3. Errors are enum variants, never strings

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations and domain logic failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product not present in the cart.
    #[error("Product not in cart: {0}")]
    ItemNotInCart(String),

    /// Cart has exceeded maximum allowed items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// The flow was asked for a draft before reaching confirmation.
    #[error("Sale flow is in {state}, not ready to commit")]
    NotReadyToCommit { state: String },

    /// A credit sale needs a registered client with an enabled account.
    ///
    /// The walk-in sentinel can never carry credit, and the historical
    /// module refuses to advance at all without a registered client.
    #[error("Credit sale requires a registered client with an account (got {client})")]
    CreditRequiresAccount { client: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (bad UUID, non-numeric PIN, ...).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
