//! Error types for Vellum
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! ## Propagation policy
//!
//! - `Validation` errors are raised before any store I/O; a failed
//!   validation never mutates the store.
//! - `Store` errors are propagated unmodified; the engine does not retry
//!   store-level failures.
//! - `Conflict` is surfaced to the caller, who decides whether to retry
//!   the whole read-modify-write cycle. The engine never retries
//!   automatically.

use crate::types::{EntityId, IdError};
use thiserror::Error;

/// Result type alias for Vellum operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the record layer
#[derive(Debug, Error)]
pub enum Error {
    /// Candidate record failed schema validation, or a supplied
    /// identifier was malformed. Raised before any store mutation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An operation requiring an existing record found none
    #[error("record not found: {0}")]
    NotFound(EntityId),

    /// Optimistic concurrency check failed: the primary key was modified
    /// between the read and the conditional write
    #[error("concurrent write conflict on record {0}")]
    Conflict(EntityId),

    /// Record encode/decode failure
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The underlying store primitive failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<IdError> for Error {
    fn from(e: IdError) -> Self {
        Error::Validation(e.to_string())
    }
}

/// Error raised by a store backend
///
/// Kept separate from [`Error`] so store failures cross the engine
/// boundary unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend itself failed (network, protocol, poisoned state)
    #[error("store backend error: {0}")]
    Backend(String),
}
