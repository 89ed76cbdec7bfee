//! The store contract consumed by the record layer
//!
//! Implementations wrap a concrete key-value backend. The record layer
//! only ever touches the store through this trait, so backends can be
//! swapped without changing engine semantics.
//!
//! ## Keyspaces
//!
//! Keys are plain strings. A key names at most one of three shapes:
//! byte records, sets, or sorted sets. [`Command::Delete`] removes a key
//! regardless of shape; `scan` enumerates keys of every shape.
//!
//! ## Atomicity and watches
//!
//! `exec` applies a whole batch atomically. `watch` captures the current
//! version of a record key; `exec_watched` commits its batch only if
//! that key has not been written since, reporting [`ExecOutcome::Aborted`]
//! otherwise. Nothing is retried internally.

use crate::command::{Batch, Reply};
use std::ops::Bound;
use vellum_core::StoreError;

/// Snapshot of a record key's version at watch time
///
/// `version` is `None` when the key did not exist and had never been
/// written. Any subsequent `Put` or `Delete` of the key invalidates the
/// token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchToken {
    /// The watched record key
    pub key: String,
    /// Observed version, `None` for a never-written key
    pub version: Option<u64>,
}

/// Result of a conditional batch execution
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    /// The watched key was unchanged; the batch was applied
    Committed(Vec<Reply>),
    /// The watched key was written since the watch; nothing was applied
    Aborted,
}

/// Store primitive set the record layer is written against
pub trait Store: Send + Sync {
    /// Point read of a record key
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Bulk read; result order matches `keys`, `None` for missing keys
    fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, StoreError>;

    /// Cursor-based paged key enumeration
    ///
    /// `pattern` is a glob (`*` any run, `?` one char). Pass cursor `0`
    /// to start; a returned cursor of `0` means enumeration is done.
    /// Enumeration is best-effort under concurrent mutation.
    fn scan(&self, pattern: &str, cursor: u64, count: usize)
        -> Result<(u64, Vec<String>), StoreError>;

    /// Members of a set (empty for a missing key)
    fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Union of the members of several sets
    fn set_union(&self, keys: &[String]) -> Result<Vec<String>, StoreError>;

    /// Members of `base` that appear in none of `subtract`
    fn set_difference(&self, base: &str, subtract: &[String]) -> Result<Vec<String>, StoreError>;

    /// Cardinality of a set
    fn set_len(&self, key: &str) -> Result<u64, StoreError>;

    /// Sorted-set members whose score falls within the bounds,
    /// ascending by (score, member)
    fn sorted_range_by_score(
        &self,
        key: &str,
        min: Bound<f64>,
        max: Bound<f64>,
    ) -> Result<Vec<String>, StoreError>;

    /// Sorted-set members within the lexicographic bounds, ascending
    ///
    /// Meaningful when all members share one score, as the ordered
    /// string index guarantees.
    fn sorted_range_by_lex(
        &self,
        key: &str,
        min: Bound<String>,
        max: Bound<String>,
    ) -> Result<Vec<String>, StoreError>;

    /// Apply a batch atomically, returning one reply per command
    fn exec(&self, batch: Batch) -> Result<Vec<Reply>, StoreError>;

    /// Capture the current version of a record key
    fn watch(&self, key: &str) -> Result<WatchToken, StoreError>;

    /// Apply a batch atomically only if the watched key is unchanged
    fn exec_watched(&self, token: &WatchToken, batch: Batch) -> Result<ExecOutcome, StoreError>;
}
