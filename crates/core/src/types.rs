//! Identifier and timestamp types
//!
//! This module defines:
//! - EntityId: Opaque unique record identifier, uuid-backed
//! - Timestamp: Millisecond-precision timestamp with a monotonic `now()`
//!
//! EntityIds are generator-assigned on creation unless the caller supplies
//! one, in which case it must parse as a valid id. There is no uniqueness
//! check against the store; collisions are pathologically improbable and
//! not defended against.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::SystemTime;
use thiserror::Error;
use uuid::Uuid;

/// Error returned when a caller-supplied identifier does not parse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed entity id: {0:?}")]
pub struct IdError(pub String);

/// Opaque unique identifier for one record
///
/// Backed by a v4 UUID. The string form is the canonical representation:
/// it is what index members and primary keys embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Generate a new unique identifier
    pub fn generate() -> Self {
        EntityId(Uuid::new_v4())
    }

    /// Parse a caller-supplied identifier, validating its format
    pub fn parse(s: &str) -> Result<Self, IdError> {
        Uuid::parse_str(s)
            .map(EntityId)
            .map_err(|_| IdError(s.to_string()))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityId::parse(s)
    }
}

/// Millisecond-precision timestamp
///
/// Stored as millis since the Unix epoch. `now()` is monotonic within a
/// process: successive calls always return strictly increasing values,
/// which keeps `updatedAt` strictly increasing across successive writes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Construct from millis since the Unix epoch
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// Millis since the Unix epoch
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Current time, strictly increasing within this process
    pub fn now() -> Self {
        static LAST: AtomicI64 = AtomicI64::new(0);

        let wall = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let mut prev = LAST.load(Ordering::Relaxed);
        loop {
            let next = wall.max(prev + 1);
            match LAST.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return Timestamp(next),
                Err(actual) => prev = actual,
            }
        }
    }

    /// ISO-8601 text form, used for equality-index key derivation
    ///
    /// Timestamps outside chrono's representable range fall back to the
    /// raw decimal millis; the rendering stays deterministic either way.
    pub fn to_iso8601(self) -> String {
        chrono::DateTime::from_timestamp_millis(self.0)
            .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
            .unwrap_or_else(|| self.0.to_string())
    }

    /// Numeric score for ordered-index storage
    pub fn score(self) -> f64 {
        self.0 as f64
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iso8601())
    }
}
