//! Before/after operation hooks
//!
//! A hook sink observes every mutating operation on a collection, once
//! before any store traffic and once after the operation settles. Hooks
//! are observation-only; they
//! cannot veto or alter the operation, and the write path does not wait
//! on anything they do.
//!
//! The default sink, [`NoHooks`], does nothing.

use vellum_core::{Entity, EntityId, FieldMap};

/// Which mutating operation is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Single-record creation
    Create,
    /// Batched creation
    CreateMany,
    /// Patch of one existing record
    Update,
    /// Removal of one record
    Delete,
    /// Pattern-scoped bulk removal
    DeleteAll,
}

/// What the operation was asked to do
#[derive(Debug, Clone, Copy)]
pub enum HookInput<'a> {
    /// Candidate fields for a creation
    Record(&'a FieldMap),
    /// Candidate fields for a batched creation
    Records(&'a [FieldMap]),
    /// Target identifier and patch for an update
    Patch {
        /// Record being patched
        id: &'a EntityId,
        /// Fields to overlay
        patch: &'a FieldMap,
    },
    /// Target identifier for a deletion
    Id(&'a EntityId),
    /// Identifier glob for a bulk deletion
    Pattern(&'a str),
}

/// What the operation produced
#[derive(Debug, Clone, Copy)]
pub enum HookOutcome<'a> {
    /// The stored record
    Record(&'a Entity),
    /// The stored records, in input order
    Records(&'a [Entity]),
    /// The stored record, or `None` when the target was missing or the
    /// write lost a concurrent race
    Maybe(Option<&'a Entity>),
    /// Whether a record was actually removed
    Deleted(bool),
    /// Number of records affected
    Count(usize),
}

/// Observation sink for collection operations
pub trait Hooks: Send + Sync {
    /// Called before any store traffic for the operation
    fn before(&self, op: Operation, input: &HookInput<'_>) {
        let _ = (op, input);
    }

    /// Called after the operation settles, successfully or not having
    /// found its target; store errors skip the after hook
    fn after(&self, op: Operation, outcome: &HookOutcome<'_>) {
        let _ = (op, outcome);
    }
}

/// The do-nothing sink
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl Hooks for NoHooks {}
