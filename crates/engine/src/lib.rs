//! Vellum engine: the secondary-index consistency engine and its
//! transactional write path
//!
//! The engine keeps secondary index structures in lock-step with primary
//! records across create/update/delete, and answers field predicates
//! either through those indexes or through a full-scan fallback.
//!
//! - [`keys`]: pure derivation of primary, index and membership keys
//! - [`normalize`]: canonical, fully-populated records from partial input
//! - [`mutator`]: the index add/remove operations a write must carry
//! - [`Collection`]: the transactional write coordinator and query entry
//!   point
//! - [`hooks`]: before/after notification sink
//!
//! Every logical write travels as one atomic store batch (primary record
//! plus all index mutations); updates add optimistic concurrency over
//! the primary key and never retry after a conflict.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod hooks;
pub mod keys;
pub mod mutator;
pub mod normalize;
pub mod query;

pub use collection::Collection;
pub use hooks::{HookInput, HookOutcome, Hooks, NoHooks, Operation};
