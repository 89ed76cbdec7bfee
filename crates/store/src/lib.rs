//! Store primitives for Vellum
//!
//! This crate defines the narrow contract the record layer consumes from
//! its key-value store, and an in-memory reference implementation:
//!
//! - [`Store`]: point/bulk reads, paged glob scans, set and sorted-set
//!   reads, atomic batch execution, and watch + conditional execution
//!   for optimistic concurrency
//! - [`Command`] / [`Batch`]: the mutations a batch can carry
//! - [`MemoryStore`]: reference implementation backed by in-process maps
//!
//! The store is the single source of truth shared by all concurrent
//! operations; the only mutation discipline is "batch together, commit
//! atomically", plus "commit only if the watched key is unchanged since
//! read" for the optimistic path.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod command;
pub mod memory;
pub mod traits;

pub use command::{Batch, Command, Reply};
pub use memory::MemoryStore;
pub use traits::{ExecOutcome, Store, WatchToken};
