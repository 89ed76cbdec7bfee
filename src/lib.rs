//! Vellum: a record-oriented access layer over a key-value store
//!
//! Vellum stores validated records as opaque payloads under primary keys
//! and keeps secondary index structures (equality sets, ordered sorted
//! sets, a membership set) in lock-step with them. Every logical write
//! commits as one atomic batch; updates use optimistic concurrency over
//! the primary key and report lost races instead of retrying.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use vellum::{Collection, CollectionSchema, FieldValue, MemoryStore, Operator, QueryValue};
//!
//! # fn main() -> vellum::Result<()> {
//! let schema = CollectionSchema::builder("user")
//!     .equality_index("email")
//!     .ordered_index("age")
//!     .build()?;
//! let users = Collection::new(Arc::new(MemoryStore::new()), schema);
//!
//! let alice = users.create(
//!     [
//!         ("email".to_string(), FieldValue::from("alice@example.com")),
//!         ("age".to_string(), FieldValue::from(34i64)),
//!     ]
//!     .into_iter()
//!     .collect(),
//! )?;
//!
//! let found = users.find_where(
//!     "email",
//!     Operator::Eq,
//!     &QueryValue::One(FieldValue::from("alice@example.com")),
//! )?;
//! assert_eq!(found[0].id, alice.id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! - `vellum-core`: value model, entities, schemas, operators, errors
//! - `vellum-store`: the store contract and the in-memory reference store
//! - `vellum-engine`: key derivation, index mutation planning, the
//!   transactional coordinator and the query executor

#![warn(missing_docs)]

pub use vellum_core::{
    CollectionSchema, Entity, EntityId, Error, FieldMap, FieldRules, FieldType, FieldValue,
    IndexKind, Operator, QueryValue, Result, StoreError, Timestamp, Validator, FIELD_CREATED_AT,
    FIELD_ID, FIELD_UPDATED_AT, RESERVED_FIELDS,
};
pub use vellum_engine::{Collection, HookInput, HookOutcome, Hooks, NoHooks, Operation};
pub use vellum_store::{Batch, Command, ExecOutcome, MemoryStore, Reply, Store, WatchToken};
