//! Core types for Vellum
//!
//! This crate defines the foundational types used throughout the system:
//! - EntityId: Opaque unique identifier for records
//! - Timestamp: Millisecond timestamp with monotonic `now()`
//! - FieldValue: Unified value enum for entity fields
//! - Entity: A validated record (id, timestamps, field map)
//! - CollectionSchema / IndexKind / Validator: Per-collection configuration
//! - Operator: Closed query operator set with its compatibility table
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entity;
pub mod error;
pub mod operator;
pub mod schema;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use entity::{Entity, FieldMap, FIELD_CREATED_AT, FIELD_ID, FIELD_UPDATED_AT, RESERVED_FIELDS};
pub use error::{Error, Result, StoreError};
pub use operator::{Operator, QueryValue};
pub use schema::{CollectionSchema, FieldRules, FieldType, IndexKind, Validator};
pub use types::{EntityId, IdError, Timestamp};
pub use value::FieldValue;
