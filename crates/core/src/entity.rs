//! Entity: one validated record
//!
//! An entity is a mapping of field name to value plus three reserved
//! fields owned by the engine:
//!
//! - `id`: opaque unique identifier, immutable after creation
//! - `createdAt`: set once at creation, never changed by update
//! - `updatedAt`: refreshed on every successful write
//!
//! Invariant: `updatedAt >= createdAt` always.
//!
//! The reserved fields live on the struct, not in the field map;
//! [`Entity::field`] resolves reserved names so that indexing and
//! querying can treat them like any other field.

use crate::types::{EntityId, Timestamp};
use crate::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved field name for the identifier
pub const FIELD_ID: &str = "id";
/// Reserved field name for the creation timestamp
pub const FIELD_CREATED_AT: &str = "createdAt";
/// Reserved field name for the last-write timestamp
pub const FIELD_UPDATED_AT: &str = "updatedAt";
/// All reserved field names, owned by the engine
pub const RESERVED_FIELDS: [&str; 3] = [FIELD_ID, FIELD_CREATED_AT, FIELD_UPDATED_AT];

/// Field name to value mapping for the entity-type-specific fields
pub type FieldMap = BTreeMap<String, FieldValue>;

/// One validated record stored under a primary key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier, immutable after creation
    pub id: EntityId,
    /// Creation time, set once
    pub created_at: Timestamp,
    /// Last successful write time
    pub updated_at: Timestamp,
    /// Entity-type-specific fields
    pub fields: FieldMap,
}

impl Entity {
    /// Resolve a field by name, including the reserved fields
    ///
    /// Returns `None` for fields that are not present. Stored `Null`
    /// values are reported as-is; callers that follow index semantics
    /// treat them as absent.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            FIELD_ID => Some(FieldValue::String(self.id.to_string())),
            FIELD_CREATED_AT => Some(FieldValue::Timestamp(self.created_at)),
            FIELD_UPDATED_AT => Some(FieldValue::Timestamp(self.updated_at)),
            _ => self.fields.get(name).cloned(),
        }
    }

    /// Merge this entity's fields with a patch, patch entries winning
    ///
    /// Used by the update path: the result is the candidate field map
    /// for re-normalization. Reserved names in the patch are left for
    /// the normalizer to check (a differing `id` is rejected there).
    pub fn merged_with(&self, patch: &FieldMap) -> FieldMap {
        let mut merged = self.fields.clone();
        for (k, v) in patch {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }
}
