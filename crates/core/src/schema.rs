//! Collection configuration: index declarations and validation
//!
//! A `CollectionSchema` fixes, at configuration time, which fields of an
//! entity type are indexed and how:
//!
//! - `Equality`: backed by a set of identifiers per distinct value,
//!   answers `eq/ne/in/nin`
//! - `Ordered`: backed by a single sorted structure per field, answers
//!   range operators
//!
//! Undeclared fields are queryable only via full scan.
//!
//! Record-shape validation is delegated to a [`Validator`]. The engine
//! treats the validator as an external collaborator; [`FieldRules`] is
//! the reference implementation used by tests and simple deployments.

use crate::entity::{FieldMap, RESERVED_FIELDS};
use crate::error::{Error, Result};
use crate::value::FieldValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// How a declared field is indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Per-value set of identifiers
    Equality,
    /// Single sorted structure covering the whole entity type
    Ordered,
}

/// Record-shape validation collaborator
///
/// `validate` receives the full candidate field map (reserved fields
/// included) and returns the map to store, which may add defaults or
/// coerce values. A failure aborts the operation before any store
/// mutation.
pub trait Validator: Send + Sync {
    /// Validate and possibly coerce a candidate field map
    fn validate(&self, fields: FieldMap) -> Result<FieldMap>;
}

/// Validator that accepts any candidate unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl Validator for AcceptAll {
    fn validate(&self, fields: FieldMap) -> Result<FieldMap> {
        Ok(fields)
    }
}

/// Expected type for a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Boolean field
    Bool,
    /// Integer field
    Int,
    /// Float field
    Float,
    /// String field
    String,
    /// Timestamp field
    Timestamp,
}

impl FieldType {
    fn accepts(self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (FieldType::Bool, FieldValue::Bool(_))
                | (FieldType::Int, FieldValue::Int(_))
                | (FieldType::Float, FieldValue::Float(_))
                | (FieldType::String, FieldValue::String(_))
                | (FieldType::Timestamp, FieldValue::Timestamp(_))
        )
    }
}

#[derive(Debug, Clone)]
struct FieldRule {
    ty: FieldType,
    required: bool,
    default: Option<FieldValue>,
}

/// Reference validator: per-field type rules, required flags, defaults
///
/// Unknown fields pass through untouched. `Null` satisfies any declared
/// type (it means "absent"). The builder rejects rules on the reserved
/// fields; those are engine-owned and always accepted.
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    rules: BTreeMap<String, FieldRule>,
}

impl FieldRules {
    /// Start building a rule set
    pub fn builder() -> FieldRulesBuilder {
        FieldRulesBuilder {
            rules: BTreeMap::new(),
            error: None,
        }
    }
}

/// Builder for [`FieldRules`]
pub struct FieldRulesBuilder {
    rules: BTreeMap<String, FieldRule>,
    error: Option<Error>,
}

impl FieldRulesBuilder {
    fn push(mut self, field: &str, rule: FieldRule) -> Self {
        if RESERVED_FIELDS.contains(&field) {
            self.error = Some(Error::Validation(format!(
                "field {field:?} is reserved and cannot be redeclared"
            )));
            return self;
        }
        self.rules.insert(field.to_string(), rule);
        self
    }

    /// Declare an optional typed field
    pub fn field(self, name: &str, ty: FieldType) -> Self {
        self.push(
            name,
            FieldRule {
                ty,
                required: false,
                default: None,
            },
        )
    }

    /// Declare a required typed field
    pub fn required(self, name: &str, ty: FieldType) -> Self {
        self.push(
            name,
            FieldRule {
                ty,
                required: true,
                default: None,
            },
        )
    }

    /// Declare an optional typed field with a default value
    pub fn with_default(self, name: &str, ty: FieldType, default: FieldValue) -> Self {
        self.push(
            name,
            FieldRule {
                ty,
                required: false,
                default: Some(default),
            },
        )
    }

    /// Finish the rule set
    pub fn build(self) -> Result<FieldRules> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(FieldRules { rules: self.rules })
    }
}

impl Validator for FieldRules {
    fn validate(&self, mut fields: FieldMap) -> Result<FieldMap> {
        for (name, rule) in &self.rules {
            match fields.get(name) {
                Some(FieldValue::Null) | None => {
                    if let Some(default) = &rule.default {
                        fields.insert(name.clone(), default.clone());
                    } else if rule.required {
                        return Err(Error::Validation(format!(
                            "required field {name:?} is missing"
                        )));
                    }
                }
                Some(value) => {
                    if !rule.ty.accepts(value) {
                        return Err(Error::Validation(format!(
                            "field {name:?} expected {:?}, got {}",
                            rule.ty,
                            value.type_name()
                        )));
                    }
                }
            }
        }
        Ok(fields)
    }
}

/// Per-collection configuration: key prefix, index declarations, validator
#[derive(Clone)]
pub struct CollectionSchema {
    prefix: String,
    indexes: BTreeMap<String, IndexKind>,
    validator: Arc<dyn Validator>,
}

impl fmt::Debug for CollectionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionSchema")
            .field("prefix", &self.prefix)
            .field("indexes", &self.indexes)
            .finish_non_exhaustive()
    }
}

impl CollectionSchema {
    /// Start building a schema for the given entity-type key prefix
    pub fn builder(prefix: &str) -> CollectionSchemaBuilder {
        CollectionSchemaBuilder {
            prefix: prefix.to_string(),
            indexes: BTreeMap::new(),
            validator: Arc::new(AcceptAll),
        }
    }

    /// Entity-type key prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Declared indexes, field name to kind
    pub fn indexes(&self) -> &BTreeMap<String, IndexKind> {
        &self.indexes
    }

    /// Index kind declared for a field, if any
    pub fn index_kind(&self, field: &str) -> Option<IndexKind> {
        self.indexes.get(field).copied()
    }

    /// The validation collaborator
    pub fn validator(&self) -> &Arc<dyn Validator> {
        &self.validator
    }
}

/// Builder for [`CollectionSchema`]
pub struct CollectionSchemaBuilder {
    prefix: String,
    indexes: BTreeMap<String, IndexKind>,
    validator: Arc<dyn Validator>,
}

impl CollectionSchemaBuilder {
    /// Declare an equality index on a field
    pub fn equality_index(mut self, field: &str) -> Self {
        self.indexes.insert(field.to_string(), IndexKind::Equality);
        self
    }

    /// Declare an ordered index on a field
    pub fn ordered_index(mut self, field: &str) -> Self {
        self.indexes.insert(field.to_string(), IndexKind::Ordered);
        self
    }

    /// Set the validation collaborator
    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    /// Finish the schema
    ///
    /// The prefix and every indexed field name must be non-empty and
    /// must not contain NUL or glob metacharacters; both are embedded
    /// verbatim in derived keys and scan patterns.
    pub fn build(self) -> Result<CollectionSchema> {
        if self.prefix.is_empty() {
            return Err(Error::Validation("collection prefix cannot be empty".into()));
        }
        if self.prefix.contains('\x00') {
            return Err(Error::Validation(
                "collection prefix cannot contain NUL bytes".into(),
            ));
        }
        if self.prefix.contains(['*', '?']) {
            return Err(Error::Validation(
                "collection prefix cannot contain glob metacharacters".into(),
            ));
        }
        for field in self.indexes.keys() {
            if field.is_empty() {
                return Err(Error::Validation(
                    "indexed field name cannot be empty".into(),
                ));
            }
            if field.contains('\x00') {
                return Err(Error::Validation(format!(
                    "indexed field {field:?} cannot contain NUL bytes"
                )));
            }
            if field.contains(['*', '?']) {
                return Err(Error::Validation(format!(
                    "indexed field {field:?} cannot contain glob metacharacters"
                )));
            }
        }
        Ok(CollectionSchema {
            prefix: self.prefix,
            indexes: self.indexes,
            validator: self.validator,
        })
    }
}
