//! Entity normalizer
//!
//! Produces a canonical, fully-populated record from partial input:
//! assigns the identifier and timestamps, rejects malformed identifiers,
//! and delegates record-shape validation to the schema's validator. A
//! validation failure aborts before any store mutation.
//!
//! Timestamp rules:
//! - creation: `createdAt` = `updatedAt` = current time
//! - update: `createdAt` preserved from the existing record, `updatedAt`
//!   refreshed regardless of whether any other field changed

use vellum_core::{
    CollectionSchema, Entity, EntityId, Error, FieldMap, FieldValue, Result, Timestamp,
    FIELD_CREATED_AT, FIELD_ID, FIELD_UPDATED_AT, RESERVED_FIELDS,
};

/// Normalize a candidate field map into a storable entity
///
/// `existing` is `None` for creation, or the current record for an
/// update (the merged map is expected as `input`). The identifier is
/// immutable: a supplied id that differs from the existing record's is
/// rejected.
pub fn normalize(
    schema: &CollectionSchema,
    input: &FieldMap,
    existing: Option<&Entity>,
) -> Result<Entity> {
    let id = resolve_id(input.get(FIELD_ID), existing)?;

    let now = Timestamp::now();
    let created_at = match existing {
        Some(prior) => prior.created_at,
        None => now,
    };

    // Candidate seen by the validator: reserved fields populated so
    // external validators can observe them.
    let mut candidate = input.clone();
    candidate.insert(FIELD_ID.to_string(), FieldValue::String(id.to_string()));
    candidate.insert(
        FIELD_CREATED_AT.to_string(),
        FieldValue::Timestamp(created_at),
    );
    candidate.insert(FIELD_UPDATED_AT.to_string(), FieldValue::Timestamp(now));

    let mut fields = schema.validator().validate(candidate)?;
    for reserved in RESERVED_FIELDS {
        fields.remove(reserved);
    }
    check_storable(&fields)?;

    Ok(Entity {
        id,
        created_at,
        updated_at: now,
        fields,
    })
}

fn resolve_id(supplied: Option<&FieldValue>, existing: Option<&Entity>) -> Result<EntityId> {
    let supplied = match supplied {
        None | Some(FieldValue::Null) => None,
        Some(FieldValue::String(s)) => Some(EntityId::parse(s)?),
        Some(other) => {
            return Err(Error::Validation(format!(
                "id must be a string, got {}",
                other.type_name()
            )))
        }
    };

    match (supplied, existing) {
        (_, Some(prior)) => {
            if let Some(id) = supplied {
                if id != prior.id {
                    return Err(Error::Validation("id is immutable".into()));
                }
            }
            Ok(prior.id)
        }
        (Some(id), None) => Ok(id),
        (None, None) => Ok(EntityId::generate()),
    }
}

/// Structural rules every stored value must satisfy
///
/// String values must not contain NUL (reserved by the ordered-index
/// member encoding and illegal in derived keys); floats must be finite
/// so their index representation is well defined.
fn check_storable(fields: &FieldMap) -> Result<()> {
    for (name, value) in fields {
        match value {
            FieldValue::String(s) if s.contains('\x00') => {
                return Err(Error::Validation(format!(
                    "field {name:?} contains a NUL byte"
                )));
            }
            FieldValue::Float(f) if !f.is_finite() => {
                return Err(Error::Validation(format!(
                    "field {name:?} is not a finite number"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}
