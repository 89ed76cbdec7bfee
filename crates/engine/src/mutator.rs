//! Index mutation planning
//!
//! Pure translation from an entity transition to the store commands that
//! keep every declared index consistent with it. The coordinator appends
//! these to the same batch as the primary-record write, so indexes can
//! never drift from the record they describe.
//!
//! Planned commands are idempotent set and sorted-set mutations; the
//! plan only emits a remove/add pair for an index whose entry actually
//! changes.

use vellum_core::{CollectionSchema, Entity, FieldValue, IndexKind};
use vellum_store::Command;

use crate::keys;

/// Commands that bring every index in line with `entity`
///
/// `prior` is the previously stored version for an update, or `None`
/// for a creation. Entries derived from the prior version that no
/// longer apply are removed; the membership set always gains the id.
pub fn save_ops(schema: &CollectionSchema, entity: &Entity, prior: Option<&Entity>) -> Vec<Command> {
    let prefix = schema.prefix();
    let id = entity.id.to_string();
    let mut ops = vec![Command::SetAdd {
        key: keys::membership_key(prefix),
        member: id.clone(),
    }];

    for (field, kind) in schema.indexes() {
        let old = prior.and_then(|p| p.field(field));
        let new = entity.field(field);

        match kind {
            IndexKind::Equality => {
                let old_key = old.as_ref().and_then(|v| equality_entry(prefix, field, v));
                let new_key = new.as_ref().and_then(|v| equality_entry(prefix, field, v));
                if old_key == new_key {
                    continue;
                }
                if let Some(key) = old_key {
                    ops.push(Command::SetRemove {
                        key,
                        member: id.clone(),
                    });
                }
                if let Some(key) = new_key {
                    ops.push(Command::SetAdd {
                        key,
                        member: id.clone(),
                    });
                }
            }
            IndexKind::Ordered => {
                let old_entry = old.as_ref().and_then(|v| keys::ordered_member(v, &entity.id));
                let new_entry = new.as_ref().and_then(|v| keys::ordered_member(v, &entity.id));
                if old_entry == new_entry {
                    continue;
                }
                let key = keys::ordered_key(prefix, field);
                if let Some((_, member)) = old_entry {
                    ops.push(Command::SortedRemove {
                        key: key.clone(),
                        member,
                    });
                }
                if let Some((score, member)) = new_entry {
                    ops.push(Command::SortedAdd { key, score, member });
                }
            }
        }
    }
    ops
}

/// Commands that retract every index entry of `entity`
pub fn delete_ops(schema: &CollectionSchema, entity: &Entity) -> Vec<Command> {
    let prefix = schema.prefix();
    let id = entity.id.to_string();
    let mut ops = vec![Command::SetRemove {
        key: keys::membership_key(prefix),
        member: id.clone(),
    }];

    for (field, kind) in schema.indexes() {
        let value = match entity.field(field) {
            Some(v) => v,
            None => continue,
        };
        match kind {
            IndexKind::Equality => {
                if let Some(key) = equality_entry(prefix, field, &value) {
                    ops.push(Command::SetRemove {
                        key,
                        member: id.clone(),
                    });
                }
            }
            IndexKind::Ordered => {
                if let Some((_, member)) = keys::ordered_member(&value, &entity.id) {
                    ops.push(Command::SortedRemove {
                        key: keys::ordered_key(prefix, field),
                        member,
                    });
                }
            }
        }
    }
    ops
}

fn equality_entry(prefix: &str, field: &str, value: &FieldValue) -> Option<String> {
    if value.is_null() {
        return None;
    }
    keys::equality_key(prefix, field, value)
}
