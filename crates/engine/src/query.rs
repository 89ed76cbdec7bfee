//! Query execution: index-backed where possible, full scan otherwise
//!
//! Route selection is static: the field's declared index kind and the
//! operator's compatibility table pick the plan, never data statistics.
//!
//! - equality index + `eq/in`: direct set lookup (union for `in`)
//! - equality index + `ne/nin`: membership-set complement
//! - ordered index + range operator: sorted-set range, by score for
//!   numeric and timestamp bounds, lexicographic for string bounds
//! - everything else: paged scan of the primary records
//!
//! Identifiers resolved through an index whose primary record is gone
//! are skipped and logged, never surfaced as an error. Every candidate,
//! index-resolved or scanned, is re-checked against the predicate in
//! memory, so both routes return the same records for the same data.

use tracing::warn;
use vellum_core::{
    CollectionSchema, Entity, FieldValue, IndexKind, Operator, QueryValue, Result,
};
use vellum_store::Store;

use crate::collection::decode_record;
use crate::keys;

/// Page size for full-scan key enumeration
const SCAN_PAGE: usize = 128;

/// Execute one field predicate against a collection
pub fn find_where(
    store: &dyn Store,
    schema: &CollectionSchema,
    field: &str,
    op: Operator,
    operand: &QueryValue,
) -> Result<Vec<Entity>> {
    op.check_operand(operand)?;

    let ids = match schema.index_kind(field) {
        Some(IndexKind::Equality) if op.usable_with_equality_index() => {
            Some(equality_candidates(store, schema, field, op, operand)?)
        }
        Some(IndexKind::Ordered) if op.is_range() => {
            Some(ordered_candidates(store, schema, field, op, operand)?)
        }
        _ => None,
    };

    match ids {
        Some(ids) => resolve_and_filter(store, schema, field, op, operand, &ids),
        None => full_scan(store, schema, field, op, operand),
    }
}

fn equality_candidates(
    store: &dyn Store,
    schema: &CollectionSchema,
    field: &str,
    op: Operator,
    operand: &QueryValue,
) -> Result<Vec<String>> {
    let prefix = schema.prefix();
    let entry_keys = |values: &[FieldValue]| -> Vec<String> {
        values
            .iter()
            .filter_map(|v| keys::equality_key(prefix, field, v))
            .collect()
    };

    let ids = match (op, operand) {
        (Operator::Eq, QueryValue::One(v)) => {
            match keys::equality_key(prefix, field, v) {
                Some(key) => store.set_members(&key)?,
                None => Vec::new(),
            }
        }
        (Operator::In, QueryValue::Many(values)) => store.set_union(&entry_keys(values))?,
        (Operator::Ne, QueryValue::One(v)) => store.set_difference(
            &keys::membership_key(prefix),
            &entry_keys(std::slice::from_ref(v)),
        )?,
        (Operator::Nin, QueryValue::Many(values)) => {
            store.set_difference(&keys::membership_key(prefix), &entry_keys(values))?
        }
        // check_operand and the route guard rule these out
        _ => Vec::new(),
    };
    Ok(ids)
}

fn ordered_candidates(
    store: &dyn Store,
    schema: &CollectionSchema,
    field: &str,
    op: Operator,
    operand: &QueryValue,
) -> Result<Vec<String>> {
    let bound = match operand {
        QueryValue::One(v) => v,
        QueryValue::Many(_) => return Ok(Vec::new()),
    };
    let key = keys::ordered_key(schema.prefix(), field);

    let members = if let Some(score) = bound.score() {
        let (min, max) = keys::score_bounds(op, score);
        store.sorted_range_by_score(&key, min, max)?
    } else if let Some(s) = bound.as_str() {
        let (min, max) = keys::lex_bounds(op, s);
        store.sorted_range_by_lex(&key, min, max)?
    } else {
        Vec::new()
    };

    Ok(members
        .iter()
        .map(|m| keys::decode_ordered_member(m).to_string())
        .collect())
}

/// Fetch candidate records by id, drop stale entries, re-check the
/// predicate
fn resolve_and_filter(
    store: &dyn Store,
    schema: &CollectionSchema,
    field: &str,
    op: Operator,
    operand: &QueryValue,
    ids: &[String],
) -> Result<Vec<Entity>> {
    let prefix = schema.prefix();
    let record_keys: Vec<String> = ids
        .iter()
        .map(|id| format!("{prefix}:record:{id}"))
        .collect();

    let mut out = Vec::new();
    for (id, payload) in ids.iter().zip(store.get_many(&record_keys)?) {
        let Some(bytes) = payload else {
            warn!(prefix, id = %id, "index entry points at a missing record, skipping");
            continue;
        };
        let entity = decode_record(&bytes)?;
        if op.matches(entity.field(field).as_ref(), operand) {
            out.push(entity);
        }
    }
    Ok(out)
}

fn full_scan(
    store: &dyn Store,
    schema: &CollectionSchema,
    field: &str,
    op: Operator,
    operand: &QueryValue,
) -> Result<Vec<Entity>> {
    let pattern = keys::record_pattern(schema.prefix(), "*");
    let mut out = Vec::new();
    let mut cursor = 0;
    loop {
        let (next, page) = store.scan(&pattern, cursor, SCAN_PAGE)?;
        for payload in store.get_many(&page)?.into_iter().flatten() {
            let entity = decode_record(&payload)?;
            if op.matches(entity.field(field).as_ref(), operand) {
                out.push(entity);
            }
        }
        if next == 0 {
            break;
        }
        cursor = next;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutator;
    use vellum_core::{EntityId, Error, Timestamp};
    use vellum_store::{Batch, Command, MemoryStore};

    fn schema() -> CollectionSchema {
        CollectionSchema::builder("user")
            .equality_index("email")
            .ordered_index("age")
            .ordered_index("name")
            .build()
            .unwrap()
    }

    fn seed(store: &MemoryStore, schema: &CollectionSchema, pairs: &[(&str, FieldValue)]) -> Entity {
        let entity = Entity {
            id: EntityId::generate(),
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        };
        let mut batch = Batch::new();
        batch.push(Command::Put {
            key: keys::record_key(schema.prefix(), &entity.id),
            value: rmp_serde::to_vec(&entity).unwrap(),
        });
        batch.extend(mutator::save_ops(schema, &entity, None));
        store.exec(batch).unwrap();
        entity
    }

    fn ids(entities: &[Entity]) -> Vec<EntityId> {
        entities.iter().map(|e| e.id).collect()
    }

    fn one(v: impl Into<FieldValue>) -> QueryValue {
        QueryValue::One(v.into())
    }

    // === Equality index ===

    #[test]
    fn test_eq_via_index() {
        let store = MemoryStore::new();
        let schema = schema();
        let a = seed(&store, &schema, &[("email", FieldValue::String("a@x.com".into()))]);
        seed(&store, &schema, &[("email", FieldValue::String("b@x.com".into()))]);

        let found = find_where(&store, &schema, "email", Operator::Eq, &one("a@x.com")).unwrap();
        assert_eq!(ids(&found), vec![a.id]);
    }

    #[test]
    fn test_eq_no_match_is_empty() {
        let store = MemoryStore::new();
        let schema = schema();
        seed(&store, &schema, &[("email", FieldValue::String("a@x.com".into()))]);
        let found = find_where(&store, &schema, "email", Operator::Eq, &one("zz@x.com")).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_ne_via_membership_complement() {
        let store = MemoryStore::new();
        let schema = schema();
        seed(&store, &schema, &[("email", FieldValue::String("a@x.com".into()))]);
        let b = seed(&store, &schema, &[("email", FieldValue::String("b@x.com".into()))]);
        // no email at all still satisfies ne
        let c = seed(&store, &schema, &[]);

        let mut found =
            ids(&find_where(&store, &schema, "email", Operator::Ne, &one("a@x.com")).unwrap());
        found.sort_by_key(|id| id.to_string());
        let mut expect = vec![b.id, c.id];
        expect.sort_by_key(|id| id.to_string());
        assert_eq!(found, expect);
    }

    #[test]
    fn test_in_union() {
        let store = MemoryStore::new();
        let schema = schema();
        let a = seed(&store, &schema, &[("email", FieldValue::String("a@x.com".into()))]);
        let b = seed(&store, &schema, &[("email", FieldValue::String("b@x.com".into()))]);
        seed(&store, &schema, &[("email", FieldValue::String("c@x.com".into()))]);

        let operand = QueryValue::Many(vec![
            FieldValue::String("a@x.com".into()),
            FieldValue::String("b@x.com".into()),
        ]);
        let mut found = ids(&find_where(&store, &schema, "email", Operator::In, &operand).unwrap());
        found.sort_by_key(|id| id.to_string());
        let mut expect = vec![a.id, b.id];
        expect.sort_by_key(|id| id.to_string());
        assert_eq!(found, expect);
    }

    #[test]
    fn test_nin_complement() {
        let store = MemoryStore::new();
        let schema = schema();
        seed(&store, &schema, &[("email", FieldValue::String("a@x.com".into()))]);
        let b = seed(&store, &schema, &[("email", FieldValue::String("b@x.com".into()))]);

        let operand = QueryValue::Many(vec![FieldValue::String("a@x.com".into())]);
        let found = find_where(&store, &schema, "email", Operator::Nin, &operand).unwrap();
        assert_eq!(ids(&found), vec![b.id]);
    }

    #[test]
    fn test_eq_strict_type_no_cross_match() {
        let store = MemoryStore::new();
        let schema = CollectionSchema::builder("t")
            .equality_index("n")
            .build()
            .unwrap();
        seed(&store, &schema, &[("n", FieldValue::Int(1))]);

        let found = find_where(&store, &schema, "n", Operator::Eq, &one(1.0f64)).unwrap();
        assert!(found.is_empty());
        let found = find_where(&store, &schema, "n", Operator::Eq, &one(1i64)).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_ne_keeps_records_of_other_types() {
        // Int(1) and String("1") must not share an equality entry: the
        // complement subtracts whole entries, so a shared key would drop
        // the string record from ne/nin results entirely
        let store = MemoryStore::new();
        let schema = CollectionSchema::builder("t")
            .equality_index("n")
            .build()
            .unwrap();
        let int_rec = seed(&store, &schema, &[("n", FieldValue::Int(1))]);
        let str_rec = seed(&store, &schema, &[("n", FieldValue::String("1".into()))]);

        let found = find_where(&store, &schema, "n", Operator::Ne, &one(1i64)).unwrap();
        assert_eq!(ids(&found), vec![str_rec.id]);

        let operand = QueryValue::Many(vec![FieldValue::String("1".into())]);
        let found = find_where(&store, &schema, "n", Operator::Nin, &operand).unwrap();
        assert_eq!(ids(&found), vec![int_rec.id]);
    }

    #[test]
    fn test_negative_zero_found_under_zero() {
        // -0.0 == 0.0, so both spellings must resolve through one entry
        let store = MemoryStore::new();
        let schema = CollectionSchema::builder("t")
            .equality_index("x")
            .build()
            .unwrap();
        let rec = seed(&store, &schema, &[("x", FieldValue::Float(-0.0))]);

        let found = find_where(&store, &schema, "x", Operator::Eq, &one(0.0f64)).unwrap();
        assert_eq!(ids(&found), vec![rec.id]);
        let found = find_where(&store, &schema, "x", Operator::Eq, &one(-0.0f64)).unwrap();
        assert_eq!(ids(&found), vec![rec.id]);
    }

    // === Ordered index ===

    #[test]
    fn test_numeric_range_via_sorted_index() {
        let store = MemoryStore::new();
        let schema = schema();
        seed(&store, &schema, &[("age", FieldValue::Int(20))]);
        let b = seed(&store, &schema, &[("age", FieldValue::Int(30))]);
        let c = seed(&store, &schema, &[("age", FieldValue::Int(40))]);

        let found = find_where(&store, &schema, "age", Operator::Gte, &one(30i64)).unwrap();
        assert_eq!(ids(&found), vec![b.id, c.id]);

        let found = find_where(&store, &schema, "age", Operator::Lt, &one(30i64)).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_string_range_via_lex_index() {
        let store = MemoryStore::new();
        let schema = schema();
        let a = seed(&store, &schema, &[("name", FieldValue::String("alice".into()))]);
        let b = seed(&store, &schema, &[("name", FieldValue::String("bob".into()))]);
        let c = seed(&store, &schema, &[("name", FieldValue::String("carol".into()))]);

        let found = find_where(&store, &schema, "name", Operator::Gt, &one("alice")).unwrap();
        assert_eq!(ids(&found), vec![b.id, c.id]);

        let found = find_where(&store, &schema, "name", Operator::Lte, &one("bob")).unwrap();
        assert_eq!(ids(&found), vec![a.id, b.id]);
    }

    #[test]
    fn test_mixed_type_ordered_index_stays_partitioned() {
        // numeric and string values of one field share the sorted key;
        // the in-memory re-check keeps each range to its own type
        let store = MemoryStore::new();
        let schema = CollectionSchema::builder("t")
            .ordered_index("rank")
            .build()
            .unwrap();
        let n = seed(&store, &schema, &[("rank", FieldValue::Int(5))]);
        let s = seed(&store, &schema, &[("rank", FieldValue::String("gold".into()))]);

        let found = find_where(&store, &schema, "rank", Operator::Gte, &one(0i64)).unwrap();
        assert_eq!(ids(&found), vec![n.id]);

        let found = find_where(&store, &schema, "rank", Operator::Gte, &one("a")).unwrap();
        assert_eq!(ids(&found), vec![s.id]);
    }

    #[test]
    fn test_timestamp_range_on_created_at() {
        let store = MemoryStore::new();
        let schema = CollectionSchema::builder("evt")
            .ordered_index("createdAt")
            .build()
            .unwrap();
        let e1 = seed(&store, &schema, &[]);
        let e2 = seed(&store, &schema, &[]);
        let e3 = seed(&store, &schema, &[]);
        assert!(e1.created_at < e2.created_at && e2.created_at < e3.created_at);

        let found =
            find_where(&store, &schema, "createdAt", Operator::Gte, &one(e2.created_at)).unwrap();
        assert_eq!(ids(&found), vec![e2.id, e3.id]);
    }

    // === Full scan ===

    #[test]
    fn test_unindexed_field_falls_back_to_scan() {
        let store = MemoryStore::new();
        let schema = schema();
        let a = seed(&store, &schema, &[("city", FieldValue::String("Oslo".into()))]);
        seed(&store, &schema, &[("city", FieldValue::String("Bergen".into()))]);

        let found = find_where(&store, &schema, "city", Operator::Eq, &one("Oslo")).unwrap();
        assert_eq!(ids(&found), vec![a.id]);
    }

    #[test]
    fn test_like_scans_even_on_indexed_field() {
        let store = MemoryStore::new();
        let schema = schema();
        let a = seed(&store, &schema, &[("email", FieldValue::String("alice@x.com".into()))]);
        seed(&store, &schema, &[("email", FieldValue::String("bob@y.org".into()))]);

        let found = find_where(&store, &schema, "email", Operator::Like, &one("X.COM")).unwrap();
        assert_eq!(ids(&found), vec![a.id]);
    }

    #[test]
    fn test_range_on_equality_indexed_field_scans() {
        let store = MemoryStore::new();
        let schema = CollectionSchema::builder("t")
            .equality_index("n")
            .build()
            .unwrap();
        seed(&store, &schema, &[("n", FieldValue::Int(1))]);
        let b = seed(&store, &schema, &[("n", FieldValue::Int(9))]);

        let found = find_where(&store, &schema, "n", Operator::Gt, &one(5i64)).unwrap();
        assert_eq!(ids(&found), vec![b.id]);
    }

    #[test]
    fn test_scan_pages_through_many_records() {
        let store = MemoryStore::new();
        let schema = CollectionSchema::builder("t").build().unwrap();
        for i in 0..(SCAN_PAGE * 2 + 10) {
            seed(&store, &schema, &[("n", FieldValue::Int(i as i64))]);
        }
        let found = find_where(&store, &schema, "n", Operator::Gte, &one(0i64)).unwrap();
        assert_eq!(found.len(), SCAN_PAGE * 2 + 10);
    }

    // === Robustness ===

    #[test]
    fn test_stale_index_entry_is_skipped() {
        let store = MemoryStore::new();
        let schema = schema();
        let a = seed(&store, &schema, &[("email", FieldValue::String("a@x.com".into()))]);

        // remove the primary record but leave the index entry behind
        let mut batch = Batch::new();
        batch.push(Command::Delete {
            key: keys::record_key(schema.prefix(), &a.id),
        });
        store.exec(batch).unwrap();

        let found = find_where(&store, &schema, "email", Operator::Eq, &one("a@x.com")).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_invalid_operand_is_rejected_up_front() {
        let store = MemoryStore::new();
        let schema = schema();
        let err = find_where(&store, &schema, "email", Operator::Eq, &one(()));
        assert!(matches!(err, Err(Error::Validation(_))));

        let err = find_where(
            &store,
            &schema,
            "email",
            Operator::In,
            &one("not-a-list"),
        );
        assert!(matches!(err, Err(Error::Validation(_))));
    }

    #[test]
    fn test_null_stored_value_not_matched_by_eq() {
        let store = MemoryStore::new();
        let schema = schema();
        seed(&store, &schema, &[("email", FieldValue::Null)]);
        let found = find_where(&store, &schema, "email", Operator::Eq, &one("a@x.com")).unwrap();
        assert!(found.is_empty());
    }
}
