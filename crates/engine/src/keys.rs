//! Index key derivation
//!
//! Pure, deterministic, no I/O. Equal logical values always serialize to
//! the identical key string and unequal values (including across types)
//! to distinct strings; index correctness depends on this, not just
//! performance.
//!
//! ## Key layout
//!
//! For an entity type with prefix `user`:
//!
//! - primary record:    `user:record:{id}`
//! - equality entry:    `user:index:{field}:{tag}:{value}`
//! - ordered index:     `user:sorted:{field}` (one key per field)
//! - membership set:    `user:members`
//!
//! ## Ordered string members
//!
//! Numeric and timestamp values are stored by numeric score with the
//! bare identifier as member. String values are stored at score zero as
//! `{value}\x00{id}`, which sorts lexicographically by value while
//! remaining resolvable back to an identifier. String field values are
//! rejected upstream if they contain NUL, so the separator is
//! unambiguous. The derived lex bounds below exploit that `\x00` is the
//! lowest byte: no legal value byte sorts below the separator.

use std::ops::Bound;
use vellum_core::{EntityId, FieldValue, Operator};

/// Primary record key for an identifier
pub fn record_key(prefix: &str, id: &EntityId) -> String {
    format!("{prefix}:record:{id}")
}

/// Scan pattern for primary record keys; `id_glob` may contain globs
pub fn record_pattern(prefix: &str, id_glob: &str) -> String {
    format!("{prefix}:record:{id_glob}")
}

/// Equality-index entry key for one (field, value) pair
///
/// Returns `None` for values that are not indexed (Null).
pub fn equality_key(prefix: &str, field: &str, value: &FieldValue) -> Option<String> {
    serialize_value(value).map(|repr| format!("{prefix}:index:{field}:{repr}"))
}

/// Scan pattern covering every equality entry of one field
pub fn equality_pattern(prefix: &str, field: &str) -> String {
    format!("{prefix}:index:{field}:*")
}

/// Ordered-index key for a field: one key covers the whole entity type
pub fn ordered_key(prefix: &str, field: &str) -> String {
    format!("{prefix}:sorted:{field}")
}

/// Membership-set key: all live identifiers of one entity type
pub fn membership_key(prefix: &str) -> String {
    format!("{prefix}:members")
}

/// Stable serialization of a value for equality-key derivation
///
/// Each representation carries a one-letter type tag, so values of
/// different types never share a key: `ne`/`nin` subtract whole
/// equality entries from the membership set, and a cross-type key
/// collision would drop records from their results. After the tag,
/// timestamps render as ISO-8601 text, numbers and booleans as decimal
/// text, strings as-is. Integer-valued floats keep a trailing `.0` and
/// negative zero canonicalizes to zero, matching value equality in both
/// directions. `Null` is not indexed.
pub fn serialize_value(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Null => None,
        FieldValue::Bool(b) => Some(format!("b:{b}")),
        FieldValue::Int(i) => Some(format!("i:{i}")),
        FieldValue::Float(f) => {
            // -0.0 == 0.0, so both must derive the same key
            let f = if *f == 0.0 { 0.0f64 } else { *f };
            if f.is_finite() && f.fract() == 0.0 {
                Some(format!("f:{f:.1}"))
            } else {
                Some(format!("f:{f}"))
            }
        }
        FieldValue::String(s) => Some(format!("s:{s}")),
        FieldValue::Timestamp(t) => Some(format!("t:{}", t.to_iso8601())),
    }
}

/// Ordered-index member for a value: (score, member)
///
/// Returns `None` for values the ordered index cannot hold (Null,
/// Bool). Numeric and timestamp values use their score with the bare
/// id; strings use the zero-score lexicographic encoding.
pub fn ordered_member(value: &FieldValue, id: &EntityId) -> Option<(f64, String)> {
    if let Some(score) = value.score() {
        return Some((score, id.to_string()));
    }
    value
        .as_str()
        .map(|s| (0.0, format!("{s}\x00{id}")))
}

/// Recover the identifier portion of an ordered-index member
pub fn decode_ordered_member(member: &str) -> &str {
    match member.rfind('\x00') {
        Some(pos) => &member[pos + 1..],
        None => member,
    }
}

/// Score bounds for a numeric range operator
pub fn score_bounds(op: Operator, score: f64) -> (Bound<f64>, Bound<f64>) {
    match op {
        Operator::Lt => (Bound::Unbounded, Bound::Excluded(score)),
        Operator::Lte => (Bound::Unbounded, Bound::Included(score)),
        Operator::Gt => (Bound::Excluded(score), Bound::Unbounded),
        Operator::Gte => (Bound::Included(score), Bound::Unbounded),
        _ => (Bound::Unbounded, Bound::Unbounded),
    }
}

/// Lexicographic bounds for a string range operator
///
/// Members for value `v` all sort within `[v, v\x01)`: they begin with
/// `v\x00` and values contain no NUL. Appending `\x01` therefore forms
/// the tightest bound excluding (for `lte`, including) every member of
/// `v` itself.
pub fn lex_bounds(op: Operator, value: &str) -> (Bound<String>, Bound<String>) {
    match op {
        Operator::Lt => (Bound::Unbounded, Bound::Excluded(value.to_string())),
        Operator::Lte => (Bound::Unbounded, Bound::Excluded(format!("{value}\x01"))),
        Operator::Gt => (Bound::Included(format!("{value}\x01")), Bound::Unbounded),
        Operator::Gte => (Bound::Included(value.to_string()), Bound::Unbounded),
        _ => (Bound::Unbounded, Bound::Unbounded),
    }
}
