//! Field value model for Vellum
//!
//! This module defines `FieldValue`, the closed enum for entity field
//! values.
//!
//! ## Type Rules
//!
//! - Six types only: Null, Bool, Int, Float, String, Timestamp
//! - No implicit coercion for equality: `Int(1) != Float(1.0)`
//! - Float equality follows IEEE-754: `NaN != NaN`, `-0.0 == 0.0`
//! - `Null` is treated as "absent" by indexing and querying
//!
//! Ordering comparisons (used by range predicates) are a separate,
//! deliberately looser relation: Int and Float compare numerically with
//! each other so that in-memory scans agree with the score-based ordered
//! index, which stores both as a single f64 score.

use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Canonical value type for entity fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FieldValue {
    /// Null value (indexed as absent)
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Millisecond timestamp
    Timestamp(Timestamp),
}

// Custom PartialEq: IEEE-754 float semantics, no cross-type equality.
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => true,
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::Int(a), FieldValue::Int(b)) => a == b,
            // IEEE-754: NaN != NaN, -0.0 == 0.0
            (FieldValue::Float(a), FieldValue::Float(b)) => a == b,
            (FieldValue::String(a), FieldValue::String(b)) => a == b,
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl FieldValue {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "Null",
            FieldValue::Bool(_) => "Bool",
            FieldValue::Int(_) => "Int",
            FieldValue::Float(_) => "Float",
            FieldValue::String(_) => "String",
            FieldValue::Timestamp(_) => "Timestamp",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Check if this is a string value
    pub fn is_string(&self) -> bool {
        matches!(self, FieldValue::String(_))
    }

    /// Check if this value is numeric or a timestamp (score-orderable)
    pub fn is_scored(&self) -> bool {
        matches!(
            self,
            FieldValue::Int(_) | FieldValue::Float(_) | FieldValue::Timestamp(_)
        )
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as Timestamp if this is a Timestamp value
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            FieldValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Numeric score, if this value is score-orderable
    ///
    /// Int and Float map to their f64 value, Timestamp to its epoch
    /// millis. This is the representation the ordered index stores.
    pub fn score(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Timestamp(t) => Some(t.score()),
            _ => None,
        }
    }

    /// Ordering comparison for range predicates
    ///
    /// Numeric values (Int, Float, Timestamp) compare by score; strings
    /// compare lexicographically. Any other pairing, and NaN, is
    /// unordered and yields `None`.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.score(), other.score()) {
            return a.partial_cmp(&b);
        }
        match (self, other) {
            (FieldValue::String(a), FieldValue::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<Timestamp> for FieldValue {
    fn from(t: Timestamp) -> Self {
        FieldValue::Timestamp(t)
    }
}

impl From<()> for FieldValue {
    fn from(_: ()) -> Self {
        FieldValue::Null
    }
}

// ============================================================================
// serde_json interop for ergonomic construction in tests and adapters
// ============================================================================

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Int(i)
                } else {
                    FieldValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => FieldValue::String(s),
            // Arrays and objects are not part of the field value model
            other => FieldValue::String(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(FieldValue::Null.type_name(), "Null");
        assert_eq!(FieldValue::Bool(true).type_name(), "Bool");
        assert_eq!(FieldValue::Int(1).type_name(), "Int");
        assert_eq!(FieldValue::Float(1.0).type_name(), "Float");
        assert_eq!(FieldValue::String("s".into()).type_name(), "String");
        assert_eq!(
            FieldValue::Timestamp(Timestamp::from_millis(0)).type_name(),
            "Timestamp"
        );
    }

    // === Equality rules ===

    #[test]
    fn test_int_not_equal_float() {
        assert_ne!(FieldValue::Int(1), FieldValue::Float(1.0));
    }

    #[test]
    fn test_nan_not_equal_nan() {
        assert_ne!(FieldValue::Float(f64::NAN), FieldValue::Float(f64::NAN));
    }

    #[test]
    fn test_negative_zero_equals_zero() {
        assert_eq!(FieldValue::Float(-0.0), FieldValue::Float(0.0));
    }

    #[test]
    fn test_null_not_equal_to_other_types() {
        assert_ne!(FieldValue::Null, FieldValue::Bool(false));
        assert_ne!(FieldValue::Null, FieldValue::Int(0));
        assert_ne!(FieldValue::Null, FieldValue::String(String::new()));
    }

    #[test]
    fn test_timestamp_equality() {
        let a = FieldValue::Timestamp(Timestamp::from_millis(5));
        let b = FieldValue::Timestamp(Timestamp::from_millis(5));
        assert_eq!(a, b);
        assert_ne!(a, FieldValue::Int(5));
    }

    // === Ordering comparison ===

    #[test]
    fn test_compare_ints() {
        assert_eq!(
            FieldValue::Int(1).compare(&FieldValue::Int(2)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_compare_int_with_float() {
        // Range comparisons go through the f64 score, matching the
        // ordered index's storage representation.
        assert_eq!(
            FieldValue::Int(2).compare(&FieldValue::Float(1.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            FieldValue::Int(1).compare(&FieldValue::Float(1.0)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_compare_timestamps() {
        let t1 = FieldValue::Timestamp(Timestamp::from_millis(100));
        let t2 = FieldValue::Timestamp(Timestamp::from_millis(200));
        assert_eq!(t1.compare(&t2), Some(Ordering::Less));
    }

    #[test]
    fn test_compare_strings_lexicographic() {
        let a = FieldValue::String("apple".into());
        let b = FieldValue::String("banana".into());
        assert_eq!(a.compare(&b), Some(Ordering::Less));
    }

    #[test]
    fn test_compare_mixed_types_unordered() {
        let s = FieldValue::String("1".into());
        assert_eq!(s.compare(&FieldValue::Int(1)), None);
        assert_eq!(FieldValue::Bool(true).compare(&FieldValue::Bool(false)), None);
        assert_eq!(FieldValue::Null.compare(&FieldValue::Null), None);
    }

    #[test]
    fn test_compare_nan_unordered() {
        assert_eq!(
            FieldValue::Float(f64::NAN).compare(&FieldValue::Float(1.0)),
            None
        );
    }

    // === Accessors ===

    #[test]
    fn test_as_wrong_type_returns_none() {
        let v = FieldValue::Int(42);
        assert!(v.as_bool().is_none());
        assert!(v.as_float().is_none());
        assert!(v.as_str().is_none());
        assert!(v.as_timestamp().is_none());
        assert_eq!(v.as_int(), Some(42));
    }

    #[test]
    fn test_score() {
        assert_eq!(FieldValue::Int(3).score(), Some(3.0));
        assert_eq!(FieldValue::Float(2.5).score(), Some(2.5));
        assert_eq!(
            FieldValue::Timestamp(Timestamp::from_millis(7)).score(),
            Some(7.0)
        );
        assert_eq!(FieldValue::String("x".into()).score(), None);
        assert_eq!(FieldValue::Bool(true).score(), None);
        assert_eq!(FieldValue::Null.score(), None);
    }

    // === From conversions ===

    #[test]
    fn test_from_conversions() {
        assert_eq!(FieldValue::from(42i64), FieldValue::Int(42));
        assert_eq!(FieldValue::from(42i32), FieldValue::Int(42));
        assert_eq!(FieldValue::from(true), FieldValue::Bool(true));
        assert_eq!(FieldValue::from("hi"), FieldValue::String("hi".into()));
        assert_eq!(FieldValue::from(()), FieldValue::Null);
        let t = Timestamp::from_millis(1);
        assert_eq!(FieldValue::from(t), FieldValue::Timestamp(t));
    }

    // === serde_json interop ===

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(
            FieldValue::from(serde_json::json!(null)),
            FieldValue::Null
        );
        assert_eq!(
            FieldValue::from(serde_json::json!(7)),
            FieldValue::Int(7)
        );
        assert_eq!(
            FieldValue::from(serde_json::json!(2.5)),
            FieldValue::Float(2.5)
        );
        assert_eq!(
            FieldValue::from(serde_json::json!("s")),
            FieldValue::String("s".into())
        );
        assert_eq!(
            FieldValue::from(serde_json::json!(false)),
            FieldValue::Bool(false)
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let values = vec![
            FieldValue::Null,
            FieldValue::Bool(true),
            FieldValue::Int(-3),
            FieldValue::Float(1.25),
            FieldValue::String("hello".into()),
            FieldValue::Timestamp(Timestamp::from_millis(99)),
        ];
        for v in values {
            let s = serde_json::to_string(&v).unwrap();
            let back: FieldValue = serde_json::from_str(&s).unwrap();
            assert_eq!(v, back);
        }
    }

    // === Ordering properties ===

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn compare_is_antisymmetric(a in -1000i64..1000, b in -1000.0f64..1000.0) {
                let x = FieldValue::Int(a);
                let y = FieldValue::Float(b);
                match x.compare(&y) {
                    Some(Ordering::Less) => {
                        prop_assert_eq!(y.compare(&x), Some(Ordering::Greater));
                    }
                    Some(Ordering::Greater) => {
                        prop_assert_eq!(y.compare(&x), Some(Ordering::Less));
                    }
                    Some(Ordering::Equal) => {
                        prop_assert_eq!(y.compare(&x), Some(Ordering::Equal));
                    }
                    None => prop_assert!(false, "int and float are always ordered"),
                }
            }

            #[test]
            fn int_never_equals_float(a in proptest::num::i64::ANY) {
                prop_assert_ne!(FieldValue::Int(a), FieldValue::Float(a as f64));
            }

            #[test]
            fn string_compare_matches_str_ordering(a in "[a-z]{0,8}", b in "[a-z]{0,8}") {
                let got = FieldValue::String(a.clone()).compare(&FieldValue::String(b.clone()));
                prop_assert_eq!(got, Some(a.cmp(&b)));
            }
        }
    }
}
