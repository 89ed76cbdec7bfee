//! Query operators
//!
//! The operator set is a closed enum with a statically enumerated
//! compatibility table: which operators an index kind can answer, and
//! which operand types each operator accepts. There is no runtime type
//! inspection beyond that table.
//!
//! `matches` is the in-memory predicate evaluation used by full scans
//! and by the post-filter on index-resolved results; stored `Null`
//! values count as absent, mirroring what the index mutator stores.

use crate::error::{Error, Result};
use crate::value::FieldValue;
use std::cmp::Ordering;

/// Field predicate operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal to
    Eq,
    /// Not equal to
    Ne,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Case-insensitive substring containment
    Like,
    /// Member of the operand set
    In,
    /// Not a member of the operand set
    Nin,
}

/// Operand of a query predicate: a single value or a value list
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// Single operand (all operators except `in`/`nin`)
    One(FieldValue),
    /// Operand list (`in`/`nin` only)
    Many(Vec<FieldValue>),
}

impl Operator {
    /// Whether an equality index can answer this operator
    pub fn usable_with_equality_index(self) -> bool {
        matches!(self, Operator::Eq | Operator::Ne | Operator::In | Operator::Nin)
    }

    /// Whether an ordered index can answer this operator
    pub fn usable_with_ordered_index(self) -> bool {
        matches!(self, Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte)
    }

    /// Whether this operator takes an ordering bound as operand
    pub fn is_range(self) -> bool {
        self.usable_with_ordered_index()
    }

    /// Validate operand shape and type against the compatibility table
    ///
    /// - `in`/`nin` take a value list; everything else a single value
    /// - range operators take numeric, timestamp or string bounds
    /// - `like` takes a string
    /// - `Null` and non-finite floats are never legal operands
    pub fn check_operand(self, operand: &QueryValue) -> Result<()> {
        fn check_scalar(op: Operator, v: &FieldValue) -> Result<()> {
            if v.is_null() {
                return Err(Error::Validation(format!(
                    "operator {op:?} does not accept a null operand"
                )));
            }
            if let FieldValue::Float(f) = v {
                if !f.is_finite() {
                    return Err(Error::Validation(format!(
                        "operator {op:?} does not accept a non-finite operand"
                    )));
                }
            }
            match op {
                Operator::Eq | Operator::Ne | Operator::In | Operator::Nin => Ok(()),
                Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => {
                    if v.is_scored() || v.is_string() {
                        Ok(())
                    } else {
                        Err(Error::Validation(format!(
                            "operator {op:?} is not supported for {} values",
                            v.type_name()
                        )))
                    }
                }
                Operator::Like => {
                    if v.is_string() {
                        Ok(())
                    } else {
                        Err(Error::Validation(format!(
                            "operator Like requires a string operand, got {}",
                            v.type_name()
                        )))
                    }
                }
            }
        }

        match (self, operand) {
            (Operator::In | Operator::Nin, QueryValue::Many(values)) => {
                for v in values {
                    check_scalar(self, v)?;
                }
                Ok(())
            }
            (Operator::In | Operator::Nin, QueryValue::One(_)) => Err(Error::Validation(
                format!("operator {self:?} requires a value list"),
            )),
            (_, QueryValue::Many(_)) => Err(Error::Validation(format!(
                "operator {self:?} takes a single operand, not a list"
            ))),
            (_, QueryValue::One(v)) => check_scalar(self, v),
        }
    }

    /// Evaluate the predicate against one field value
    ///
    /// `field` is the entity's value for the queried field; `None` and
    /// stored `Null` both mean absent. Absent fields satisfy only the
    /// complement operators (`ne`, `nin`), matching the index path's
    /// membership-set complement.
    pub fn matches(self, field: Option<&FieldValue>, operand: &QueryValue) -> bool {
        let present = field.filter(|v| !v.is_null());

        match (self, operand) {
            (Operator::Eq, QueryValue::One(v)) => present == Some(v),
            (Operator::Ne, QueryValue::One(v)) => present != Some(v),
            (Operator::Lt, QueryValue::One(v)) => {
                matches!(present.and_then(|f| f.compare(v)), Some(Ordering::Less))
            }
            (Operator::Lte, QueryValue::One(v)) => matches!(
                present.and_then(|f| f.compare(v)),
                Some(Ordering::Less | Ordering::Equal)
            ),
            (Operator::Gt, QueryValue::One(v)) => {
                matches!(present.and_then(|f| f.compare(v)), Some(Ordering::Greater))
            }
            (Operator::Gte, QueryValue::One(v)) => matches!(
                present.and_then(|f| f.compare(v)),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            (Operator::Like, QueryValue::One(v)) => match (present.and_then(|f| f.as_str()), v.as_str()) {
                (Some(field), Some(needle)) => {
                    field.to_lowercase().contains(&needle.to_lowercase())
                }
                _ => false,
            },
            (Operator::In, QueryValue::Many(values)) => match present {
                Some(f) => values.iter().any(|v| v == f),
                None => false,
            },
            (Operator::Nin, QueryValue::Many(values)) => match present {
                Some(f) => !values.iter().any(|v| v == f),
                None => true,
            },
            // Operand shape mismatches never match; check_operand rejects
            // them before execution.
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;

    fn one(v: impl Into<FieldValue>) -> QueryValue {
        QueryValue::One(v.into())
    }

    fn many(vs: Vec<FieldValue>) -> QueryValue {
        QueryValue::Many(vs)
    }

    // === Compatibility table ===

    #[test]
    fn test_index_usability() {
        assert!(Operator::Eq.usable_with_equality_index());
        assert!(Operator::Nin.usable_with_equality_index());
        assert!(!Operator::Lt.usable_with_equality_index());
        assert!(!Operator::Like.usable_with_equality_index());

        assert!(Operator::Gte.usable_with_ordered_index());
        assert!(!Operator::Eq.usable_with_ordered_index());
        assert!(!Operator::Like.usable_with_ordered_index());
    }

    #[test]
    fn test_check_operand_shapes() {
        assert!(Operator::Eq.check_operand(&one("x")).is_ok());
        assert!(Operator::Eq
            .check_operand(&many(vec![FieldValue::Int(1)]))
            .is_err());
        assert!(Operator::In
            .check_operand(&many(vec![FieldValue::Int(1)]))
            .is_ok());
        assert!(Operator::In.check_operand(&one(1i64)).is_err());
    }

    #[test]
    fn test_check_operand_types() {
        assert!(Operator::Lt.check_operand(&one(5i64)).is_ok());
        assert!(Operator::Lt.check_operand(&one("abc")).is_ok());
        assert!(Operator::Lt
            .check_operand(&one(Timestamp::from_millis(1)))
            .is_ok());
        assert!(Operator::Lt.check_operand(&one(true)).is_err());

        assert!(Operator::Like.check_operand(&one("sub")).is_ok());
        assert!(Operator::Like.check_operand(&one(1i64)).is_err());
    }

    #[test]
    fn test_check_operand_rejects_null_and_nan() {
        assert!(Operator::Eq.check_operand(&one(())).is_err());
        assert!(Operator::Gt.check_operand(&one(f64::NAN)).is_err());
        assert!(Operator::In
            .check_operand(&many(vec![FieldValue::Null]))
            .is_err());
    }

    // === Predicate evaluation ===

    #[test]
    fn test_eq_matches() {
        let f = FieldValue::String("a@x.com".into());
        assert!(Operator::Eq.matches(Some(&f), &one("a@x.com")));
        assert!(!Operator::Eq.matches(Some(&f), &one("b@x.com")));
        assert!(!Operator::Eq.matches(None, &one("a@x.com")));
    }

    #[test]
    fn test_eq_is_strict_about_types() {
        let f = FieldValue::Int(1);
        assert!(!Operator::Eq.matches(Some(&f), &one(1.0f64)));
    }

    #[test]
    fn test_ne_matches_absent() {
        assert!(Operator::Ne.matches(None, &one("x")));
        assert!(Operator::Ne.matches(Some(&FieldValue::Null), &one("x")));
        assert!(!Operator::Ne.matches(Some(&FieldValue::String("x".into())), &one("x")));
    }

    #[test]
    fn test_range_numeric() {
        let f = FieldValue::Int(25);
        assert!(Operator::Gt.matches(Some(&f), &one(20i64)));
        assert!(!Operator::Gt.matches(Some(&f), &one(25i64)));
        assert!(Operator::Gte.matches(Some(&f), &one(25i64)));
        assert!(Operator::Lt.matches(Some(&f), &one(30i64)));
        assert!(Operator::Lte.matches(Some(&f), &one(25i64)));
        // float bound against int field compares numerically
        assert!(Operator::Gt.matches(Some(&f), &one(24.5f64)));
    }

    #[test]
    fn test_range_timestamp() {
        let f = FieldValue::Timestamp(Timestamp::from_millis(200));
        assert!(Operator::Gte.matches(Some(&f), &one(Timestamp::from_millis(200))));
        assert!(!Operator::Lt.matches(Some(&f), &one(Timestamp::from_millis(200))));
    }

    #[test]
    fn test_range_string_lexicographic() {
        let f = FieldValue::String("banana".into());
        assert!(Operator::Gt.matches(Some(&f), &one("apple")));
        assert!(!Operator::Gt.matches(Some(&f), &one("cherry")));
    }

    #[test]
    fn test_range_absent_never_matches() {
        assert!(!Operator::Lt.matches(None, &one(10i64)));
        assert!(!Operator::Gte.matches(Some(&FieldValue::Null), &one(10i64)));
    }

    #[test]
    fn test_range_type_mismatch_never_matches() {
        let f = FieldValue::String("10".into());
        assert!(!Operator::Lt.matches(Some(&f), &one(20i64)));
    }

    #[test]
    fn test_like_case_insensitive_substring() {
        let f = FieldValue::String("Alice Johnson".into());
        assert!(Operator::Like.matches(Some(&f), &one("alice")));
        assert!(Operator::Like.matches(Some(&f), &one("JOHN")));
        assert!(!Operator::Like.matches(Some(&f), &one("bob")));
        assert!(!Operator::Like.matches(None, &one("alice")));
    }

    #[test]
    fn test_in_nin() {
        let f = FieldValue::Int(2);
        let set = many(vec![FieldValue::Int(1), FieldValue::Int(2)]);
        assert!(Operator::In.matches(Some(&f), &set));
        assert!(!Operator::Nin.matches(Some(&f), &set));

        let f3 = FieldValue::Int(3);
        assert!(!Operator::In.matches(Some(&f3), &set));
        assert!(Operator::Nin.matches(Some(&f3), &set));

        // absent: in never matches, nin always does
        assert!(!Operator::In.matches(None, &set));
        assert!(Operator::Nin.matches(None, &set));
    }

    #[test]
    fn test_empty_in_list() {
        let f = FieldValue::Int(1);
        assert!(!Operator::In.matches(Some(&f), &many(vec![])));
        assert!(Operator::Nin.matches(Some(&f), &many(vec![])));
    }
}
