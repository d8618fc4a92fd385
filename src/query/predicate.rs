//! Record predicates
//!
//! Equality is exact JSON equality: the string `"64"` never equals the number
//! `64`, and `4` never equals `4.0`. Ordering comparisons apply to numbers only.

use std::io::Write;
use std::ops::Not;

use serde_json::Value;

use crate::experiment::ResultRecord;
use crate::{Error, Result};

/// Numeric comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
        }
    }
}

/// Filter over result records
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every record
    Always,
    /// Field present and exactly equal
    Eq(String, Value),
    /// Field present and not equal
    NotEq(String, Value),
    /// Field is a number and compares against the bound
    Compare {
        /// Field name
        key: String,
        /// Operator
        op: CompareOp,
        /// Right-hand bound
        value: f64,
    },
    /// Field present and not null
    Exists(String),
    /// Every inner predicate matches (vacuously true when empty)
    And(Vec<Predicate>),
    /// Some inner predicate matches
    Or(Vec<Predicate>),
    /// Inner predicate does not match
    Not(Box<Predicate>),
}

impl Predicate {
    /// `key == value`
    #[must_use]
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(key.into(), value.into())
    }

    /// Numeric comparison `key <op> value`
    #[must_use]
    pub fn compare(key: impl Into<String>, op: CompareOp, value: f64) -> Self {
        Self::Compare {
            key: key.into(),
            op,
            value,
        }
    }

    /// Conjunction of pairwise equalities; pairs beyond the shorter slice are ignored.
    #[must_use]
    pub fn all_equal<K: AsRef<str>>(keys: &[K], values: &[Value]) -> Self {
        Self::And(
            keys.iter()
                .zip(values)
                .map(|(k, v)| Self::Eq(k.as_ref().to_string(), v.clone()))
                .collect(),
        )
    }

    /// Both predicates match.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::And(mut inner) => {
                inner.push(other);
                Self::And(inner)
            }
            Self::Always => other,
            first => Self::And(vec![first, other]),
        }
    }

    /// Either predicate matches.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Or(mut inner) => {
                inner.push(other);
                Self::Or(inner)
            }
            first => Self::Or(vec![first, other]),
        }
    }

    /// Evaluate against one record.
    #[must_use]
    pub fn matches(&self, record: &ResultRecord) -> bool {
        match self {
            Self::Always => true,
            Self::Eq(key, value) => record.get(key) == Some(value),
            Self::NotEq(key, value) => record.get(key).is_some_and(|v| v != value),
            Self::Compare { key, op, value } => record
                .get(key)
                .and_then(Value::as_f64)
                .is_some_and(|v| op.apply(v, *value)),
            Self::Exists(key) => record.get(key).is_some_and(|v| !v.is_null()),
            Self::And(inner) => inner.iter().all(|p| p.matches(record)),
            Self::Or(inner) => inner.iter().any(|p| p.matches(record)),
            Self::Not(inner) => !inner.matches(record),
        }
    }
}

impl Not for Predicate {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}

/// Records whose `keys[i]` exactly equals `values[i]` for every `i`.
///
/// # Errors
///
/// Returns `InvalidInput` if `keys` and `values` differ in length; this is
/// checked before any record is looked at.
pub fn filter_by<'a, K: AsRef<str>>(
    records: &'a [ResultRecord],
    keys: &[K],
    values: &[Value],
) -> Result<Vec<&'a ResultRecord>> {
    if keys.len() != values.len() {
        return Err(Error::InvalidInput(format!(
            "filter has {} keys but {} values",
            keys.len(),
            values.len()
        )));
    }

    let predicate = Predicate::all_equal(keys, values);
    Ok(records.iter().filter(|r| predicate.matches(r)).collect())
}

/// Write each record as one JSON line. Nothing is written for no matches.
///
/// # Errors
///
/// Returns error if serialization or the write fails
pub fn print_matches<W: Write>(out: &mut W, matches: &[&ResultRecord]) -> Result<()> {
    for record in matches {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
    }
    Ok(())
}
