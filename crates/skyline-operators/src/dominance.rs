//! Pareto dominance between two tuples over a preference list.

use std::cmp::Ordering;

use skyline_core::schema::Schema;
use skyline_core::types::{Scalar, Tuple};

use crate::error::{OpError, Result};
use crate::preference::{Direction, Preference};

/// True iff `a` is no worse than `b` on every preferred attribute and strictly
/// better on at least one. An empty preference list dominates nothing.
///
/// Numbers compare numerically, strings byte-lexicographically. Both values
/// must carry the field's declared type.
pub fn dominates(a: &Tuple, b: &Tuple, schema: &Schema, prefs: &[Preference]) -> Result<bool> {
    let mut strictly_better = false;
    for pref in prefs {
        match compare_attr(a, b, schema, pref)? {
            Ordering::Greater => return Ok(false),
            Ordering::Less => strictly_better = true,
            Ordering::Equal => {}
        }
    }
    Ok(strictly_better)
}

/// How `a` ranks against `b` on one attribute: `Less` means `a` is better.
pub fn compare_attr(a: &Tuple, b: &Tuple, schema: &Schema, pref: &Preference) -> Result<Ordering> {
    let idx = pref.index;
    let field = schema.field(idx).ok_or_else(|| {
        OpError::Schema(format!(
            "attribute {idx} out of range for schema of {} fields",
            schema.len()
        ))
    })?;
    let x = value_at(a, idx)?;
    let y = value_at(b, idx)?;

    for v in [x, y] {
        if v.data_type() != field.data_type {
            return Err(OpError::TypeMismatch {
                index: idx,
                left: field.data_type,
                right: v.data_type(),
            });
        }
    }
    let ord = x.cmp_same_type(y).ok_or(OpError::TypeMismatch {
        index: idx,
        left: x.data_type(),
        right: y.data_type(),
    })?;

    Ok(match pref.direction {
        Direction::Minimize => ord,
        Direction::Maximize => ord.reverse(),
    })
}

fn value_at(t: &Tuple, idx: usize) -> Result<&Scalar> {
    t.get(idx)
        .ok_or_else(|| OpError::Schema(format!("tuple has no attribute {idx}")))
}
