// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Representation-independent comparison of [`Value`]s.
//!
//! Width normalisation happens when a runtime value is converted into a
//! `Value`; this module defines how the canonical variants compare. Numeric
//! pairs compare in `f64` space, so `30i32`, `30u8` and `30.0` are all equal.

use std::cmp::Ordering;

use crate::value::Value;

pub fn as_f64(value: &Value) -> Option<f64> {
	match value {
		Value::Int(i) => Some(*i as f64),
		Value::UInt(u) => Some(*u as f64),
		Value::Float(f) => Some(*f),
		_ => None,
	}
}

/// String form used by the substring operators and lexicographic ordering.
pub fn to_text(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::Text(s) => s.clone(),
		Value::Float(f) => f.to_string(),
		other => other.to_string(),
	}
}

pub fn values_equal(left: &Value, right: &Value) -> bool {
	match (as_f64(left), as_f64(right)) {
		(Some(l), Some(r)) => l == r,
		_ => match (left, right) {
			(Value::Null, Value::Null) => true,
			(Value::Bool(l), Value::Bool(r)) => l == r,
			(Value::Text(l), Value::Text(r)) => l == r,
			(Value::List(l), Value::List(r)) => {
				l.len() == r.len() && l.iter().zip(r).all(|(a, b)| values_equal(a, b))
			}
			_ => false,
		},
	}
}

/// Ordering for `>`, `>=`, `<`, `<=`. `None` means the pair is not ordered:
/// a null on either side, a NaN, a list, or one numeric and one non-numeric
/// operand. Two non-numeric operands order by their text form.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
	if left.is_null() || right.is_null() {
		return None;
	}
	if matches!(left, Value::List(_)) || matches!(right, Value::List(_)) {
		return None;
	}
	match (as_f64(left), as_f64(right)) {
		(Some(l), Some(r)) => l.partial_cmp(&r),
		(None, None) => Some(to_text(left).cmp(&to_text(right))),
		_ => None,
	}
}

pub fn contains_text(haystack: &Value, needle: &Value) -> bool {
	to_text(haystack).contains(&to_text(needle))
}

pub fn starts_with_text(value: &Value, prefix: &Value) -> bool {
	to_text(value).starts_with(&to_text(prefix))
}

pub fn ends_with_text(value: &Value, suffix: &Value) -> bool {
	to_text(value).ends_with(&to_text(suffix))
}

/// Membership using [`values_equal`] per element.
pub fn list_contains(list: &Value, item: &Value) -> bool {
	list
		.as_list()
		.map(|items| items.iter().any(|candidate| values_equal(candidate, item)))
		.unwrap_or(false)
}
