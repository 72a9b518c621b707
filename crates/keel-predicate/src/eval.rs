// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory predicate evaluation.
//!
//! Resolution failures never escape the matcher: an unresolvable path reads as
//! null, so `IS_NULL` holds and every other operator is a non-match.

use std::cmp::Ordering;

use tracing::trace;

use crate::ast::{AtomicPredicate, CompoundPredicate, Predicate};
use crate::normalize::{
	compare_values, contains_text, ends_with_text, list_contains, starts_with_text, values_equal,
};
use crate::operator::{Conjunction, Operator};
use crate::resolve::{resolve, Inspect, Resolved};
use crate::value::Value;

pub fn matches(predicate: &Predicate, object: &dyn Inspect) -> bool {
	match predicate {
		Predicate::MatchAll => true,
		Predicate::Atomic(atom) => evaluate_atomic(atom, object),
		Predicate::Compound(compound) => evaluate_compound(compound, object),
	}
}

/// Keeps the items that satisfy `predicate`, preserving order.
pub fn filter<'a, T: Inspect>(
	predicate: &Predicate,
	items: impl IntoIterator<Item = &'a T>,
) -> Vec<&'a T> {
	items
		.into_iter()
		.filter(|item| matches(predicate, *item))
		.collect()
}

impl Predicate {
	pub fn matches(&self, object: &dyn Inspect) -> bool {
		matches(self, object)
	}
}

fn evaluate_compound(compound: &CompoundPredicate, object: &dyn Inspect) -> bool {
	let children = compound.children();
	if children.is_empty() {
		return true;
	}
	match compound.conjunction() {
		Conjunction::And => children.iter().all(|child| matches(child, object)),
		Conjunction::Or => children.iter().any(|child| matches(child, object)),
	}
}

fn evaluate_atomic(atom: &AtomicPredicate, object: &dyn Inspect) -> bool {
	let resolved = match resolve(object, atom.field()) {
		Ok(resolved) => resolved,
		Err(e) => {
			trace!(field = atom.field(), error = %e, "field did not resolve, treating as null");
			Resolved::Value(Value::Null)
		}
	};
	satisfies(&resolved, atom.operator(), atom.value())
}

/// Broadcast results satisfy the operator when any element does.
fn satisfies(resolved: &Resolved, operator: Operator, expected: &Value) -> bool {
	match resolved {
		Resolved::Many(items) => items
			.iter()
			.any(|item| satisfies(item, operator, expected)),
		Resolved::Composite => operator == Operator::IsNotNull,
		Resolved::Value(actual) => compare(actual, operator, expected),
	}
}

fn compare(actual: &Value, operator: Operator, expected: &Value) -> bool {
	match operator {
		Operator::IsNull => return actual.is_null(),
		Operator::IsNotNull => return !actual.is_null(),
		_ => {}
	}
	if actual.is_null() {
		return false;
	}

	match operator {
		Operator::Eq => values_equal(actual, expected),
		Operator::Neq => !values_equal(actual, expected),
		Operator::Gt => compare_values(actual, expected) == Some(Ordering::Greater),
		Operator::Gte => matches!(
			compare_values(actual, expected),
			Some(Ordering::Greater | Ordering::Equal)
		),
		Operator::Lt => compare_values(actual, expected) == Some(Ordering::Less),
		Operator::Lte => matches!(
			compare_values(actual, expected),
			Some(Ordering::Less | Ordering::Equal)
		),
		Operator::In => list_contains(expected, actual),
		Operator::NotIn => !list_contains(expected, actual),
		Operator::Like | Operator::Contains => contains_text(actual, expected),
		Operator::NotLike => !contains_text(actual, expected),
		Operator::StartsWith => starts_with_text(actual, expected),
		Operator::EndsWith => ends_with_text(actual, expected),
		Operator::IsNull | Operator::IsNotNull => unreachable!("null checks handled above"),
	}
}


#[cfg(test)]
mod proptest_tests {
	use proptest::prelude::*;

	use super::*;
	use crate::builder;
	use crate::parser::parse_predicate;

	const FIELDS: &[&str] = &["a", "b", "obj.x", "items.v"];

	fn arb_scalar() -> impl Strategy<Value = Value> {
		prop_oneof![
			(-50i64..50).prop_map(Value::Int),
			(-50i64..50).prop_map(|i| Value::Float(i as f64 / 2.0)),
			"[a-z\"' ]{0,6}".prop_map(Value::Text),
			any::<bool>().prop_map(Value::Bool),
		]
	}

	fn arb_atomic() -> impl Strategy<Value = Predicate> {
		let field = prop::sample::select(FIELDS);
		let op = prop::sample::select(Operator::ALL.to_vec());
		(field, op, arb_scalar(), prop::collection::vec(arb_scalar(), 1..4)).prop_map(
			|(field, op, scalar, list)| {
				let value = if op.is_null_check() {
					Value::Null
				} else if op.is_membership() {
					Value::List(list)
				} else {
					scalar
				};
				Predicate::Atomic(
					AtomicPredicate::new(field, op, value).expect("generated atom is valid"),
				)
			},
		)
	}

	fn arb_predicate() -> impl Strategy<Value = Predicate> {
		let leaf = prop_oneof![9 => arb_atomic(), 1 => Just(Predicate::MatchAll)];
		leaf.prop_recursive(3, 16, 4, |inner| {
			prop_oneof![
				prop::collection::vec(inner.clone(), 0..4).prop_map(builder::and),
				prop::collection::vec(inner, 0..4).prop_map(builder::or),
			]
		})
	}

	fn arb_document() -> impl Strategy<Value = serde_json::Value> {
		let leaf = prop_oneof![
			Just(serde_json::Value::Null),
			(-50i64..50).prop_map(|i| serde_json::json!(i)),
			(-50i64..50).prop_map(|i| serde_json::json!(i as f64 / 2.0)),
			"[a-z ]{0,4}".prop_map(|s| serde_json::json!(s)),
			any::<bool>().prop_map(|b| serde_json::json!(b)),
		];
		(
			leaf.clone(),
			leaf.clone(),
			leaf.clone(),
			prop::collection::vec(leaf, 0..3),
		)
			.prop_map(|(a, b, x, vs)| {
				let items: Vec<_> = vs.into_iter().map(|v| serde_json::json!({ "v": v })).collect();
				serde_json::json!({ "a": a, "b": b, "obj": { "x": x }, "items": items })
			})
	}

	proptest! {
		#[test]
		fn json_round_trip_is_structural(p in arb_predicate()) {
			let back = Predicate::from_json(&p.to_json()).unwrap();
			prop_assert_eq!(back, p);
		}

		#[test]
		fn text_round_trip_preserves_matching(p in arb_predicate(), doc in arb_document()) {
			let text = p.to_string();
			let back = parse_predicate(&text).unwrap();
			prop_assert_eq!(matches(&back, &doc), matches(&p, &doc), "text: {}", text);
		}

		#[test]
		fn single_child_compound_is_transparent(p in arb_atomic(), doc in arb_document()) {
			prop_assert_eq!(builder::and([p.clone()]).matches(&doc), p.matches(&doc));
			prop_assert_eq!(builder::or([p.clone()]).matches(&doc), p.matches(&doc));
		}

		#[test]
		fn matcher_never_panics(p in arb_predicate(), doc in arb_document()) {
			let _ = matches(&p, &doc);
		}
	}
}
