// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JSON wire format.
//!
//! ```text
//! atomic:   {"field": "a.b", "operator": "=", "value": 1}
//! compound: {"operator": "AND", "predicates": [ ... ]}
//! matchAll: {"type": "matchAll"}
//! ```
//!
//! Nodes are told apart by the presence of a `predicates` key (`children` is
//! accepted as an alias on input). The raw document shape is inspected only
//! here; everything downstream works on [`Predicate`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map};

use crate::ast::{AtomicPredicate, CompoundPredicate, Predicate};
use crate::error::{PredicateError, Result};
use crate::operator::{Conjunction, Operator};
use crate::value::Value;

const MATCH_ALL_TAG: &str = "matchAll";

impl Predicate {
	pub fn to_json_value(&self) -> serde_json::Value {
		match self {
			Predicate::MatchAll => json!({ "type": MATCH_ALL_TAG }),
			Predicate::Atomic(atom) => {
				let mut obj = Map::new();
				obj.insert("field".to_string(), json!(atom.field()));
				obj.insert("operator".to_string(), json!(atom.operator().as_str()));
				if !atom.operator().is_null_check() {
					obj.insert("value".to_string(), atom.value().to_json());
				}
				serde_json::Value::Object(obj)
			}
			Predicate::Compound(compound) => json!({
				"operator": compound.conjunction().as_str(),
				"predicates": compound
					.children()
					.iter()
					.map(Predicate::to_json_value)
					.collect::<Vec<_>>(),
			}),
		}
	}

	pub fn from_json_value(json: &serde_json::Value) -> Result<Self> {
		let obj = json
			.as_object()
			.ok_or_else(|| PredicateError::Malformed(format!("expected an object, got {json}")))?;

		if let Some(tag) = obj.get("type") {
			return match tag.as_str() {
				Some(t) if t.eq_ignore_ascii_case(MATCH_ALL_TAG) => Ok(Predicate::MatchAll),
				_ => Err(PredicateError::Malformed(format!(
					"unknown predicate type {tag}"
				))),
			};
		}

		match obj.get("predicates").or_else(|| obj.get("children")) {
			Some(children) => decode_compound(obj, children),
			None => decode_atomic(obj),
		}
	}

	pub fn to_json(&self) -> String {
		self.to_json_value().to_string()
	}

	pub fn from_json(input: &str) -> Result<Self> {
		let json: serde_json::Value =
			serde_json::from_str(input).map_err(|e| PredicateError::Malformed(e.to_string()))?;
		Self::from_json_value(&json)
	}
}

fn required_str<'a>(obj: &'a Map<String, serde_json::Value>, key: &str) -> Result<&'a str> {
	obj
		.get(key)
		.and_then(serde_json::Value::as_str)
		.ok_or_else(|| PredicateError::Malformed(format!("missing string field '{key}'")))
}

fn decode_compound(
	obj: &Map<String, serde_json::Value>,
	children: &serde_json::Value,
) -> Result<Predicate> {
	let conjunction: Conjunction = required_str(obj, "operator")?.parse()?;
	let items = children
		.as_array()
		.ok_or_else(|| PredicateError::Malformed("'predicates' must be an array".to_string()))?;

	let children = items
		.iter()
		.enumerate()
		.map(|(index, child)| {
			Predicate::from_json_value(child).map_err(|e| match e {
				PredicateError::UnknownOperator(_) | PredicateError::UnknownConjunction(_) => e,
				other => PredicateError::MalformedChild {
					index,
					reason: other.to_string(),
				},
			})
		})
		.collect::<Result<Vec<_>>>()?;

	Ok(Predicate::Compound(CompoundPredicate::new(conjunction, children)))
}

fn decode_atomic(obj: &Map<String, serde_json::Value>) -> Result<Predicate> {
	let field = required_str(obj, "field")?;
	let operator: Operator = required_str(obj, "operator")?.parse()?;
	let value = match obj.get("value") {
		Some(v) => Value::from_json(v)?,
		None => Value::Null,
	};
	Ok(Predicate::Atomic(AtomicPredicate::new(field, operator, value)?))
}

impl Serialize for Predicate {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		self.to_json_value().serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for Predicate {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		let json = serde_json::Value::deserialize(deserializer)?;
		Predicate::from_json_value(&json).map_err(serde::de::Error::custom)
	}
}
