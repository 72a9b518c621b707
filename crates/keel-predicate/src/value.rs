// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Comparison values carried by atomic predicates.
//!
//! Every runtime representation collapses into one of a handful of variants
//! when it is converted into a [`Value`]: all signed widths become `Int`, all
//! unsigned widths become `UInt`, all float widths become `Float` and every
//! string-like type becomes `Text`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PredicateError;

#[derive(Debug, Clone)]
pub enum Value {
	Null,
	Bool(bool),
	Int(i64),
	UInt(u64),
	Float(f64),
	Text(String),
	List(Vec<Value>),
}

impl Value {
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	pub fn is_numeric(&self) -> bool {
		matches!(self, Value::Int(_) | Value::UInt(_) | Value::Float(_))
	}

	pub fn as_list(&self) -> Option<&[Value]> {
		match self {
			Value::List(items) => Some(items),
			_ => None,
		}
	}

	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "bool",
			Value::Int(_) => "int",
			Value::UInt(_) => "uint",
			Value::Float(_) => "float",
			Value::Text(_) => "text",
			Value::List(_) => "list",
		}
	}

	/// Decode a JSON value. Objects are rejected: predicate values are
	/// scalars or lists of scalars.
	pub fn from_json(json: &serde_json::Value) -> Result<Self, PredicateError> {
		Ok(match json {
			serde_json::Value::Null => Value::Null,
			serde_json::Value::Bool(b) => Value::Bool(*b),
			serde_json::Value::Number(n) => {
				if let Some(i) = n.as_i64() {
					Value::Int(i)
				} else if let Some(u) = n.as_u64() {
					Value::UInt(u)
				} else {
					Value::Float(n.as_f64().unwrap_or(f64::NAN))
				}
			}
			serde_json::Value::String(s) => Value::Text(s.clone()),
			serde_json::Value::Array(items) => Value::List(
				items
					.iter()
					.map(Value::from_json)
					.collect::<Result<Vec<_>, _>>()?,
			),
			serde_json::Value::Object(_) => {
				return Err(PredicateError::Malformed(
					"predicate values must be scalars or lists, not objects".to_string(),
				))
			}
		})
	}

	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Value::Null => serde_json::Value::Null,
			Value::Bool(b) => serde_json::Value::Bool(*b),
			Value::Int(i) => serde_json::Value::from(*i),
			Value::UInt(u) => serde_json::Value::from(*u),
			Value::Float(f) => serde_json::Value::from(*f),
			Value::Text(s) => serde_json::Value::String(s.clone()),
			Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
		}
	}
}

/// Structural equality. Integers compare by value regardless of signedness,
/// so a small `UInt` equals the `Int` it decodes back into.
impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Null, Value::Null) => true,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::Int(a), Value::Int(b)) => a == b,
			(Value::UInt(a), Value::UInt(b)) => a == b,
			(Value::Int(a), Value::UInt(b)) | (Value::UInt(b), Value::Int(a)) => {
				u64::try_from(*a).map(|a| a == *b).unwrap_or(false)
			}
			(Value::Float(a), Value::Float(b)) => a == b,
			(Value::Text(a), Value::Text(b)) => a == b,
			(Value::List(a), Value::List(b)) => a == b,
			_ => false,
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => write!(f, "null"),
			Value::Bool(b) => write!(f, "{b}"),
			Value::Int(i) => write!(f, "{i}"),
			Value::UInt(u) => write!(f, "{u}"),
			Value::Float(x) => write!(f, "{x:?}"),
			Value::Text(s) => {
				write!(f, "\"")?;
				for c in s.chars() {
					match c {
						'"' => write!(f, "\\\"")?,
						'\\' => write!(f, "\\\\")?,
						c => write!(f, "{c}")?,
					}
				}
				write!(f, "\"")
			}
			Value::List(items) => {
				write!(f, "(")?;
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{item}")?;
				}
				write!(f, ")")
			}
		}
	}
}

impl Serialize for Value {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.to_json().serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for Value {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let json = serde_json::Value::deserialize(deserializer)?;
		Value::from_json(&json).map_err(serde::de::Error::custom)
	}
}

macro_rules! impl_from_signed {
	($($ty:ty),*) => {
		$(impl From<$ty> for Value {
			fn from(v: $ty) -> Self {
				Value::Int(v as i64)
			}
		})*
	};
}

macro_rules! impl_from_unsigned {
	($($ty:ty),*) => {
		$(impl From<$ty> for Value {
			fn from(v: $ty) -> Self {
				Value::UInt(v as u64)
			}
		})*
	};
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for Value {
	fn from(v: f32) -> Self {
		Value::Float(f64::from(v))
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Self {
		Value::Float(v)
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Value::Bool(v)
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Value::Text(v)
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Value::Text(v.to_string())
	}
}

impl From<&String> for Value {
	fn from(v: &String) -> Self {
		Value::Text(v.clone())
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		v.map(Into::into).unwrap_or(Value::Null)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(v: Vec<T>) -> Self {
		Value::List(v.into_iter().map(Into::into).collect())
	}
}

impl From<serde_json::Value> for Value {
	/// Lossy conversion: objects become their JSON text.
	fn from(v: serde_json::Value) -> Self {
		match v {
			serde_json::Value::Object(_) => Value::Text(v.to_string()),
			other => Value::from_json(&other).unwrap_or(Value::Null),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_widths_collapse() {
		assert_eq!(Value::from(7i8), Value::Int(7));
		assert_eq!(Value::from(7i32), Value::Int(7));
		assert!(matches!(Value::from(7u16), Value::UInt(7)));
		assert!(matches!(Value::from(1.5f32), Value::Float(f) if f == 1.5));
		assert_eq!(Value::from("x"), Value::Text("x".to_string()));
	}

	#[test]
	fn test_int_uint_structural_equality() {
		assert_eq!(Value::UInt(3), Value::Int(3));
		assert_ne!(Value::UInt(3), Value::Int(-3));
		assert_ne!(Value::Int(1), Value::Float(1.0));
	}

	#[test]
	fn test_from_json_numbers() {
		assert_eq!(Value::from_json(&serde_json::json!(5)).unwrap(), Value::Int(5));
		assert!(matches!(
			Value::from_json(&serde_json::json!(u64::MAX)).unwrap(),
			Value::UInt(u64::MAX)
		));
		assert!(matches!(
			Value::from_json(&serde_json::json!(2.5)).unwrap(),
			Value::Float(f) if f == 2.5
		));
	}

	#[test]
	fn test_from_json_rejects_objects() {
		let result = Value::from_json(&serde_json::json!({"a": 1}));
		assert!(matches!(result, Err(PredicateError::Malformed(_))));
	}

	#[test]
	fn test_display_escapes_text() {
		let value = Value::Text(r#"say "hi" \o/"#.to_string());
		assert_eq!(value.to_string(), r#""say \"hi\" \\o/""#);
	}

	#[test]
	fn test_display_keeps_float_marker() {
		assert_eq!(Value::Float(30.0).to_string(), "30.0");
		assert_eq!(
			Value::List(vec![Value::Int(1), Value::Text("a".into())]).to_string(),
			r#"(1, "a")"#
		);
	}
}
