// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use keel_predicate::Value;
use serde::Serialize;
use sqlx::postgres::PgArguments;
use sqlx::Arguments;

use crate::error::{DbError, Result};

/// A positional SQL argument.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
	Json(serde_json::Value),
}

impl SqlArg {
	/// Native binding of a predicate value. Unsigned values past `i64::MAX`
	/// fall back to `Float`; lists travel as JSON.
	pub fn from_value(value: &Value) -> Self {
		match value {
			Value::Null => SqlArg::Null,
			Value::Bool(b) => SqlArg::Bool(*b),
			Value::Int(i) => SqlArg::Int(*i),
			Value::UInt(u) => i64::try_from(*u)
				.map(SqlArg::Int)
				.unwrap_or(SqlArg::Float(*u as f64)),
			Value::Float(f) => SqlArg::Float(*f),
			Value::Text(s) => SqlArg::Text(s.clone()),
			Value::List(_) => SqlArg::Json(value.to_json()),
		}
	}

	/// Serialize `value` as a JSONB document. Object keys are lower-cased at
	/// every depth so stored paths line up with compiled accessors.
	pub fn document<T: Serialize>(value: &T) -> Result<Self> {
		let json = serde_json::to_value(value)?;
		Ok(SqlArg::Json(lowercase_keys(json)))
	}

	pub fn is_null(&self) -> bool {
		matches!(self, SqlArg::Null)
	}
}

impl From<bool> for SqlArg {
	fn from(value: bool) -> Self {
		SqlArg::Bool(value)
	}
}

impl From<i32> for SqlArg {
	fn from(value: i32) -> Self {
		SqlArg::Int(value.into())
	}
}

impl From<i64> for SqlArg {
	fn from(value: i64) -> Self {
		SqlArg::Int(value)
	}
}

impl From<f64> for SqlArg {
	fn from(value: f64) -> Self {
		SqlArg::Float(value)
	}
}

impl From<&str> for SqlArg {
	fn from(value: &str) -> Self {
		SqlArg::Text(value.to_string())
	}
}

impl From<String> for SqlArg {
	fn from(value: String) -> Self {
		SqlArg::Text(value)
	}
}

impl<T: Into<SqlArg>> From<Option<T>> for SqlArg {
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or(SqlArg::Null)
	}
}

pub fn lowercase_keys(json: serde_json::Value) -> serde_json::Value {
	match json {
		serde_json::Value::Object(map) => serde_json::Value::Object(
			map
				.into_iter()
				.map(|(key, value)| (key.to_lowercase(), lowercase_keys(value)))
				.collect(),
		),
		serde_json::Value::Array(items) => {
			serde_json::Value::Array(items.into_iter().map(lowercase_keys).collect())
		}
		other => other,
	}
}

/// Encode positional arguments for `sqlx::query_with` and friends.
pub fn to_arguments(args: &[SqlArg]) -> Result<PgArguments> {
	let mut arguments = PgArguments::default();
	for arg in args {
		let added = match arg {
			SqlArg::Null => arguments.add(None::<String>),
			SqlArg::Bool(b) => arguments.add(*b),
			SqlArg::Int(i) => arguments.add(*i),
			SqlArg::Float(f) => arguments.add(*f),
			SqlArg::Text(s) => arguments.add(s.clone()),
			SqlArg::Json(v) => arguments.add(sqlx::types::Json(v.clone())),
		};
		added.map_err(|e| DbError::Internal(format!("failed to encode argument: {e}")))?;
	}
	Ok(arguments)
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_from_value() {
		assert_eq!(SqlArg::from_value(&Value::Int(-3)), SqlArg::Int(-3));
		assert_eq!(SqlArg::from_value(&Value::UInt(7)), SqlArg::Int(7));
		assert_eq!(
			SqlArg::from_value(&Value::UInt(u64::MAX)),
			SqlArg::Float(u64::MAX as f64)
		);
		assert_eq!(
			SqlArg::from_value(&Value::from(vec!["a", "b"])),
			SqlArg::Json(json!(["a", "b"]))
		);
	}

	#[test]
	fn test_document_lowercases_nested_keys() {
		#[derive(Serialize)]
		#[serde(rename_all = "PascalCase")]
		struct Cell {
			id: String,
		}

		#[derive(Serialize)]
		#[serde(rename_all = "PascalCase")]
		struct Vpa {
			name: String,
			cell: Cell,
		}

		let arg = SqlArg::document(&vec![Vpa {
			name: "a".to_string(),
			cell: Cell {
				id: "c1".to_string(),
			},
		}])
		.unwrap();

		assert_eq!(
			arg,
			SqlArg::Json(json!([{"name": "a", "cell": {"id": "c1"}}]))
		);
	}

	#[test]
	fn test_option_into_null() {
		assert_eq!(SqlArg::from(None::<String>), SqlArg::Null);
		assert_eq!(SqlArg::from(Some(4i64)), SqlArg::Int(4));
	}

	#[test]
	fn test_to_arguments_accepts_every_variant() {
		let args = [
			SqlArg::Null,
			SqlArg::Bool(true),
			SqlArg::Int(1),
			SqlArg::Float(1.5),
			SqlArg::Text("x".to_string()),
			SqlArg::Json(json!({"a": 1})),
		];
		assert!(to_arguments(&args).is_ok());
	}
}
