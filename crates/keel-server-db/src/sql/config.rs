// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How a JSONB document column is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonFieldType {
	/// A single JSON value, usually an object navigated by path.
	Scalar,
	/// A JSON array of primitives.
	ArrayOfScalars,
	/// A JSON array of objects, searched element by element.
	ArrayOfObjects,
	/// Shape decided per row with `jsonb_typeof`.
	Unknown,
}

impl JsonFieldType {
	pub fn as_str(&self) -> &'static str {
		match self {
			JsonFieldType::Scalar => "scalar",
			JsonFieldType::ArrayOfScalars => "array_of_scalars",
			JsonFieldType::ArrayOfObjects => "array_of_objects",
			JsonFieldType::Unknown => "unknown",
		}
	}

	pub fn is_array(&self) -> bool {
		matches!(
			self,
			JsonFieldType::ArrayOfScalars | JsonFieldType::ArrayOfObjects
		)
	}
}

impl fmt::Display for JsonFieldType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for JsonFieldType {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.to_ascii_lowercase().replace('-', "_").as_str() {
			"scalar" => Ok(JsonFieldType::Scalar),
			"array_of_scalars" => Ok(JsonFieldType::ArrayOfScalars),
			"array_of_objects" => Ok(JsonFieldType::ArrayOfObjects),
			"unknown" => Ok(JsonFieldType::Unknown),
			_ => Err(format!("unknown document field type: {s}")),
		}
	}
}

/// Per-store compiler settings. Frozen once built; share it behind the
/// compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerConfig {
	document_fields: HashMap<String, JsonFieldType>,
	field_mappings: HashMap<String, String>,
}

impl CompilerConfig {
	pub fn builder() -> CompilerConfigBuilder {
		CompilerConfigBuilder::default()
	}

	/// Document classification of a physical column, if it holds JSONB.
	pub fn document_field(&self, column: &str) -> Option<JsonFieldType> {
		self
			.document_fields
			.get(&column.to_ascii_lowercase())
			.copied()
	}

	/// Physical column for a predicate root field. Unmapped fields are
	/// lower-cased.
	pub fn column_for(&self, field: &str) -> String {
		let key = field.to_ascii_lowercase();
		self.field_mappings.get(&key).cloned().unwrap_or(key)
	}

	pub fn document_fields(&self) -> impl Iterator<Item = (&str, JsonFieldType)> {
		self
			.document_fields
			.iter()
			.map(|(name, kind)| (name.as_str(), *kind))
	}

	pub fn field_mappings(&self) -> impl Iterator<Item = (&str, &str)> {
		self
			.field_mappings
			.iter()
			.map(|(field, column)| (field.as_str(), column.as_str()))
	}
}

#[derive(Debug, Clone, Default)]
pub struct CompilerConfigBuilder {
	config: CompilerConfig,
}

impl CompilerConfigBuilder {
	pub fn document_field(mut self, column: impl Into<String>, kind: JsonFieldType) -> Self {
		self
			.config
			.document_fields
			.insert(column.into().to_ascii_lowercase(), kind);
		self
	}

	/// Route predicate field `field` (matched case-insensitively) to `column`.
	pub fn field_mapping(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
		self
			.config
			.field_mappings
			.insert(field.into().to_ascii_lowercase(), column.into());
		self
	}

	pub fn build(self) -> CompilerConfig {
		self.config
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_field_type_parsing() {
		assert_eq!(
			"array_of_objects".parse::<JsonFieldType>().unwrap(),
			JsonFieldType::ArrayOfObjects
		);
		assert_eq!(
			"Array-Of-Scalars".parse::<JsonFieldType>().unwrap(),
			JsonFieldType::ArrayOfScalars
		);
		assert!("map".parse::<JsonFieldType>().is_err());
	}

	#[test]
	fn test_field_type_round_trips_through_display() {
		for kind in [
			JsonFieldType::Scalar,
			JsonFieldType::ArrayOfScalars,
			JsonFieldType::ArrayOfObjects,
			JsonFieldType::Unknown,
		] {
			assert_eq!(kind.to_string().parse::<JsonFieldType>().unwrap(), kind);
		}
	}

	#[test]
	fn test_lookups_are_case_insensitive() {
		let config = CompilerConfig::builder()
			.document_field("Metadata", JsonFieldType::Scalar)
			.field_mapping("tenantId", "tenant_id")
			.build();

		assert_eq!(
			config.document_field("metadata"),
			Some(JsonFieldType::Scalar)
		);
		assert_eq!(config.column_for("TENANTID"), "tenant_id");
		assert_eq!(config.column_for("Name"), "name");
		assert_eq!(config.document_field("name"), None);
	}
}
