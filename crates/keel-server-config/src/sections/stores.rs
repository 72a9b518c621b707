// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-store table and document-field registration.
//!
//! ```toml
//! [stores.sites]
//! table = "ops.sites"
//! document_fields = { metadata = "scalar", vpas = "array_of_objects" }
//! field_mappings = { tenantId = "tenant_id" }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ConfigError;

/// Resolved store configuration. Document field kinds are kept as written;
/// the database layer parses them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
	pub table: String,
	pub document_fields: BTreeMap<String, String>,
	pub field_mappings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfigLayer {
	#[serde(default)]
	pub table: Option<String>,
	#[serde(default)]
	pub document_fields: Option<BTreeMap<String, String>>,
	#[serde(default)]
	pub field_mappings: Option<BTreeMap<String, String>>,
}

impl StoreConfigLayer {
	/// Maps merge key by key.
	pub fn merge(&mut self, other: StoreConfigLayer) {
		if other.table.is_some() {
			self.table = other.table;
		}
		merge_map(&mut self.document_fields, other.document_fields);
		merge_map(&mut self.field_mappings, other.field_mappings);
	}

	/// The table defaults to the store's name.
	pub fn finalize(self, name: &str) -> Result<StoreConfig, ConfigError> {
		let table = self.table.unwrap_or_else(|| name.to_string());
		if table.trim().is_empty() {
			return Err(ConfigError::InvalidValue {
				key: format!("stores.{name}.table"),
				message: "table name is empty".to_string(),
			});
		}
		Ok(StoreConfig {
			table,
			document_fields: self.document_fields.unwrap_or_default(),
			field_mappings: self.field_mappings.unwrap_or_default(),
		})
	}
}

fn merge_map(target: &mut Option<BTreeMap<String, String>>, source: Option<BTreeMap<String, String>>) {
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => t.extend(s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_table_defaults_to_name() {
		let config = StoreConfigLayer::default().finalize("sites").unwrap();
		assert_eq!(config.table, "sites");
		assert!(config.document_fields.is_empty());
	}

	#[test]
	fn test_empty_table_rejected() {
		let layer = StoreConfigLayer {
			table: Some("  ".to_string()),
			..Default::default()
		};
		let err = layer.finalize("sites").unwrap_err();
		assert!(err.to_string().contains("stores.sites.table"));
	}

	#[test]
	fn test_merge_extends_maps() {
		let mut base: StoreConfigLayer = toml::from_str(
			r#"
			table = "sites"
			document_fields = { metadata = "scalar", vpas = "unknown" }
			"#,
		)
		.unwrap();
		let overlay: StoreConfigLayer = toml::from_str(
			r#"
			document_fields = { vpas = "array_of_objects" }
			field_mappings = { tenantId = "tenant_id" }
			"#,
		)
		.unwrap();
		base.merge(overlay);

		let config = base.finalize("ignored").unwrap();
		assert_eq!(config.table, "sites");
		assert_eq!(config.document_fields["metadata"], "scalar");
		assert_eq!(config.document_fields["vpas"], "array_of_objects");
		assert_eq!(config.field_mappings["tenantId"], "tenant_id");
	}
}
