// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Paging limits for predicate queries.

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
	pub default_page_size: u64,
	pub max_page_size: u64,
}

impl Default for QueryConfig {
	fn default() -> Self {
		Self {
			default_page_size: DEFAULT_PAGE_SIZE,
			max_page_size: MAX_PAGE_SIZE,
		}
	}
}

impl QueryConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.default_page_size == 0 || self.max_page_size == 0 {
			return Err(ConfigError::Validation(
				"query page sizes must be greater than zero".to_string(),
			));
		}
		if self.default_page_size > self.max_page_size {
			return Err(ConfigError::Validation(format!(
				"query.default_page_size ({}) exceeds query.max_page_size ({})",
				self.default_page_size, self.max_page_size
			)));
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryConfigLayer {
	#[serde(default)]
	pub default_page_size: Option<u64>,
	#[serde(default)]
	pub max_page_size: Option<u64>,
}

impl QueryConfigLayer {
	pub fn merge(&mut self, other: QueryConfigLayer) {
		if other.default_page_size.is_some() {
			self.default_page_size = other.default_page_size;
		}
		if other.max_page_size.is_some() {
			self.max_page_size = other.max_page_size;
		}
	}

	pub fn finalize(self) -> QueryConfig {
		QueryConfig {
			default_page_size: self.default_page_size.unwrap_or(DEFAULT_PAGE_SIZE),
			max_page_size: self.max_page_size.unwrap_or(MAX_PAGE_SIZE),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_are_valid() {
		let config = QueryConfigLayer::default().finalize();
		assert_eq!(config, QueryConfig::default());
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_default_above_max_rejected() {
		let config = QueryConfig {
			default_page_size: 100,
			max_page_size: 20,
		};
		assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_zero_rejected() {
		let config = QueryConfig {
			default_page_size: 0,
			max_page_size: 20,
		};
		assert!(config.validate().is_err());
	}
}
