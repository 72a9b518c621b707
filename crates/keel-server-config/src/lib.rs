// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for Keel.
//!
//! Sources are applied lowest precedence first: built-in defaults, then a
//! TOML file, then `KEEL_*` environment variables.
//!
//! ```ignore
//! use keel_server_config::load_config_with_file;
//!
//! let config = load_config_with_file("keel.toml")?;
//! let sites = config.store("sites");
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

use std::collections::BTreeMap;

pub use error::{ConfigError, Result};
pub use layer::KeelConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct KeelConfig {
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub query: QueryConfig,
	pub stores: BTreeMap<String, StoreConfig>,
}

impl KeelConfig {
	pub fn store(&self, name: &str) -> Option<&StoreConfig> {
		self.stores.get(name)
	}
}

/// Load configuration from defaults, `/etc/keel/keel.toml` and the environment.
pub fn load_config() -> Result<KeelConfig> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(config_path: impl Into<std::path::PathBuf>) -> Result<KeelConfig> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<KeelConfig> {
	let mut merged = KeelConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<KeelConfig> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = KeelConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

fn finalize(layer: KeelConfigLayer) -> Result<KeelConfig> {
	let database = layer.database.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let query = layer.query.unwrap_or_default().finalize();
	let stores = layer
		.stores
		.unwrap_or_default()
		.into_iter()
		.map(|(name, store)| store.finalize(&name).map(|config| (name, config)))
		.collect::<Result<BTreeMap<_, _>>>()?;

	query.validate()?;

	info!(
		max_connections = database.max_connections,
		log_level = %logging.level,
		default_page_size = query.default_page_size,
		max_page_size = query.max_page_size,
		stores = stores.len(),
		"Keel configuration loaded"
	);

	Ok(KeelConfig {
		database,
		logging,
		query,
		stores,
	})
}
