// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::sections::{DatabaseConfigLayer, LoggingConfigLayer, QueryConfigLayer, StoreConfigLayer};

/// Keel configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeelConfigLayer {
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub query: Option<QueryConfigLayer>,
	#[serde(default)]
	pub stores: Option<BTreeMap<String, StoreConfigLayer>>,
}

impl KeelConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: KeelConfigLayer) {
		merge_option(
			&mut self.database,
			other.database,
			DatabaseConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_option(&mut self.query, other.query, QueryConfigLayer::merge);
		merge_option(&mut self.stores, other.stores, |stores, incoming| {
			for (name, layer) in incoming {
				stores.entry(name).or_default().merge(layer);
			}
		});
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}
