// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod commands;
mod logging;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use keel_server_config::{load_config, load_config_with_file, KeelConfig};
use keel_server_db::create_pool;
use tracing::info;

use commands::InputFormat;

/// Keel - inspect, compile and evaluate entity predicates
#[derive(Parser, Debug)]
#[command(name = "keel", version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Log filter (overrides config)
	#[arg(short, long, global = true)]
	log_level: Option<String>,

	/// Output logs as JSON (overrides config)
	#[arg(long, global = true)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Parse a predicate and print its JSON and expression forms
	Parse {
		predicate: String,
		#[arg(long, value_enum, default_value_t = InputFormat::Auto)]
		format: InputFormat,
	},
	/// Compile a predicate to a Postgres WHERE fragment
	Compile {
		predicate: String,
		#[arg(long, value_enum, default_value_t = InputFormat::Auto)]
		format: InputFormat,
		/// Store whose document fields and mappings apply
		#[arg(short, long)]
		store: Option<String>,
		/// Number of the first placeholder
		#[arg(long, default_value_t = 1)]
		first_placeholder: usize,
	},
	/// Evaluate a predicate against a JSON document; exits 1 on no match
	Match {
		predicate: String,
		#[arg(long, value_enum, default_value_t = InputFormat::Auto)]
		format: InputFormat,
		/// Document file (reads stdin when omitted)
		#[arg(short, long)]
		document: Option<PathBuf>,
	},
	/// Count rows of a configured store that satisfy a predicate
	Count {
		predicate: String,
		#[arg(long, value_enum, default_value_t = InputFormat::Auto)]
		format: InputFormat,
		#[arg(short, long)]
		store: String,
	},
	/// Print one page of matching rows of a configured store as JSON
	Find {
		predicate: String,
		#[arg(long, value_enum, default_value_t = InputFormat::Auto)]
		format: InputFormat,
		#[arg(short, long)]
		store: String,
		/// Zero-based page number
		#[arg(long, default_value_t = 0)]
		page: u64,
		/// Rows per page (defaults to query.default_page_size)
		#[arg(long)]
		limit: Option<u64>,
	},
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
	let args = Args::parse();

	let mut config = match &args.config {
		Some(path) => load_config_with_file(path),
		None => load_config(),
	}
	.context("failed to load configuration")?;
	if let Some(level) = &args.log_level {
		config.logging.level = level.clone();
	}
	if args.json_logs {
		config.logging.json = true;
	}
	logging::init_tracing(&config.logging);

	run(args.command, &config).await
}

async fn run(command: Command, config: &KeelConfig) -> Result<ExitCode> {
	match command {
		Command::Parse { predicate, format } => {
			let predicate = commands::read_predicate(&predicate, format)?;
			println!("{}", commands::render_parsed(&predicate)?);
		}
		Command::Compile {
			predicate,
			format,
			store,
			first_placeholder,
		} => {
			if first_placeholder == 0 {
				bail!("--first-placeholder must be at least 1");
			}
			let store = match store.as_deref() {
				Some(name) => Some(
					config
						.store(name)
						.with_context(|| format!("store '{name}' is not configured"))?,
				),
				None => None,
			};
			let predicate = commands::read_predicate(&predicate, format)?;
			let compiled = commands::compiler_for(store)?.compile_from(&predicate, first_placeholder);
			println!("{}", commands::render_compiled(&compiled, first_placeholder));
		}
		Command::Match {
			predicate,
			format,
			document,
		} => {
			let predicate = commands::read_predicate(&predicate, format)?;
			let raw = match &document {
				Some(path) => std::fs::read_to_string(path)
					.with_context(|| format!("failed to read {}", path.display()))?,
				None => {
					let mut raw = String::new();
					std::io::stdin()
						.read_to_string(&mut raw)
						.context("failed to read document from stdin")?;
					raw
				}
			};
			let document: serde_json::Value =
				serde_json::from_str(&raw).context("document is not valid JSON")?;
			let matched = predicate.matches(&document);
			println!("{matched}");
			if !matched {
				return Ok(ExitCode::FAILURE);
			}
		}
		Command::Count {
			predicate,
			format,
			store,
		} => {
			let store = config
				.store(&store)
				.with_context(|| format!("store '{store}' is not configured"))?;
			let predicate = commands::read_predicate(&predicate, format)?;
			let entities = commands::document_store(store, &config.query)?;

			let pool = create_pool(&config.database.url, config.database.max_connections)
				.await
				.context("failed to connect to database")?;
			let mut conn = pool.acquire().await.context("failed to acquire connection")?;
			let total = entities
				.count_by_predicate(&mut conn, Some(&predicate))
				.await
				.with_context(|| format!("count on {} failed", store.table))?;
			info!(table = %store.table, total, "count complete");
			println!("{total}");
		}
		Command::Find {
			predicate,
			format,
			store,
			page,
			limit,
		} => {
			let store = config
				.store(&store)
				.with_context(|| format!("store '{store}' is not configured"))?;
			let predicate = commands::read_predicate(&predicate, format)?;
			let entities = commands::document_store(store, &config.query)?;
			let request = commands::page_request(&config.query, page, limit);

			let pool = create_pool(&config.database.url, config.database.max_connections)
				.await
				.context("failed to connect to database")?;
			let mut conn = pool.acquire().await.context("failed to acquire connection")?;
			let found = entities
				.find_by_predicate_paginated(&mut conn, Some(&predicate), request)
				.await
				.with_context(|| format!("find on {} failed", store.table))?;
			info!(
				table = %store.table,
				total = found.total,
				returned = found.items.len(),
				"find complete"
			);
			println!("{}", serde_json::to_string_pretty(&found)?);
		}
	}
	Ok(ExitCode::SUCCESS)
}
