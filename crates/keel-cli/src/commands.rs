// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt::Write as _;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use keel_predicate::{parse_predicate, Predicate};
use keel_server_config::{QueryConfig, StoreConfig};
use keel_server_db::sql::quote_qualified;
use keel_server_db::store::{ID_COLUMN, VERSION_COLUMN};
use keel_server_db::{
	CompiledSql, CompilerConfig, DbError, EntityMapper, EntityStore, JsonFieldType, PageRequest,
	SqlArg, SqlCompiler,
};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
	/// JSON when the input starts with `{`, expression text otherwise
	Auto,
	Json,
	Text,
}

pub fn read_predicate(input: &str, format: InputFormat) -> Result<Predicate> {
	let input = input.trim();
	let json = match format {
		InputFormat::Auto => input.starts_with('{'),
		InputFormat::Json => true,
		InputFormat::Text => false,
	};
	if json {
		Predicate::from_json(input).context("invalid predicate JSON")
	} else {
		parse_predicate(input).context("invalid predicate expression")
	}
}

/// Pretty JSON followed by the expression form.
pub fn render_parsed(predicate: &Predicate) -> Result<String> {
	let json = serde_json::to_string_pretty(&predicate.to_json_value())?;
	Ok(format!("{json}\n{predicate}"))
}

pub fn compiler_for(store: Option<&StoreConfig>) -> Result<SqlCompiler> {
	let mut builder = CompilerConfig::builder();
	if let Some(store) = store {
		for (field, kind) in &store.document_fields {
			let kind = JsonFieldType::from_str(kind)
				.map_err(|e| anyhow!("store table {}: field {field}: {e}", store.table))?;
			builder = builder.document_field(field, kind);
		}
		for (field, column) in &store.field_mappings {
			builder = builder.field_mapping(field, column);
		}
	}
	Ok(SqlCompiler::new(builder.build()))
}

/// The fragment, then one `$n = value` line per argument.
pub fn render_compiled(compiled: &CompiledSql, first_placeholder: usize) -> String {
	let mut out = compiled.sql.clone();
	for (i, arg) in compiled.args.iter().enumerate() {
		let _ = write!(out, "\n${} = {}", first_placeholder + i, describe_arg(arg));
	}
	out
}

fn describe_arg(arg: &SqlArg) -> String {
	match arg {
		SqlArg::Null => "NULL".to_string(),
		SqlArg::Bool(b) => b.to_string(),
		SqlArg::Int(i) => i.to_string(),
		SqlArg::Float(f) => f.to_string(),
		SqlArg::Text(s) => serde_json::Value::String(s.clone()).to_string(),
		SqlArg::Json(v) => format!("{v}::jsonb"),
	}
}

/// Reads whole rows as JSON objects. Read-only.
pub struct DocumentMapper;

impl EntityMapper<serde_json::Value> for DocumentMapper {
	fn columns(&self) -> &[&str] {
		&[]
	}

	fn select_list(&self, table: &str) -> String {
		format!("to_jsonb({}.*)", quote_qualified(table))
	}

	fn from_row(&self, row: &PgRow) -> keel_server_db::Result<serde_json::Value> {
		let Json(document) = row.try_get::<Json<serde_json::Value>, _>(0)?;
		Ok(document)
	}

	fn to_record(&self, _document: &serde_json::Value) -> keel_server_db::Result<Vec<SqlArg>> {
		Err(DbError::Internal("document rows are read-only".to_string()))
	}

	fn id_of(&self, document: &serde_json::Value) -> String {
		match document.get(ID_COLUMN) {
			Some(serde_json::Value::String(id)) => id.clone(),
			Some(other) => other.to_string(),
			None => String::new(),
		}
	}

	fn version_of(&self, document: &serde_json::Value) -> i64 {
		document
			.get(VERSION_COLUMN)
			.and_then(serde_json::Value::as_i64)
			.unwrap_or(0)
	}
}

pub type DocumentStore = EntityStore<serde_json::Value, DocumentMapper>;

pub fn document_store(store: &StoreConfig, query: &QueryConfig) -> Result<DocumentStore> {
	Ok(
		EntityStore::new(&store.table, DocumentMapper, compiler_for(Some(store))?)
			.with_max_page_size(query.max_page_size),
	)
}

/// Zero-based page number to an offset, with the limit clamped first.
pub fn page_request(query: &QueryConfig, page: u64, limit: Option<u64>) -> PageRequest {
	let limit = limit
		.unwrap_or(query.default_page_size)
		.clamp(1, query.max_page_size.max(1));
	PageRequest::new(page.saturating_mul(limit), limit)
}
