// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Generic predicate-scoped entity persistence.
//!
//! Every operation runs on a connection supplied by the caller, so the
//! caller's transaction is the unit of work. Pass `&mut tx` for a
//! `sqlx::Transaction` or `&mut conn` for a pooled connection.

use std::marker::PhantomData;

use async_trait::async_trait;
use keel_predicate::Predicate;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Postgres};

use crate::error::{DbError, Result};
use crate::sql::{quote_ident, quote_qualified, to_arguments, CompiledSql, SqlArg, SqlCompiler};

pub const ID_COLUMN: &str = "id";
pub const VERSION_COLUMN: &str = "version";
pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 500;

/// Converts between an entity and its table row.
pub trait EntityMapper<E>: Send + Sync {
	/// Every column read or written, including `id` and `version`.
	fn columns(&self) -> &[&str];

	/// Projection used by reads. Defaults to [`columns`](EntityMapper::columns).
	fn select_list(&self, _table: &str) -> String {
		column_list(self.columns())
	}

	fn from_row(&self, row: &PgRow) -> Result<E>;

	/// Values aligned with [`columns`](EntityMapper::columns).
	fn to_record(&self, entity: &E) -> Result<Vec<SqlArg>>;

	fn id_of(&self, entity: &E) -> String;

	fn version_of(&self, entity: &E) -> i64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
	pub offset: u64,
	pub limit: u64,
}

impl PageRequest {
	pub fn new(offset: u64, limit: u64) -> Self {
		Self { offset, limit }
	}

	pub fn first(limit: u64) -> Self {
		Self::new(0, limit)
	}

	pub fn next(&self) -> Self {
		Self::new(self.offset.saturating_add(self.limit), self.limit)
	}

	fn clamped(self, max: u64) -> Self {
		Self::new(self.offset, self.limit.clamp(1, max.max(1)))
	}
}

impl Default for PageRequest {
	fn default() -> Self {
		Self::first(DEFAULT_PAGE_SIZE)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<E> {
	pub items: Vec<E>,
	pub total: i64,
	pub offset: u64,
	pub limit: u64,
}

impl<E> Page<E> {
	pub fn has_more(&self) -> bool {
		let seen = self.offset.saturating_add(self.items.len() as u64);
		seen < u64::try_from(self.total).unwrap_or(0)
	}
}

pub struct EntityStore<E, M> {
	table: String,
	mapper: M,
	compiler: SqlCompiler,
	max_page_size: u64,
	_entity: PhantomData<fn() -> E>,
}

impl<E, M> EntityStore<E, M>
where
	M: EntityMapper<E>,
{
	pub fn new(table: impl Into<String>, mapper: M, compiler: SqlCompiler) -> Self {
		Self {
			table: table.into(),
			mapper,
			compiler,
			max_page_size: MAX_PAGE_SIZE,
			_entity: PhantomData,
		}
	}

	pub fn with_max_page_size(mut self, max_page_size: u64) -> Self {
		self.max_page_size = max_page_size;
		self
	}

	pub fn max_page_size(&self) -> u64 {
		self.max_page_size
	}

	pub fn table(&self) -> &str {
		&self.table
	}

	pub fn compiler(&self) -> &SqlCompiler {
		&self.compiler
	}

	pub fn mapper(&self) -> &M {
		&self.mapper
	}

	fn query_error(&self, operation: &'static str, id: Option<&str>, source: sqlx::Error) -> DbError {
		if let sqlx::Error::Database(db) = &source {
			if db.is_unique_violation() {
				return DbError::Conflict(format!(
					"{operation} on {}: {}",
					self.table,
					db.message()
				));
			}
		}
		DbError::Query {
			operation,
			table: self.table.clone(),
			id: id.map(str::to_string),
			source,
		}
	}

	fn select_sql(&self, filter: &CompiledSql) -> String {
		format!(
			"SELECT {} FROM {} WHERE {} ORDER BY {}",
			self.mapper.select_list(&self.table),
			quote_qualified(&self.table),
			filter.sql,
			quote_ident(ID_COLUMN),
		)
	}

	fn filter(&self, predicate: Option<&Predicate>) -> CompiledSql {
		predicate
			.map(|p| self.compiler.compile(p))
			.unwrap_or_else(CompiledSql::match_all)
	}

	async fn fetch_all(
		&self,
		conn: &mut PgConnection,
		operation: &'static str,
		sql: &str,
		args: &[SqlArg],
	) -> Result<Vec<E>> {
		let rows = sqlx::query_with(sql, to_arguments(args)?)
			.fetch_all(&mut *conn)
			.await
			.map_err(|e| self.query_error(operation, None, e))?;
		rows.iter().map(|row| self.mapper.from_row(row)).collect()
	}

	async fn fetch_count(
		&self,
		conn: &mut PgConnection,
		operation: &'static str,
		sql: &str,
		args: &[SqlArg],
	) -> Result<i64> {
		sqlx::query_scalar_with::<Postgres, i64, _>(sql, to_arguments(args)?)
			.fetch_one(&mut *conn)
			.await
			.map_err(|e| self.query_error(operation, None, e))
	}

	#[tracing::instrument(skip_all, fields(table = %self.table, id = %id))]
	pub async fn find_by_id(&self, conn: &mut PgConnection, id: &str) -> Result<Option<E>> {
		let sql = format!(
			"SELECT {} FROM {} WHERE {} = $1",
			self.mapper.select_list(&self.table),
			quote_qualified(&self.table),
			quote_ident(ID_COLUMN),
		);
		let row = sqlx::query_with(&sql, to_arguments(&[SqlArg::from(id)])?)
			.fetch_optional(&mut *conn)
			.await
			.map_err(|e| self.query_error("find_by_id", Some(id), e))?;
		row.map(|row| self.mapper.from_row(&row)).transpose()
	}

	#[tracing::instrument(skip_all, fields(table = %self.table, id = %id))]
	pub async fn exists(&self, conn: &mut PgConnection, id: &str) -> Result<bool> {
		let sql = format!(
			"SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1)",
			quote_qualified(&self.table),
			quote_ident(ID_COLUMN),
		);
		sqlx::query_scalar_with::<Postgres, bool, _>(&sql, to_arguments(&[SqlArg::from(id)])?)
			.fetch_one(&mut *conn)
			.await
			.map_err(|e| self.query_error("exists", Some(id), e))
	}

	#[tracing::instrument(skip_all, fields(table = %self.table, id = %self.mapper.id_of(entity)))]
	pub async fn create(&self, conn: &mut PgConnection, entity: &E) -> Result<()> {
		let id = self.mapper.id_of(entity);
		let record = self.record(entity)?;
		let (sql, args) = insert_sql(&self.table, self.mapper.columns(), record);
		sqlx::query_with(&sql, to_arguments(&args)?)
			.execute(&mut *conn)
			.await
			.map_err(|e| self.query_error("create", Some(&id), e))?;
		tracing::debug!("entity created");
		Ok(())
	}

	/// Writes every non-key column and bumps `version`, provided the stored
	/// version still equals the entity's. Returns the new version.
	#[tracing::instrument(skip_all, fields(table = %self.table, id = %self.mapper.id_of(entity)))]
	pub async fn update(&self, conn: &mut PgConnection, entity: &E) -> Result<i64> {
		let id = self.mapper.id_of(entity);
		let expected = self.mapper.version_of(entity);
		let record = self.record(entity)?;
		let (sql, args) = update_sql(&self.table, self.mapper.columns(), record, &id, expected);

		let version = sqlx::query_scalar_with::<Postgres, i64, _>(&sql, to_arguments(&args)?)
			.fetch_optional(&mut *conn)
			.await
			.map_err(|e| self.query_error("update", Some(&id), e))?;

		if let Some(version) = version {
			return Ok(version);
		}
		if self.exists(conn, &id).await? {
			Err(DbError::Conflict(format!(
				"{} {id}: expected version {expected}",
				self.table
			)))
		} else {
			Err(DbError::NotFound(format!("{} {id}", self.table)))
		}
	}

	#[tracing::instrument(skip_all, fields(table = %self.table, id = %id))]
	pub async fn delete(&self, conn: &mut PgConnection, id: &str) -> Result<()> {
		let sql = format!(
			"DELETE FROM {} WHERE {} = $1",
			quote_qualified(&self.table),
			quote_ident(ID_COLUMN),
		);
		let result = sqlx::query_with(&sql, to_arguments(&[SqlArg::from(id)])?)
			.execute(&mut *conn)
			.await
			.map_err(|e| self.query_error("delete", Some(id), e))?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("{} {id}", self.table)));
		}
		Ok(())
	}

	pub async fn get_all(&self, conn: &mut PgConnection) -> Result<Vec<E>> {
		self.find_by_predicate(conn, None).await
	}

	pub async fn get_all_count(&self, conn: &mut PgConnection) -> Result<i64> {
		self.count_by_predicate(conn, None).await
	}

	pub async fn get_all_paginated(
		&self,
		conn: &mut PgConnection,
		page: PageRequest,
	) -> Result<Page<E>> {
		self.find_by_predicate_paginated(conn, None, page).await
	}

	/// `None` matches every row.
	#[tracing::instrument(skip_all, fields(table = %self.table))]
	pub async fn find_by_predicate(
		&self,
		conn: &mut PgConnection,
		predicate: Option<&Predicate>,
	) -> Result<Vec<E>> {
		let filter = self.filter(predicate);
		let sql = self.select_sql(&filter);
		self
			.fetch_all(conn, "find_by_predicate", &sql, &filter.args)
			.await
	}

	#[tracing::instrument(skip_all, fields(table = %self.table, offset = page.offset, limit = page.limit))]
	pub async fn find_by_predicate_paginated(
		&self,
		conn: &mut PgConnection,
		predicate: Option<&Predicate>,
		page: PageRequest,
	) -> Result<Page<E>> {
		let page = page.clamped(self.max_page_size);
		let total = self.count_by_predicate(conn, predicate).await?;

		let filter = self.filter(predicate);
		let next = filter.args.len() + 1;
		let sql = format!(
			"{} LIMIT ${next} OFFSET ${}",
			self.select_sql(&filter),
			next + 1
		);
		let mut args = filter.args;
		args.push(SqlArg::Int(to_i64(page.limit)));
		args.push(SqlArg::Int(to_i64(page.offset)));

		let items = self
			.fetch_all(conn, "find_by_predicate_paginated", &sql, &args)
			.await?;
		Ok(Page {
			items,
			total,
			offset: page.offset,
			limit: page.limit,
		})
	}

	/// First row by id order. Zero matches is `NotFound`.
	#[tracing::instrument(skip_all, fields(table = %self.table))]
	pub async fn find_first_by_predicate(
		&self,
		conn: &mut PgConnection,
		predicate: Option<&Predicate>,
	) -> Result<E> {
		let filter = self.filter(predicate);
		let sql = format!("{} LIMIT 1", self.select_sql(&filter));
		let row = sqlx::query_with(&sql, to_arguments(&filter.args)?)
			.fetch_optional(&mut *conn)
			.await
			.map_err(|e| self.query_error("find_first_by_predicate", None, e))?;

		match row {
			Some(row) => self.mapper.from_row(&row),
			None => Err(DbError::NotFound(format!(
				"{}: no row matches {}",
				self.table,
				describe(predicate)
			))),
		}
	}

	#[tracing::instrument(skip_all, fields(table = %self.table))]
	pub async fn count_by_predicate(
		&self,
		conn: &mut PgConnection,
		predicate: Option<&Predicate>,
	) -> Result<i64> {
		let filter = self.filter(predicate);
		let sql = format!(
			"SELECT COUNT(*) FROM {} WHERE {}",
			quote_qualified(&self.table),
			filter.sql
		);
		self
			.fetch_count(conn, "count_by_predicate", &sql, &filter.args)
			.await
	}

	/// Deletes every matching row. Zero affected rows is `NotFound`.
	#[tracing::instrument(skip_all, fields(table = %self.table))]
	pub async fn delete_by_predicate(
		&self,
		conn: &mut PgConnection,
		predicate: Option<&Predicate>,
	) -> Result<u64> {
		let filter = self.filter(predicate);
		let sql = format!(
			"DELETE FROM {} WHERE {}",
			quote_qualified(&self.table),
			filter.sql
		);
		let result = sqlx::query_with(&sql, to_arguments(&filter.args)?)
			.execute(&mut *conn)
			.await
			.map_err(|e| self.query_error("delete_by_predicate", None, e))?;

		let deleted = result.rows_affected();
		if deleted == 0 {
			return Err(DbError::NotFound(format!(
				"{}: no row matches {}",
				self.table,
				describe(predicate)
			)));
		}
		tracing::debug!(deleted, "deleted by predicate");
		Ok(deleted)
	}

	fn record(&self, entity: &E) -> Result<Vec<SqlArg>> {
		let record = self.mapper.to_record(entity)?;
		let columns = self.mapper.columns();
		if record.len() != columns.len() {
			return Err(DbError::Internal(format!(
				"{}: mapper produced {} values for {} columns",
				self.table,
				record.len(),
				columns.len()
			)));
		}
		Ok(record)
	}
}

fn describe(predicate: Option<&Predicate>) -> String {
	predicate
		.map(ToString::to_string)
		.unwrap_or_else(|| "*".to_string())
}

fn to_i64(value: u64) -> i64 {
	i64::try_from(value).unwrap_or(i64::MAX)
}

fn column_list(columns: &[&str]) -> String {
	columns
		.iter()
		.map(|c| quote_ident(c))
		.collect::<Vec<_>>()
		.join(", ")
}

/// Null values are written as literal `NULL` so their column type is
/// inferred by Postgres rather than fixed by the bound parameter.
fn insert_sql(table: &str, columns: &[&str], record: Vec<SqlArg>) -> (String, Vec<SqlArg>) {
	let mut args = Vec::new();
	let values: Vec<String> = record
		.into_iter()
		.map(|arg| {
			if arg.is_null() {
				"NULL".to_string()
			} else {
				args.push(arg);
				format!("${}", args.len())
			}
		})
		.collect();

	let sql = format!(
		"INSERT INTO {} ({}) VALUES ({})",
		quote_qualified(table),
		column_list(columns),
		values.join(", ")
	);
	(sql, args)
}

fn update_sql(
	table: &str,
	columns: &[&str],
	record: Vec<SqlArg>,
	id: &str,
	expected_version: i64,
) -> (String, Vec<SqlArg>) {
	let mut args = Vec::new();
	let mut assignments: Vec<String> = columns
		.iter()
		.zip(record)
		.filter(|(column, _)| **column != ID_COLUMN && **column != VERSION_COLUMN)
		.map(|(column, arg)| {
			if arg.is_null() {
				format!("{} = NULL", quote_ident(column))
			} else {
				args.push(arg);
				format!("{} = ${}", quote_ident(column), args.len())
			}
		})
		.collect();
	let version = quote_ident(VERSION_COLUMN);
	assignments.push(format!("{version} = {version} + 1"));

	args.push(SqlArg::from(id));
	let id_placeholder = args.len();
	args.push(SqlArg::Int(expected_version));
	let version_placeholder = args.len();

	let sql = format!(
		"UPDATE {} SET {} WHERE {} = ${id_placeholder} AND {version} = ${version_placeholder} RETURNING {version}",
		quote_qualified(table),
		assignments.join(", "),
		quote_ident(ID_COLUMN),
	);
	(sql, args)
}

#[async_trait]
pub trait PredicateStore<E>: Send + Sync {
	async fn find_by_id(&self, conn: &mut PgConnection, id: &str) -> Result<Option<E>>;
	async fn exists(&self, conn: &mut PgConnection, id: &str) -> Result<bool>;
	async fn create(&self, conn: &mut PgConnection, entity: &E) -> Result<()>;
	async fn update(&self, conn: &mut PgConnection, entity: &E) -> Result<i64>;
	async fn delete(&self, conn: &mut PgConnection, id: &str) -> Result<()>;
	async fn get_all(&self, conn: &mut PgConnection) -> Result<Vec<E>>;
	async fn get_all_count(&self, conn: &mut PgConnection) -> Result<i64>;
	async fn get_all_paginated(&self, conn: &mut PgConnection, page: PageRequest) -> Result<Page<E>>;
	async fn find_by_predicate(
		&self,
		conn: &mut PgConnection,
		predicate: Option<&Predicate>,
	) -> Result<Vec<E>>;
	async fn find_by_predicate_paginated(
		&self,
		conn: &mut PgConnection,
		predicate: Option<&Predicate>,
		page: PageRequest,
	) -> Result<Page<E>>;
	async fn find_first_by_predicate(
		&self,
		conn: &mut PgConnection,
		predicate: Option<&Predicate>,
	) -> Result<E>;
	async fn count_by_predicate(
		&self,
		conn: &mut PgConnection,
		predicate: Option<&Predicate>,
	) -> Result<i64>;
	async fn delete_by_predicate(
		&self,
		conn: &mut PgConnection,
		predicate: Option<&Predicate>,
	) -> Result<u64>;
}

#[async_trait]
impl<E, M> PredicateStore<E> for EntityStore<E, M>
where
	E: Send + Sync + 'static,
	M: EntityMapper<E>,
{
	async fn find_by_id(&self, conn: &mut PgConnection, id: &str) -> Result<Option<E>> {
		self.find_by_id(conn, id).await
	}

	async fn exists(&self, conn: &mut PgConnection, id: &str) -> Result<bool> {
		self.exists(conn, id).await
	}

	async fn create(&self, conn: &mut PgConnection, entity: &E) -> Result<()> {
		self.create(conn, entity).await
	}

	async fn update(&self, conn: &mut PgConnection, entity: &E) -> Result<i64> {
		self.update(conn, entity).await
	}

	async fn delete(&self, conn: &mut PgConnection, id: &str) -> Result<()> {
		self.delete(conn, id).await
	}

	async fn get_all(&self, conn: &mut PgConnection) -> Result<Vec<E>> {
		self.get_all(conn).await
	}

	async fn get_all_count(&self, conn: &mut PgConnection) -> Result<i64> {
		self.get_all_count(conn).await
	}

	async fn get_all_paginated(&self, conn: &mut PgConnection, page: PageRequest) -> Result<Page<E>> {
		self.get_all_paginated(conn, page).await
	}

	async fn find_by_predicate(
		&self,
		conn: &mut PgConnection,
		predicate: Option<&Predicate>,
	) -> Result<Vec<E>> {
		self.find_by_predicate(conn, predicate).await
	}

	async fn find_by_predicate_paginated(
		&self,
		conn: &mut PgConnection,
		predicate: Option<&Predicate>,
		page: PageRequest,
	) -> Result<Page<E>> {
		self
			.find_by_predicate_paginated(conn, predicate, page)
			.await
	}

	async fn find_first_by_predicate(
		&self,
		conn: &mut PgConnection,
		predicate: Option<&Predicate>,
	) -> Result<E> {
		self.find_first_by_predicate(conn, predicate).await
	}

	async fn count_by_predicate(
		&self,
		conn: &mut PgConnection,
		predicate: Option<&Predicate>,
	) -> Result<i64> {
		self.count_by_predicate(conn, predicate).await
	}

	async fn delete_by_predicate(
		&self,
		conn: &mut PgConnection,
		predicate: Option<&Predicate>,
	) -> Result<u64> {
		self.delete_by_predicate(conn, predicate).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const COLUMNS: &[&str] = &["id", "name", "owner", "metadata", "version"];

	#[test]
	fn test_insert_sql_inlines_nulls() {
		let (sql, args) = insert_sql(
			"sites",
			COLUMNS,
			vec![
				SqlArg::from("s-1"),
				SqlArg::from("edge"),
				SqlArg::Null,
				SqlArg::Json(serde_json::json!({})),
				SqlArg::Int(1),
			],
		);
		assert_eq!(
			sql,
			"INSERT INTO sites (id, name, owner, metadata, version) VALUES ($1, $2, NULL, $3, $4)"
		);
		assert_eq!(args.len(), 4);
	}

	#[test]
	fn test_update_sql_checks_version() {
		let (sql, args) = update_sql(
			"sites",
			COLUMNS,
			vec![
				SqlArg::from("s-1"),
				SqlArg::from("edge"),
				SqlArg::from("ops"),
				SqlArg::Json(serde_json::json!({})),
				SqlArg::Int(3),
			],
			"s-1",
			3,
		);
		assert_eq!(
			sql,
			"UPDATE sites SET name = $1, owner = $2, metadata = $3, version = version + 1 WHERE id = $4 AND version = $5 RETURNING version"
		);
		assert_eq!(args[3], SqlArg::from("s-1"));
		assert_eq!(args[4], SqlArg::Int(3));
	}

	#[test]
	fn test_update_sql_inlines_nulls() {
		let (sql, args) = update_sql(
			"sites",
			COLUMNS,
			vec![
				SqlArg::from("s-1"),
				SqlArg::from("edge"),
				SqlArg::Null,
				SqlArg::Json(serde_json::json!({})),
				SqlArg::Int(1),
			],
			"s-1",
			1,
		);
		assert!(sql.contains("owner = NULL, metadata = $2"));
		assert!(sql.contains("WHERE id = $3 AND version = $4"));
		assert_eq!(args.len(), 4);
	}

	#[test]
	fn test_page_request_clamps_limit() {
		assert_eq!(PageRequest::new(10, 0).clamped(500).limit, 1);
		assert_eq!(PageRequest::new(10, 9000).clamped(500).limit, 500);
		assert_eq!(PageRequest::default().limit, DEFAULT_PAGE_SIZE);
		assert_eq!(PageRequest::new(20, 10).next(), PageRequest::new(30, 10));
		assert_eq!(
			PageRequest::new(u64::MAX - 1, 10).next(),
			PageRequest::new(u64::MAX, 10)
		);
	}

	#[test]
	fn test_page_has_more() {
		let page = Page {
			items: vec![1, 2],
			total: 5,
			offset: 0,
			limit: 2,
		};
		assert!(page.has_more());

		let last = Page {
			items: vec![5],
			total: 5,
			offset: 4,
			limit: 2,
		};
		assert!(!last.has_more());

		let far = Page::<i32> {
			items: vec![1],
			total: i64::MAX,
			offset: u64::MAX,
			limit: 1,
		};
		assert!(!far.has_more());
	}

	struct Columns;

	impl EntityMapper<()> for Columns {
		fn columns(&self) -> &[&str] {
			COLUMNS
		}

		fn from_row(&self, _row: &PgRow) -> Result<()> {
			Ok(())
		}

		fn to_record(&self, _entity: &()) -> Result<Vec<SqlArg>> {
			Ok(Vec::new())
		}

		fn id_of(&self, _entity: &()) -> String {
			String::new()
		}

		fn version_of(&self, _entity: &()) -> i64 {
			0
		}
	}

	#[test]
	fn test_default_select_list_quotes_columns() {
		assert_eq!(
			Columns.select_list("sites"),
			"id, name, owner, metadata, version"
		);
	}
}
