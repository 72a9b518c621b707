// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::postgres::PgPool;
use sqlx::PgConnection;

pub const TEST_DATABASE_URL_ENV: &str = "KEEL_TEST_DATABASE_URL";

/// Pool for database tests, or `None` when no test database is configured.
pub async fn create_test_pool() -> Option<PgPool> {
	let Ok(url) = std::env::var(TEST_DATABASE_URL_ENV) else {
		eprintln!("{TEST_DATABASE_URL_ENV} not set, skipping database test");
		return None;
	};
	Some(PgPool::connect(&url).await.unwrap())
}

pub async fn create_sites_table(conn: &mut PgConnection, table: &str) {
	sqlx::query(&format!(
		r#"
		CREATE TABLE {table} (
			id TEXT PRIMARY KEY,
			name TEXT NOT NULL,
			tenant_id TEXT NOT NULL,
			tier INTEGER NOT NULL DEFAULT 1,
			metadata JSONB,
			vpas JSONB,
			tags JSONB,
			version BIGINT NOT NULL DEFAULT 1
		)
		"#
	))
	.execute(conn)
	.await
	.unwrap();
}
