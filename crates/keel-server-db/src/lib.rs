// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Postgres backend for Keel predicates: a JSONB-aware SQL compiler and a
//! generic entity store built on it.

pub mod error;
pub mod pool;
pub mod sql;
pub mod store;
pub mod testing;

pub use error::{DbError, Result};
pub use pool::create_pool;
pub use sql::{CompiledSql, CompilerConfig, JsonFieldType, SqlArg, SqlCompiler};
pub use store::{EntityMapper, EntityStore, Page, PageRequest, PredicateStore};
