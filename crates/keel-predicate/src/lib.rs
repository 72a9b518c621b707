// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Predicate model for Keel entity stores.
//!
//! A [`Predicate`] is a tree of atomic comparisons joined by AND/OR. It can be
//! built in code ([`builder`]), decoded from JSON ([`wire`]), parsed from text
//! ([`parse_predicate`]) and evaluated against in-memory objects
//! ([`matches`]). The SQL backend lives in `keel-server-db`.

pub mod ast;
pub mod builder;
pub mod error;
pub mod eval;
pub mod normalize;
pub mod operator;
pub mod parser;
pub mod resolve;
pub mod value;
pub mod wire;

pub use ast::{AtomicPredicate, CompoundPredicate, Predicate};
pub use error::{PredicateError, ResolveError, Result};
pub use eval::{filter, matches};
pub use operator::{Conjunction, Operator};
pub use parser::parse_predicate;
pub use resolve::{resolve, Inspect, KeyedAccess, RecordAccess, Resolved, Shape};
pub use value::Value;
