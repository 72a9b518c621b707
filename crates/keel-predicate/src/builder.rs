// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Infallible predicate constructors.
//!
//! The argument types pin the value shape to the operator: comparisons take
//! a [`Scalar`], membership tests take an iterator of scalars and null checks
//! take nothing.
//!
//! The remaining checks of [`AtomicPredicate::new`] still run. An empty field
//! path segment or a non-finite float is a programming error and panics, so
//! every predicate these functions return survives the wire codec.
//!
//! ```
//! use keel_predicate::builder::{and, eq, gt, or};
//!
//! let p = and([eq("metadata.environment", "prod"), or([gt("replicas", 2), eq("pinned", true)])]);
//! assert_eq!(p.to_string(), r#"(metadata.environment = "prod" AND (replicas > 2 OR pinned = true))"#);
//! ```

use crate::ast::{AtomicPredicate, CompoundPredicate, Predicate};
use crate::operator::{Conjunction, Operator};
use crate::value::Value;

/// Types that convert into a single non-null, non-list [`Value`].
pub trait Scalar: Into<Value> {}

macro_rules! impl_scalar {
	($($ty:ty),*) => {
		$(impl Scalar for $ty {})*
	};
}

impl_scalar!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, String);
impl Scalar for &str {}
impl Scalar for &String {}

fn atom(field: impl Into<String>, operator: Operator, value: Value) -> Predicate {
	match AtomicPredicate::new(field, operator, value) {
		Ok(atom) => Predicate::Atomic(atom),
		Err(e) => panic!("invalid predicate: {e}"),
	}
}

fn list<T: Scalar>(values: impl IntoIterator<Item = T>) -> Value {
	Value::List(values.into_iter().map(Into::into).collect())
}

pub fn eq(field: impl Into<String>, value: impl Scalar) -> Predicate {
	atom(field, Operator::Eq, value.into())
}

pub fn neq(field: impl Into<String>, value: impl Scalar) -> Predicate {
	atom(field, Operator::Neq, value.into())
}

pub fn gt(field: impl Into<String>, value: impl Scalar) -> Predicate {
	atom(field, Operator::Gt, value.into())
}

pub fn gte(field: impl Into<String>, value: impl Scalar) -> Predicate {
	atom(field, Operator::Gte, value.into())
}

pub fn lt(field: impl Into<String>, value: impl Scalar) -> Predicate {
	atom(field, Operator::Lt, value.into())
}

pub fn lte(field: impl Into<String>, value: impl Scalar) -> Predicate {
	atom(field, Operator::Lte, value.into())
}

pub fn in_list<T: Scalar>(field: impl Into<String>, values: impl IntoIterator<Item = T>) -> Predicate {
	atom(field, Operator::In, list(values))
}

pub fn not_in<T: Scalar>(field: impl Into<String>, values: impl IntoIterator<Item = T>) -> Predicate {
	atom(field, Operator::NotIn, list(values))
}

pub fn like(field: impl Into<String>, pattern: impl Scalar) -> Predicate {
	atom(field, Operator::Like, pattern.into())
}

pub fn not_like(field: impl Into<String>, pattern: impl Scalar) -> Predicate {
	atom(field, Operator::NotLike, pattern.into())
}

pub fn contains(field: impl Into<String>, value: impl Scalar) -> Predicate {
	atom(field, Operator::Contains, value.into())
}

pub fn starts_with(field: impl Into<String>, prefix: impl Scalar) -> Predicate {
	atom(field, Operator::StartsWith, prefix.into())
}

pub fn ends_with(field: impl Into<String>, suffix: impl Scalar) -> Predicate {
	atom(field, Operator::EndsWith, suffix.into())
}

pub fn is_null(field: impl Into<String>) -> Predicate {
	atom(field, Operator::IsNull, Value::Null)
}

pub fn is_not_null(field: impl Into<String>) -> Predicate {
	atom(field, Operator::IsNotNull, Value::Null)
}

pub fn and(children: impl IntoIterator<Item = Predicate>) -> Predicate {
	Predicate::Compound(CompoundPredicate::new(
		Conjunction::And,
		children.into_iter().collect(),
	))
}

pub fn or(children: impl IntoIterator<Item = Predicate>) -> Predicate {
	Predicate::Compound(CompoundPredicate::new(
		Conjunction::Or,
		children.into_iter().collect(),
	))
}

pub fn match_all() -> Predicate {
	Predicate::MatchAll
}
