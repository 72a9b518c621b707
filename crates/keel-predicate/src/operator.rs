// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PredicateError;

/// Comparison operator of an atomic predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
	Eq,
	Neq,
	Gt,
	Gte,
	Lt,
	Lte,
	In,
	NotIn,
	Like,
	NotLike,
	Contains,
	StartsWith,
	EndsWith,
	IsNull,
	IsNotNull,
}

impl Operator {
	pub const ALL: [Operator; 15] = [
		Operator::Eq,
		Operator::Neq,
		Operator::Gt,
		Operator::Gte,
		Operator::Lt,
		Operator::Lte,
		Operator::In,
		Operator::NotIn,
		Operator::Like,
		Operator::NotLike,
		Operator::Contains,
		Operator::StartsWith,
		Operator::EndsWith,
		Operator::IsNull,
		Operator::IsNotNull,
	];

	/// Canonical wire token.
	pub fn as_str(&self) -> &'static str {
		match self {
			Operator::Eq => "=",
			Operator::Neq => "!=",
			Operator::Gt => ">",
			Operator::Gte => ">=",
			Operator::Lt => "<",
			Operator::Lte => "<=",
			Operator::In => "IN",
			Operator::NotIn => "NOT_IN",
			Operator::Like => "LIKE",
			Operator::NotLike => "NOT_LIKE",
			Operator::Contains => "CONTAINS",
			Operator::StartsWith => "STARTS_WITH",
			Operator::EndsWith => "ENDS_WITH",
			Operator::IsNull => "IS_NULL",
			Operator::IsNotNull => "IS_NOT_NULL",
		}
	}

	/// Token used by the textual grammar.
	pub fn keyword(&self) -> &'static str {
		match self {
			Operator::NotIn => "NOT IN",
			Operator::NotLike => "NOT LIKE",
			Operator::IsNull => "IS NULL",
			Operator::IsNotNull => "IS NOT NULL",
			other => other.as_str(),
		}
	}

	pub fn is_null_check(&self) -> bool {
		matches!(self, Operator::IsNull | Operator::IsNotNull)
	}

	pub fn is_membership(&self) -> bool {
		matches!(self, Operator::In | Operator::NotIn)
	}

	pub fn is_ordering(&self) -> bool {
		matches!(
			self,
			Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte
		)
	}

	pub fn is_textual(&self) -> bool {
		matches!(
			self,
			Operator::Like
				| Operator::NotLike
				| Operator::Contains
				| Operator::StartsWith
				| Operator::EndsWith
		)
	}
}

impl fmt::Display for Operator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Operator {
	type Err = PredicateError;

	/// Case-insensitive; `NOT IN`, `not_in` and `Not  In` are the same token.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let normalized = s
			.split_whitespace()
			.collect::<Vec<_>>()
			.join("_")
			.to_ascii_uppercase();

		Ok(match normalized.as_str() {
			"=" => Operator::Eq,
			"!=" => Operator::Neq,
			">" => Operator::Gt,
			">=" => Operator::Gte,
			"<" => Operator::Lt,
			"<=" => Operator::Lte,
			"IN" => Operator::In,
			"NOT_IN" => Operator::NotIn,
			"LIKE" => Operator::Like,
			"NOT_LIKE" => Operator::NotLike,
			"CONTAINS" => Operator::Contains,
			"STARTS_WITH" => Operator::StartsWith,
			"ENDS_WITH" => Operator::EndsWith,
			"IS_NULL" => Operator::IsNull,
			"IS_NOT_NULL" => Operator::IsNotNull,
			_ => return Err(PredicateError::UnknownOperator(s.to_string())),
		})
	}
}

impl Serialize for Operator {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for Operator {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let token = String::deserialize(deserializer)?;
		token.parse().map_err(serde::de::Error::custom)
	}
}

/// Boolean combinator of a compound predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conjunction {
	And,
	Or,
}

impl Conjunction {
	pub fn as_str(&self) -> &'static str {
		match self {
			Conjunction::And => "AND",
			Conjunction::Or => "OR",
		}
	}
}

impl fmt::Display for Conjunction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Conjunction {
	type Err = PredicateError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			t if t.eq_ignore_ascii_case("and") => Ok(Conjunction::And),
			t if t.eq_ignore_ascii_case("or") => Ok(Conjunction::Or),
			_ => Err(PredicateError::UnknownConjunction(s.to_string())),
		}
	}
}
