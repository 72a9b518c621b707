// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Errors raised while building, decoding or parsing a predicate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredicateError {
	#[error("unknown operator: {0}")]
	UnknownOperator(String),

	#[error("unknown conjunction: {0}")]
	UnknownConjunction(String),

	#[error("malformed child predicate at index {index}: {reason}")]
	MalformedChild { index: usize, reason: String },

	#[error("invalid value for {field} {operator}: {reason}")]
	InvalidValue {
		field: String,
		operator: String,
		reason: String,
	},

	#[error("malformed predicate: {0}")]
	Malformed(String),

	#[error("syntax error: {0}")]
	Syntax(String),
}

pub type Result<T> = std::result::Result<T, PredicateError>;

/// Errors raised while following a dotted field path through an object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
	#[error("field '{segment}' not found while resolving '{path}'")]
	MissingField { segment: String, path: String },

	#[error("cannot descend into '{segment}' of '{path}': value is null")]
	NullTraversal { segment: String, path: String },

	#[error("cannot descend into '{segment}' of '{path}': value is not a record or map")]
	NotTraversable { segment: String, path: String },
}
