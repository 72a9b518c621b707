// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use crate::error::{PredicateError, Result};
use crate::operator::{Conjunction, Operator};
use crate::value::Value;

/// A filter expression over entity fields.
///
/// Predicates are immutable trees. They are built with the functions in
/// [`crate::builder`], decoded from the JSON wire format, or parsed from the
/// textual grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
	Atomic(AtomicPredicate),
	Compound(CompoundPredicate),
	MatchAll,
}

/// A single `field operator value` comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicPredicate {
	field: String,
	operator: Operator,
	value: Value,
}

/// An AND/OR combination of child predicates.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundPredicate {
	conjunction: Conjunction,
	children: Vec<Predicate>,
}

impl AtomicPredicate {
	/// Build an atomic predicate, checking that the value fits the operator.
	///
	/// Null checks take no value, `IN`/`NOT_IN` take a list of scalars and
	/// every other operator takes a single non-null scalar.
	pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Result<Self> {
		let field = field.into();
		if field.is_empty() || field.split('.').any(str::is_empty) {
			return Err(PredicateError::Malformed(format!(
				"invalid field path '{field}'"
			)));
		}

		let invalid = |reason: &str| PredicateError::InvalidValue {
			field: field.clone(),
			operator: operator.as_str().to_string(),
			reason: reason.to_string(),
		};

		match (&operator, &value) {
			(op, Value::Null) if op.is_null_check() => {}
			(op, _) if op.is_null_check() => return Err(invalid("null checks take no value")),
			(op, Value::List(items)) if op.is_membership() => {
				if items
					.iter()
					.any(|v| matches!(v, Value::List(_) | Value::Null))
				{
					return Err(invalid("list elements must be non-null scalars"));
				}
			}
			(op, _) if op.is_membership() => return Err(invalid("a list value is required")),
			(_, Value::Null) => return Err(invalid("a value is required")),
			(_, Value::List(_)) => return Err(invalid("a scalar value is required")),
			_ => {}
		}

		let non_finite = |v: &Value| matches!(v, Value::Float(f) if !f.is_finite());
		if non_finite(&value) || value.as_list().is_some_and(|items| items.iter().any(non_finite)) {
			return Err(invalid("numbers must be finite"));
		}

		Ok(Self {
			field,
			operator,
			value,
		})
	}

	pub fn field(&self) -> &str {
		&self.field
	}

	pub fn operator(&self) -> Operator {
		self.operator
	}

	pub fn value(&self) -> &Value {
		&self.value
	}

	/// First segment of the dotted field path.
	pub fn root_field(&self) -> &str {
		self.field.split('.').next().unwrap_or(&self.field)
	}

	/// Segments after the root.
	pub fn nested_path(&self) -> Vec<&str> {
		self.field.split('.').skip(1).collect()
	}

	pub fn segments(&self) -> Vec<&str> {
		self.field.split('.').collect()
	}
}

impl CompoundPredicate {
	pub fn new(conjunction: Conjunction, children: Vec<Predicate>) -> Self {
		Self {
			conjunction,
			children,
		}
	}

	pub fn conjunction(&self) -> Conjunction {
		self.conjunction
	}

	pub fn children(&self) -> &[Predicate] {
		&self.children
	}
}

impl Predicate {
	pub fn is_match_all(&self) -> bool {
		matches!(self, Predicate::MatchAll)
	}

	/// Number of atomic leaves in the tree.
	pub fn leaf_count(&self) -> usize {
		match self {
			Predicate::Atomic(_) => 1,
			Predicate::Compound(c) => c.children.iter().map(Predicate::leaf_count).sum(),
			Predicate::MatchAll => 0,
		}
	}
}

impl From<AtomicPredicate> for Predicate {
	fn from(p: AtomicPredicate) -> Self {
		Predicate::Atomic(p)
	}
}

impl From<CompoundPredicate> for Predicate {
	fn from(p: CompoundPredicate) -> Self {
		Predicate::Compound(p)
	}
}

/// Renders the textual grammar accepted by [`crate::parse_predicate`].
impl fmt::Display for Predicate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Predicate::Atomic(atom) => write!(f, "{atom}"),
			Predicate::Compound(compound) => write!(f, "{compound}"),
			Predicate::MatchAll => write!(f, "*"),
		}
	}
}

impl fmt::Display for AtomicPredicate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.operator.is_null_check() {
			write!(f, "{} {}", self.field, self.operator.keyword())
		} else {
			write!(f, "{} {} {}", self.field, self.operator.keyword(), self.value)
		}
	}
}

impl fmt::Display for CompoundPredicate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.children.is_empty() {
			return write!(f, "*");
		}
		write!(f, "(")?;
		for (i, child) in self.children.iter().enumerate() {
			if i > 0 {
				write!(f, " {} ", self.conjunction)?;
			}
			write!(f, "{child}")?;
		}
		write!(f, ")")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_null_check_rejects_value() {
		let result = AtomicPredicate::new("name", Operator::IsNull, Value::from("x"));
		assert!(matches!(result, Err(PredicateError::InvalidValue { .. })));
	}

	#[test]
	fn test_in_requires_list() {
		let result = AtomicPredicate::new("name", Operator::In, Value::from("x"));
		assert!(matches!(result, Err(PredicateError::InvalidValue { .. })));

		let ok = AtomicPredicate::new("name", Operator::In, Value::from(vec!["a", "b"]));
		assert!(ok.is_ok());
	}

	#[test]
	fn test_comparison_requires_scalar() {
		assert!(AtomicPredicate::new("age", Operator::Gt, Value::Null).is_err());
		assert!(AtomicPredicate::new("age", Operator::Gt, Value::from(vec![1, 2])).is_err());
		assert!(AtomicPredicate::new("age", Operator::Gt, Value::from(1)).is_ok());
	}

	#[test]
	fn test_rejects_empty_segments() {
		assert!(AtomicPredicate::new("", Operator::Eq, Value::from(1)).is_err());
		assert!(AtomicPredicate::new("a..b", Operator::Eq, Value::from(1)).is_err());
		assert!(AtomicPredicate::new("a.", Operator::Eq, Value::from(1)).is_err());
	}

	#[test]
	fn test_path_segments() {
		let atom = AtomicPredicate::new("VPAs.Cell.ID", Operator::Eq, Value::from("c1")).unwrap();
		assert_eq!(atom.root_field(), "VPAs");
		assert_eq!(atom.nested_path(), vec!["Cell", "ID"]);
	}

	#[test]
	fn test_display() {
		let atom = AtomicPredicate::new("a.b", Operator::NotIn, Value::from(vec![1, 2])).unwrap();
		assert_eq!(atom.to_string(), "a.b NOT IN (1, 2)");

		let null = AtomicPredicate::new("a", Operator::IsNotNull, Value::Null).unwrap();
		assert_eq!(null.to_string(), "a IS NOT NULL");

		let compound = Predicate::Compound(CompoundPredicate::new(
			Conjunction::Or,
			vec![atom.into(), null.into()],
		));
		assert_eq!(compound.to_string(), "(a.b NOT IN (1, 2) OR a IS NOT NULL)");
	}
}
