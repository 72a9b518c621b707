// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Parser for the textual predicate grammar.
//!
//! ```text
//! expr       := term ((AND | OR) term)*        -- one conjunction per level
//! term       := '(' expr ')' | '*' | comparison
//! comparison := path IS [NOT] NULL
//!             | path [NOT] IN '(' value (',' value)* ')'
//!             | path op value
//! path       := ident ('.' ident)*
//! value      := "string" | 'string' | number | true | false
//! ```
//!
//! The grammar is what [`Predicate`]'s `Display` implementation prints, so
//! printed predicates parse back to an equivalent tree.

use winnow::ascii::{multispace0, multispace1, Caseless};
use winnow::combinator::alt;
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::take_while;

use crate::ast::{AtomicPredicate, CompoundPredicate, Predicate};
use crate::error::{PredicateError, Result};
use crate::operator::{Conjunction, Operator};
use crate::value::Value;

/// Untyped parse tree; semantic checks happen when lowering to [`Predicate`].
#[derive(Debug)]
enum RawExpr {
	All,
	Comparison {
		field: String,
		operator: Operator,
		value: Value,
	},
	Group(Box<RawExpr>),
	Sequence {
		terms: Vec<RawExpr>,
		conjunctions: Vec<Conjunction>,
	},
}

pub fn parse_predicate(input: &str) -> Result<Predicate> {
	let raw = parse_sequence
		.parse(input.trim())
		.map_err(|e| PredicateError::Syntax(format!("at offset {}: {}", e.offset(), e.inner())))?;
	lower(raw)
}

fn lower(raw: RawExpr) -> Result<Predicate> {
	match raw {
		RawExpr::All => Ok(Predicate::MatchAll),
		RawExpr::Comparison {
			field,
			operator,
			value,
		} => Ok(Predicate::Atomic(AtomicPredicate::new(field, operator, value)?)),
		RawExpr::Group(inner) => lower(*inner),
		RawExpr::Sequence {
			terms,
			conjunctions,
		} => {
			let conjunction = conjunctions[0];
			if conjunctions.iter().any(|c| *c != conjunction) {
				return Err(PredicateError::Syntax(
					"AND and OR cannot be mixed at the same level without parentheses".to_string(),
				));
			}
			let children = terms.into_iter().map(lower).collect::<Result<Vec<_>>>()?;
			Ok(Predicate::Compound(CompoundPredicate::new(conjunction, children)))
		}
	}
}

fn parse_sequence(input: &mut &str) -> std::result::Result<RawExpr, ContextError> {
	let first = parse_term(input)?;
	let mut terms = vec![first];
	let mut conjunctions = Vec::new();

	loop {
		let checkpoint = *input;
		let space_result: std::result::Result<&str, ContextError> = multispace1.parse_next(input);
		if space_result.is_err() {
			*input = checkpoint;
			break;
		}
		let conj_result: std::result::Result<Conjunction, ContextError> = alt((
			Caseless("and").value(Conjunction::And),
			Caseless("or").value(Conjunction::Or),
		))
		.parse_next(input);
		let Ok(conjunction) = conj_result else {
			*input = checkpoint;
			break;
		};
		let _: &str = multispace1.parse_next(input)?;
		terms.push(parse_term(input)?);
		conjunctions.push(conjunction);
	}

	if conjunctions.is_empty() {
		return Ok(terms.remove(0));
	}
	Ok(RawExpr::Sequence {
		terms,
		conjunctions,
	})
}

fn parse_term(input: &mut &str) -> std::result::Result<RawExpr, ContextError> {
	let _: &str = multispace0.parse_next(input)?;

	if input.starts_with('(') {
		let _ = '('.parse_next(input)?;
		let _: &str = multispace0.parse_next(input)?;
		let inner = parse_sequence(input)?;
		let _: &str = multispace0.parse_next(input)?;
		let _ = ')'.parse_next(input)?;
		return Ok(RawExpr::Group(Box::new(inner)));
	}

	if input.starts_with('*') {
		let _ = '*'.parse_next(input)?;
		return Ok(RawExpr::All);
	}

	parse_comparison(input)
}

fn parse_comparison(input: &mut &str) -> std::result::Result<RawExpr, ContextError> {
	let field = parse_field_path(input)?;
	let _: &str = multispace0.parse_next(input)?;
	let operator = parse_operator(input)?;

	let value = if operator.is_null_check() {
		Value::Null
	} else if operator.is_membership() {
		let _: &str = multispace0.parse_next(input)?;
		parse_value_list(input)?
	} else {
		let _: &str = multispace0.parse_next(input)?;
		parse_value(input)?
	};

	Ok(RawExpr::Comparison {
		field,
		operator,
		value,
	})
}

fn parse_field_path(input: &mut &str) -> std::result::Result<String, ContextError> {
	let path: &str = take_while(1.., |c: char| {
		c.is_ascii_alphanumeric() || c == '_' || c == '.'
	})
	.parse_next(input)?;
	if path.starts_with(|c: char| c.is_ascii_digit()) {
		return Err(ContextError::new());
	}
	Ok(path.to_string())
}

fn word(input: &mut &str) -> std::result::Result<String, ContextError> {
	let w: &str =
		take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_').parse_next(input)?;
	Ok(w.to_ascii_uppercase())
}

fn parse_operator(input: &mut &str) -> std::result::Result<Operator, ContextError> {
	let checkpoint = *input;
	let symbolic: std::result::Result<Operator, ContextError> = alt((
		">=".value(Operator::Gte),
		"<=".value(Operator::Lte),
		"!=".value(Operator::Neq),
		"=".value(Operator::Eq),
		">".value(Operator::Gt),
		"<".value(Operator::Lt),
	))
	.parse_next(input);
	if let Ok(op) = symbolic {
		return Ok(op);
	}
	*input = checkpoint;

	let first = word(input)?;
	match first.as_str() {
		"IS" => {
			let _: &str = multispace1.parse_next(input)?;
			match word(input)?.as_str() {
				"NULL" => Ok(Operator::IsNull),
				"NOT" => {
					let _: &str = multispace1.parse_next(input)?;
					match word(input)?.as_str() {
						"NULL" => Ok(Operator::IsNotNull),
						_ => Err(ContextError::new()),
					}
				}
				_ => Err(ContextError::new()),
			}
		}
		"NOT" => {
			let _: &str = multispace1.parse_next(input)?;
			match word(input)?.as_str() {
				"IN" => Ok(Operator::NotIn),
				"LIKE" => Ok(Operator::NotLike),
				_ => Err(ContextError::new()),
			}
		}
		other => other.parse().map_err(|_| ContextError::new()),
	}
}

fn parse_value_list(input: &mut &str) -> std::result::Result<Value, ContextError> {
	let _ = '('.parse_next(input)?;
	let mut items = Vec::new();
	loop {
		let _: &str = multispace0.parse_next(input)?;
		if input.starts_with(')') && items.is_empty() {
			break;
		}
		items.push(parse_value(input)?);
		let _: &str = multispace0.parse_next(input)?;
		if input.starts_with(',') {
			let _ = ','.parse_next(input)?;
		} else {
			break;
		}
	}
	let _: &str = multispace0.parse_next(input)?;
	let _ = ')'.parse_next(input)?;
	Ok(Value::List(items))
}

fn parse_value(input: &mut &str) -> std::result::Result<Value, ContextError> {
	if input.starts_with('"') || input.starts_with('\'') {
		return parse_quoted(input).map(Value::Text);
	}

	if input.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+' || c == '.') {
		let raw: &str = take_while(1.., |c: char| {
			c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')
		})
		.parse_next(input)?;
		return parse_number(raw).ok_or_else(ContextError::new);
	}

	match word(input)?.as_str() {
		"TRUE" => Ok(Value::Bool(true)),
		"FALSE" => Ok(Value::Bool(false)),
		"NULL" => Ok(Value::Null),
		_ => Err(ContextError::new()),
	}
}

fn parse_number(raw: &str) -> Option<Value> {
	if raw.contains(['.', 'e', 'E']) {
		return raw.parse::<f64>().ok().map(Value::Float);
	}
	raw
		.parse::<i64>()
		.map(Value::Int)
		.or_else(|_| raw.parse::<u64>().map(Value::UInt))
		.ok()
}

fn parse_quoted(input: &mut &str) -> std::result::Result<String, ContextError> {
	let mut chars = input.char_indices();
	let Some((_, quote)) = chars.next() else {
		return Err(ContextError::new());
	};

	let mut out = String::new();
	let mut escaped = false;
	for (idx, c) in chars {
		if escaped {
			out.push(c);
			escaped = false;
		} else if c == '\\' {
			escaped = true;
		} else if c == quote {
			*input = &input[idx + c.len_utf8()..];
			return Ok(out);
		} else {
			out.push(c);
		}
	}
	Err(ContextError::new())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::builder::*;

	#[test]
	fn test_simple_eq() {
		let p = parse_predicate(r#"metadata.environment = "prod""#).unwrap();
		assert_eq!(p, eq("metadata.environment", "prod"));
	}

	#[test]
	fn test_symbolic_operators() {
		assert_eq!(parse_predicate("age >= 30").unwrap(), gte("age", 30));
		assert_eq!(parse_predicate("age<30").unwrap(), lt("age", 30));
		assert_eq!(parse_predicate("ratio != 0.5").unwrap(), neq("ratio", 0.5));
	}

	#[test]
	fn test_keyword_operators() {
		assert_eq!(parse_predicate("owner IS NULL").unwrap(), is_null("owner"));
		assert_eq!(parse_predicate("owner is not null").unwrap(), is_not_null("owner"));
		assert_eq!(parse_predicate("owner IS_NOT_NULL").unwrap(), is_not_null("owner"));
		assert_eq!(
			parse_predicate("name starts_with 'web'").unwrap(),
			starts_with("name", "web")
		);
		assert_eq!(parse_predicate(r#"name NOT LIKE "tmp""#).unwrap(), not_like("name", "tmp"));
	}

	#[test]
	fn test_in_lists() {
		assert_eq!(
			parse_predicate(r#"region IN ("eu", "us")"#).unwrap(),
			in_list("region", ["eu", "us"])
		);
		assert_eq!(
			parse_predicate("replicas NOT IN (1, 2,3)").unwrap(),
			not_in("replicas", [1, 2, 3])
		);
		assert_eq!(
			parse_predicate("replicas not_in ()").unwrap(),
			not_in("replicas", Vec::<i64>::new())
		);
	}

	#[test]
	fn test_nested_compound() {
		let p = parse_predicate(r#"(a = 1 AND (b = "x" OR c > 2.5))"#).unwrap();
		assert_eq!(p, and([eq("a", 1), or([eq("b", "x"), gt("c", 2.5)])]));
	}

	#[test]
	fn test_unparenthesized_top_level() {
		let p = parse_predicate("a = 1 or b = 2").unwrap();
		assert_eq!(p, or([eq("a", 1), eq("b", 2)]));
	}

	#[test]
	fn test_mixed_conjunctions_rejected() {
		let err = parse_predicate("(a = 1 AND b = 2 OR c = 3)").unwrap_err();
		assert!(matches!(err, PredicateError::Syntax(_)));
	}

	#[test]
	fn test_escaped_quotes() {
		let p = parse_predicate(r#"name = "say \"hi\"""#).unwrap();
		assert_eq!(p, eq("name", r#"say "hi""#));
	}

	#[test]
	fn test_match_all() {
		assert_eq!(parse_predicate("*").unwrap(), Predicate::MatchAll);
	}

	#[test]
	fn test_null_value_needs_null_check() {
		let err = parse_predicate("owner = null").unwrap_err();
		assert!(matches!(err, PredicateError::InvalidValue { .. }));
	}

	#[test]
	fn test_garbage_is_syntax_error() {
		assert!(matches!(
			parse_predicate("a ~ 1"),
			Err(PredicateError::Syntax(_))
		));
		assert!(matches!(
			parse_predicate("(a = 1"),
			Err(PredicateError::Syntax(_))
		));
	}

	#[test]
	fn test_display_round_trip() {
		let p = and([
			eq("metadata.environment", "prod"),
			or([in_list("region", ["eu", "us"]), is_null("owner")]),
			gt("replicas", 3.0),
			not_in("port", [80u16, 443]),
		]);
		assert_eq!(parse_predicate(&p.to_string()).unwrap(), p);
	}
}
