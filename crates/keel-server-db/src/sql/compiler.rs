// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Predicate to Postgres `WHERE` fragment compilation.
//!
//! Values never appear in the emitted SQL. Every value is bound to a `$n`
//! placeholder, numbered left to right across the whole tree. Only field
//! path segments are embedded, as quoted identifiers or quoted literals.
//!
//! Root fields registered as JSONB document columns are navigated with `->`
//! and `->>`. Array-shaped documents compile to an `EXISTS` over
//! `jsonb_array_elements`, which gives the same any-element semantics as
//! broadcasting in the in-memory matcher.

use std::sync::Arc;

use keel_predicate::normalize::to_text;
use keel_predicate::{AtomicPredicate, Conjunction, Operator, Predicate, Value};
use tracing::{debug, trace};

use super::bind::SqlArg;
use super::config::{CompilerConfig, JsonFieldType};
use super::quote::{escape_like, quote_ident, quote_literal};

const ELEMENT: &str = "elem.value";

/// A compiled `WHERE` fragment and the arguments for its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSql {
	pub sql: String,
	pub args: Vec<SqlArg>,
}

impl CompiledSql {
	pub fn match_all() -> Self {
		Self {
			sql: "true".to_string(),
			args: Vec::new(),
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct SqlCompiler {
	config: Arc<CompilerConfig>,
}

struct Params {
	next: usize,
	args: Vec<SqlArg>,
}

impl Params {
	fn bind(&mut self, arg: SqlArg) -> String {
		let placeholder = format!("${}", self.next);
		self.next += 1;
		self.args.push(arg);
		placeholder
	}
}

#[derive(Debug)]
enum Operand {
	None,
	Scalar(String),
	Numeric(String),
	List(Vec<String>),
	/// Document membership, split so numeric items compare as numbers.
	Members {
		numeric: Vec<String>,
		text: Vec<String>,
	},
	Pattern(String),
	Json(String),
}

/// Object (`->`) and text (`->>`) forms of a document path.
struct Accessor {
	object: String,
	text: String,
}

impl Accessor {
	fn new(base: &str, path: &[String]) -> Self {
		let Some((last, init)) = path.split_last() else {
			return Self {
				object: base.to_string(),
				text: format!("({base} #>> '{{}}')"),
			};
		};

		let mut chain = base.to_string();
		for segment in init {
			chain.push_str("->");
			chain.push_str(&quote_literal(segment));
		}
		let last = quote_literal(last);
		Self {
			object: format!("({chain}->{last})"),
			text: format!("({chain}->>{last})"),
		}
	}
}

impl SqlCompiler {
	pub fn new(config: CompilerConfig) -> Self {
		Self {
			config: Arc::new(config),
		}
	}

	pub fn config(&self) -> &CompilerConfig {
		&self.config
	}

	pub fn compile(&self, predicate: &Predicate) -> CompiledSql {
		self.compile_from(predicate, 1)
	}

	/// Compile with placeholders numbered from `first_placeholder`, for
	/// fragments that follow other bound parameters.
	pub fn compile_from(&self, predicate: &Predicate, first_placeholder: usize) -> CompiledSql {
		assert!(first_placeholder >= 1, "placeholders are numbered from 1");
		let mut params = Params {
			next: first_placeholder,
			args: Vec::new(),
		};
		let sql = self.compile_node(predicate, &mut params);
		debug!(args = params.args.len(), sql = %sql, "compiled predicate");
		CompiledSql {
			sql,
			args: params.args,
		}
	}

	fn compile_node(&self, predicate: &Predicate, params: &mut Params) -> String {
		match predicate {
			Predicate::MatchAll => "true".to_string(),
			Predicate::Atomic(atom) => self.compile_atomic(atom, params),
			Predicate::Compound(compound) => match compound.children() {
				[] => "true".to_string(),
				[only] => self.compile_node(only, params),
				children => {
					let joiner = match compound.conjunction() {
						Conjunction::And => " AND ",
						Conjunction::Or => " OR ",
					};
					children
						.iter()
						.map(|child| format!("({})", self.compile_node(child, params)))
						.collect::<Vec<_>>()
						.join(joiner)
				}
			},
		}
	}

	fn compile_atomic(&self, atom: &AtomicPredicate, params: &mut Params) -> String {
		let column_name = self.config.column_for(atom.root_field());
		let column = quote_ident(&column_name);
		let path: Vec<String> = atom
			.nested_path()
			.into_iter()
			.map(str::to_lowercase)
			.collect();
		let operator = atom.operator();

		// A nested path implies a document even when the column is unregistered.
		let kind = self
			.config
			.document_field(&column_name)
			.or_else(|| (!path.is_empty()).then_some(JsonFieldType::Scalar));

		let fragment = match kind {
			None => {
				let operand = bind_column_operand(params, operator, atom.value());
				render_column(&column, operator, &operand)
			}
			Some(kind) => {
				let operand = bind_document_operand(params, operator, atom.value());
				match kind {
					JsonFieldType::Scalar => {
						render_document(&Accessor::new(&column, &path), operator, &operand)
					}
					JsonFieldType::ArrayOfScalars | JsonFieldType::ArrayOfObjects => {
						render_array(&column, &path, operator, &operand)
					}
					JsonFieldType::Unknown => format!(
						"(CASE WHEN jsonb_typeof({column}) = 'array' THEN {} ELSE {} END)",
						render_array(&column, &path, operator, &operand),
						render_document(&Accessor::new(&column, &path), operator, &operand),
					),
				}
			}
		};

		trace!(field = atom.field(), operator = %operator, fragment = %fragment, "compiled atomic predicate");
		fragment
	}
}

fn like_pattern(operator: Operator, value: &Value) -> String {
	let escaped = escape_like(&to_text(value));
	match operator {
		Operator::StartsWith => format!("{escaped}%"),
		Operator::EndsWith => format!("%{escaped}"),
		_ => format!("%{escaped}%"),
	}
}

fn list_items(operator: Operator, value: &Value) -> &[Value] {
	match value.as_list() {
		Some(items) => items,
		None => panic!("{operator} requires a list value, got {}", value.type_name()),
	}
}

fn bind_column_operand(params: &mut Params, operator: Operator, value: &Value) -> Operand {
	match operator {
		Operator::IsNull | Operator::IsNotNull => Operand::None,
		Operator::In | Operator::NotIn => Operand::List(
			list_items(operator, value)
				.iter()
				.map(|item| params.bind(SqlArg::from_value(item)))
				.collect(),
		),
		Operator::Like
		| Operator::NotLike
		| Operator::Contains
		| Operator::StartsWith
		| Operator::EndsWith => Operand::Pattern(params.bind(SqlArg::Text(like_pattern(operator, value)))),
		_ => Operand::Scalar(params.bind(SqlArg::from_value(value))),
	}
}

fn bind_document_operand(params: &mut Params, operator: Operator, value: &Value) -> Operand {
	match operator {
		Operator::IsNull | Operator::IsNotNull => Operand::None,
		Operator::Contains => Operand::Json(params.bind(SqlArg::Json(value.to_json()))),
		Operator::Like | Operator::NotLike | Operator::StartsWith | Operator::EndsWith => {
			Operand::Pattern(params.bind(SqlArg::Text(like_pattern(operator, value))))
		}
		Operator::In | Operator::NotIn => {
			// Numeric items bind first so placeholders read in order.
			let (numeric, text): (Vec<&Value>, Vec<&Value>) =
				list_items(operator, value).iter().partition(|item| item.is_numeric());
			Operand::Members {
				numeric: numeric
					.into_iter()
					.map(|item| params.bind(SqlArg::from_value(item)))
					.collect(),
				text: text
					.into_iter()
					.map(|item| params.bind(SqlArg::Text(to_text(item))))
					.collect(),
			}
		}
		_ if value.is_numeric() => Operand::Numeric(params.bind(SqlArg::from_value(value))),
		_ => Operand::Scalar(params.bind(SqlArg::Text(to_text(value)))),
	}
}

fn comparison_token(operator: Operator) -> &'static str {
	match operator {
		Operator::Eq => "=",
		Operator::Neq => "<>",
		Operator::Gt => ">",
		Operator::Gte => ">=",
		Operator::Lt => "<",
		Operator::Lte => "<=",
		other => panic!("{other} is not a comparison operator"),
	}
}

fn render_column(column: &str, operator: Operator, operand: &Operand) -> String {
	match (operator, operand) {
		(Operator::IsNull, _) => format!("{column} IS NULL"),
		(Operator::IsNotNull, _) => format!("{column} IS NOT NULL"),
		(Operator::In, Operand::List(placeholders)) if placeholders.is_empty() => {
			"false".to_string()
		}
		(Operator::NotIn, Operand::List(placeholders)) if placeholders.is_empty() => {
			format!("{column} IS NOT NULL")
		}
		(Operator::In, Operand::List(placeholders)) => {
			format!("{column} IN ({})", placeholders.join(", "))
		}
		(Operator::NotIn, Operand::List(placeholders)) => {
			format!("{column} NOT IN ({})", placeholders.join(", "))
		}
		(Operator::NotLike, Operand::Pattern(p)) => {
			format!("{column}::text NOT LIKE {p} ESCAPE '\\'")
		}
		(_, Operand::Pattern(p)) => format!("{column}::text LIKE {p} ESCAPE '\\'"),
		(op, Operand::Scalar(p)) => format!("{column} {} {p}", comparison_token(op)),
		(op, operand) => panic!("cannot render {op} against a column with {operand:?}"),
	}
}

/// Only JSON numbers convert; numeric-looking strings stay unordered.
fn numeric_expr(object: &str, text: &str) -> String {
	format!("(CASE WHEN jsonb_typeof({object}) = 'number' THEN {text}::numeric END)")
}

fn numeric_list(placeholders: &[String]) -> String {
	placeholders
		.iter()
		.map(|p| format!("{p}::numeric"))
		.collect::<Vec<_>>()
		.join(", ")
}

fn render_document(accessor: &Accessor, operator: Operator, operand: &Operand) -> String {
	let Accessor { object, text } = accessor;
	match (operator, operand) {
		(Operator::IsNull, _) => {
			format!("({object} IS NULL OR jsonb_typeof({object}) = 'null')")
		}
		(Operator::IsNotNull, _) => format!("jsonb_typeof({object}) <> 'null'"),
		(Operator::Contains, Operand::Json(p)) => format!("{object} @> {p}::jsonb"),
		(Operator::NotLike, Operand::Pattern(p)) => {
			format!("{text} NOT LIKE {p} ESCAPE '\\'")
		}
		(_, Operand::Pattern(p)) => format!("{text} LIKE {p} ESCAPE '\\'"),
		(Operator::In, Operand::Members { numeric, text: items }) => {
			let mut terms = Vec::new();
			if !numeric.is_empty() {
				terms.push(format!("{} IN ({})", numeric_expr(object, text), numeric_list(numeric)));
			}
			if !items.is_empty() {
				terms.push(format!("{text} IN ({})", items.join(", ")));
			}
			match terms.len() {
				0 => "false".to_string(),
				1 => terms.remove(0),
				_ => format!("({})", terms.join(" OR ")),
			}
		}
		(Operator::NotIn, Operand::Members { numeric, text: items }) => {
			let mut terms = vec![format!("{text} IS NOT NULL")];
			if !numeric.is_empty() {
				let num = numeric_expr(object, text);
				terms.push(format!(
					"({num} IS NULL OR {num} NOT IN ({}))",
					numeric_list(numeric)
				));
			}
			if !items.is_empty() {
				terms.push(format!("{text} NOT IN ({})", items.join(", ")));
			}
			match terms.len() {
				1 => terms.remove(0),
				_ => format!("({})", terms.join(" AND ")),
			}
		}
		(Operator::Neq, Operand::Numeric(p)) => {
			let num = numeric_expr(object, text);
			format!("({text} IS NOT NULL AND ({num} IS NULL OR {num} <> {p}::numeric))")
		}
		(op, Operand::Numeric(p)) => {
			format!("{} {} {p}::numeric", numeric_expr(object, text), comparison_token(op))
		}
		(op, Operand::Scalar(p)) if op.is_ordering() => format!(
			"(jsonb_typeof({object}) <> 'number' AND {text} COLLATE \"C\" {} {p})",
			comparison_token(op)
		),
		(op, Operand::Scalar(p)) => format!("{text} {} {p}", comparison_token(op)),
		(op, operand) => panic!("cannot render {op} against a document with {operand:?}"),
	}
}

fn render_array(column: &str, path: &[String], operator: Operator, operand: &Operand) -> String {
	let condition = render_document(&Accessor::new(ELEMENT, path), operator, operand);
	let exists = format!(
		"EXISTS (SELECT 1 FROM jsonb_array_elements(CASE WHEN jsonb_typeof({column}) = 'array' THEN {column} ELSE '[]'::jsonb END) AS elem(value) WHERE {condition})"
	);
	if operator == Operator::IsNull {
		format!("(jsonb_typeof({column}) IS DISTINCT FROM 'array' OR {exists})")
	} else {
		exists
	}
}

#[cfg(test)]
mod tests {
	use keel_predicate::builder::*;
	use serde_json::json;

	use super::*;

	fn compiler() -> SqlCompiler {
		SqlCompiler::new(
			CompilerConfig::builder()
				.document_field("metadata", JsonFieldType::Scalar)
				.document_field("tags", JsonFieldType::ArrayOfScalars)
				.document_field("vpas", JsonFieldType::ArrayOfObjects)
				.document_field("labels", JsonFieldType::Unknown)
				.field_mapping("tenantId", "tenant_id")
				.build(),
		)
	}

	fn text(s: &str) -> SqlArg {
		SqlArg::Text(s.to_string())
	}

	#[test]
	fn test_plain_column_comparisons() {
		let c = compiler();
		let out = c.compile(&eq("name", "edge"));
		assert_eq!(out.sql, "name = $1");
		assert_eq!(out.args, vec![text("edge")]);

		assert_eq!(c.compile(&neq("tier", 2)).sql, "tier <> $1");
		assert_eq!(c.compile(&gte("tier", 2)).sql, "tier >= $1");
		assert_eq!(c.compile(&is_null("owner")).sql, "owner IS NULL");
		assert!(c.compile(&is_not_null("owner")).args.is_empty());
	}

	#[test]
	fn test_placeholders_follow_traversal_order() {
		let out = compiler().compile(&and([eq("name", "x"), in_list("tier", [1, 2])]));
		assert_eq!(out.sql, "(name = $1) AND (tier IN ($2, $3))");
		assert_eq!(out.args, vec![text("x"), SqlArg::Int(1), SqlArg::Int(2)]);
	}

	#[test]
	fn test_compile_from_offsets_placeholders() {
		let out = compiler().compile_from(&or([eq("a", 1), eq("b", 2)]), 4);
		assert_eq!(out.sql, "(a = $4) OR (b = $5)");
	}

	#[test]
	fn test_compound_identities() {
		let c = compiler();
		assert_eq!(c.compile(&and(Vec::<Predicate>::new())), CompiledSql::match_all());
		assert_eq!(c.compile(&or(Vec::<Predicate>::new())), CompiledSql::match_all());
		assert_eq!(c.compile(&match_all()), CompiledSql::match_all());
		assert_eq!(c.compile(&and([eq("a", 1)])), c.compile(&eq("a", 1)));
	}

	#[test]
	fn test_nested_compound_parenthesization() {
		let out = compiler().compile(&and([
			or([eq("a", 1), eq("b", 2)]),
			eq("c", 3),
		]));
		assert_eq!(out.sql, "((a = $1) OR (b = $2)) AND (c = $3)");
	}

	#[test]
	fn test_field_mapping() {
		let out = compiler().compile(&eq("tenantId", "t-1"));
		assert_eq!(out.sql, "tenant_id = $1");
	}

	#[test]
	fn test_unusual_identifiers_are_quoted() {
		let out = compiler().compile(&eq("weird name", 1));
		assert_eq!(out.sql, "\"weird name\" = $1");
	}

	#[test]
	fn test_membership_edge_cases() {
		let c = compiler();
		assert_eq!(c.compile(&in_list("tier", Vec::<i32>::new())).sql, "false");
		assert_eq!(
			c.compile(&not_in("tier", Vec::<i32>::new())).sql,
			"tier IS NOT NULL"
		);
		assert_eq!(
			c.compile(&not_in("name", ["a", "b"])).sql,
			"name NOT IN ($1, $2)"
		);
	}

	#[test]
	fn test_like_family_escapes_pattern() {
		let c = compiler();
		let out = c.compile(&like("name", "50%_off"));
		assert_eq!(out.sql, "name::text LIKE $1 ESCAPE '\\'");
		assert_eq!(out.args, vec![text("%50\\%\\_off%")]);

		assert_eq!(c.compile(&starts_with("name", "ed")).args, vec![text("ed%")]);
		assert_eq!(c.compile(&ends_with("name", "ge")).args, vec![text("%ge")]);
		assert_eq!(
			c.compile(&not_like("name", "x")).sql,
			"name::text NOT LIKE $1 ESCAPE '\\'"
		);
		assert_eq!(c.compile(&contains("name", "x")).args, vec![text("%x%")]);
	}

	#[test]
	fn test_scalar_document_text_access() {
		let out = compiler().compile(&eq("metadata.environment", "prod"));
		assert_eq!(out.sql, "(metadata->>'environment') = $1");
		assert_eq!(out.args, vec![text("prod")]);
	}

	#[test]
	fn test_document_path_is_lowercased() {
		let c = compiler();
		assert_eq!(
			c.compile(&eq("Metadata.Status.Region", "x")).sql,
			"(metadata->'status'->>'region') = $1"
		);
	}

	#[test]
	fn test_document_numeric_comparison_is_cast() {
		let out = compiler().compile(&gt("metadata.replicas", 2));
		assert_eq!(
			out.sql,
			"(CASE WHEN jsonb_typeof((metadata->'replicas')) = 'number' THEN (metadata->>'replicas')::numeric END) > $1::numeric"
		);
		assert_eq!(out.args, vec![SqlArg::Int(2)]);
	}

	#[test]
	fn test_document_text_ordering_uses_byte_collation() {
		let out = compiler().compile(&lt("metadata.version", "v2"));
		assert_eq!(
			out.sql,
			"(jsonb_typeof((metadata->'version')) <> 'number' AND (metadata->>'version') COLLATE \"C\" < $1)"
		);
	}

	#[test]
	fn test_document_null_checks_use_object_access() {
		let c = compiler();
		assert_eq!(
			c.compile(&is_null("metadata.owner")).sql,
			"((metadata->'owner') IS NULL OR jsonb_typeof((metadata->'owner')) = 'null')"
		);
		assert_eq!(
			c.compile(&is_not_null("metadata.owner")).sql,
			"jsonb_typeof((metadata->'owner')) <> 'null'"
		);
	}

	#[test]
	fn test_document_contains_uses_containment() {
		let out = compiler().compile(&contains("metadata.roles", "admin"));
		assert_eq!(out.sql, "(metadata->'roles') @> $1::jsonb");
		assert_eq!(out.args, vec![SqlArg::Json(json!("admin"))]);
	}

	#[test]
	fn test_document_root_without_path() {
		let out = compiler().compile(&eq("metadata", "x"));
		assert_eq!(out.sql, "(metadata #>> '{}') = $1");
	}

	#[test]
	fn test_document_numeric_membership() {
		let out = compiler().compile(&in_list("metadata.replicas", [1, 3]));
		assert!(out.sql.ends_with(" IN ($1::numeric, $2::numeric)"));
		assert_eq!(out.args, vec![SqlArg::Int(1), SqlArg::Int(3)]);

		let out = compiler().compile(&in_list("metadata.env", ["a", "b"]));
		assert_eq!(out.sql, "(metadata->>'env') IN ($1, $2)");

		assert_eq!(
			compiler().compile(&not_in("metadata.env", ["a"])).sql,
			"((metadata->>'env') IS NOT NULL AND (metadata->>'env') NOT IN ($1))"
		);
		assert_eq!(
			compiler().compile(&in_list("metadata.env", Vec::<i32>::new())).sql,
			"false"
		);
	}

	fn membership(operator: Operator, items: Vec<Value>) -> Predicate {
		Predicate::Atomic(
			AtomicPredicate::new("metadata.replicas", operator, Value::List(items)).unwrap(),
		)
	}

	#[test]
	fn test_document_mixed_membership_splits_numeric_items() {
		let out = compiler().compile(&membership(Operator::In, vec![Value::Int(1), Value::from("one")]));
		assert_eq!(
			out.sql,
			"((CASE WHEN jsonb_typeof((metadata->'replicas')) = 'number' THEN (metadata->>'replicas')::numeric END) IN ($1::numeric) OR (metadata->>'replicas') IN ($2))"
		);
		assert_eq!(out.args, vec![SqlArg::Int(1), text("one")]);

		let out = compiler().compile(&membership(Operator::NotIn, vec![Value::from("one"), Value::Int(1)]));
		assert_eq!(
			out.sql,
			"((metadata->>'replicas') IS NOT NULL AND ((CASE WHEN jsonb_typeof((metadata->'replicas')) = 'number' THEN (metadata->>'replicas')::numeric END) IS NULL OR (CASE WHEN jsonb_typeof((metadata->'replicas')) = 'number' THEN (metadata->>'replicas')::numeric END) NOT IN ($1::numeric)) AND (metadata->>'replicas') NOT IN ($2))"
		);
		assert_eq!(out.args, vec![SqlArg::Int(1), text("one")]);
	}

	#[test]
	fn test_array_of_objects_exists() {
		let out = compiler().compile(&eq("vpas.cell.id", "c-1"));
		assert_eq!(
			out.sql,
			"EXISTS (SELECT 1 FROM jsonb_array_elements(CASE WHEN jsonb_typeof(vpas) = 'array' THEN vpas ELSE '[]'::jsonb END) AS elem(value) WHERE (elem.value->'cell'->>'id') = $1)"
		);
		assert_eq!(out.args, vec![text("c-1")]);
	}

	#[test]
	fn test_array_of_scalars_uses_element() {
		let out = compiler().compile(&eq("tags", "blue"));
		assert_eq!(
			out.sql,
			"EXISTS (SELECT 1 FROM jsonb_array_elements(CASE WHEN jsonb_typeof(tags) = 'array' THEN tags ELSE '[]'::jsonb END) AS elem(value) WHERE (elem.value #>> '{}') = $1)"
		);
	}

	#[test]
	fn test_array_is_null_covers_missing_array() {
		let out = compiler().compile(&is_null("vpas.cell"));
		assert!(out
			.sql
			.starts_with("(jsonb_typeof(vpas) IS DISTINCT FROM 'array' OR EXISTS ("));
	}

	#[test]
	fn test_unknown_field_dispatches_at_runtime_and_reuses_placeholders() {
		let out = compiler().compile(&and([eq("labels.env", "prod"), eq("name", "x")]));
		assert!(out
			.sql
			.starts_with("((CASE WHEN jsonb_typeof(labels) = 'array' THEN EXISTS ("));
		assert_eq!(out.sql.matches("$1").count(), 2);
		assert!(out.sql.ends_with("(name = $2)"));
		assert_eq!(out.args, vec![text("prod"), text("x")]);
	}

	#[test]
	fn test_unregistered_nested_path_is_a_document() {
		let out = compiler().compile(&eq("status.region", "x"));
		assert_eq!(out.sql, "(status->>'region') = $1");
	}

	#[test]
	fn test_values_never_interpolated() {
		let out = compiler().compile(&eq("metadata.o'x", "'; DROP TABLE sites; --"));
		assert_eq!(out.sql, "(metadata->>'o''x') = $1");
		assert!(!out.sql.contains("DROP"));
	}

	#[test]
	fn test_compiler_is_send_sync() {
		fn assert_send_sync<T: Send + Sync>() {}
		assert_send_sync::<SqlCompiler>();
	}
}

#[cfg(test)]
mod proptest_tests {
	use keel_predicate::builder;
	use proptest::prelude::*;

	use super::*;

	const FIELDS: &[&str] = &["name", "tier", "metadata.env", "vpas.cell.id", "tags"];

	fn compiler() -> SqlCompiler {
		SqlCompiler::new(
			CompilerConfig::builder()
				.document_field("metadata", JsonFieldType::Scalar)
				.document_field("tags", JsonFieldType::ArrayOfScalars)
				.document_field("vpas", JsonFieldType::ArrayOfObjects)
				.build(),
		)
	}

	fn arb_atomic() -> impl Strategy<Value = Predicate> {
		let field = prop::sample::select(FIELDS);
		let op = prop::sample::select(Operator::ALL.to_vec());
		let scalar = prop_oneof![
			(-20i64..20).prop_map(Value::Int),
			"[a-z%_']{0,5}".prop_map(Value::Text),
		];
		(field, op, scalar.clone(), prop::collection::vec(scalar, 0..4)).prop_map(
			|(field, op, scalar, list)| {
				let value = if op.is_null_check() {
					Value::Null
				} else if op.is_membership() {
					Value::List(list)
				} else {
					scalar
				};
				Predicate::Atomic(
					AtomicPredicate::new(field, op, value).expect("generated atom is valid"),
				)
			},
		)
	}

	fn arb_predicate() -> impl Strategy<Value = Predicate> {
		arb_atomic().prop_recursive(3, 24, 4, |inner| {
			prop_oneof![
				prop::collection::vec(inner.clone(), 0..4).prop_map(builder::and),
				prop::collection::vec(inner, 0..4).prop_map(builder::or),
			]
		})
	}

	fn placeholders(sql: &str) -> Vec<usize> {
		let bytes = sql.as_bytes();
		let mut out = Vec::new();
		let mut i = 0;
		while i < bytes.len() {
			if bytes[i] == b'$' {
				let start = i + 1;
				let mut end = start;
				while end < bytes.len() && bytes[end].is_ascii_digit() {
					end += 1;
				}
				if end > start {
					out.push(sql[start..end].parse().unwrap());
				}
				i = end.max(i + 1);
			} else {
				i += 1;
			}
		}
		out
	}

	proptest! {
		#[test]
		fn placeholders_are_sequential(p in arb_predicate(), first in 1usize..5) {
			let out = compiler().compile_from(&p, first);
			let expected: Vec<usize> = (first..first + out.args.len()).collect();
			prop_assert_eq!(placeholders(&out.sql), expected);
		}

	}
}
