// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identifier and literal quoting for generated SQL.

/// Emit `name` bare when it is a plain lower-case identifier, otherwise
/// double-quote it with embedded quotes doubled.
pub fn quote_ident(name: &str) -> String {
	let mut chars = name.chars();
	let plain = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
		&& chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
	if plain {
		name.to_string()
	} else {
		format!("\"{}\"", name.replace('"', "\"\""))
	}
}

/// Quote each dot-separated part of a possibly schema-qualified name.
pub fn quote_qualified(name: &str) -> String {
	name.split('.').map(quote_ident).collect::<Vec<_>>().join(".")
}

/// Single-quoted string literal with embedded quotes doubled.
pub fn quote_literal(value: &str) -> String {
	format!("'{}'", value.replace('\'', "''"))
}

/// Escape `\`, `%` and `_` for a `LIKE ... ESCAPE '\'` pattern.
pub fn escape_like(value: &str) -> String {
	let mut out = String::with_capacity(value.len());
	for c in value.chars() {
		if matches!(c, '\\' | '%' | '_') {
			out.push('\\');
		}
		out.push(c);
	}
	out
}
