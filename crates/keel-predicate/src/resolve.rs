// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Dotted-path field resolution over arbitrary object graphs.
//!
//! Types opt in by implementing [`Inspect`], which reports whether a value is
//! a leaf, a list, a keyed map or a record. Records are usually wired up with
//! [`impl_record!`](crate::impl_record), which generates the member table.
//!
//! Resolution rules, applied per segment:
//! - lists broadcast: the rest of the path is resolved against every element
//!   and the results are flattened; an element that fails to resolve
//!   contributes a null;
//! - maps look the segment up as a case-sensitive key;
//! - records look the segment up as a case-insensitive member name;
//! - descending through a null is an error.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::error::ResolveError;
use crate::value::Value;

/// What a value looks like to the resolver.
pub enum Shape<'a> {
	Null,
	Leaf(Value),
	List(Vec<&'a dyn Inspect>),
	Map(&'a dyn KeyedAccess),
	Record(&'a dyn RecordAccess),
}

pub trait Inspect {
	fn shape(&self) -> Shape<'_>;
}

/// Case-sensitive string-keyed lookup.
pub trait KeyedAccess {
	fn get(&self, key: &str) -> Option<&dyn Inspect>;
}

/// Named-member lookup. `field` is called with an exact entry of
/// `field_names`; the resolver handles case folding.
pub trait RecordAccess {
	fn field_names(&self) -> &'static [&'static str];
	fn field(&self, name: &str) -> Option<&dyn Inspect>;
}

/// Result of resolving a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
	/// A leaf value (possibly null).
	Value(Value),
	/// A record or map: present, but not comparable.
	Composite,
	/// Flattened results of broadcasting through one or more lists.
	Many(Vec<Resolved>),
}

pub fn resolve(root: &dyn Inspect, path: &str) -> Result<Resolved, ResolveError> {
	let segments: Vec<&str> = path.split('.').collect();
	resolve_segments(root, &segments, path)
}

fn resolve_segments(
	current: &dyn Inspect,
	segments: &[&str],
	path: &str,
) -> Result<Resolved, ResolveError> {
	let shape = match current.shape() {
		Shape::List(items) => {
			let mut out = Vec::with_capacity(items.len());
			for item in items {
				match resolve_segments(item, segments, path) {
					Ok(Resolved::Many(nested)) => out.extend(nested),
					Ok(resolved) => out.push(resolved),
					Err(e) => {
						trace!(error = %e, "list element did not resolve, reading as null");
						out.push(Resolved::Value(Value::Null));
					}
				}
			}
			return Ok(Resolved::Many(out));
		}
		other => other,
	};

	let Some((segment, rest)) = segments.split_first() else {
		return Ok(match shape {
			Shape::Null => Resolved::Value(Value::Null),
			Shape::Leaf(value) => Resolved::Value(value),
			_ => Resolved::Composite,
		});
	};

	let next = match shape {
		Shape::Map(map) => map.get(segment),
		Shape::Record(record) => record
			.field_names()
			.iter()
			.find(|name| name.eq_ignore_ascii_case(segment))
			.and_then(|name| record.field(name)),
		Shape::Null => {
			return Err(ResolveError::NullTraversal {
				segment: segment.to_string(),
				path: path.to_string(),
			})
		}
		Shape::Leaf(_) | Shape::List(_) => {
			return Err(ResolveError::NotTraversable {
				segment: segment.to_string(),
				path: path.to_string(),
			})
		}
	};

	match next {
		Some(child) => resolve_segments(child, rest, path),
		None => Err(ResolveError::MissingField {
			segment: segment.to_string(),
			path: path.to_string(),
		}),
	}
}

/// Implements [`RecordAccess`] and [`Inspect`] for a struct.
///
/// Members are exposed under their Rust name unless an alias is given:
///
/// ```
/// use keel_predicate::impl_record;
///
/// struct Cell { id: String }
/// struct Vpa { cell: Cell, tenant_id: String }
///
/// impl_record!(Cell { id });
/// impl_record!(Vpa { cell, tenant_id => "tenantId" });
/// ```
#[macro_export]
macro_rules! impl_record {
	(@name $field:ident) => {
		stringify!($field)
	};
	(@name $field:ident $alias:literal) => {
		$alias
	};
	($ty:ty { $($field:ident $(=> $alias:literal)?),* $(,)? }) => {
		impl $crate::resolve::RecordAccess for $ty {
			fn field_names(&self) -> &'static [&'static str] {
				&[$($crate::impl_record!(@name $field $($alias)?)),*]
			}

			fn field(&self, name: &str) -> Option<&dyn $crate::resolve::Inspect> {
				$(
					if name == $crate::impl_record!(@name $field $($alias)?) {
						return Some(&self.$field as &dyn $crate::resolve::Inspect);
					}
				)*
				None
			}
		}

		impl $crate::resolve::Inspect for $ty {
			fn shape(&self) -> $crate::resolve::Shape<'_> {
				$crate::resolve::Shape::Record(self)
			}
		}
	};
}

macro_rules! impl_leaf {
	($($ty:ty),*) => {
		$(impl Inspect for $ty {
			fn shape(&self) -> Shape<'_> {
				Shape::Leaf(Value::from(*self))
			}
		})*
	};
}

impl_leaf!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool);

impl Inspect for String {
	fn shape(&self) -> Shape<'_> {
		Shape::Leaf(Value::Text(self.clone()))
	}
}

impl Inspect for str {
	fn shape(&self) -> Shape<'_> {
		Shape::Leaf(Value::Text(self.to_string()))
	}
}

impl<T: Inspect + ?Sized> Inspect for &T {
	fn shape(&self) -> Shape<'_> {
		(**self).shape()
	}
}

impl<T: Inspect + ?Sized> Inspect for Box<T> {
	fn shape(&self) -> Shape<'_> {
		(**self).shape()
	}
}

impl<T: Inspect> Inspect for Option<T> {
	fn shape(&self) -> Shape<'_> {
		match self {
			Some(inner) => inner.shape(),
			None => Shape::Null,
		}
	}
}

impl<T: Inspect> Inspect for Vec<T> {
	fn shape(&self) -> Shape<'_> {
		self.as_slice().shape()
	}
}

impl<T: Inspect> Inspect for [T] {
	fn shape(&self) -> Shape<'_> {
		Shape::List(self.iter().map(|item| item as &dyn Inspect).collect())
	}
}

impl<T: Inspect> KeyedAccess for HashMap<String, T> {
	fn get(&self, key: &str) -> Option<&dyn Inspect> {
		HashMap::get(self, key).map(|v| v as &dyn Inspect)
	}
}

impl<T: Inspect> Inspect for HashMap<String, T> {
	fn shape(&self) -> Shape<'_> {
		Shape::Map(self)
	}
}

impl<T: Inspect> KeyedAccess for BTreeMap<String, T> {
	fn get(&self, key: &str) -> Option<&dyn Inspect> {
		BTreeMap::get(self, key).map(|v| v as &dyn Inspect)
	}
}

impl<T: Inspect> Inspect for BTreeMap<String, T> {
	fn shape(&self) -> Shape<'_> {
		Shape::Map(self)
	}
}

impl KeyedAccess for serde_json::Map<String, serde_json::Value> {
	fn get(&self, key: &str) -> Option<&dyn Inspect> {
		serde_json::Map::get(self, key).map(|v| v as &dyn Inspect)
	}
}

impl Inspect for serde_json::Value {
	fn shape(&self) -> Shape<'_> {
		match self {
			serde_json::Value::Null => Shape::Null,
			serde_json::Value::Array(items) => items.as_slice().shape(),
			serde_json::Value::Object(map) => Shape::Map(map),
			leaf => Shape::Leaf(Value::from_json(leaf).unwrap_or(Value::Null)),
		}
	}
}

impl Inspect for Value {
	fn shape(&self) -> Shape<'_> {
		match self {
			Value::Null => Shape::Null,
			Value::List(items) => items.as_slice().shape(),
			leaf => Shape::Leaf(leaf.clone()),
		}
	}
}
