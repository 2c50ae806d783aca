//! Expression helpers: raw templates, aliases, column comparisons and
//! boolean conjunctions.
//!
//! Every helper is a [`Fragment`] and can be passed anywhere a predicate or
//! column is accepted, including as an argument of another expression.
//!
//! # Examples
//!
//! ```
//! use cbquery_core::Fragment;
//! use cbquery_statements::expr::{And, Equal, Gt, Or, Lt};
//!
//! let filter = And::new()
//!     .push(Equal::new().column("name", "test"))
//!     .push(Or::new().push(Gt::new().column("age", 30)).push(Lt::new().column("age", 10)));
//!
//! let (sql, args) = filter.render().unwrap();
//! assert_eq!(sql, "(name = ? AND (age > ? OR age < ?))");
//! assert_eq!(args.len(), 3);
//! ```

use std::collections::BTreeMap;

use cbquery_core::fragment::{
	Expr, Fragment, FragmentRef, IntoArgs, Rendered, fragment, render_nested,
};
use cbquery_core::{RenderError, RenderResult, Value};

/// Creates a template expression.
///
/// # Examples
///
/// ```
/// use cbquery_core::Fragment;
/// use cbquery_statements::expr::expr;
///
/// let (sql, args) = expr("name = ?", ["test"]).render().unwrap();
/// assert_eq!(sql, "name = ?");
/// assert_eq!(args.len(), 1);
/// ```
pub fn expr(sql: impl Into<String>, args: impl IntoArgs) -> Expr {
	Expr::new(sql, args.into_args())
}

/// `(<fragment>) AS <alias>`.
#[derive(Debug, Clone)]
pub struct Alias {
	fragment: FragmentRef,
	alias: String,
}

/// Aliases a fragment with `AS`.
pub fn alias(inner: impl Fragment + 'static, alias: impl Into<String>) -> Alias {
	Alias {
		fragment: fragment(inner),
		alias: alias.into(),
	}
}

impl Fragment for Alias {
	fn render(&self) -> RenderResult<Rendered> {
		let (sql, args) = render_nested(self.fragment.as_ref())?;
		Ok((format!("({sql}) AS {}", self.alias), args))
	}
}

macro_rules! column_conditions {
	($($(#[$meta:meta])* $name:ident;)*) => {
		$(
			$(#[$meta])*
			#[derive(Debug, Clone, Default, PartialEq)]
			pub struct $name(BTreeMap<String, Value>);

			impl $name {
				pub fn new() -> Self {
					Self::default()
				}

				/// Adds a condition on `column`, replacing any earlier one.
				#[must_use]
				pub fn column(
					mut self,
					column: impl Into<String>,
					value: impl Into<Value>,
				) -> Self {
					self.0.insert(column.into(), value.into());
					self
				}

				pub fn len(&self) -> usize {
					self.0.len()
				}

				pub fn is_empty(&self) -> bool {
					self.0.is_empty()
				}
			}

			impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for $name {
				fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
					Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
				}
			}
		)*
	};
}

column_conditions! {
	/// `column = value` for every column, joined with `AND`.
	///
	/// `Null` renders `IS NULL`, an array renders `IN (...)` (an empty one
	/// is always false), and a fragment is rendered in place of the value.
	Equal;
	/// `column <> value` for every column, joined with `AND`.
	///
	/// The negation of [`Equal`]: `IS NOT NULL`, `NOT IN (...)`, and an
	/// empty array is always true.
	NotEqual;
	/// `column < value`.
	Lt;
	/// `column <= value`.
	Lte;
	/// `column > value`.
	Gt;
	/// `column >= value`.
	Gte;
}

struct EqualityOps {
	compare: &'static str,
	null: &'static str,
	membership: &'static str,
	empty: &'static str,
}

const EQUAL: EqualityOps = EqualityOps {
	compare: "=",
	null: "IS NULL",
	membership: "IN",
	empty: "1=0",
};

const NOT_EQUAL: EqualityOps = EqualityOps {
	compare: "<>",
	null: "IS NOT NULL",
	membership: "NOT IN",
	empty: "1=1",
};

fn render_equality(columns: &BTreeMap<String, Value>, ops: &EqualityOps) -> RenderResult<Rendered> {
	let mut parts = Vec::with_capacity(columns.len());
	let mut args = Vec::new();

	for (column, value) in columns {
		let items = match value {
			Value::Null => {
				parts.push(format!("{column} {}", ops.null));
				continue;
			}
			Value::Fragment(nested) => {
				let (sql, nested_args) = render_nested(nested.as_ref())?;
				parts.push(format!("{column} {} {sql}", ops.compare));
				args.extend(nested_args);
				continue;
			}
			Value::Array(_, items) => items.clone(),
			Value::List(list) => list.reverse().iter().cloned().collect(),
			other => {
				parts.push(format!("{column} {} ?", ops.compare));
				args.push(other.clone());
				continue;
			}
		};

		if items.is_empty() {
			parts.push(ops.empty.to_owned());
		} else {
			let markers = vec!["?"; items.len()].join(",");
			parts.push(format!("{column} {} ({markers})", ops.membership));
			args.extend(items);
		}
	}

	Ok((parts.join(" AND "), args))
}

fn render_comparison(
	columns: &BTreeMap<String, Value>,
	op: &'static str,
) -> RenderResult<Rendered> {
	let mut parts = Vec::with_capacity(columns.len());
	let mut args = Vec::new();

	for (column, value) in columns {
		match value {
			Value::Null => return Err(RenderError::NullComparison { op }),
			Value::Fragment(nested) => {
				let (sql, nested_args) = render_nested(nested.as_ref())?;
				parts.push(format!("{column} {op} {sql}"));
				args.extend(nested_args);
			}
			other => {
				parts.push(format!("{column} {op} ?"));
				args.push(other.clone());
			}
		}
	}

	Ok((parts.join(" AND "), args))
}

impl Fragment for Equal {
	fn render(&self) -> RenderResult<Rendered> {
		render_equality(&self.0, &EQUAL)
	}
}

impl Fragment for NotEqual {
	fn render(&self) -> RenderResult<Rendered> {
		render_equality(&self.0, &NOT_EQUAL)
	}
}

impl Fragment for Lt {
	fn render(&self) -> RenderResult<Rendered> {
		render_comparison(&self.0, "<")
	}
}

impl Fragment for Lte {
	fn render(&self) -> RenderResult<Rendered> {
		render_comparison(&self.0, "<=")
	}
}

impl Fragment for Gt {
	fn render(&self) -> RenderResult<Rendered> {
		render_comparison(&self.0, ">")
	}
}

impl Fragment for Gte {
	fn render(&self) -> RenderResult<Rendered> {
		render_comparison(&self.0, ">=")
	}
}

macro_rules! conjunctions {
	($($(#[$meta:meta])* $name:ident => $separator:literal;)*) => {
		$(
			$(#[$meta])*
			#[derive(Debug, Clone, Default)]
			pub struct $name(Vec<FragmentRef>);

			impl $name {
				pub fn new() -> Self {
					Self::default()
				}

				/// Adds a child condition.
				#[must_use]
				pub fn push(mut self, condition: impl Fragment + 'static) -> Self {
					self.0.push(fragment(condition));
					self
				}

				pub fn len(&self) -> usize {
					self.0.len()
				}

				pub fn is_empty(&self) -> bool {
					self.0.is_empty()
				}
			}

			impl FromIterator<FragmentRef> for $name {
				fn from_iter<I: IntoIterator<Item = FragmentRef>>(iter: I) -> Self {
					Self(iter.into_iter().collect())
				}
			}

			impl Fragment for $name {
				fn render(&self) -> RenderResult<Rendered> {
					render_conjunction(&self.0, $separator)
				}
			}
		)*
	};
}

conjunctions! {
	/// Children joined with `AND`, parenthesised when there is more than one.
	And => " AND ";
	/// Children joined with `OR`, parenthesised when there is more than one.
	Or => " OR ";
}

fn render_conjunction(children: &[FragmentRef], separator: &str) -> RenderResult<Rendered> {
	match children {
		[] => Ok((String::new(), Vec::new())),
		[only] => render_nested(only.as_ref()),
		_ => {
			let mut parts = Vec::with_capacity(children.len());
			let mut args = Vec::new();
			for child in children {
				let (sql, child_args) = render_nested(child.as_ref())?;
				if !sql.is_empty() {
					parts.push(sql);
					args.extend(child_args);
				}
			}
			if parts.is_empty() {
				return Ok((String::new(), args));
			}
			Ok((format!("({})", parts.join(separator)), args))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use cbquery_core::args;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	#[case::eq_single(Equal::new().column("id", 1), "id = ?", args![1])]
	#[case::eq_multiple(
		Equal::new().column("name", "test").column("age", 30),
		"age = ? AND name = ?",
		args![30, "test"]
	)]
	#[case::eq_null(Equal::new().column("id", Value::Null), "id IS NULL", args![])]
	#[case::eq_array(
		Equal::new().column("id", Value::array([1, 2, 3])),
		"id IN (?,?,?)",
		args![1, 2, 3]
	)]
	#[case::eq_empty_array(
		Equal::new().column("id", Value::array(Vec::<i64>::new())),
		"1=0",
		args![]
	)]
	#[case::eq_empty(Equal::new(), "", args![])]
	fn test_equal(#[case] condition: Equal, #[case] sql: &str, #[case] args: Vec<Value>) {
		assert_eq!(condition.render().unwrap(), (sql.to_owned(), args));
	}

	#[rstest]
	#[case::single(NotEqual::new().column("id", 1), "id <> ?", args![1])]
	#[case::null(NotEqual::new().column("name", Value::Null), "name IS NOT NULL", args![])]
	#[case::array(
		NotEqual::new().column("id", Value::array([1, 2])),
		"id NOT IN (?,?)",
		args![1, 2]
	)]
	#[case::empty_array(
		NotEqual::new().column("id", Value::array(Vec::<i64>::new())),
		"1=1",
		args![]
	)]
	#[case::empty(NotEqual::new(), "", args![])]
	fn test_not_equal(#[case] condition: NotEqual, #[case] sql: &str, #[case] args: Vec<Value>) {
		assert_eq!(condition.render().unwrap(), (sql.to_owned(), args));
	}

	#[rstest]
	fn test_equal_with_fragment_value() {
		// Arrange
		let condition = Equal::new().column(
			"is_valid",
			Value::fragment(expr("LENGTH(?) > 5", ["test_value"])),
		);

		// Act
		let (sql, args) = condition.render().unwrap();

		// Assert
		assert_eq!(sql, "is_valid = LENGTH(?) > 5");
		assert_eq!(args, args!["test_value"]);
	}

	#[rstest]
	#[case::lt(Lt::new().column("age", 30).render(), "age < ?")]
	#[case::lte(Lte::new().column("age", 30).render(), "age <= ?")]
	#[case::gt(Gt::new().column("age", 30).render(), "age > ?")]
	#[case::gte(Gte::new().column("age", 30).render(), "age >= ?")]
	fn test_comparisons(#[case] rendered: RenderResult<Rendered>, #[case] sql: &str) {
		assert_eq!(rendered.unwrap(), (sql.to_owned(), args![30]));
	}

	#[rstest]
	fn test_comparison_with_several_columns() {
		let (sql, args) = Lt::new().column("price", 100).column("age", 30).render().unwrap();

		assert_eq!(sql, "age < ? AND price < ?");
		assert_eq!(args, args![30, 100]);
	}

	#[rstest]
	fn test_comparison_rejects_null() {
		let result = Lt::new().column("age", Value::Null).render();

		assert_eq!(result, Err(RenderError::NullComparison { op: "<" }));
	}

	#[rstest]
	fn test_and_or() {
		// Arrange
		let and = And::new()
			.push(Equal::new().column("id", 1))
			.push(Equal::new().column("name", "test"));
		let or = Or::new()
			.push(Equal::new().column("id", 1))
			.push(Equal::new().column("name", "test"));

		// Act
		let and = and.render().unwrap();
		let or = or.render().unwrap();

		// Assert
		assert_eq!(and, ("(id = ? AND name = ?)".to_owned(), args![1, "test"]));
		assert_eq!(or, ("(id = ? OR name = ?)".to_owned(), args![1, "test"]));
	}

	#[rstest]
	fn test_conjunction_edge_cases() {
		assert_eq!(And::new().render().unwrap(), (String::new(), Vec::new()));
		assert_eq!(
			And::new().push(Equal::new().column("name", "test")).render().unwrap(),
			("name = ?".to_owned(), args!["test"])
		);
		assert_eq!(
			Or::new().push(Equal::new()).push(Equal::new().column("a", 1)).render().unwrap(),
			("(a = ?)".to_owned(), args![1])
		);
		assert_eq!(
			Or::new().push(Equal::new()).push(Equal::new()).render().unwrap(),
			(String::new(), Vec::new())
		);
	}

	#[rstest]
	fn test_conjunction_propagates_errors() {
		let and = And::new()
			.push(Equal::new().column("a", 1))
			.push(Gt::new().column("b", Value::Null));

		assert_eq!(and.render(), Err(RenderError::NullComparison { op: ">" }));
	}

	#[rstest]
	#[case::plain(alias(expr("COUNT(*)", ()), "total"), "(COUNT(*)) AS total", args![])]
	#[case::with_args(
		alias(expr("name = ?", ["test"]), "name_filter"),
		"(name = ?) AS name_filter",
		args!["test"]
	)]
	fn test_alias(#[case] aliased: Alias, #[case] sql: &str, #[case] args: Vec<Value>) {
		assert_eq!(aliased.render().unwrap(), (sql.to_owned(), args));
	}

	#[rstest]
	fn test_conditions_collect_from_pairs() {
		let condition: Equal = [("b", 2), ("a", 1)].into_iter().collect();

		assert_eq!(condition.len(), 2);
		assert_eq!(condition.render().unwrap().0, "a = ? AND b = ?");
	}
}
