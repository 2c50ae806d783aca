//! `NEST` and `UNNEST` join clauses.
//!
//! These are plain values rather than builders: each setter consumes the
//! clause and returns the updated one. Attach them to a query with
//! [`SelectBuilder::join_clause`](crate::select::SelectBuilder::join_clause)
//! or the `nest`/`unnest` shortcuts.

use cbquery_core::fragment::{
	Expr, Fragment, FragmentRef, IntoArgs, Rendered, fragment, render_nested,
};
use cbquery_core::RenderResult;

fn push_alias(sql: &mut String, alias: Option<&str>) {
	if let Some(alias) = alias {
		sql.push_str(" AS ");
		sql.push_str(alias);
	}
}

fn push_condition(
	sql: &mut String,
	args: &mut Vec<cbquery_core::Value>,
	condition: Option<&FragmentRef>,
) -> RenderResult<()> {
	if let Some(condition) = condition {
		let (condition_sql, condition_args) = render_nested(condition.as_ref())?;
		if !condition_sql.is_empty() {
			sql.push_str(" ON ");
			sql.push_str(&condition_sql);
			args.extend(condition_args);
		}
	}
	Ok(())
}

/// `NEST <bucket> [AS <alias>] [ON KEYS <keys>] [ON <condition>]`.
#[derive(Debug, Clone)]
pub struct Nest {
	bucket: String,
	alias: Option<String>,
	on_keys: Option<String>,
	condition: Option<FragmentRef>,
}

impl Nest {
	pub fn new(bucket: impl Into<String>) -> Self {
		Self {
			bucket: bucket.into(),
			alias: None,
			on_keys: None,
			condition: None,
		}
	}

	#[must_use]
	pub fn as_(mut self, alias: impl Into<String>) -> Self {
		self.alias = Some(alias.into());
		self
	}

	/// Sets the `ON KEYS` expression, written verbatim.
	#[must_use]
	pub fn on_keys(mut self, keys: impl Into<String>) -> Self {
		self.on_keys = Some(keys.into());
		self
	}

	/// Sets the `ON` condition from a template.
	#[must_use]
	pub fn on(self, sql: impl Into<String>, args: impl IntoArgs) -> Self {
		self.on_expr(Expr::new(sql, args.into_args()))
	}

	/// Sets the `ON` condition from any fragment.
	#[must_use]
	pub fn on_expr(mut self, condition: impl Fragment + 'static) -> Self {
		self.condition = Some(fragment(condition));
		self
	}
}

impl Fragment for Nest {
	fn render(&self) -> RenderResult<Rendered> {
		let mut sql = format!("NEST {}", self.bucket);
		let mut args = Vec::new();
		push_alias(&mut sql, self.alias.as_deref());
		if let Some(keys) = &self.on_keys {
			sql.push_str(" ON KEYS ");
			sql.push_str(keys);
		}
		push_condition(&mut sql, &mut args, self.condition.as_ref())?;
		Ok((sql, args))
	}
}

/// `LEFT NEST ...`, the outer form of [`Nest`].
#[derive(Debug, Clone)]
pub struct LeftNest(Nest);

impl LeftNest {
	pub fn new(bucket: impl Into<String>) -> Self {
		Self(Nest::new(bucket))
	}

	#[must_use]
	pub fn as_(self, alias: impl Into<String>) -> Self {
		Self(self.0.as_(alias))
	}

	#[must_use]
	pub fn on_keys(self, keys: impl Into<String>) -> Self {
		Self(self.0.on_keys(keys))
	}

	#[must_use]
	pub fn on(self, sql: impl Into<String>, args: impl IntoArgs) -> Self {
		Self(self.0.on(sql, args))
	}

	#[must_use]
	pub fn on_expr(self, condition: impl Fragment + 'static) -> Self {
		Self(self.0.on_expr(condition))
	}
}

impl Fragment for LeftNest {
	fn render(&self) -> RenderResult<Rendered> {
		let (sql, args) = self.0.render()?;
		Ok((format!("LEFT {sql}"), args))
	}
}

/// `UNNEST <path> [AS <alias>] [ON <condition>]`.
#[derive(Debug, Clone)]
pub struct Unnest {
	path: String,
	alias: Option<String>,
	condition: Option<FragmentRef>,
}

impl Unnest {
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			alias: None,
			condition: None,
		}
	}

	#[must_use]
	pub fn as_(mut self, alias: impl Into<String>) -> Self {
		self.alias = Some(alias.into());
		self
	}

	#[must_use]
	pub fn on(self, sql: impl Into<String>, args: impl IntoArgs) -> Self {
		self.on_expr(Expr::new(sql, args.into_args()))
	}

	#[must_use]
	pub fn on_expr(mut self, condition: impl Fragment + 'static) -> Self {
		self.condition = Some(fragment(condition));
		self
	}
}

impl Fragment for Unnest {
	fn render(&self) -> RenderResult<Rendered> {
		let mut sql = format!("UNNEST {}", self.path);
		let mut args = Vec::new();
		push_alias(&mut sql, self.alias.as_deref());
		push_condition(&mut sql, &mut args, self.condition.as_ref())?;
		Ok((sql, args))
	}
}

/// `LEFT UNNEST ...`, the outer form of [`Unnest`].
#[derive(Debug, Clone)]
pub struct LeftUnnest(Unnest);

impl LeftUnnest {
	pub fn new(path: impl Into<String>) -> Self {
		Self(Unnest::new(path))
	}

	#[must_use]
	pub fn as_(self, alias: impl Into<String>) -> Self {
		Self(self.0.as_(alias))
	}

	#[must_use]
	pub fn on(self, sql: impl Into<String>, args: impl IntoArgs) -> Self {
		Self(self.0.on(sql, args))
	}

	#[must_use]
	pub fn on_expr(self, condition: impl Fragment + 'static) -> Self {
		Self(self.0.on_expr(condition))
	}
}

impl Fragment for LeftUnnest {
	fn render(&self) -> RenderResult<Rendered> {
		let (sql, args) = self.0.render()?;
		Ok((format!("LEFT {sql}"), args))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::expr::Equal;
	use cbquery_core::{Value, args};
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	#[case::bare(Nest::new("orders").render(), "NEST orders")]
	#[case::alias_keys(
		Nest::new("orders").as_("o").on_keys("u.order_ids").render(),
		"NEST orders AS o ON KEYS u.order_ids"
	)]
	#[case::left(
		LeftNest::new("orders").as_("o").on_keys("u.order_ids").render(),
		"LEFT NEST orders AS o ON KEYS u.order_ids"
	)]
	#[case::unnest(Unnest::new("u.addresses").as_("addr").render(), "UNNEST u.addresses AS addr")]
	#[case::left_unnest(LeftUnnest::new("u.tags").as_("t").render(), "LEFT UNNEST u.tags AS t")]
	fn test_clause_without_arguments(#[case] rendered: RenderResult<Rendered>, #[case] sql: &str) {
		assert_eq!(rendered.unwrap(), (sql.to_owned(), Vec::new()));
	}

	#[rstest]
	fn test_nest_on_template() {
		// Arrange
		let nest = Nest::new("orders").as_("o").on("o.user_id = ?", ["u1"]);

		// Act
		let (sql, args) = nest.render().unwrap();

		// Assert
		assert_eq!(sql, "NEST orders AS o ON o.user_id = ?");
		assert_eq!(args, args!["u1"]);
	}

	#[rstest]
	fn test_unnest_on_fragment() {
		let unnest = LeftUnnest::new("u.addresses")
			.as_("a")
			.on_expr(Equal::new().column("a.city", "Paris"));

		let (sql, args) = unnest.render().unwrap();

		assert_eq!(sql, "LEFT UNNEST u.addresses AS a ON a.city = ?");
		assert_eq!(args, vec![Value::from("Paris")]);
	}

	#[rstest]
	fn test_empty_condition_is_omitted() {
		let nest = Nest::new("orders").on_expr(Equal::new());

		assert_eq!(nest.render().unwrap().0, "NEST orders");
	}

	#[rstest]
	fn test_condition_arity_error_propagates() {
		let nest = Nest::new("orders").on("o.id = ? AND o.kind = ?", ["x"]);

		assert!(nest.render().is_err());
	}
}
