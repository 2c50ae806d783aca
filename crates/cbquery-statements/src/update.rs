//! `UPDATE` statements.

use cbquery_core::builder::{self, BuilderShape};
use cbquery_core::fragment::{Expr, Fragment, FragmentRef, IntoArgs, Rendered};
use cbquery_core::registry::ShapeRegistration;
use cbquery_core::typed::TypedMap;
use cbquery_core::{PlaceholderFormat, RenderError, RenderResult, Value, builder_shape, record};

use crate::statement::{Statement, write_assignments, write_clause, write_keyword, write_prefixes};

builder_shape! {
	/// Builds `UPDATE` statements.
	///
	/// # Examples
	///
	/// ```
	/// use cbquery_core::Fragment;
	/// use cbquery_statements::update;
	///
	/// let (sql, args) = update("users")
	///     .set("status", "active")
	///     .set("age", 31)
	///     .where_("id = ?", ["u1"])
	///     .render()
	///     .unwrap();
	///
	/// assert_eq!(sql, "UPDATE users SET age = ?, status = ? WHERE id = ?");
	/// assert_eq!(args.len(), 3);
	/// ```
	pub struct UpdateBuilder;
}

record! {
	/// The state of an [`UpdateBuilder`].
	pub struct UpdateData {
		pub placeholder_format: PlaceholderFormat,
		pub prefixes: Vec<FragmentRef>,
		pub table: Option<String>,
		pub use_keys: Option<String>,
		pub set_clauses: TypedMap<Value>,
		pub where_parts: Vec<FragmentRef>,
		pub limit: Option<String>,
		pub offset: Option<String>,
		pub suffixes: Vec<FragmentRef>,
	}
}

inventory::submit! {
	ShapeRegistration::new(|registry| {
		registry.register::<UpdateBuilder, UpdateData>();
	})
}

impl UpdateData {
	/// Renders with `?` markers.
	pub fn render_raw(&self) -> RenderResult<Rendered> {
		let Some(table) = self.table.as_deref().filter(|table| !table.is_empty()) else {
			return Err(RenderError::MissingClause(
				"update statements must specify a table".into(),
			));
		};
		if self.set_clauses.is_empty() {
			return Err(RenderError::MissingClause(
				"update statements must have at least one Set clause".into(),
			));
		}

		let mut sql = String::new();
		let mut args = Vec::new();

		write_prefixes(&self.prefixes, &mut sql, &mut args)?;

		sql.push_str("UPDATE ");
		sql.push_str(table);
		write_keyword(" USE KEYS ", self.use_keys.as_deref(), &mut sql);

		sql.push_str(" SET ");
		write_assignments(&self.set_clauses, " = ", &mut sql, &mut args)?;

		write_clause(" WHERE ", &self.where_parts, " AND ", &mut sql, &mut args)?;
		write_keyword(" LIMIT ", self.limit.as_deref(), &mut sql);
		write_keyword(" OFFSET ", self.offset.as_deref(), &mut sql);
		write_clause(" ", &self.suffixes, " ", &mut sql, &mut args)?;

		Ok((sql, args))
	}
}

impl UpdateBuilder {
	fn data(&self) -> UpdateData {
		builder::get_record(self)
	}

	fn set_clauses(&self) -> TypedMap<Value> {
		match self.builder().state().lookup("set_clauses") {
			Some(Value::Record(map)) => TypedMap::from_untyped(map.clone()),
			_ => TypedMap::new(),
		}
	}

	#[must_use]
	pub fn table(&self, table: impl Into<String>) -> Self {
		builder::set(self, "table", Value::Text(table.into()))
	}

	/// Sets `USE KEYS`, written verbatim after the table.
	#[must_use]
	pub fn use_keys(&self, keys: impl Into<String>) -> Self {
		builder::set(self, "use_keys", Value::Text(keys.into()))
	}

	/// Adds `column = value` to the `SET` clause, replacing an earlier value
	/// for the same column.
	#[must_use]
	pub fn set(&self, column: &str, value: impl Into<Value>) -> Self {
		builder::set(self, "set_clauses", self.set_clauses().set(column, value.into()))
	}

	/// Adds every pair to the `SET` clause.
	#[must_use]
	pub fn set_map<I, K, V>(&self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<Value>,
	{
		let clauses = pairs.into_iter().fold(self.set_clauses(), |map, (column, value)| {
			map.set(column.as_ref(), value.into())
		});
		builder::set(self, "set_clauses", clauses)
	}

	#[must_use]
	pub fn where_(&self, sql: impl Into<String>, args: impl IntoArgs) -> Self {
		self.where_expr(Expr::new(sql, args.into_args()))
	}

	#[must_use]
	pub fn where_expr(&self, predicate: impl Fragment + 'static) -> Self {
		builder::append(self, "where_parts", [Value::fragment(predicate)])
	}

	#[must_use]
	pub fn limit(&self, limit: u64) -> Self {
		builder::set(self, "limit", limit.to_string())
	}

	#[must_use]
	pub fn offset(&self, offset: u64) -> Self {
		builder::set(self, "offset", offset.to_string())
	}
}

impl Fragment for UpdateBuilder {
	fn render(&self) -> RenderResult<Rendered> {
		let data = self.data();
		Ok(data.placeholder_format.finalize(data.render_raw()?))
	}

	fn render_raw(&self) -> RenderResult<Rendered> {
		self.data().render_raw()
	}
}

impl Statement for UpdateBuilder {}
