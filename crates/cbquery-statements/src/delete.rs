//! `DELETE` statements.

use cbquery_core::builder;
use cbquery_core::fragment::{Expr, Fragment, FragmentRef, IntoArgs, Rendered};
use cbquery_core::registry::ShapeRegistration;
use cbquery_core::{PlaceholderFormat, RenderError, RenderResult, Value, builder_shape, record};

use crate::statement::{Statement, write_clause, write_keyword, write_prefixes};

builder_shape! {
	/// Builds `DELETE` statements.
	///
	/// # Examples
	///
	/// ```
	/// use cbquery_core::Fragment;
	/// use cbquery_statements::delete;
	///
	/// let query = delete("users").where_("status = ?", ["inactive"]).limit(100);
	/// let (sql, _) = query.render().unwrap();
	/// assert_eq!(sql, "DELETE FROM users WHERE status = ? LIMIT 100");
	/// ```
	pub struct DeleteBuilder;
}

record! {
	/// The state of a [`DeleteBuilder`].
	pub struct DeleteData {
		pub placeholder_format: PlaceholderFormat,
		pub prefixes: Vec<FragmentRef>,
		pub from: Option<String>,
		pub use_keys: Option<String>,
		pub where_parts: Vec<FragmentRef>,
		pub limit: Option<String>,
		pub offset: Option<String>,
		pub suffixes: Vec<FragmentRef>,
	}
}

inventory::submit! {
	ShapeRegistration::new(|registry| {
		registry.register::<DeleteBuilder, DeleteData>();
	})
}

impl DeleteData {
	/// Renders with `?` markers.
	pub fn render_raw(&self) -> RenderResult<Rendered> {
		let Some(from) = self.from.as_deref().filter(|from| !from.is_empty()) else {
			return Err(RenderError::MissingClause(
				"delete statements must specify a table".into(),
			));
		};

		let mut sql = String::new();
		let mut args = Vec::new();

		write_prefixes(&self.prefixes, &mut sql, &mut args)?;

		sql.push_str("DELETE FROM ");
		sql.push_str(from);
		write_keyword(" USE KEYS ", self.use_keys.as_deref(), &mut sql);
		write_clause(" WHERE ", &self.where_parts, " AND ", &mut sql, &mut args)?;
		write_keyword(" LIMIT ", self.limit.as_deref(), &mut sql);
		write_keyword(" OFFSET ", self.offset.as_deref(), &mut sql);
		write_clause(" ", &self.suffixes, " ", &mut sql, &mut args)?;

		Ok((sql, args))
	}
}

impl DeleteBuilder {
	fn data(&self) -> DeleteData {
		builder::get_record(self)
	}

	#[must_use]
	pub fn from(&self, from: impl Into<String>) -> Self {
		builder::set(self, "from", Value::Text(from.into()))
	}

	#[must_use]
	pub fn use_keys(&self, keys: impl Into<String>) -> Self {
		builder::set(self, "use_keys", Value::Text(keys.into()))
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

impl Fragment for DeleteBuilder {
	fn render(&self) -> RenderResult<Rendered> {
		let data = self.data();
		Ok(data.placeholder_format.finalize(data.render_raw()?))
	}

	fn render_raw(&self) -> RenderResult<Rendered> {
		self.data().render_raw()
	}
}

impl Statement for DeleteBuilder {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::expr::{Lt, Or};
	use crate::statement::delete;
	use cbquery_core::args;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	fn test_full_delete() {
		// Arrange
		let query = delete("sessions")
			.use_keys("['s1', 's2']")
			.where_expr(
				Or::new()
					.push(Lt::new().column("expires", 100))
					.push(Lt::new().column("touched", 50)),
			)
			.where_("owner = ?", ["u1"])
			.limit(5)
			.offset(1)
			.suffix("RETURNING META().id", ());

		// Act
		let (sql, args) = query.render().unwrap();

		// Assert
		assert_eq!(
			sql,
			"DELETE FROM sessions USE KEYS ['s1', 's2'] WHERE (expires < ? OR touched < ?) \
			 AND owner = ? LIMIT 5 OFFSET 1 RETURNING META().id"
		);
		assert_eq!(args, args![100, 50, "u1"]);
	}

	#[rstest]
	fn test_use_keys_prefix() {
		let (sql, args) = delete("users").prefix("USE KEYS ?", ["u1"]).render().unwrap();

		assert_eq!(sql, "USE KEYS ? DELETE FROM users");
		assert_eq!(args, args!["u1"]);
	}

	#[rstest]
	#[case::missing(DeleteBuilder::default())]
	#[case::empty(delete(""))]
	fn test_missing_table(#[case] query: DeleteBuilder) {
		assert_eq!(
			query.render(),
			Err(RenderError::MissingClause("delete statements must specify a table".into()))
		);
	}
}
