//! `SELECT` statements.

use cbquery_core::builder;
use cbquery_core::fragment::{Expr, Fragment, FragmentRef, IntoArgs, Rendered};
use cbquery_core::registry::ShapeRegistration;
use cbquery_core::{PlaceholderFormat, RenderError, RenderResult, Value, builder_shape, record};

use crate::expr::alias;
use crate::json::UseIndex;
use crate::nest::{LeftNest, LeftUnnest, Nest, Unnest};
use crate::statement::{Statement, raw_part, replace, write_clause, write_keyword, write_prefixes};

builder_shape! {
	/// Builds `SELECT` statements.
	///
	/// # Examples
	///
	/// ```
	/// use cbquery_core::Fragment;
	/// use cbquery_statements::select;
	///
	/// let (sql, args) = select(["id", "name"])
	///     .from("users")
	///     .where_("id = ?", [1])
	///     .render()
	///     .unwrap();
	///
	/// assert_eq!(sql, "SELECT id, name FROM users WHERE id = ?");
	/// assert_eq!(args.len(), 1);
	/// ```
	pub struct SelectBuilder;
}

record! {
	/// The state of a [`SelectBuilder`].
	pub struct SelectData {
		pub placeholder_format: PlaceholderFormat,
		pub prefixes: Vec<FragmentRef>,
		pub options: Vec<String>,
		pub columns: Vec<FragmentRef>,
		pub from: Option<FragmentRef>,
		pub use_keys: Option<String>,
		pub use_index: Option<FragmentRef>,
		pub joins: Vec<FragmentRef>,
		pub where_parts: Vec<FragmentRef>,
		pub group_bys: Vec<String>,
		pub having_parts: Vec<FragmentRef>,
		pub order_by_parts: Vec<FragmentRef>,
		pub limit: Option<String>,
		pub offset: Option<String>,
		pub suffixes: Vec<FragmentRef>,
	}
}

inventory::submit! {
	ShapeRegistration::new(|registry| {
		registry.register::<SelectBuilder, SelectData>();
	})
}

impl SelectData {
	/// Renders with `?` markers.
	pub fn render_raw(&self) -> RenderResult<Rendered> {
		if self.columns.is_empty() {
			return Err(RenderError::MissingClause(
				"select statements must have at least one result column".into(),
			));
		}

		let mut sql = String::new();
		let mut args = Vec::new();

		write_prefixes(&self.prefixes, &mut sql, &mut args)?;

		sql.push_str("SELECT ");
		if !self.options.is_empty() {
			sql.push_str(&self.options.join(" "));
			sql.push(' ');
		}
		cbquery_core::join_clauses(&self.columns, ", ", &mut sql, &mut args)?;

		if let Some(from) = &self.from {
			write_clause(" FROM ", std::slice::from_ref(from), "", &mut sql, &mut args)?;
			write_keyword(" USE KEYS ", self.use_keys.as_deref(), &mut sql);
			if let Some(index) = &self.use_index {
				write_clause(" ", std::slice::from_ref(index), "", &mut sql, &mut args)?;
			}
		}

		write_clause(" ", &self.joins, " ", &mut sql, &mut args)?;
		write_clause(" WHERE ", &self.where_parts, " AND ", &mut sql, &mut args)?;
		if !self.group_bys.is_empty() {
			sql.push_str(" GROUP BY ");
			sql.push_str(&self.group_bys.join(", "));
		}
		write_clause(" HAVING ", &self.having_parts, " AND ", &mut sql, &mut args)?;
		write_clause(" ORDER BY ", &self.order_by_parts, ", ", &mut sql, &mut args)?;
		write_keyword(" LIMIT ", self.limit.as_deref(), &mut sql);
		write_keyword(" OFFSET ", self.offset.as_deref(), &mut sql);
		write_clause(" ", &self.suffixes, " ", &mut sql, &mut args)?;

		Ok((sql, args))
	}
}

impl SelectBuilder {
	fn data(&self) -> SelectData {
		builder::get_record(self)
	}

	/// Adds `DISTINCT`.
	#[must_use]
	pub fn distinct(&self) -> Self {
		self.options(["DISTINCT"])
	}

	/// Sets the keywords written after `SELECT`, replacing earlier ones.
	#[must_use]
	pub fn options<I, O>(&self, options: I) -> Self
	where
		I: IntoIterator<Item = O>,
		O: Into<String>,
	{
		replace(self, "options", options.into_iter().map(|option| Value::Text(option.into())))
	}

	/// Sets the result columns, replacing earlier ones.
	#[must_use]
	pub fn columns<I, C>(&self, columns: I) -> Self
	where
		I: IntoIterator<Item = C>,
		C: Into<String>,
	{
		replace(self, "columns", columns.into_iter().map(raw_part))
	}

	/// Adds a result column whose template binds `args`.
	#[must_use]
	pub fn column(&self, sql: impl Into<String>, args: impl IntoArgs) -> Self {
		self.column_expr(Expr::new(sql, args.into_args()))
	}

	/// Adds a result column rendered from any fragment.
	#[must_use]
	pub fn column_expr(&self, column: impl Fragment + 'static) -> Self {
		builder::append(self, "columns", [Value::fragment(column)])
	}

	/// Sets the `FROM` source.
	#[must_use]
	pub fn from(&self, from: impl Into<String>) -> Self {
		builder::set(self, "from", raw_part(from))
	}

	/// Selects from a subquery, `FROM (<sub>) AS <alias>`.
	#[must_use]
	pub fn from_select(&self, sub: SelectBuilder, name: impl Into<String>) -> Self {
		builder::set(self, "from", Value::fragment(alias(sub, name)))
	}

	/// Sets `USE KEYS`, written verbatim after the `FROM` source.
	#[must_use]
	pub fn use_keys(&self, keys: impl Into<String>) -> Self {
		builder::set(self, "use_keys", Value::Text(keys.into()))
	}

	/// Sets the `USE INDEX` hint written after the `FROM` source.
	#[must_use]
	pub fn use_index(&self, index: UseIndex) -> Self {
		builder::set(self, "use_index", Value::fragment(index))
	}

	/// Adds a join clause written verbatim with `args` bound.
	#[must_use]
	pub fn join_clause(&self, sql: impl Into<String>, args: impl IntoArgs) -> Self {
		self.join_expr(Expr::new(sql, args.into_args()))
	}

	/// Adds any fragment as a join clause.
	#[must_use]
	pub fn join_expr(&self, join: impl Fragment + 'static) -> Self {
		builder::append(self, "joins", [Value::fragment(join)])
	}

	#[must_use]
	pub fn join(&self, sql: impl AsRef<str>, args: impl IntoArgs) -> Self {
		self.join_clause(format!("JOIN {}", sql.as_ref()), args)
	}

	#[must_use]
	pub fn left_join(&self, sql: impl AsRef<str>, args: impl IntoArgs) -> Self {
		self.join_clause(format!("LEFT JOIN {}", sql.as_ref()), args)
	}

	#[must_use]
	pub fn right_join(&self, sql: impl AsRef<str>, args: impl IntoArgs) -> Self {
		self.join_clause(format!("RIGHT JOIN {}", sql.as_ref()), args)
	}

	#[must_use]
	pub fn inner_join(&self, sql: impl AsRef<str>, args: impl IntoArgs) -> Self {
		self.join_clause(format!("INNER JOIN {}", sql.as_ref()), args)
	}

	#[must_use]
	pub fn nest(&self, nest: Nest) -> Self {
		self.join_expr(nest)
	}

	#[must_use]
	pub fn left_nest(&self, nest: LeftNest) -> Self {
		self.join_expr(nest)
	}

	#[must_use]
	pub fn unnest(&self, unnest: Unnest) -> Self {
		self.join_expr(unnest)
	}

	#[must_use]
	pub fn left_unnest(&self, unnest: LeftUnnest) -> Self {
		self.join_expr(unnest)
	}

	/// Adds a `WHERE` template; several are joined with `AND`.
	#[must_use]
	pub fn where_(&self, sql: impl Into<String>, args: impl IntoArgs) -> Self {
		self.where_expr(Expr::new(sql, args.into_args()))
	}

	/// Adds a `WHERE` predicate from any fragment.
	#[must_use]
	pub fn where_expr(&self, predicate: impl Fragment + 'static) -> Self {
		builder::append(self, "where_parts", [Value::fragment(predicate)])
	}

	/// Adds a full-text search predicate, such as
	/// [`fts_match`](crate::fts::fts_match), to `WHERE`.
	#[must_use]
	pub fn with_search(&self, search: impl Fragment + 'static) -> Self {
		self.where_expr(search)
	}

	/// Sets the `GROUP BY` expressions, replacing earlier ones.
	#[must_use]
	pub fn group_by<I, G>(&self, group_bys: I) -> Self
	where
		I: IntoIterator<Item = G>,
		G: Into<String>,
	{
		replace(self, "group_bys", group_bys.into_iter().map(|group| Value::Text(group.into())))
	}

	#[must_use]
	pub fn having(&self, sql: impl Into<String>, args: impl IntoArgs) -> Self {
		self.having_expr(Expr::new(sql, args.into_args()))
	}

	#[must_use]
	pub fn having_expr(&self, predicate: impl Fragment + 'static) -> Self {
		builder::append(self, "having_parts", [Value::fragment(predicate)])
	}

	/// Sets the `ORDER BY` expressions, replacing earlier ones.
	#[must_use]
	pub fn order_by<I, O>(&self, order_bys: I) -> Self
	where
		I: IntoIterator<Item = O>,
		O: Into<String>,
	{
		replace(self, "order_by_parts", order_bys.into_iter().map(raw_part))
	}

	/// Adds an `ORDER BY` template with bound arguments.
	#[must_use]
	pub fn order_by_clause(&self, sql: impl Into<String>, args: impl IntoArgs) -> Self {
		builder::append(
			self,
			"order_by_parts",
			[Value::fragment(Expr::new(sql, args.into_args()))],
		)
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

impl Fragment for SelectBuilder {
	fn render(&self) -> RenderResult<Rendered> {
		let data = self.data();
		Ok(data.placeholder_format.finalize(data.render_raw()?))
	}

	fn render_raw(&self) -> RenderResult<Rendered> {
		self.data().render_raw()
	}
}

impl Statement for SelectBuilder {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::expr::{Equal, Gt};
	use crate::statement::select;
	use cbquery_core::args;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	fn test_full_clause_order() {
		// Arrange
		let query = select(["a", "b"])
			.prefix("WITH prefix AS ?", [0])
			.distinct()
			.column("IF(x > ?, ?, ?)", args![100, "HIGH", "LOW"])
			.from("t")
			.use_keys("'k1'")
			.join("j1 ON j1.id = t.j1_id", ())
			.left_join("j2 ON j2.id = t.j2_id", ())
			.where_("d = ?", [1])
			.where_expr(Equal::new().column("e", 2))
			.group_by(["f", "g"])
			.having("h = ?", [3])
			.order_by(["i DESC", "j ASC"])
			.limit(10)
			.offset(20)
			.suffix("FETCH FIRST ? ROWS ONLY", [5]);

		// Act
		let (sql, args) = query.render().unwrap();

		// Assert
		assert_eq!(
			sql,
			"WITH prefix AS ? SELECT DISTINCT a, b, IF(x > ?, ?, ?) FROM t USE KEYS 'k1' \
			 JOIN j1 ON j1.id = t.j1_id LEFT JOIN j2 ON j2.id = t.j2_id \
			 WHERE d = ? AND e = ? GROUP BY f, g HAVING h = ? ORDER BY i DESC, j ASC \
			 LIMIT 10 OFFSET 20 FETCH FIRST ? ROWS ONLY"
		);
		assert_eq!(args, args![0, 100, "HIGH", "LOW", 1, 2, 3, 5]);
	}

	#[rstest]
	fn test_columns_replace_then_column_appends() {
		// Arrange
		let query = select(["a"]).columns(["b", "c"]).column("COUNT(*) AS n", ());

		// Act
		let (sql, _) = query.from("t").render().unwrap();

		// Assert
		assert_eq!(sql, "SELECT b, c, COUNT(*) AS n FROM t");
	}

	#[rstest]
	fn test_no_columns_is_an_error() {
		let result = select(Vec::<String>::new()).from("users").render();

		assert_eq!(
			result,
			Err(RenderError::MissingClause(
				"select statements must have at least one result column".into()
			))
		);
	}

	#[rstest]
	fn test_use_keys_needs_from() {
		let (sql, _) = select(["*"]).use_keys("'k'").render().unwrap();

		assert_eq!(sql, "SELECT *");
	}

	#[rstest]
	#[case::plain(
		UseIndex::new("idx_users"),
		"SELECT * FROM users USE INDEX (`idx_users`) WHERE age > ?"
	)]
	#[case::gsi(
		UseIndex::gsi("idx_users"),
		"SELECT * FROM users USE INDEX (`idx_users` USING GSI) WHERE age > ?"
	)]
	#[case::view(
		UseIndex::view("by_age"),
		"SELECT * FROM users USE INDEX (`by_age` USING VIEW) WHERE age > ?"
	)]
	fn test_use_index_follows_from(#[case] index: UseIndex, #[case] expected: &str) {
		let query = select(["*"]).from("users").use_index(index).where_("age > ?", [18]);

		assert_eq!(query.render().unwrap(), (expected.to_owned(), args![18]));
	}

	#[rstest]
	fn test_use_index_after_use_keys_and_replaced() {
		// Arrange
		let base = select(["*"]).from("users").use_keys("'u1'").use_index(UseIndex::new("old"));

		// Act
		let (sql, _) = base.use_index(UseIndex::gsi("idx")).render().unwrap();

		// Assert
		assert_eq!(sql, "SELECT * FROM users USE KEYS 'u1' USE INDEX (`idx` USING GSI)");
		assert_eq!(base.render().unwrap().0, "SELECT * FROM users USE KEYS 'u1' USE INDEX (`old`)");
	}

	#[rstest]
	fn test_from_select_embeds_raw_subquery() {
		// Arrange
		let sub = select(["id"])
			.from("users")
			.where_("age > ?", [18])
			.placeholder_format(PlaceholderFormat::Dollar);
		let outer = select(["*"])
			.from_select(sub, "adults")
			.where_("id = ?", ["u1"])
			.placeholder_format(PlaceholderFormat::Dollar);

		// Act
		let (sql, args) = outer.render().unwrap();

		// Assert
		assert_eq!(
			sql,
			"SELECT * FROM (SELECT id FROM users WHERE age > $1) AS adults WHERE id = $2"
		);
		assert_eq!(args, args![18, "u1"]);
	}

	#[rstest]
	fn test_nest_and_unnest_are_joins() {
		let query = select(["u.name", "o"])
			.from("users u")
			.nest(Nest::new("orders").as_("o").on_keys("u.order_ids"))
			.left_unnest(LeftUnnest::new("u.tags").as_("tag"));

		assert_eq!(
			query.render().unwrap().0,
			"SELECT u.name, o FROM users u NEST orders AS o ON KEYS u.order_ids \
			 LEFT UNNEST u.tags AS tag"
		);
	}

	#[rstest]
	fn test_where_error_propagates() {
		let query = select(["*"]).from("t").where_expr(Gt::new().column("age", Value::Null));

		assert_eq!(query.render(), Err(RenderError::NullComparison { op: ">" }));
	}

	#[rstest]
	fn test_order_by_clause_appends() {
		let query = select(["*"])
			.from("t")
			.order_by(["a"])
			.order_by_clause("b <-> ? DESC", ["x"]);

		assert_eq!(
			query.render().unwrap(),
			("SELECT * FROM t ORDER BY a, b <-> ? DESC".to_owned(), args!["x"])
		);
	}

	#[rstest]
	#[should_panic(expected = "at least one result column")]
	fn test_must_render_panics_on_error() {
		let _ = select(Vec::<&str>::new()).must_render();
	}
}
