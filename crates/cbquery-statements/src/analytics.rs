//! `SELECT` statements for the analytics service, and the array and object
//! functions it offers.

use cbquery_core::builder::{self, BuilderShape};
use cbquery_core::fragment::{Expr, Fragment, FragmentRef, IntoArgs, Rendered};
use cbquery_core::registry::ShapeRegistration;
use cbquery_core::typed::TypedMap;
use cbquery_core::{PlaceholderFormat, RenderError, RenderResult, Value, builder_shape, record};

use crate::statement::{
	Statement, raw_part, replace, write_assignments, write_clause, write_keyword, write_prefixes,
};

builder_shape! {
	/// Builds analytics `SELECT` statements, which add `LET` bindings and a
	/// `WINDOW` clause to the usual clauses.
	///
	/// # Examples
	///
	/// ```
	/// use cbquery_core::Fragment;
	/// use cbquery_statements::analytics_select;
	///
	/// let (sql, args) = analytics_select(["u.name"])
	///     .from("users u")
	///     .let_("minAge", 18)
	///     .where_("u.age >= minAge", ())
	///     .render()
	///     .unwrap();
	///
	/// assert_eq!(sql, "SELECT u.name LET minAge = ? FROM users u WHERE u.age >= minAge");
	/// assert_eq!(args.len(), 1);
	/// ```
	pub struct AnalyticsSelectBuilder;
}

record! {
	/// The state of an [`AnalyticsSelectBuilder`].
	pub struct AnalyticsSelectData {
		pub placeholder_format: PlaceholderFormat,
		pub prefixes: Vec<FragmentRef>,
		pub options: Vec<String>,
		pub columns: Vec<FragmentRef>,
		pub lets: TypedMap<Value>,
		pub from: Option<FragmentRef>,
		pub joins: Vec<FragmentRef>,
		pub where_parts: Vec<FragmentRef>,
		pub group_bys: Vec<String>,
		pub having_parts: Vec<FragmentRef>,
		pub order_by_parts: Vec<FragmentRef>,
		pub window: Option<String>,
		pub limit: Option<String>,
		pub offset: Option<String>,
		pub suffixes: Vec<FragmentRef>,
	}
}

inventory::submit! {
	ShapeRegistration::new(|registry| {
		registry.register::<AnalyticsSelectBuilder, AnalyticsSelectData>();
	})
}

impl AnalyticsSelectData {
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

		if !self.lets.is_empty() {
			sql.push_str(" LET ");
			write_assignments(&self.lets, " = ", &mut sql, &mut args)?;
		}

		if let Some(from) = &self.from {
			write_clause(" FROM ", std::slice::from_ref(from), "", &mut sql, &mut args)?;
		}

		write_clause(" ", &self.joins, " ", &mut sql, &mut args)?;
		write_clause(" WHERE ", &self.where_parts, " AND ", &mut sql, &mut args)?;
		if !self.group_bys.is_empty() {
			sql.push_str(" GROUP BY ");
			sql.push_str(&self.group_bys.join(", "));
		}
		write_clause(" HAVING ", &self.having_parts, " AND ", &mut sql, &mut args)?;
		write_clause(" ORDER BY ", &self.order_by_parts, ", ", &mut sql, &mut args)?;
		write_keyword(" WINDOW ", self.window.as_deref(), &mut sql);
		write_keyword(" LIMIT ", self.limit.as_deref(), &mut sql);
		write_keyword(" OFFSET ", self.offset.as_deref(), &mut sql);
		write_clause(" ", &self.suffixes, " ", &mut sql, &mut args)?;

		Ok((sql, args))
	}
}

impl AnalyticsSelectBuilder {
	fn data(&self) -> AnalyticsSelectData {
		builder::get_record(self)
	}

	fn lets(&self) -> TypedMap<Value> {
		match self.builder().state().lookup("lets") {
			Some(Value::Record(map)) => TypedMap::from_untyped(map.clone()),
			_ => TypedMap::new(),
		}
	}

	#[must_use]
	pub fn distinct(&self) -> Self {
		replace(self, "options", [Value::Text("DISTINCT".into())])
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
		builder::append(self, "columns", [Value::fragment(Expr::new(sql, args.into_args()))])
	}

	#[must_use]
	pub fn from(&self, from: impl Into<String>) -> Self {
		builder::set(self, "from", raw_part(from))
	}

	/// Binds `variable` to `value` in the `LET` clause, replacing an earlier
	/// binding of the same name. A fragment value is written in place,
	/// anything else is bound.
	#[must_use]
	pub fn let_(&self, variable: &str, value: impl Into<Value>) -> Self {
		builder::set(self, "lets", self.lets().set(variable, value.into()))
	}

	/// Sets the `WINDOW` clause, written verbatim.
	#[must_use]
	pub fn window(&self, window: impl Into<String>) -> Self {
		builder::set(self, "window", Value::Text(window.into()))
	}

	/// Adds a join clause written verbatim with `args` bound.
	#[must_use]
	pub fn join(&self, sql: impl AsRef<str>, args: impl IntoArgs) -> Self {
		let join = Expr::new(format!("JOIN {}", sql.as_ref()), args.into_args());
		builder::append(self, "joins", [Value::fragment(join)])
	}

	#[must_use]
	pub fn where_(&self, sql: impl Into<String>, args: impl IntoArgs) -> Self {
		self.where_expr(Expr::new(sql, args.into_args()))
	}

	#[must_use]
	pub fn where_expr(&self, predicate: impl Fragment + 'static) -> Self {
		builder::append(self, "where_parts", [Value::fragment(predicate)])
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
		let predicate = Expr::new(sql, args.into_args());
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

	#[must_use]
	pub fn limit(&self, limit: u64) -> Self {
		builder::set(self, "limit", limit.to_string())
	}

	#[must_use]
	pub fn offset(&self, offset: u64) -> Self {
		builder::set(self, "offset", offset.to_string())
	}
}

impl Fragment for AnalyticsSelectBuilder {
	fn render(&self) -> RenderResult<Rendered> {
		let data = self.data();
		Ok(data.placeholder_format.finalize(data.render_raw()?))
	}

	fn render_raw(&self) -> RenderResult<Rendered> {
		self.data().render_raw()
	}
}

impl Statement for AnalyticsSelectBuilder {}

fn call(function: &str, operands: &[&str]) -> Expr {
	Expr::raw(format!("{function}({})", operands.join(", ")))
}

pub fn array_avg(array: &str) -> Expr {
	call("ARRAY_AVG", &[array])
}

pub fn array_sum(array: &str) -> Expr {
	call("ARRAY_SUM", &[array])
}

pub fn array_min(array: &str) -> Expr {
	call("ARRAY_MIN", &[array])
}

pub fn array_max(array: &str) -> Expr {
	call("ARRAY_MAX", &[array])
}

pub fn array_count(array: &str) -> Expr {
	call("ARRAY_COUNT", &[array])
}

/// `ARRAY_FILTER(array, variable, condition)`.
pub fn array_filter(array: &str, variable: &str, condition: &str) -> Expr {
	call("ARRAY_FILTER", &[array, variable, condition])
}

pub fn array_flatten(array: &str) -> Expr {
	call("ARRAY_FLATTEN", &[array])
}

pub fn object_pairs(object: &str) -> Expr {
	call("OBJECT_PAIRS", &[object])
}

pub fn object_names(object: &str) -> Expr {
	call("OBJECT_NAMES", &[object])
}

pub fn object_values(object: &str) -> Expr {
	call("OBJECT_VALUES", &[object])
}

/// `OBJECT_REMOVE(object, "field", ...)`.
pub fn object_remove<I, F>(object: &str, fields: I) -> Expr
where
	I: IntoIterator<Item = F>,
	F: AsRef<str>,
{
	let quoted: Vec<String> =
		fields.into_iter().map(|field| format!("\"{}\"", field.as_ref())).collect();
	Expr::raw(format!("OBJECT_REMOVE({object}, {})", quoted.join(", ")))
}

/// `OBJECT_PUT(object, "field", value)` with `value` written verbatim.
pub fn object_put(object: &str, field: &str, value: &str) -> Expr {
	Expr::raw(format!("OBJECT_PUT({object}, \"{field}\", {value})"))
}
