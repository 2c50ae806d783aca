//! Behaviour shared by every statement shape, and the root factory.

use async_trait::async_trait;
use cbquery_core::builder::{self, BuilderShape};
use cbquery_core::fragment::{
	Expr, Fragment, FragmentRef, IntoArgs, Rendered, join_clauses, render_nested,
};
use cbquery_core::typed::TypedMap;
use cbquery_core::{PlaceholderFormat, RenderResult, Value, builder_shape};
use tokio_util::sync::CancellationToken;

use crate::analytics::AnalyticsSelectBuilder;
use crate::delete::DeleteBuilder;
use crate::exec::{
	ExecuteResult, QueryExecutor, QueryResult, execute_cancellable_with, execute_with,
};
use crate::insert::InsertBuilder;
use crate::select::SelectBuilder;
use crate::settings::StatementSettings;
use crate::update::UpdateBuilder;
use crate::upsert::UpsertBuilder;

/// A renderable statement shape.
///
/// Every method returns a new statement; the receiver is never changed.
#[async_trait]
pub trait Statement: BuilderShape + Fragment {
	/// Sets how `?` markers are written when this statement is rendered at
	/// the top level.
	#[must_use]
	fn placeholder_format(&self, format: PlaceholderFormat) -> Self {
		builder::set(self, "placeholder_format", format)
	}

	/// Adds a template to the beginning of the statement.
	#[must_use]
	fn prefix(&self, sql: impl Into<String>, args: impl IntoArgs) -> Self {
		self.prefix_expr(Expr::new(sql, args.into_args()))
	}

	/// Adds a fragment to the beginning of the statement.
	#[must_use]
	fn prefix_expr(&self, prefix: impl Fragment + 'static) -> Self {
		builder::append(self, "prefixes", [Value::fragment(prefix)])
	}

	/// Adds a template to the end of the statement.
	#[must_use]
	fn suffix(&self, sql: impl Into<String>, args: impl IntoArgs) -> Self {
		self.suffix_expr(Expr::new(sql, args.into_args()))
	}

	/// Adds a fragment to the end of the statement.
	#[must_use]
	fn suffix_expr(&self, suffix: impl Fragment + 'static) -> Self {
		builder::append(self, "suffixes", [Value::fragment(suffix)])
	}

	/// Renders the statement.
	///
	/// # Panics
	///
	/// Panics if rendering fails.
	fn must_render(&self) -> Rendered {
		match self.render() {
			Ok(rendered) => rendered,
			Err(err) => panic!("{err}"),
		}
	}

	/// Renders the statement and runs it on `executor`.
	async fn execute(&self, executor: &dyn QueryExecutor) -> ExecuteResult<Box<dyn QueryResult>> {
		execute_with(executor, self).await
	}

	/// Like [`execute`](Self::execute), abandoned once `token` is cancelled.
	async fn execute_cancellable(
		&self,
		executor: &dyn QueryExecutor,
		token: &CancellationToken,
	) -> ExecuteResult<Box<dyn QueryResult>> {
		execute_cancellable_with(executor, token, self).await
	}
}

builder_shape! {
	/// Root factory for statement shapes.
	///
	/// Shapes created from a factory start out with its placeholder format.
	///
	/// # Examples
	///
	/// ```
	/// use cbquery_core::{Fragment, PlaceholderFormat};
	/// use cbquery_statements::StatementBuilder;
	///
	/// let dollar = StatementBuilder::new().placeholder_format(PlaceholderFormat::Dollar);
	/// let (sql, _) = dollar.select(["*"]).from("users").where_("id = ?", [1]).render().unwrap();
	/// assert_eq!(sql, "SELECT * FROM users WHERE id = $1");
	/// ```
	pub struct StatementBuilder;
}

impl StatementBuilder {
	pub fn new() -> Self {
		Self::default().placeholder_format(PlaceholderFormat::Question)
	}

	/// Creates a factory configured from `settings`.
	pub fn from_settings(settings: &StatementSettings) -> Self {
		Self::default().placeholder_format(settings.placeholder_format)
	}

	#[must_use]
	pub fn placeholder_format(&self, format: PlaceholderFormat) -> Self {
		builder::set(self, "placeholder_format", format)
	}

	/// Starts a `SELECT` with the given result columns.
	pub fn select<I, C>(&self, columns: I) -> SelectBuilder
	where
		I: IntoIterator<Item = C>,
		C: Into<String>,
	{
		self.shape::<SelectBuilder>().columns(columns)
	}

	/// Starts an analytics `SELECT` with the given result columns.
	pub fn analytics_select<I, C>(&self, columns: I) -> AnalyticsSelectBuilder
	where
		I: IntoIterator<Item = C>,
		C: Into<String>,
	{
		self.shape::<AnalyticsSelectBuilder>().columns(columns)
	}

	/// Starts an `INSERT INTO into`.
	pub fn insert(&self, into: impl Into<String>) -> InsertBuilder {
		self.shape::<InsertBuilder>().into_(into)
	}

	/// Starts an `UPSERT INTO into`.
	pub fn upsert(&self, into: impl Into<String>) -> UpsertBuilder {
		self.shape::<UpsertBuilder>().into_(into)
	}

	/// Starts an `UPDATE table`.
	pub fn update(&self, table: impl Into<String>) -> UpdateBuilder {
		self.shape::<UpdateBuilder>().table(table)
	}

	/// Starts a `DELETE FROM from`.
	pub fn delete(&self, from: impl Into<String>) -> DeleteBuilder {
		self.shape::<DeleteBuilder>().from(from)
	}

	fn shape<S: BuilderShape>(&self) -> S {
		S::from_builder(self.builder().clone())
	}
}

/// The default factory, using `?` markers.
pub fn statement_builder() -> StatementBuilder {
	StatementBuilder::new()
}

/// Starts a `SELECT` from the default factory.
pub fn select<I, C>(columns: I) -> SelectBuilder
where
	I: IntoIterator<Item = C>,
	C: Into<String>,
{
	statement_builder().select(columns)
}

/// Starts an analytics `SELECT` from the default factory.
pub fn analytics_select<I, C>(columns: I) -> AnalyticsSelectBuilder
where
	I: IntoIterator<Item = C>,
	C: Into<String>,
{
	statement_builder().analytics_select(columns)
}

/// Starts an `INSERT` from the default factory.
pub fn insert(into: impl Into<String>) -> InsertBuilder {
	statement_builder().insert(into)
}

/// Starts an `UPSERT` from the default factory.
pub fn upsert(into: impl Into<String>) -> UpsertBuilder {
	statement_builder().upsert(into)
}

/// Starts an `UPDATE` from the default factory.
pub fn update(table: impl Into<String>) -> UpdateBuilder {
	statement_builder().update(table)
}

/// Starts a `DELETE` from the default factory.
pub fn delete(from: impl Into<String>) -> DeleteBuilder {
	statement_builder().delete(from)
}

/// Replaces the sequence at `name` with `values`.
pub(crate) fn replace<S, I>(builder: &S, name: &str, values: I) -> S
where
	S: BuilderShape,
	I: IntoIterator,
	I::Item: Into<Value>,
{
	builder::append(&builder::remove(builder, name), name, values)
}

/// Wraps a raw piece of query text as a stored fragment.
pub(crate) fn raw_part(sql: impl Into<String>) -> Value {
	Value::fragment(Expr::raw(sql))
}

/// Writes `prefixes` followed by a space, if there are any.
pub(crate) fn write_prefixes(
	prefixes: &[FragmentRef],
	sql: &mut String,
	args: &mut Vec<Value>,
) -> RenderResult<()> {
	if !prefixes.is_empty() {
		join_clauses(prefixes, " ", sql, args)?;
		sql.push(' ');
	}
	Ok(())
}

/// Writes `lead` and the joined `parts`, if there are any.
pub(crate) fn write_clause(
	lead: &str,
	parts: &[FragmentRef],
	separator: &str,
	sql: &mut String,
	args: &mut Vec<Value>,
) -> RenderResult<()> {
	if !parts.is_empty() {
		sql.push_str(lead);
		join_clauses(parts, separator, sql, args)?;
	}
	Ok(())
}

/// Writes `lead` and `text`, if `text` is set.
pub(crate) fn write_keyword(lead: &str, text: Option<&str>, sql: &mut String) {
	if let Some(text) = text.filter(|text| !text.is_empty()) {
		sql.push_str(lead);
		sql.push_str(text);
	}
}

/// Writes one value: fragments in place, anything else as a bound `?`.
pub(crate) fn write_value(
	value: &Value,
	sql: &mut String,
	args: &mut Vec<Value>,
) -> RenderResult<()> {
	match value {
		Value::Fragment(nested) => {
			let (nested_sql, nested_args) = render_nested(nested.as_ref())?;
			sql.push_str(&nested_sql);
			args.extend(nested_args);
		}
		other => {
			sql.push('?');
			args.push(other.clone());
		}
	}
	Ok(())
}

/// Writes ` VALUES (...), (...)` for the given rows.
pub(crate) fn write_rows(
	rows: &[Vec<Value>],
	sql: &mut String,
	args: &mut Vec<Value>,
) -> RenderResult<()> {
	sql.push_str(" VALUES ");
	for (i, row) in rows.iter().enumerate() {
		if i > 0 {
			sql.push_str(", ");
		}
		sql.push('(');
		for (j, value) in row.iter().enumerate() {
			if j > 0 {
				sql.push_str(", ");
			}
			write_value(value, sql, args)?;
		}
		sql.push(')');
	}
	Ok(())
}

/// Writes `column<assign>value` pairs sorted by column, joined by `, `.
pub(crate) fn write_assignments(
	assignments: &TypedMap<Value>,
	assign: &str,
	sql: &mut String,
	args: &mut Vec<Value>,
) -> RenderResult<()> {
	for (i, (column, value)) in assignments.sorted_entries().into_iter().enumerate() {
		if i > 0 {
			sql.push_str(", ");
		}
		sql.push_str(&column);
		sql.push_str(assign);
		write_value(&value, sql, args)?;
	}
	Ok(())
}

/// Builds a sorted assignment map from `(column, value)` pairs.
pub(crate) fn assignment_map<I, K, V>(pairs: I) -> TypedMap<Value>
where
	I: IntoIterator<Item = (K, V)>,
	K: AsRef<str>,
	V: Into<Value>,
{
	pairs
		.into_iter()
		.fold(TypedMap::new(), |map, (column, value)| map.set(column.as_ref(), value.into()))
}
