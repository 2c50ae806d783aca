//! `INSERT` statements.

use cbquery_core::builder;
use cbquery_core::fragment::{Fragment, FragmentRef, Rendered};
use cbquery_core::registry::ShapeRegistration;
use cbquery_core::typed::TypedMap;
use cbquery_core::{PlaceholderFormat, RenderError, RenderResult, Value, builder_shape, record};

use crate::statement::{
	Statement, assignment_map, replace, write_assignments, write_clause, write_prefixes, write_rows,
};

builder_shape! {
	/// Builds `INSERT` statements.
	///
	/// # Examples
	///
	/// ```
	/// use cbquery_core::Fragment;
	/// use cbquery_statements::insert;
	///
	/// let (sql, args) = insert("users")
	///     .columns(["id", "name"])
	///     .values(["u1", "Alice"])
	///     .values(["u2", "Bob"])
	///     .render()
	///     .unwrap();
	///
	/// assert_eq!(sql, "INSERT INTO users (id, name) VALUES (?, ?), (?, ?)");
	/// assert_eq!(args.len(), 4);
	/// ```
	pub struct InsertBuilder;
}

record! {
	/// The state of an [`InsertBuilder`].
	pub struct InsertData {
		pub placeholder_format: PlaceholderFormat,
		pub prefixes: Vec<FragmentRef>,
		pub options: Vec<String>,
		pub into: Option<String>,
		pub columns: Vec<String>,
		pub values: Vec<Vec<Value>>,
		pub set_map: TypedMap<Value>,
		pub suffixes: Vec<FragmentRef>,
	}
}

inventory::submit! {
	ShapeRegistration::new(|registry| {
		registry.register::<InsertBuilder, InsertData>();
	})
}

impl InsertData {
	/// Renders with `?` markers.
	pub fn render_raw(&self) -> RenderResult<Rendered> {
		let Some(into) = self.into.as_deref().filter(|into| !into.is_empty()) else {
			return Err(RenderError::MissingClause(
				"insert statements must specify a table".into(),
			));
		};
		if !self.values.is_empty() && !self.set_map.is_empty() {
			return Err(RenderError::ConflictingClause(
				"insert statements cannot use both VALUES and SET".into(),
			));
		}

		let mut sql = String::new();
		let mut args = Vec::new();

		write_prefixes(&self.prefixes, &mut sql, &mut args)?;

		sql.push_str("INSERT ");
		if !self.options.is_empty() {
			sql.push_str(&self.options.join(" "));
			sql.push(' ');
		}
		sql.push_str("INTO ");
		sql.push_str(into);

		if !self.columns.is_empty() {
			sql.push_str(" (");
			sql.push_str(&self.columns.join(", "));
			sql.push(')');
		}
		if !self.values.is_empty() {
			write_rows(&self.values, &mut sql, &mut args)?;
		}
		if !self.set_map.is_empty() {
			sql.push_str(" SET ");
			write_assignments(&self.set_map, "=", &mut sql, &mut args)?;
		}

		write_clause(" ", &self.suffixes, " ", &mut sql, &mut args)?;

		Ok((sql, args))
	}
}

impl InsertBuilder {
	fn data(&self) -> InsertData {
		builder::get_record(self)
	}

	/// Sets the keywords written after `INSERT`, replacing earlier ones.
	#[must_use]
	pub fn options<I, O>(&self, options: I) -> Self
	where
		I: IntoIterator<Item = O>,
		O: Into<String>,
	{
		replace(self, "options", options.into_iter().map(|option| Value::Text(option.into())))
	}

	/// Sets the target keyspace.
	#[must_use]
	pub fn into_(&self, into: impl Into<String>) -> Self {
		builder::set(self, "into", Value::Text(into.into()))
	}

	/// Sets the column list, replacing earlier ones.
	#[must_use]
	pub fn columns<I, C>(&self, columns: I) -> Self
	where
		I: IntoIterator<Item = C>,
		C: Into<String>,
	{
		replace(self, "columns", columns.into_iter().map(|column| Value::Text(column.into())))
	}

	/// Adds one row of values.
	///
	/// Fragments are rendered in place; everything else binds as `?`.
	#[must_use]
	pub fn values<I, V>(&self, row: I) -> Self
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		builder::append(self, "values", [Value::array(row)])
	}

	/// Sets `SET column=value` pairs, replacing earlier ones.
	#[must_use]
	pub fn set_map<I, K, V>(&self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<Value>,
	{
		builder::set(self, "set_map", assignment_map(pairs))
	}
}

impl Fragment for InsertBuilder {
	fn render(&self) -> RenderResult<Rendered> {
		let data = self.data();
		Ok(data.placeholder_format.finalize(data.render_raw()?))
	}

	fn render_raw(&self) -> RenderResult<Rendered> {
		self.data().render_raw()
	}
}

impl Statement for InsertBuilder {}
