//! `UPSERT` statements.
//!
//! The body is chosen from the first form that has been supplied:
//!
//! 1. a document, `(KEY, VALUE) VALUES (?, <value>)`
//! 2. columns together with rows, `(a, b) VALUES (?, ?)`
//! 3. a `SET` map
//!
//! Anything supplied for a later form is ignored.

use cbquery_core::builder;
use cbquery_core::fragment::{Fragment, FragmentRef, Rendered};
use cbquery_core::registry::ShapeRegistration;
use cbquery_core::typed::TypedMap;
use cbquery_core::{PlaceholderFormat, RenderError, RenderResult, Value, builder_shape, record};

use crate::statement::{
	Statement, assignment_map, replace, write_assignments, write_clause, write_prefixes, write_rows,
	write_value,
};

builder_shape! {
	/// Builds `UPSERT` statements.
	///
	/// # Examples
	///
	/// ```
	/// use cbquery_core::{Fragment, Value};
	/// use cbquery_statements::upsert;
	///
	/// let doc = serde_json::json!({"name": "Alice"});
	/// let (sql, args) = upsert("users").document("user::1", doc).render().unwrap();
	///
	/// assert_eq!(sql, "UPSERT INTO users (KEY, VALUE) VALUES (?, ?)");
	/// assert_eq!(args[0], Value::from("user::1"));
	/// ```
	pub struct UpsertBuilder;
}

record! {
	/// The state of an [`UpsertBuilder`].
	pub struct UpsertData {
		pub placeholder_format: PlaceholderFormat,
		pub prefixes: Vec<FragmentRef>,
		pub options: Vec<String>,
		pub into: Option<String>,
		pub key: Option<String>,
		pub value: Value,
		pub columns: Vec<String>,
		pub values: Vec<Vec<Value>>,
		pub set_map: TypedMap<Value>,
		pub suffixes: Vec<FragmentRef>,
	}
}

inventory::submit! {
	ShapeRegistration::new(|registry| {
		registry.register::<UpsertBuilder, UpsertData>();
	})
}

impl UpsertData {
	/// Renders with `?` markers.
	pub fn render_raw(&self) -> RenderResult<Rendered> {
		let Some(into) = self.into.as_deref().filter(|into| !into.is_empty()) else {
			return Err(RenderError::MissingClause(
				"upsert statements must specify a bucket".into(),
			));
		};

		let mut sql = String::new();
		let mut args = Vec::new();

		write_prefixes(&self.prefixes, &mut sql, &mut args)?;

		sql.push_str("UPSERT ");
		if !self.options.is_empty() {
			sql.push_str(&self.options.join(" "));
			sql.push(' ');
		}
		sql.push_str("INTO ");
		sql.push_str(into);

		let key = self.key.as_deref().filter(|key| !key.is_empty());
		if let Some(key) = key.filter(|_| !self.value.is_null()) {
			sql.push_str(" (KEY, VALUE) VALUES (?, ");
			args.push(Value::from(key));
			write_value(&self.value, &mut sql, &mut args)?;
			sql.push(')');
		} else if !self.columns.is_empty() && !self.values.is_empty() {
			sql.push_str(" (");
			sql.push_str(&self.columns.join(", "));
			sql.push(')');
			write_rows(&self.values, &mut sql, &mut args)?;
		} else if !self.set_map.is_empty() {
			sql.push_str(" SET ");
			write_assignments(&self.set_map, "=", &mut sql, &mut args)?;
		}

		write_clause(" ", &self.suffixes, " ", &mut sql, &mut args)?;

		Ok((sql, args))
	}
}

impl UpsertBuilder {
	fn data(&self) -> UpsertData {
		builder::get_record(self)
	}

	#[must_use]
	pub fn options<I, O>(&self, options: I) -> Self
	where
		I: IntoIterator<Item = O>,
		O: Into<String>,
	{
		replace(self, "options", options.into_iter().map(|option| Value::Text(option.into())))
	}

	/// Sets the target bucket.
	#[must_use]
	pub fn into_(&self, into: impl Into<String>) -> Self {
		builder::set(self, "into", Value::Text(into.into()))
	}

	/// Upserts a whole document under `key`.
	///
	/// The key always binds as an argument. A fragment value renders in
	/// place.
	#[must_use]
	pub fn document(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		let with_key = builder::set(self, "key", Value::Text(key.into()));
		builder::set(&with_key, "value", value)
	}

	#[must_use]
	pub fn columns<I, C>(&self, columns: I) -> Self
	where
		I: IntoIterator<Item = C>,
		C: Into<String>,
	{
		replace(self, "columns", columns.into_iter().map(|column| Value::Text(column.into())))
	}

	/// Adds one row of values.
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

impl Fragment for UpsertBuilder {
	fn render(&self) -> RenderResult<Rendered> {
		let data = self.data();
		Ok(data.placeholder_format.finalize(data.render_raw()?))
	}

	fn render_raw(&self) -> RenderResult<Rendered> {
		self.data().render_raw()
	}
}

impl Statement for UpsertBuilder {}
