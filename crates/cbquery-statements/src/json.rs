//! JSON document helpers: field paths, array and object constructors,
//! embedded documents and index hints.

use std::fmt;

use cbquery_core::fragment::{Expr, Fragment, IntoArgs, Rendered};
use cbquery_core::{RenderResult, Value};
use serde::Serialize;

/// Escapes every segment after the first of a dotted path.
///
/// # Examples
///
/// ```
/// use cbquery_statements::json::json_field;
///
/// assert_eq!(json_field("user"), "user");
/// assert_eq!(json_field("user.address.city"), "user.`address`.`city`");
/// ```
pub fn json_field(path: &str) -> String {
	let mut segments = path.split('.');
	let mut field = segments.next().unwrap_or_default().to_owned();
	for segment in segments {
		field.push_str(".`");
		field.push_str(segment);
		field.push('`');
	}
	field
}

/// `<field> ARRAY_CONTAINS ?`.
pub fn json_array_contains(field: impl AsRef<str>, value: impl Into<Value>) -> Expr {
	Expr::new(format!("{} ARRAY_CONTAINS ?", field.as_ref()), vec![value.into()])
}

/// `ARRAY_CONSTRUCTOR(?, ...)` with one bound element per value.
pub fn json_array(values: impl IntoArgs) -> Expr {
	let values = values.into_args();
	let markers = vec!["?"; values.len()].join(",");
	Expr::new(format!("ARRAY_CONSTRUCTOR({markers})"), values)
}

/// An object constructor, `{"key": ?, ...}`, in the order the pairs are
/// given.
///
/// A value that is itself a fragment, such as a nested object, is rendered
/// in place.
///
/// # Examples
///
/// ```
/// use cbquery_core::{Fragment, Value};
/// use cbquery_statements::json::json_object;
///
/// let address = json_object([("city", "New York")]);
/// let person = json_object([
///     ("name", Value::from("John")),
///     ("address", Value::fragment(address)),
/// ]);
///
/// let (sql, args) = person.render().unwrap();
/// assert_eq!(sql, r#"{"name": ?, "address": {"city": ?}}"#);
/// assert_eq!(args.len(), 2);
/// ```
pub fn json_object<I, K, V>(pairs: I) -> Expr
where
	I: IntoIterator<Item = (K, V)>,
	K: AsRef<str>,
	V: Into<Value>,
{
	let mut entries = Vec::new();
	let mut args = Vec::new();
	for (key, value) in pairs {
		let key = serde_json::Value::String(key.as_ref().to_owned());
		entries.push(format!("{key}: ?"));
		args.push(value.into());
	}
	Expr::new(format!("{{{}}}", entries.join(", ")), args)
}

/// A value written into the query as a JSON literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Document(serde_json::Value);

impl Document {
	pub fn into_inner(self) -> serde_json::Value {
		self.0
	}
}

/// Serializes `value` as a [`Document`].
pub fn as_document<T: Serialize>(value: &T) -> serde_json::Result<Document> {
	serde_json::to_value(value).map(Document)
}

impl From<serde_json::Value> for Document {
	fn from(value: serde_json::Value) -> Self {
		Self(value)
	}
}

impl Fragment for Document {
	fn render(&self) -> RenderResult<Rendered> {
		Ok((self.0.to_string(), Vec::new()))
	}
}

/// A field with a path of escaped sub-fields, `user.`address`.`city``.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedField {
	pub field: String,
	pub path: Vec<String>,
}

/// Creates a [`NestedField`].
pub fn field<I, P>(field: impl Into<String>, path: I) -> NestedField
where
	I: IntoIterator<Item = P>,
	P: Into<String>,
{
	NestedField {
		field: field.into(),
		path: path.into_iter().map(Into::into).collect(),
	}
}

impl fmt::Display for NestedField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.field)?;
		for segment in &self.path {
			write!(f, ".`{segment}`")?;
		}
		Ok(())
	}
}

/// The index kind named by `USE INDEX (... USING <kind>)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
	Gsi,
	View,
}

impl IndexType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Gsi => "GSI",
			Self::View => "VIEW",
		}
	}
}

/// A `USE INDEX` hint.
///
/// # Examples
///
/// ```
/// use cbquery_core::Fragment;
/// use cbquery_statements::json::UseIndex;
///
/// assert_eq!(UseIndex::gsi("idx_users").render().unwrap().0, "USE INDEX (`idx_users` USING GSI)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseIndex {
	name: String,
	index_type: Option<IndexType>,
}

impl UseIndex {
	/// Names an index without its kind.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			index_type: None,
		}
	}

	pub fn gsi(name: impl Into<String>) -> Self {
		Self::new(name).using(IndexType::Gsi)
	}

	pub fn view(name: impl Into<String>) -> Self {
		Self::new(name).using(IndexType::View)
	}

	#[must_use]
	pub fn using(mut self, index_type: IndexType) -> Self {
		self.index_type = Some(index_type);
		self
	}
}

impl Fragment for UseIndex {
	fn render(&self) -> RenderResult<Rendered> {
		let sql = match self.index_type {
			Some(index_type) => {
				format!("USE INDEX (`{}` USING {})", self.name, index_type.as_str())
			}
			None => format!("USE INDEX (`{}`)", self.name),
		};
		Ok((sql, Vec::new()))
	}
}

/// Binds `document` and navigates into it, `?->`a`.`b``.
pub fn sub_document<I, P>(document: impl Into<Value>, path: I) -> Expr
where
	I: IntoIterator<Item = P>,
	P: AsRef<str>,
{
	let segments: Vec<String> =
		path.into_iter().map(|segment| format!("`{}`", segment.as_ref())).collect();
	let sql = if segments.is_empty() {
		"?".to_owned()
	} else {
		format!("?->{}", segments.join("."))
	};
	Expr::new(sql, vec![document.into()])
}
