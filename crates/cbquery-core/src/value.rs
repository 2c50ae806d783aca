//! The value model stored in builder state and passed as statement arguments.

use std::fmt;
use std::sync::Arc;

use cbquery_persistent::{List, Map};

use crate::fragment::{Fragment, FragmentRef};

/// A value held in builder state or bound as a positional argument.
///
/// `List` is the unmaterialized, newest-first sequence built by
/// [`append`](crate::builder::append); readers see it as an `Array` in
/// insertion order.
#[derive(Debug, Clone, Default)]
pub enum Value {
	#[default]
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
	Json(serde_json::Value),
	Fragment(FragmentRef),
	List(List<Value>),
	Record(Map<Value>),
	Array(ElementKind, Vec<Value>),
}

impl Value {
	/// Wraps a fragment so it can be stored or bound.
	pub fn fragment(fragment: impl Fragment + 'static) -> Self {
		Self::Fragment(Arc::new(fragment))
	}

	/// Builds an untyped array from anything convertible to values.
	pub fn array<I, T>(items: I) -> Self
	where
		I: IntoIterator<Item = T>,
		T: Into<Value>,
	{
		Self::Array(ElementKind::Any, items.into_iter().map(Into::into).collect())
	}

	/// Returns the element kind this value satisfies.
	pub fn kind(&self) -> ElementKind {
		match self {
			Self::Null => ElementKind::Any,
			Self::Bool(_) => ElementKind::Bool,
			Self::Int(_) => ElementKind::Int,
			Self::Float(_) => ElementKind::Float,
			Self::Text(_) => ElementKind::Text,
			Self::Json(_) => ElementKind::Json,
			Self::Fragment(_) => ElementKind::Fragment,
			Self::List(_) | Self::Array(..) => ElementKind::Array,
			Self::Record(_) => ElementKind::Record,
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	pub fn is_fragment(&self) -> bool {
		matches!(self, Self::Fragment(_))
	}

	pub fn as_fragment(&self) -> Option<&FragmentRef> {
		match self {
			Self::Fragment(fragment) => Some(fragment),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			_ => None,
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => a == b,
			(Self::Text(a), Self::Text(b)) => a == b,
			(Self::Json(a), Self::Json(b)) => a == b,
			(Self::Fragment(a), Self::Fragment(b)) => {
				std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
			}
			(Self::List(a), Self::List(b)) => a == b,
			(Self::Record(a), Self::Record(b)) => a == b,
			(Self::Array(ka, a), Self::Array(kb, b)) => ka == kb && a == b,
			_ => false,
		}
	}
}

/// Rendering used when arguments are inlined for debugging.
impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("NULL"),
			Self::Bool(b) => write!(f, "{b}"),
			Self::Int(i) => write!(f, "{i}"),
			Self::Float(x) => write!(f, "{x}"),
			Self::Text(text) => f.write_str(text),
			Self::Json(json) => write!(f, "{json}"),
			Self::Fragment(fragment) => write!(f, "{fragment:?}"),
			Self::Record(map) => write!(f, "{map}"),
			Self::List(list) => write_seq(f, list.reverse().iter()),
			Self::Array(_, items) => write_seq(f, items.iter()),
		}
	}
}

fn write_seq<'a>(
	f: &mut fmt::Formatter<'_>,
	items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
	f.write_str("[")?;
	for (i, item) in items.enumerate() {
		if i > 0 {
			f.write_str(", ")?;
		}
		write!(f, "{item}")?;
	}
	f.write_str("]")
}

/// The kind of a single value, used to check sequence elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
	/// Accepts every value, including `Null`.
	Any,
	Bool,
	Int,
	Float,
	Text,
	Json,
	Fragment,
	Array,
	Record,
}

impl ElementKind {
	/// Returns `true` if `value` may be stored as an element of this kind.
	///
	/// Agrees with [`FromValue`]: `Null` is accepted everywhere (optional
	/// elements read it as `None`) and `Int` widens to `Float`.
	pub fn accepts(self, value: &Value) -> bool {
		match (self, value) {
			(Self::Any, _) | (_, Value::Null) | (Self::Float, Value::Int(_)) => true,
			(kind, value) => value.kind() == kind,
		}
	}
}

impl fmt::Display for ElementKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Any => "any",
			Self::Bool => "bool",
			Self::Int => "int",
			Self::Float => "float",
			Self::Text => "text",
			Self::Json => "json",
			Self::Fragment => "fragment",
			Self::Array => "array",
			Self::Record => "record",
		};
		f.write_str(name)
	}
}

/// The declared kind of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
	/// A single value.
	Scalar(ElementKind),
	/// A sequence whose elements have the given kind.
	List(ElementKind),
}

impl FieldKind {
	/// The kind of a value holding a field of this kind, as seen from a
	/// containing sequence.
	pub const fn element(self) -> ElementKind {
		match self {
			Self::Scalar(kind) => kind,
			Self::List(_) => ElementKind::Array,
		}
	}

	/// The element kind of a sequence field, or `Any` for scalars.
	pub const fn sequence_element(self) -> ElementKind {
		match self {
			Self::List(kind) => kind,
			Self::Scalar(_) => ElementKind::Any,
		}
	}
}

impl fmt::Display for FieldKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Scalar(kind) => write!(f, "{kind}"),
			Self::List(kind) => write!(f, "list<{kind}>"),
		}
	}
}

/// Conversion from a stored [`Value`] into a typed record field.
///
/// On mismatch the offending value is handed back so the caller can report
/// its kind.
pub trait FromValue: Sized {
	/// The field kind a record declares for this type.
	const KIND: FieldKind;

	fn from_value(value: Value) -> Result<Self, Value>;
}

impl FromValue for Value {
	const KIND: FieldKind = FieldKind::Scalar(ElementKind::Any);

	fn from_value(value: Value) -> Result<Self, Value> {
		Ok(value)
	}
}

impl FromValue for bool {
	const KIND: FieldKind = FieldKind::Scalar(ElementKind::Bool);

	fn from_value(value: Value) -> Result<Self, Value> {
		match value {
			Value::Bool(b) => Ok(b),
			other => Err(other),
		}
	}
}

impl FromValue for i64 {
	const KIND: FieldKind = FieldKind::Scalar(ElementKind::Int);

	fn from_value(value: Value) -> Result<Self, Value> {
		match value {
			Value::Int(i) => Ok(i),
			other => Err(other),
		}
	}
}

impl FromValue for u64 {
	const KIND: FieldKind = FieldKind::Scalar(ElementKind::Int);

	fn from_value(value: Value) -> Result<Self, Value> {
		match value {
			Value::Int(i) if i >= 0 => Ok(i as u64),
			other => Err(other),
		}
	}
}

impl FromValue for f64 {
	const KIND: FieldKind = FieldKind::Scalar(ElementKind::Float);

	fn from_value(value: Value) -> Result<Self, Value> {
		match value {
			Value::Float(x) => Ok(x),
			Value::Int(i) => Ok(i as f64),
			other => Err(other),
		}
	}
}

impl FromValue for String {
	const KIND: FieldKind = FieldKind::Scalar(ElementKind::Text);

	fn from_value(value: Value) -> Result<Self, Value> {
		match value {
			Value::Text(text) => Ok(text),
			other => Err(other),
		}
	}
}

impl FromValue for serde_json::Value {
	const KIND: FieldKind = FieldKind::Scalar(ElementKind::Json);

	fn from_value(value: Value) -> Result<Self, Value> {
		match value {
			Value::Json(json) => Ok(json),
			other => Err(other),
		}
	}
}

impl FromValue for FragmentRef {
	const KIND: FieldKind = FieldKind::Scalar(ElementKind::Fragment);

	fn from_value(value: Value) -> Result<Self, Value> {
		match value {
			Value::Fragment(fragment) => Ok(fragment),
			other => Err(other),
		}
	}
}

impl FromValue for Map<Value> {
	const KIND: FieldKind = FieldKind::Scalar(ElementKind::Record);

	fn from_value(value: Value) -> Result<Self, Value> {
		match value {
			Value::Record(map) => Ok(map),
			other => Err(other),
		}
	}
}

impl<T: FromValue> FromValue for Option<T> {
	const KIND: FieldKind = T::KIND;

	fn from_value(value: Value) -> Result<Self, Value> {
		match value {
			Value::Null => Ok(None),
			other => T::from_value(other).map(Some),
		}
	}
}

/// Sequences accept both the materialized `Array` form and a raw `List`,
/// which is read in insertion order.
impl<T: FromValue> FromValue for Vec<T> {
	const KIND: FieldKind = FieldKind::List(T::KIND.element());

	fn from_value(value: Value) -> Result<Self, Value> {
		let items = match value {
			Value::Array(_, items) => items,
			Value::List(list) => list.reverse().iter().cloned().collect(),
			other => return Err(other),
		};
		items.into_iter().map(T::from_value).collect()
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

macro_rules! impl_from_int {
	($($ty:ty),*) => {
		$(
			impl From<$ty> for Value {
				fn from(value: $ty) -> Self {
					Self::Int(i64::from(value))
				}
			}
		)*
	};
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
	fn from(value: f32) -> Self {
		Self::Float(f64::from(value))
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl From<&String> for Value {
	fn from(value: &String) -> Self {
		Self::Text(value.clone())
	}
}

impl From<serde_json::Value> for Value {
	fn from(value: serde_json::Value) -> Self {
		Self::Json(value)
	}
}

impl From<FragmentRef> for Value {
	fn from(value: FragmentRef) -> Self {
		Self::Fragment(value)
	}
}

impl From<List<Value>> for Value {
	fn from(value: List<Value>) -> Self {
		Self::List(value)
	}
}

impl From<Map<Value>> for Value {
	fn from(value: Map<Value>) -> Self {
		Self::Record(value)
	}
}

impl From<Vec<Value>> for Value {
	fn from(value: Vec<Value>) -> Self {
		Self::Array(ElementKind::Any, value)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fragment::Expr;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	#[case::null(Value::Null, ElementKind::Any)]
	#[case::int(Value::from(3), ElementKind::Int)]
	#[case::text(Value::from("x"), ElementKind::Text)]
	#[case::list(Value::List(List::new()), ElementKind::Array)]
	#[case::record(Value::Record(Map::new()), ElementKind::Record)]
	fn test_kind(#[case] value: Value, #[case] expected: ElementKind) {
		assert_eq!(value.kind(), expected);
	}

	#[rstest]
	#[case::any_null(ElementKind::Any, Value::Null, true)]
	#[case::text_null(ElementKind::Text, Value::Null, true)]
	#[case::int_int(ElementKind::Int, Value::Int(1), true)]
	#[case::float_int(ElementKind::Float, Value::Int(1), true)]
	#[case::int_float(ElementKind::Int, Value::Float(1.5), false)]
	#[case::text_int(ElementKind::Text, Value::Int(1), false)]
	fn test_accepts_matches_conversions(
		#[case] kind: ElementKind,
		#[case] value: Value,
		#[case] expected: bool,
	) {
		assert_eq!(kind.accepts(&value), expected);
	}

	#[rstest]
	fn test_fragment_equality_is_identity() {
		// Arrange
		let a = Value::fragment(Expr::raw("x"));
		let b = Value::fragment(Expr::raw("x"));

		// Assert
		assert_eq!(a, a.clone());
		assert_ne!(a, b);
	}

	#[rstest]
	fn test_vec_from_list_reads_insertion_order() {
		// Arrange
		let list = List::new().prepend(Value::Int(1)).prepend(Value::Int(2));

		// Act
		let items = Vec::<i64>::from_value(Value::List(list));

		// Assert
		assert_eq!(items, Ok(vec![1, 2]));
	}

	#[rstest]
	fn test_vec_rejects_wrong_element() {
		let result = Vec::<i64>::from_value(Value::array(["a"]));

		assert_eq!(result, Err(Value::from("a")));
	}

	#[rstest]
	fn test_declared_kinds() {
		assert_eq!(<Vec<String>>::KIND, FieldKind::List(ElementKind::Text));
		assert_eq!(<Vec<Vec<Value>>>::KIND, FieldKind::List(ElementKind::Array));
		assert_eq!(<Option<FragmentRef>>::KIND, FieldKind::Scalar(ElementKind::Fragment));
	}

	#[rstest]
	fn test_display() {
		assert_eq!(Value::Null.to_string(), "NULL");
		assert_eq!(Value::from("John").to_string(), "John");
		assert_eq!(Value::array([1, 2]).to_string(), "[1, 2]");
	}
}
