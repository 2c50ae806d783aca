//! Element-typed views over the persistent containers.
//!
//! Builder state stores [`Value`]s. These wrappers narrow a `List<Value>` or
//! `Map<Value>` to one element type at the API surface and delegate every
//! operation to the untyped container.

use std::fmt;
use std::marker::PhantomData;

use cbquery_persistent::{List, Map};

use crate::error::FieldAssignmentError;
use crate::value::{FieldKind, FromValue, Value};

fn narrow<T: FromValue>(value: Value, field: &str) -> T {
	T::from_value(value).unwrap_or_else(|found| {
		panic!(
			"{}",
			FieldAssignmentError::new(field, T::KIND, found.kind())
		)
	})
}

/// A persistent sequence of `T`.
///
/// # Panics
///
/// Accessors panic if a stored element does not convert to `T`.
pub struct TypedList<T> {
	inner: List<Value>,
	_marker: PhantomData<fn() -> T>,
}

impl<T: FromValue + Into<Value>> TypedList<T> {
	pub fn new() -> Self {
		Self::from_untyped(List::new())
	}

	pub fn from_untyped(inner: List<Value>) -> Self {
		Self {
			inner,
			_marker: PhantomData,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn size(&self) -> usize {
		self.inner.size()
	}

	#[must_use]
	pub fn prepend(&self, value: T) -> Self {
		Self::from_untyped(self.inner.prepend(value.into()))
	}

	/// # Panics
	///
	/// Panics if the list is empty.
	pub fn head(&self) -> T {
		narrow(self.inner.head().clone(), "head")
	}

	/// # Panics
	///
	/// Panics if the list is empty.
	pub fn tail(&self) -> Self {
		Self::from_untyped(self.inner.tail())
	}

	pub fn first(&self) -> Option<T> {
		self.inner.first().cloned().map(|value| narrow(value, "first"))
	}

	pub fn for_each<F>(&self, mut f: F)
	where
		F: FnMut(T),
	{
		self.inner.for_each(|value| f(narrow(value.clone(), "element")));
	}

	#[must_use]
	pub fn reverse(&self) -> Self {
		Self::from_untyped(self.inner.reverse())
	}

	/// Iterates from head to last.
	pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
		self.inner.iter().map(|value| narrow(value.clone(), "element"))
	}

	pub fn as_untyped(&self) -> &List<Value> {
		&self.inner
	}

	pub fn into_untyped(self) -> List<Value> {
		self.inner
	}
}

impl<T> Clone for TypedList<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
			_marker: PhantomData,
		}
	}
}

impl<T: FromValue + Into<Value>> Default for TypedList<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> fmt::Debug for TypedList<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&self.inner, f)
	}
}

/// Yields elements from head to last.
impl<T: FromValue + Into<Value>> IntoIterator for TypedList<T> {
	type Item = T;
	type IntoIter = std::vec::IntoIter<T>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter().collect::<Vec<_>>().into_iter()
	}
}

impl<T: FromValue + Into<Value>> FromIterator<T> for TypedList<T> {
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		Self::from_untyped(iter.into_iter().map(Into::into).collect())
	}
}

impl<T> From<TypedList<T>> for Value {
	fn from(list: TypedList<T>) -> Self {
		Value::List(list.inner)
	}
}

/// A persistent string-keyed map of `V`.
///
/// # Panics
///
/// Accessors panic if a stored value does not convert to `V`.
pub struct TypedMap<V> {
	inner: Map<Value>,
	_marker: PhantomData<fn() -> V>,
}

impl<V: FromValue + Into<Value>> TypedMap<V> {
	pub fn new() -> Self {
		Self::from_untyped(Map::new())
	}

	pub fn from_untyped(inner: Map<Value>) -> Self {
		Self {
			inner,
			_marker: PhantomData,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn size(&self) -> usize {
		self.inner.size()
	}

	#[must_use]
	pub fn set(&self, key: &str, value: V) -> Self {
		Self::from_untyped(self.inner.set(key, value.into()))
	}

	#[must_use]
	pub fn delete(&self, key: &str) -> Self {
		Self::from_untyped(self.inner.delete(key))
	}

	pub fn lookup(&self, key: &str) -> Option<V> {
		self.inner.lookup(key).cloned().map(|value| narrow(value, key))
	}

	pub fn for_each<F>(&self, mut f: F)
	where
		F: FnMut(&str, V),
	{
		self.inner.for_each(|key, value| f(key, narrow(value.clone(), key)));
	}

	pub fn keys(&self) -> Vec<String> {
		self.inner.keys()
	}

	/// Entries sorted by key.
	pub fn sorted_entries(&self) -> Vec<(String, V)> {
		let mut entries = Vec::with_capacity(self.size());
		self.for_each(|key, value| entries.push((key.to_owned(), value)));
		entries.sort_by(|a, b| a.0.cmp(&b.0));
		entries
	}

	pub fn as_untyped(&self) -> &Map<Value> {
		&self.inner
	}

	pub fn into_untyped(self) -> Map<Value> {
		self.inner
	}
}

impl<V> Clone for TypedMap<V> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
			_marker: PhantomData,
		}
	}
}

impl<V: FromValue + Into<Value>> Default for TypedMap<V> {
	fn default() -> Self {
		Self::new()
	}
}

impl<V> fmt::Debug for TypedMap<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&self.inner, f)
	}
}

impl<K: AsRef<str>, V: FromValue + Into<Value>> FromIterator<(K, V)> for TypedMap<V> {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self::from_untyped(
			iter.into_iter()
				.map(|(key, value)| (key, value.into()))
				.collect(),
		)
	}
}

impl<V> From<TypedMap<V>> for Value {
	fn from(map: TypedMap<V>) -> Self {
		Value::Record(map.inner)
	}
}

impl<V: FromValue + Into<Value>> FromValue for TypedMap<V> {
	const KIND: FieldKind = <Map<Value> as FromValue>::KIND;

	fn from_value(value: Value) -> Result<Self, Value> {
		Map::<Value>::from_value(value).map(Self::from_untyped)
	}
}
