//! Immutable builder state and the generic accessors over it.
//!
//! A [`Builder`] is a persistent map from field names to [`Value`]s. Concrete
//! builders ("shapes") are newtypes over it implementing [`BuilderShape`].
//! Every accessor returns a new shape and leaves its input untouched, so a
//! partially built statement can be branched freely.
//!
//! # Examples
//!
//! ```
//! use cbquery_core::builder::{self, Builder};
//! use cbquery_core::value::{ElementKind, Value};
//!
//! let base = builder::append(&Builder::new(), "columns", ["id"]);
//! let wide = builder::append(&base, "columns", ["name", "email"]);
//!
//! assert_eq!(
//!     builder::get(&wide, "columns"),
//!     Some(Value::Array(ElementKind::Any, vec!["id".into(), "name".into(), "email".into()])),
//! );
//! assert_eq!(builder::get(&base, "columns").map(|v| v.to_string()), Some("[id]".to_owned()));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use cbquery_persistent::{List, Map};

use crate::record::{AnyRecord, Record};
use crate::registry::{Registry, fill_record};
use crate::typed::TypedList;
use crate::value::{FromValue, Value};

/// Persistent builder state.
#[derive(Clone, Default)]
pub struct Builder {
	state: Map<Value>,
}

impl Builder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_state(state: Map<Value>) -> Self {
		Self { state }
	}

	pub fn state(&self) -> &Map<Value> {
		&self.state
	}

	/// Returns a builder with `name` set to `value`.
	#[must_use]
	pub fn with(&self, name: &str, value: Value) -> Self {
		Self::from_state(self.state.set(name, value))
	}

	/// Returns a builder without `name`.
	#[must_use]
	pub fn without(&self, name: &str) -> Self {
		Self::from_state(self.state.delete(name))
	}
}

impl fmt::Debug for Builder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Builder").field("state", &self.state).finish()
	}
}

/// A concrete builder type wrapping a [`Builder`].
pub trait BuilderShape: Clone + Send + Sync + 'static {
	fn from_builder(builder: Builder) -> Self;

	fn builder(&self) -> &Builder;
}

impl BuilderShape for Builder {
	fn from_builder(builder: Builder) -> Self {
		builder
	}

	fn builder(&self) -> &Builder {
		self
	}
}

/// Declares a newtype over [`Builder`] implementing [`BuilderShape`].
///
/// # Examples
///
/// ```
/// use cbquery_core::builder_shape;
/// use cbquery_core::builder::{self, BuilderShape};
///
/// builder_shape! {
///     /// Builds greetings.
///     pub struct GreetingBuilder;
/// }
///
/// let greeting = builder::set(&GreetingBuilder::default(), "name", "world");
/// assert_eq!(greeting.builder().state().size(), 1);
/// ```
#[macro_export]
macro_rules! builder_shape {
	(
		$(#[$meta:meta])*
		$vis:vis struct $name:ident;
	) => {
		$(#[$meta])*
		#[derive(Clone, Default)]
		$vis struct $name($crate::builder::Builder);

		impl $crate::builder::BuilderShape for $name {
			fn from_builder(builder: $crate::builder::Builder) -> Self {
				Self(builder)
			}

			fn builder(&self) -> &$crate::builder::Builder {
				&self.0
			}
		}

		impl ::core::fmt::Debug for $name {
			fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
				f.debug_tuple(::core::stringify!($name)).field(&self.0).finish()
			}
		}
	};
}

/// Returns a shape with `name` set to `value`.
pub fn set<S: BuilderShape>(builder: &S, name: &str, value: impl Into<Value>) -> S {
	S::from_builder(builder.builder().with(name, value.into()))
}

/// Returns a shape without `name`.
pub fn remove<S: BuilderShape>(builder: &S, name: &str) -> S {
	S::from_builder(builder.builder().without(name))
}

/// Appends `values` to the sequence stored at `name`.
///
/// An absent or non-sequence entry is treated as empty. Appending nothing
/// still stores the sequence, so an empty input leaves `name` present with
/// no elements; use [`extend`] with `None` to leave the builder unchanged.
pub fn append<S, I>(builder: &S, name: &str, values: I) -> S
where
	S: BuilderShape,
	I: IntoIterator,
	I::Item: Into<Value>,
{
	let mut list = match builder.builder().state().lookup(name) {
		Some(Value::List(list)) => list.clone(),
		_ => List::new(),
	};
	for value in values {
		list = list.prepend(value.into());
	}
	set(builder, name, Value::List(list))
}

/// Like [`append`], but `None` returns the builder unchanged.
pub fn extend<S, I>(builder: &S, name: &str, values: Option<I>) -> S
where
	S: BuilderShape,
	I: IntoIterator,
	I::Item: Into<Value>,
{
	match values {
		Some(values) => append(builder, name, values),
		None => builder.clone(),
	}
}

/// Reads one entry from the global registry's view of `S`.
///
/// Sequences come back as [`Value::Array`] in insertion order.
pub fn get<S: BuilderShape>(builder: &S, name: &str) -> Option<Value> {
	Registry::global().get(builder, name)
}

/// Snapshot of every entry, sequences materialized.
pub fn get_map<S: BuilderShape>(builder: &S) -> BTreeMap<String, Value> {
	Registry::global().get_map(builder)
}

/// Reads the state into a record of type `R`.
///
/// Private (`_`-prefixed) and undeclared names are skipped.
///
/// # Panics
///
/// Panics if a stored value cannot be assigned to its field.
pub fn get_record<S: BuilderShape, R: Record>(builder: &S) -> R {
	let mut record = R::default();
	fill_record(builder.builder().state(), R::FIELDS, |name, value| {
		record.assign(name, value)
	});
	record
}

/// Reads the state into a record of the type registered for `S`.
///
/// Returns `None` if `S` is not registered.
pub fn get_as_record<S: BuilderShape>(builder: &S) -> Option<Box<dyn AnyRecord>> {
	Registry::global().get_as_record(builder)
}

/// Reads one entry converted to `T`.
///
/// # Panics
///
/// Panics if the stored value does not convert to `T`.
pub fn get_typed<S: BuilderShape, T: FromValue>(builder: &S, name: &str) -> Option<T> {
	let value = get(builder, name)?;
	match T::from_value(value) {
		Ok(typed) => Some(typed),
		Err(found) => panic!(
			"{}",
			crate::error::FieldAssignmentError::new(name, T::KIND, found.kind())
		),
	}
}

/// Returns the unmaterialized sequence at `name` as a typed view.
///
/// The view is newest-first, the order values are held in state.
pub fn get_list<S, T>(builder: &S, name: &str) -> Option<TypedList<T>>
where
	S: BuilderShape,
	T: FromValue + Into<Value>,
{
	match builder.builder().state().lookup(name)? {
		Value::List(list) => Some(TypedList::from_untyped(list.clone())),
		_ => None,
	}
}
