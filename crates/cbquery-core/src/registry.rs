//! Registry mapping builder shapes to the record type their state reads into.
//!
//! Shapes are registered once, normally at program start through
//! [`ShapeRegistration`] entries collected by `inventory`, and looked up on
//! every untyped read. Scoped registries can be created with
//! [`Registry::new`] for isolated use.

use std::any::{TypeId, type_name};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use cbquery_persistent::Map;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::builder::{Builder, BuilderShape};
use crate::error::FieldAssignmentError;
use crate::record::{AnyRecord, FieldDescriptor, Record, is_private_field};
use crate::value::{ElementKind, FieldKind, Value};

/// Description of a registered record type.
#[derive(Clone, Copy)]
pub struct RecordType {
	name: &'static str,
	type_id: TypeId,
	fields: &'static [FieldDescriptor],
	new_empty: fn() -> Box<dyn AnyRecord>,
}

fn new_empty<R: Record>() -> Box<dyn AnyRecord> {
	Box::new(R::default())
}

impl RecordType {
	pub fn of<R: Record>() -> Self {
		Self {
			name: R::NAME,
			type_id: TypeId::of::<R>(),
			fields: R::FIELDS,
			new_empty: new_empty::<R>,
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn type_id(&self) -> TypeId {
		self.type_id
	}

	pub fn fields(&self) -> &'static [FieldDescriptor] {
		self.fields
	}

	pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
		self.fields.iter().find(|field| field.name == name)
	}

	/// Returns `true` if this describes `R`.
	pub fn is<R: Record>(&self) -> bool {
		self.type_id == TypeId::of::<R>()
	}

	/// Creates a record with every field at its default.
	pub fn new_empty(&self) -> Box<dyn AnyRecord> {
		(self.new_empty)()
	}
}

impl fmt::Debug for RecordType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RecordType")
			.field("name", &self.name)
			.field("fields", &self.fields)
			.finish()
	}
}

impl PartialEq for RecordType {
	fn eq(&self, other: &Self) -> bool {
		self.type_id == other.type_id
	}
}

/// A static registration of one builder shape, submitted with
/// `inventory::submit!`.
///
/// # Examples
///
/// ```rust,ignore
/// inventory::submit! {
///     ShapeRegistration::new(|registry| {
///         registry.register::<SelectBuilder, SelectData>();
///     })
/// }
/// ```
pub struct ShapeRegistration {
	register: fn(&Registry),
}

impl ShapeRegistration {
	pub const fn new(register: fn(&Registry)) -> Self {
		Self { register }
	}

	pub fn apply(&self, registry: &Registry) {
		(self.register)(registry);
	}
}

inventory::collect!(ShapeRegistration);

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(|| {
	let registry = Registry::new();
	for registration in inventory::iter::<ShapeRegistration> {
		registration.apply(&registry);
	}
	tracing::debug!(shapes = registry.len(), "builder registry initialized");
	registry
});

/// Shape-to-record registry.
///
/// Reads take a shared lock, registration takes the exclusive lock.
pub struct Registry {
	shapes: RwLock<HashMap<TypeId, RecordType>>,
}

impl Registry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self {
			shapes: RwLock::new(HashMap::new()),
		}
	}

	/// Returns the process-wide registry populated from every
	/// [`ShapeRegistration`] linked into the binary.
	pub fn global() -> &'static Registry {
		&GLOBAL_REGISTRY
	}

	/// Associates shape `S` with record type `R` and returns an empty `S`.
	///
	/// Registering a shape again replaces the earlier record type.
	///
	/// # Panics
	///
	/// Panics if `R` declares an empty or duplicated field name.
	pub fn register<S: BuilderShape, R: Record>(&self) -> S {
		validate_fields(R::NAME, R::FIELDS);

		let previous = self
			.shapes
			.write()
			.insert(TypeId::of::<S>(), RecordType::of::<R>());
		match previous {
			Some(previous) => tracing::warn!(
				shape = type_name::<S>(),
				previous = previous.name(),
				record = R::NAME,
				"builder shape registered again, replacing its record type"
			),
			None => tracing::debug!(
				shape = type_name::<S>(),
				record = R::NAME,
				"registered builder shape"
			),
		}

		S::from_builder(Builder::new())
	}

	pub fn record_type_for<S: 'static>(&self) -> Option<RecordType> {
		self.record_type_for_id(TypeId::of::<S>())
	}

	pub fn record_type_for_id(&self, shape: TypeId) -> Option<RecordType> {
		self.shapes.read().get(&shape).copied()
	}

	/// Creates a default record of the type registered for `S`.
	pub fn new_empty_record<S: 'static>(&self) -> Option<Box<dyn AnyRecord>> {
		self.record_type_for::<S>().map(|record| record.new_empty())
	}

	pub fn is_registered<S: 'static>(&self) -> bool {
		self.shapes.read().contains_key(&TypeId::of::<S>())
	}

	pub fn len(&self) -> usize {
		self.shapes.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.shapes.read().is_empty()
	}

	/// Reads one entry, materializing a stored sequence.
	///
	/// The element kind comes from the field declared by the registered
	/// record; undeclared names and unregistered shapes use
	/// [`ElementKind::Any`].
	///
	/// # Panics
	///
	/// Panics if a sequence element does not match the declared kind.
	pub fn get<S: BuilderShape>(&self, builder: &S, name: &str) -> Option<Value> {
		let value = builder.builder().state().lookup(name)?;
		let kind = element_kind(self.record_type_for::<S>().as_ref(), name);
		Some(materialize(value, kind, name))
	}

	/// Snapshot of every entry with sequences materialized.
	pub fn get_map<S: BuilderShape>(&self, builder: &S) -> BTreeMap<String, Value> {
		let record_type = self.record_type_for::<S>();
		builder
			.builder()
			.state()
			.iter()
			.map(|(name, value)| {
				let kind = element_kind(record_type.as_ref(), name);
				(name.to_owned(), materialize(value, kind, name))
			})
			.collect()
	}

	/// Reads builder state into a new record of the registered type.
	///
	/// Returns `None` if `S` was never registered.
	///
	/// # Panics
	///
	/// Panics if a stored value cannot be assigned to its field.
	pub fn get_as_record<S: BuilderShape>(&self, builder: &S) -> Option<Box<dyn AnyRecord>> {
		let record_type = self.record_type_for::<S>()?;
		let mut record = record_type.new_empty();
		fill_record(builder.builder().state(), record_type.fields(), |name, value| {
			record.assign_field(name, value)
		});
		Some(record)
	}
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Registry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Registry")
			.field("shapes", &self.len())
			.finish()
	}
}

fn validate_fields(record: &str, fields: &[FieldDescriptor]) {
	let mut seen = HashSet::with_capacity(fields.len());
	for field in fields {
		if field.name.is_empty() {
			panic!("cannot register record `{record}`: field with an empty name");
		}
		if !seen.insert(field.name) {
			panic!(
				"cannot register record `{record}`: field `{}` declared more than once",
				field.name
			);
		}
	}
}

fn element_kind(record_type: Option<&RecordType>, name: &str) -> ElementKind {
	record_type
		.and_then(|record| record.field(name))
		.map_or(ElementKind::Any, |field| field.kind.sequence_element())
}

/// Turns a stored newest-first `List` into an `Array` in insertion order.
pub(crate) fn materialize(value: &Value, kind: ElementKind, name: &str) -> Value {
	let Value::List(list) = value else {
		return value.clone();
	};

	let mut items: Vec<Value> = list.iter().cloned().collect();
	items.reverse();
	if let Some(bad) = items.iter().find(|item| !kind.accepts(item)) {
		panic!(
			"{}",
			FieldAssignmentError::new(name, FieldKind::List(kind), bad.kind())
		);
	}
	Value::Array(kind, items)
}

/// Assigns every public, declared entry of `state` through `assign`.
///
/// Element checks are left to the field's own conversion.
pub(crate) fn fill_record<F>(state: &Map<Value>, fields: &[FieldDescriptor], mut assign: F)
where
	F: FnMut(&str, Value) -> Result<(), FieldAssignmentError>,
{
	for (name, value) in state.iter() {
		if is_private_field(name) {
			continue;
		}
		if !fields.iter().any(|field| field.name == name) {
			continue;
		}
		let value = materialize(value, ElementKind::Any, name);
		if let Err(err) = assign(name, value) {
			panic!("{err}");
		}
	}
}

/// Registers `S` with record type `R` in the global registry.
pub fn register<S: BuilderShape, R: Record>() -> S {
	Registry::global().register::<S, R>()
}

/// Looks up the record type registered for `S` in the global registry.
pub fn record_type_for<S: 'static>() -> Option<RecordType> {
	Registry::global().record_type_for::<S>()
}

/// Creates an empty record for `S` from the global registry.
pub fn new_empty_record<S: 'static>() -> Option<Box<dyn AnyRecord>> {
	Registry::global().new_empty_record::<S>()
}
