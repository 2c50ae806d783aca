//! Typed records that builder state is read back into.
//!
//! A record is a plain struct whose fields are listed in a static
//! [`FieldDescriptor`] table. The [`record!`](crate::record!) macro declares
//! the struct and generates the table together with a field-by-name
//! assignment routine, so reading builder state needs no runtime reflection.
//!
//! # Examples
//!
//! ```
//! use cbquery_core::record;
//! use cbquery_core::record::Record;
//! use cbquery_core::value::Value;
//!
//! record! {
//!     pub struct PointData {
//!         pub x: i64,
//!         pub labels: Vec<String>,
//!     }
//! }
//!
//! let mut point = PointData::default();
//! point.assign("x", Value::from(5)).unwrap();
//! assert_eq!(point.x, 5);
//! assert_eq!(PointData::FIELDS.len(), 2);
//! ```

use std::any::Any;
use std::fmt;

use crate::error::FieldAssignmentError;
use crate::value::{FieldKind, Value};

/// Name and kind of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
	pub name: &'static str,
	pub kind: FieldKind,
}

impl FieldDescriptor {
	pub const fn new(name: &'static str, kind: FieldKind) -> Self {
		Self { name, kind }
	}
}

/// A struct that builder state can be materialized into.
pub trait Record: fmt::Debug + Default + Send + Sync + 'static {
	/// Type name used in diagnostics.
	const NAME: &'static str;

	/// Every field, in declaration order.
	const FIELDS: &'static [FieldDescriptor];

	/// Stores `value` in the field called `field`.
	///
	/// Unknown field names are ignored.
	fn assign(&mut self, field: &str, value: Value) -> Result<(), FieldAssignmentError>;
}

/// Object-safe view of a [`Record`].
pub trait AnyRecord: fmt::Debug + Send + Sync {
	fn record_name(&self) -> &'static str;

	fn fields(&self) -> &'static [FieldDescriptor];

	fn assign_field(&mut self, field: &str, value: Value) -> Result<(), FieldAssignmentError>;

	fn as_any(&self) -> &dyn Any;

	fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<R: Record> AnyRecord for R {
	fn record_name(&self) -> &'static str {
		R::NAME
	}

	fn fields(&self) -> &'static [FieldDescriptor] {
		R::FIELDS
	}

	fn assign_field(&mut self, field: &str, value: Value) -> Result<(), FieldAssignmentError> {
		self.assign(field, value)
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn into_any(self: Box<Self>) -> Box<dyn Any> {
		self
	}
}

impl dyn AnyRecord {
	/// Returns the concrete record if it is an `R`.
	pub fn downcast_ref<R: Record>(&self) -> Option<&R> {
		self.as_any().downcast_ref()
	}

	/// Converts into the concrete record if it is an `R`.
	pub fn downcast<R: Record>(self: Box<Self>) -> Option<Box<R>> {
		self.into_any().downcast().ok()
	}
}

/// Returns `true` for names that are never copied into records.
pub fn is_private_field(name: &str) -> bool {
	name.starts_with('_')
}

/// Declares a [`Record`] struct.
///
/// Every field type must implement [`FromValue`](crate::value::FromValue)
/// and `Default`. The struct derives `Debug`, `Clone` and `Default`.
#[macro_export]
macro_rules! record {
	(
		$(#[$meta:meta])*
		$vis:vis struct $name:ident {
			$(
				$(#[$field_meta:meta])*
				$field_vis:vis $field:ident : $ty:ty
			),* $(,)?
		}
	) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Default)]
		$vis struct $name {
			$(
				$(#[$field_meta])*
				$field_vis $field: $ty,
			)*
		}

		impl $crate::record::Record for $name {
			const NAME: &'static str = ::core::stringify!($name);

			const FIELDS: &'static [$crate::record::FieldDescriptor] = &[
				$(
					$crate::record::FieldDescriptor::new(
						::core::stringify!($field),
						<$ty as $crate::value::FromValue>::KIND,
					),
				)*
			];

			#[allow(unused_variables)]
			fn assign(
				&mut self,
				field: &str,
				value: $crate::value::Value,
			) -> ::core::result::Result<(), $crate::error::FieldAssignmentError> {
				match field {
					$(
						::core::stringify!($field) => {
							self.$field = <$ty as $crate::value::FromValue>::from_value(value)
								.map_err(|found| {
									$crate::error::FieldAssignmentError::new(
										::core::stringify!($field),
										<$ty as $crate::value::FromValue>::KIND,
										found.kind(),
									)
								})?;
							Ok(())
						}
					)*
					_ => Ok(()),
				}
			}
		}
	};
}
