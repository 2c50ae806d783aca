//! Immutable builder kernel for cbquery.
//!
//! This crate holds everything statement builders are made from:
//!
//! - **Values**: [`Value`], the closed set of things builder state and
//!   statement arguments can hold
//! - **Records**: typed structs declared with [`record!`] that builder state
//!   is read back into
//! - **Registry**: the mapping from builder shapes to their record types
//! - **Accessors**: [`builder::set`], [`builder::append`], [`builder::get`]
//!   and friends, each returning a new builder
//! - **Fragments**: the [`Fragment`] rendering protocol, [`Expr`],
//!   placeholder finalization and debug rendering
//!
//! # Quick Start
//!
//! ```
//! use cbquery_core::builder::{self, BuilderShape};
//! use cbquery_core::registry::Registry;
//! use cbquery_core::{builder_shape, record};
//!
//! builder_shape! {
//!     pub struct CounterBuilder;
//! }
//!
//! record! {
//!     pub struct CounterData {
//!         pub count: i64,
//!         pub notes: Vec<String>,
//!     }
//! }
//!
//! let registry = Registry::new();
//! let counter: CounterBuilder = registry.register::<CounterBuilder, CounterData>();
//! let counter = builder::set(&counter, "count", 5);
//! let counter = builder::append(&counter, "notes", ["first", "second"]);
//!
//! let data = registry.get_as_record(&counter).unwrap();
//! let data = data.downcast_ref::<CounterData>().unwrap();
//! assert_eq!(data.count, 5);
//! assert_eq!(data.notes, vec!["first", "second"]);
//! ```

pub mod builder;
pub mod debug;
pub mod error;
pub mod fragment;
pub mod placeholder;
pub mod record;
pub mod registry;
pub mod stack;
pub mod typed;
pub mod value;

pub use builder::{Builder, BuilderShape};
pub use debug::debug_render;
pub use error::{DebugRenderError, FieldAssignmentError, RenderError, RenderResult};
pub use fragment::{Expr, Fragment, FragmentRef, IntoArgs, Rendered, join_clauses};
pub use placeholder::PlaceholderFormat;
pub use record::{AnyRecord, FieldDescriptor, Record};
pub use registry::{RecordType, Registry, ShapeRegistration};
pub use typed::{TypedList, TypedMap};
pub use value::{ElementKind, FieldKind, FromValue, Value};

pub use cbquery_persistent as persistent;
