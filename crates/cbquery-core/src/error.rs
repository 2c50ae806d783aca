//! Error types for the builder kernel.

use thiserror::Error;

use crate::value::{ElementKind, FieldKind};

/// Errors produced while rendering a fragment.
///
/// Render errors are recoverable: they are returned unchanged through every
/// level of fragment composition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
	/// A template has more `?` markers than arguments.
	#[error("not enough arguments: template has {markers} placeholders but {args} arguments")]
	TemplateArity {
		/// Number of unescaped markers in the template.
		markers: usize,
		/// Number of arguments supplied.
		args: usize,
	},

	/// Two clauses that exclude each other were both supplied.
	#[error("conflicting clauses: {0}")]
	ConflictingClause(String),

	/// A clause the statement cannot be rendered without is missing.
	#[error("missing clause: {0}")]
	MissingClause(String),

	/// An ordered comparison was given a null operand.
	#[error("cannot use null with {op} operator")]
	NullComparison {
		/// The comparison operator, e.g. `<`.
		op: &'static str,
	},
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors produced by [`debug_render`](crate::debug::debug_render).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DebugRenderError {
	/// The fragment itself failed to render.
	#[error(transparent)]
	Render(#[from] RenderError),

	/// The rendered text has more placeholders than arguments.
	#[error("too many placeholders in {sql:?} for {args} arguments")]
	TooManyPlaceholders {
		/// The rendered text.
		sql: String,
		/// Number of arguments available.
		args: usize,
	},

	/// The rendered text has fewer placeholders than arguments.
	#[error("not enough placeholders in {sql:?} for {args} arguments")]
	NotEnoughPlaceholders {
		/// The rendered text.
		sql: String,
		/// Number of arguments available.
		args: usize,
	},
}

/// A stored value could not be assigned to a record field.
///
/// Builder state is only ever written through typed setters, so a mismatch
/// is a programming error. Accessors raise it as a panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot assign {found} value to field `{field}` of kind {expected}")]
pub struct FieldAssignmentError {
	/// Name of the record field.
	pub field: String,
	/// Kind the field declares.
	pub expected: FieldKind,
	/// Kind of the value that was found.
	pub found: ElementKind,
}

impl FieldAssignmentError {
	/// Creates a new assignment error.
	pub fn new(field: impl Into<String>, expected: FieldKind, found: ElementKind) -> Self {
		Self {
			field: field.into(),
			expected,
			found,
		}
	}
}
