//! The fragment rendering protocol.
//!
//! A [`Fragment`] renders to query text plus the positional arguments bound
//! to its `?` markers. Fragments nest: a composite renders its children with
//! [`Fragment::render_raw`] so that placeholder finalization happens once,
//! at the outermost statement.
//!
//! # Examples
//!
//! ```
//! use cbquery_core::fragment::{Expr, Fragment};
//! use cbquery_core::value::Value;
//!
//! let inner = Expr::new("age > ?", vec![Value::from(30)]);
//! let outer = Expr::new("name = ? AND ?", vec![Value::from("test"), Value::fragment(inner)]);
//!
//! let (sql, args) = outer.render().unwrap();
//! assert_eq!(sql, "name = ? AND age > ?");
//! assert_eq!(args, vec![Value::from("test"), Value::from(30)]);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::{RenderError, RenderResult};
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

/// Query text and its positional arguments.
pub type Rendered = (String, Vec<Value>);

/// Anything that renders to query text and arguments.
pub trait Fragment: fmt::Debug + Send + Sync {
	/// Renders the final form of this fragment.
	fn render(&self) -> RenderResult<Rendered>;

	/// Renders the form used when embedded in another fragment.
	///
	/// Statements override this to skip placeholder finalization; every
	/// other fragment renders the same either way.
	fn render_raw(&self) -> RenderResult<Rendered> {
		self.render()
	}
}

/// A shared, type-erased fragment.
pub type FragmentRef = Arc<dyn Fragment>;

impl<F: Fragment + ?Sized> Fragment for Arc<F> {
	fn render(&self) -> RenderResult<Rendered> {
		(**self).render()
	}

	fn render_raw(&self) -> RenderResult<Rendered> {
		(**self).render_raw()
	}
}

impl<F: Fragment + ?Sized> Fragment for Box<F> {
	fn render(&self) -> RenderResult<Rendered> {
		(**self).render()
	}

	fn render_raw(&self) -> RenderResult<Rendered> {
		(**self).render_raw()
	}
}

/// Type-erases a fragment.
pub fn fragment(fragment: impl Fragment + 'static) -> FragmentRef {
	Arc::new(fragment)
}

/// Renders a child fragment in raw form with stack growth for deep nesting.
pub fn render_nested(fragment: &dyn Fragment) -> RenderResult<Rendered> {
	ensure_sufficient_stack(|| fragment.render_raw())
}

/// Renders `parts` in order into `sql` and `args`.
///
/// Parts that render to empty text are skipped, and `separator` is written
/// only between two non-empty renderings. The first error is returned
/// unchanged.
pub fn join_clauses(
	parts: &[FragmentRef],
	separator: &str,
	sql: &mut String,
	args: &mut Vec<Value>,
) -> RenderResult<()> {
	let mut wrote = false;
	for part in parts {
		let (part_sql, part_args) = render_nested(part.as_ref())?;
		if part_sql.is_empty() {
			continue;
		}
		if wrote {
			sql.push_str(separator);
		}
		sql.push_str(&part_sql);
		args.extend(part_args);
		wrote = true;
	}
	Ok(())
}

/// Counts unescaped `?` markers; `??` is an escape and binds nothing.
pub fn count_markers(sql: &str) -> usize {
	let mut count = 0;
	let mut chars = sql.chars().peekable();
	while let Some(c) = chars.next() {
		if c == '?' {
			if chars.peek() == Some(&'?') {
				chars.next();
			} else {
				count += 1;
			}
		}
	}
	count
}

/// A text template with positional arguments.
///
/// Arguments that are fragments are rendered in place of their marker and
/// their own arguments are spliced into the argument list.
#[derive(Debug, Clone)]
pub struct Expr {
	sql: String,
	args: Vec<Value>,
}

impl Expr {
	/// Creates an expression from a template and its arguments.
	pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
		Self {
			sql: sql.into(),
			args,
		}
	}

	/// Creates an expression with no arguments.
	pub fn raw(sql: impl Into<String>) -> Self {
		Self::new(sql, Vec::new())
	}

	pub fn sql(&self) -> &str {
		&self.sql
	}

	pub fn args(&self) -> &[Value] {
		&self.args
	}
}

impl Fragment for Expr {
	fn render(&self) -> RenderResult<Rendered> {
		let markers = count_markers(&self.sql);
		if markers > self.args.len() {
			return Err(RenderError::TemplateArity {
				markers,
				args: self.args.len(),
			});
		}

		if !self.args.iter().any(Value::is_fragment) {
			return Ok((self.sql.clone(), self.args.clone()));
		}

		let mut sql = String::with_capacity(self.sql.len());
		let mut args = Vec::with_capacity(self.args.len());
		let mut pending = self.args.iter();
		let mut chars = self.sql.chars().peekable();
		while let Some(c) = chars.next() {
			if c != '?' {
				sql.push(c);
				continue;
			}
			if chars.peek() == Some(&'?') {
				chars.next();
				sql.push_str("??");
				continue;
			}
			match pending.next() {
				Some(Value::Fragment(nested)) => {
					let (nested_sql, nested_args) = render_nested(nested.as_ref())?;
					sql.push_str(&nested_sql);
					args.extend(nested_args);
				}
				Some(value) => {
					sql.push('?');
					args.push(value.clone());
				}
				None => sql.push('?'),
			}
		}
		args.extend(pending.cloned());

		Ok((sql, args))
	}
}

/// Conversion into a positional argument list.
pub trait IntoArgs {
	fn into_args(self) -> Vec<Value>;
}

impl IntoArgs for () {
	fn into_args(self) -> Vec<Value> {
		Vec::new()
	}
}

impl<T: Into<Value>> IntoArgs for Vec<T> {
	fn into_args(self) -> Vec<Value> {
		self.into_iter().map(Into::into).collect()
	}
}

impl<T: Into<Value>, const N: usize> IntoArgs for [T; N] {
	fn into_args(self) -> Vec<Value> {
		self.into_iter().map(Into::into).collect()
	}
}

/// Builds a `Vec<Value>` from heterogeneous arguments.
///
/// # Examples
///
/// ```
/// use cbquery_core::args;
/// use cbquery_core::value::Value;
///
/// let args = args!["John", 30, true];
/// assert_eq!(args, vec![Value::from("John"), Value::from(30), Value::from(true)]);
/// ```
#[macro_export]
macro_rules! args {
	($($arg:expr),* $(,)?) => {
		::std::vec![$($crate::value::Value::from($arg)),*]
	};
}

/// Builds an [`Expr`] from a template and heterogeneous arguments.
///
/// # Examples
///
/// ```
/// use cbquery_core::expr;
/// use cbquery_core::fragment::Fragment;
///
/// let (sql, args) = expr!("id = ? AND kind = ?", 7, "user").render().unwrap();
/// assert_eq!(sql, "id = ? AND kind = ?");
/// assert_eq!(args.len(), 2);
/// ```
#[macro_export]
macro_rules! expr {
	($sql:expr $(, $arg:expr)* $(,)?) => {
		$crate::fragment::Expr::new($sql, $crate::args![$($arg),*])
	};
}
