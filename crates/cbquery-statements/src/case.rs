//! `CASE` expressions.
//!
//! [`Case::new`] builds the searched form (`CASE WHEN <cond> THEN ...`),
//! [`Case::with_value`] the simple form (`CASE <operand> WHEN <value> THEN
//! ...`). Both are immutable: every method returns a new expression and the
//! `WHEN` arms are shared between branches.
//!
//! Operand rules:
//!
//! - fragments are always rendered in place
//! - in the searched form, a text condition is query text and binds nothing
//! - in the simple form, a text operand is query text (usually a column)
//! - everything else binds as a `?` argument
//!
//! # Examples
//!
//! ```
//! use cbquery_core::{Fragment, Value};
//! use cbquery_statements::case::Case;
//! use cbquery_statements::expr::Equal;
//!
//! let status = Case::new()
//!     .when(Value::fragment(Equal::new().column("status", "active")), "Active User")
//!     .else_("Inactive");
//!
//! let (sql, args) = status.render().unwrap();
//! assert_eq!(sql, "CASE WHEN status = ? THEN ? ELSE ? END");
//! assert_eq!(args.len(), 3);
//! ```

use cbquery_core::fragment::{Fragment, Rendered};
use cbquery_core::{RenderResult, Value};
use cbquery_persistent::List;

use crate::statement::write_value;

#[derive(Debug, Clone)]
struct WhenArm {
	condition: Value,
	result: Value,
}

/// A `CASE ... END` expression.
#[derive(Debug, Clone, Default)]
pub struct Case {
	operand: Option<Value>,
	arms: List<WhenArm>,
	otherwise: Option<Value>,
}

impl Case {
	/// Starts a searched `CASE`.
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts a simple `CASE` comparing `operand` against each `WHEN` value.
	pub fn with_value(operand: impl Into<Value>) -> Self {
		Self {
			operand: Some(operand.into()),
			..Self::default()
		}
	}

	/// Adds a `WHEN condition THEN result` arm.
	///
	/// A condition that is a fragment renders in place and carries its own
	/// arguments; use [`expr`](crate::expr::expr) to bind values inside a
	/// textual condition.
	#[must_use]
	pub fn when(&self, condition: impl Into<Value>, result: impl Into<Value>) -> Self {
		Self {
			arms: self.arms.prepend(WhenArm {
				condition: condition.into(),
				result: result.into(),
			}),
			..self.clone()
		}
	}

	/// Sets the `ELSE` result, replacing any earlier one.
	#[must_use]
	pub fn else_(&self, result: impl Into<Value>) -> Self {
		Self {
			otherwise: Some(result.into()),
			..self.clone()
		}
	}

	/// Number of `WHEN` arms.
	pub fn len(&self) -> usize {
		self.arms.size()
	}

	pub fn is_empty(&self) -> bool {
		self.arms.is_empty()
	}
}

fn write_text_or_bound(value: &Value, sql: &mut String, args: &mut Vec<Value>) -> RenderResult<()> {
	match value {
		Value::Text(text) => {
			sql.push_str(text);
			Ok(())
		}
		other => write_value(other, sql, args),
	}
}

impl Fragment for Case {
	fn render(&self) -> RenderResult<Rendered> {
		let mut sql = String::from("CASE");
		let mut args = Vec::new();

		if let Some(operand) = &self.operand {
			sql.push(' ');
			write_text_or_bound(operand, &mut sql, &mut args)?;
		}

		let arms: Vec<&WhenArm> = self.arms.iter().collect();
		for arm in arms.into_iter().rev() {
			sql.push_str(" WHEN ");
			if self.operand.is_some() {
				write_value(&arm.condition, &mut sql, &mut args)?;
			} else {
				write_text_or_bound(&arm.condition, &mut sql, &mut args)?;
			}
			sql.push_str(" THEN ");
			write_value(&arm.result, &mut sql, &mut args)?;
		}

		if let Some(otherwise) = &self.otherwise {
			sql.push_str(" ELSE ");
			write_value(otherwise, &mut sql, &mut args)?;
		}

		sql.push_str(" END");
		Ok((sql, args))
	}
}
