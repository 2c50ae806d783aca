//! Inline rendering for logs and debugging.
//!
//! The output is NOT safe to execute: argument values are pasted into the
//! text between single quotes without any escaping.

use crate::error::DebugRenderError;
use crate::fragment::Fragment;
use crate::value::Value;

/// Renders `fragment` with every argument inlined as `'<value>'`.
///
/// Both `?` and `$N` markers are recognised; `??` and `$$` are escapes that
/// collapse to a single character. A `$` not followed by a digit is copied
/// through.
///
/// # Examples
///
/// ```
/// use cbquery_core::debug::debug_render;
/// use cbquery_core::expr;
///
/// let text = debug_render(&expr!("name = ? AND age > ?", "John", 30)).unwrap();
/// assert_eq!(text, "name = 'John' AND age > '30'");
/// ```
pub fn debug_render(fragment: &dyn Fragment) -> Result<String, DebugRenderError> {
	let (sql, args) = fragment.render()?;
	inline_arguments(&sql, &args)
}

fn inline_arguments(sql: &str, args: &[Value]) -> Result<String, DebugRenderError> {
	let mut out = String::with_capacity(sql.len() + args.len() * 8);
	let mut next_arg = args.iter();
	let mut used = 0;
	let mut chars = sql.chars().peekable();

	while let Some(c) = chars.next() {
		match c {
			'?' if chars.peek() == Some(&'?') => {
				chars.next();
				out.push('?');
			}
			'$' if chars.peek() == Some(&'$') => {
				chars.next();
				out.push('$');
			}
			'$' if chars.peek().is_some_and(char::is_ascii_digit) => {
				while chars.peek().is_some_and(char::is_ascii_digit) {
					chars.next();
				}
				push_argument(&mut out, next_arg.next(), sql, args.len())?;
				used += 1;
			}
			'?' => {
				push_argument(&mut out, next_arg.next(), sql, args.len())?;
				used += 1;
			}
			other => out.push(other),
		}
	}

	if used < args.len() {
		return Err(DebugRenderError::NotEnoughPlaceholders {
			sql: sql.to_owned(),
			args: args.len(),
		});
	}
	Ok(out)
}

fn push_argument(
	out: &mut String,
	arg: Option<&Value>,
	sql: &str,
	available: usize,
) -> Result<(), DebugRenderError> {
	let Some(arg) = arg else {
		return Err(DebugRenderError::TooManyPlaceholders {
			sql: sql.to_owned(),
			args: available,
		});
	};
	out.push('\'');
	out.push_str(&arg.to_string());
	out.push('\'');
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::RenderError;
	use crate::fragment::{Expr, Rendered};
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[derive(Debug)]
	struct Prerendered(&'static str, Vec<Value>);

	impl Fragment for Prerendered {
		fn render(&self) -> crate::error::RenderResult<Rendered> {
			Ok((self.0.to_owned(), self.1.clone()))
		}
	}

	#[rstest]
	#[case::question(
		"a = ? AND b = ?",
		vec![Value::from(1), Value::from("x")],
		"a = '1' AND b = 'x'"
	)]
	#[case::dollar(
		"a = $1 AND b = $2",
		vec![Value::from(1), Value::from("x")],
		"a = '1' AND b = 'x'"
	)]
	#[case::escapes("a ?? $$ ?", vec![Value::from(true)], "a ? $ 'true'")]
	#[case::lone_dollar("price > $ and ?", vec![Value::from(5)], "price > $ and '5'")]
	#[case::multi_digit("$10", vec![Value::Null], "'NULL'")]
	fn test_inlines_arguments(
		#[case] sql: &'static str,
		#[case] args: Vec<Value>,
		#[case] expected: &str,
	) {
		let text = debug_render(&Prerendered(sql, args)).unwrap();

		assert_eq!(text, expected);
	}

	#[rstest]
	fn test_too_many_placeholders() {
		let result = debug_render(&Prerendered("a = ? AND b = ?", vec![Value::from(1)]));

		assert!(matches!(
			result,
			Err(DebugRenderError::TooManyPlaceholders { args: 1, .. })
		));
	}

	#[rstest]
	fn test_not_enough_placeholders() {
		let result = debug_render(&Prerendered("a = ?", vec![Value::from(1), Value::from(2)]));

		assert!(matches!(
			result,
			Err(DebugRenderError::NotEnoughPlaceholders { args: 2, .. })
		));
	}

	#[rstest]
	fn test_render_error_is_wrapped() {
		let result = debug_render(&Expr::new("a = ?", Vec::new()));

		assert_eq!(
			result,
			Err(DebugRenderError::Render(RenderError::TemplateArity {
				markers: 1,
				args: 0
			}))
		);
	}
}
