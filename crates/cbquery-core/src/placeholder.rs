//! Placeholder finalization.
//!
//! Fragments always render with `?` markers. A statement's
//! [`PlaceholderFormat`] rewrites them once, when the outermost statement is
//! rendered.

use serde::{Deserialize, Serialize};

use crate::fragment::Rendered;
use crate::value::{ElementKind, FieldKind, FromValue, Value};

/// How `?` markers appear in the final query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderFormat {
	/// Leave `?` markers as they are.
	#[default]
	Question,
	/// Number markers as `$1`, `$2`, ... and unescape `??` to `?`.
	Dollar,
}

impl PlaceholderFormat {
	/// Rewrites the markers in `sql` for this format.
	///
	/// # Examples
	///
	/// ```
	/// use cbquery_core::placeholder::PlaceholderFormat;
	///
	/// let sql = "SELECT * FROM users WHERE id = ? AND name LIKE '%??%'";
	/// assert_eq!(
	///     PlaceholderFormat::Dollar.replace_placeholders(sql),
	///     "SELECT * FROM users WHERE id = $1 AND name LIKE '%?%'",
	/// );
	/// assert_eq!(PlaceholderFormat::Question.replace_placeholders(sql), sql);
	/// ```
	pub fn replace_placeholders(self, sql: &str) -> String {
		match self {
			Self::Question => sql.to_owned(),
			Self::Dollar => replace_positional_placeholders(sql, "$"),
		}
	}

	/// Finalizes a raw rendering.
	pub fn finalize(self, (sql, args): Rendered) -> Rendered {
		let sql = self.replace_placeholders(&sql);
		tracing::trace!(format = ?self, %sql, args = args.len(), "finalized placeholders");
		(sql, args)
	}

	/// The name used in settings and in builder state.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Question => "question",
			Self::Dollar => "dollar",
		}
	}
}

/// Replaces the Nth unescaped `?` with `{prefix}N`; `??` becomes `?`.
pub fn replace_positional_placeholders(sql: &str, prefix: &str) -> String {
	let mut out = String::with_capacity(sql.len() + 8);
	let mut position = 0;
	let mut chars = sql.chars().peekable();
	while let Some(c) = chars.next() {
		if c != '?' {
			out.push(c);
			continue;
		}
		if chars.peek() == Some(&'?') {
			chars.next();
			out.push('?');
			continue;
		}
		position += 1;
		out.push_str(prefix);
		out.push_str(&position.to_string());
	}
	out
}

impl From<PlaceholderFormat> for Value {
	fn from(format: PlaceholderFormat) -> Self {
		Value::Text(format.as_str().to_owned())
	}
}

impl FromValue for PlaceholderFormat {
	const KIND: FieldKind = FieldKind::Scalar(ElementKind::Text);

	fn from_value(value: Value) -> Result<Self, Value> {
		match value.as_str() {
			Some("question") => Ok(Self::Question),
			Some("dollar") => Ok(Self::Dollar),
			_ => Err(value),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	#[case::simple("SELECT * FROM users WHERE id = ?", "SELECT * FROM users WHERE id = $1")]
	#[case::multiple(
		"SELECT * FROM users WHERE id = ? AND name = ?",
		"SELECT * FROM users WHERE id = $1 AND name = $2"
	)]
	#[case::escaped(
		"SELECT * FROM users WHERE id = ? AND name LIKE '%??%'",
		"SELECT * FROM users WHERE id = $1 AND name LIKE '%?%'"
	)]
	#[case::none("SELECT 1", "SELECT 1")]
	fn test_dollar_format(#[case] sql: &str, #[case] expected: &str) {
		assert_eq!(PlaceholderFormat::Dollar.replace_placeholders(sql), expected);
	}

	#[rstest]
	fn test_question_format_is_identity() {
		let sql = "a = ? AND b LIKE '??'";

		assert_eq!(PlaceholderFormat::Question.replace_placeholders(sql), sql);
	}

	#[rstest]
	#[case::question(PlaceholderFormat::Question)]
	#[case::dollar(PlaceholderFormat::Dollar)]
	fn test_state_value_conversion(#[case] format: PlaceholderFormat) {
		let stored = Value::from(format);

		assert_eq!(PlaceholderFormat::from_value(stored), Ok(format));
	}

	#[rstest]
	fn test_deserializes_lowercase_names() {
		let format: PlaceholderFormat = serde_json::from_str("\"dollar\"").unwrap();

		assert_eq!(format, PlaceholderFormat::Dollar);
	}
}
