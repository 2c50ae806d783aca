//! Statement settings loaded from TOML.
//!
//! Settings live under a `[statements]` table so they can share a file with
//! the rest of an application's configuration:
//!
//! ```toml
//! [statements]
//! placeholder_format = "dollar"
//! ```

use std::path::Path;

use cbquery_core::PlaceholderFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading [`StatementSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("invalid statement settings: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("failed to read statement settings: {0}")]
	Io(#[from] std::io::Error),
}

/// Defaults applied by [`StatementBuilder::from_settings`](crate::StatementBuilder::from_settings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementSettings {
	pub placeholder_format: PlaceholderFormat,
}

#[derive(Deserialize)]
struct SettingsFile {
	#[serde(default)]
	statements: StatementSettings,
}

impl StatementSettings {
	/// Parses settings from TOML text.
	///
	/// A missing `[statements]` table yields the defaults.
	///
	/// # Examples
	///
	/// ```
	/// use cbquery_core::PlaceholderFormat;
	/// use cbquery_statements::settings::StatementSettings;
	///
	/// let text = "[statements]\nplaceholder_format = \"dollar\"\n";
	/// let settings = StatementSettings::from_toml_str(text).unwrap();
	/// assert_eq!(settings.placeholder_format, PlaceholderFormat::Dollar);
	/// ```
	pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
		let file: SettingsFile = toml::from_str(text)?;
		Ok(file.statements)
	}

	/// Reads and parses a TOML settings file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path)?;
		let settings = Self::from_toml_str(&text)?;
		tracing::debug!(
			path = %path.display(),
			format = settings.placeholder_format.as_str(),
			"loaded statement settings"
		);
		Ok(settings)
	}
}
