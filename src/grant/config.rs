//! Serializable grant configuration.

// self
use crate::{_prelude::*, auth::ScopeId, error::ConfigError};

/// Settings applied through [`EmailGrant::with_config`](crate::grant::EmailGrant::with_config).
///
/// ```
/// use oauth2_email_grant::grant::GrantConfig;
///
/// let config: GrantConfig = serde_json::from_str(r#"{"default_scope":"foobar"}"#).unwrap();
///
/// assert_eq!(config.scope_delimiter, ' ');
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantConfig {
	/// Scope string used when the request carries no `scope` parameter.
	pub default_scope: Option<String>,
	/// Separator between scope identifiers in the `scope` parameter.
	pub scope_delimiter: char,
}
impl GrantConfig {
	/// Delimiter used by RFC 6749 scope strings.
	pub const DEFAULT_SCOPE_DELIMITER: char = ' ';

	/// Checks the delimiter and that the default scope splits into valid identifiers.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.scope_delimiter.is_control() {
			return Err(ConfigError::InvalidScopeDelimiter { delimiter: self.scope_delimiter });
		}

		if let Some(scope) = self.default_scope.as_deref() {
			let mut identifiers = scope
				.trim()
				.split(self.scope_delimiter)
				.filter(|identifier| !identifier.is_empty())
				.peekable();
			let invalid = identifiers.peek().is_none()
				|| identifiers.any(|identifier| ScopeId::new(identifier).is_err());

			if invalid {
				return Err(ConfigError::InvalidDefaultScope { scope: scope.to_owned() });
			}
		}

		Ok(())
	}
}
impl Default for GrantConfig {
	fn default() -> Self {
		Self { default_scope: None, scope_delimiter: Self::DEFAULT_SCOPE_DELIMITER }
	}
}
