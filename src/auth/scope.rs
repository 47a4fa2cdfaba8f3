//! Scope entities resolved and finalized by the scope authority.

// self
use crate::{_prelude::*, auth::ScopeId};

/// Named permission unit attached to an issued token.
///
/// Requests name scopes by identifier; the scope authority turns each identifier into a
/// [`Scope`] and later finalizes the list. Ordering and duplicates from the request are kept so
/// authorities see exactly what the caller asked for.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
	/// Scope identifier as it appears in requests.
	pub id: ScopeId,
	/// Optional human-readable description.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}
impl Scope {
	/// Creates a scope without a description.
	pub fn new(id: ScopeId) -> Self {
		Self { id, description: None }
	}

	/// Attaches a human-readable description.
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());

		self
	}

	/// Returns the scope identifier as a string slice.
	pub fn identifier(&self) -> &str {
		&self.id
	}
}
impl From<ScopeId> for Scope {
	fn from(id: ScopeId) -> Self {
		Self::new(id)
	}
}
impl Display for Scope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.id)
	}
}

/// Joins scope identifiers with the provided delimiter.
pub fn join_scopes(scopes: &[Scope], delimiter: char) -> String {
	let mut buf = String::new();

	for (idx, scope) in scopes.iter().enumerate() {
		if idx > 0 {
			buf.push(delimiter);
		}

		buf.push_str(scope.identifier());
	}

	buf
}
