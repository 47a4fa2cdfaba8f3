//! OAuth client entity looked up per request.

// self
use crate::{_prelude::*, auth::ClientId};

/// Registered OAuth client as returned by the client authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
	/// Client identifier.
	pub id: ClientId,
	/// Optional display name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Confidential clients must present a secret when authenticating.
	#[serde(default)]
	pub confidential: bool,
}
impl Client {
	/// Creates a public client.
	pub fn new(id: ClientId) -> Self {
		Self { id, name: None, confidential: false }
	}

	/// Creates a confidential client.
	pub fn confidential(id: ClientId) -> Self {
		Self { id, name: None, confidential: true }
	}

	/// Attaches a display name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());

		self
	}
}
