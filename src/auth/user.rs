//! Resource owner entity resolved from the email credential.

// self
use crate::{_prelude::*, auth::UserId};

/// Resource owner resolved by the user authority.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
	/// User identifier recorded on issued tokens.
	pub id: UserId,
}
impl User {
	/// Creates a user with the provided identifier.
	pub fn new(id: UserId) -> Self {
		Self { id }
	}
}
