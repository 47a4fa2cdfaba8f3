//! Collaborator contracts consumed by the grant, plus in-memory implementations.
//!
//! The grant never owns clients, scopes, users, or tokens. It calls the four authorities below
//! in a fixed order and treats every call as blocking. Production deployments implement these
//! traits on top of their own storage; [`memory`] provides thread-safe reference
//! implementations for tests and demos.

pub mod memory;

pub use memory::*;

// self
use crate::{
	_prelude::*,
	auth::{Client, ClientId, IssuedToken, IssuedTokenBuilderError, Scope, TokenId, User, UserId},
};

/// Authenticates and looks up OAuth clients.
pub trait ClientAuthority
where
	Self: Send + Sync,
{
	/// Returns `true` when the credentials are valid for the provided grant type.
	fn authenticate(
		&self,
		client_id: &ClientId,
		client_secret: Option<&str>,
		grant_type: &str,
	) -> Result<bool, AuthorityError>;

	/// Fetches the client entity, if registered.
	fn lookup(&self, client_id: &ClientId) -> Result<Option<Client>, AuthorityError>;
}

/// Resolves requested scope identifiers and finalizes the granted set.
pub trait ScopeAuthority
where
	Self: Send + Sync,
{
	/// Resolves a scope identifier; `None` means the scope is unknown.
	fn resolve(&self, identifier: &str) -> Result<Option<Scope>, AuthorityError>;

	/// Returns the authoritative scope list for the token about to be issued.
	fn finalize(
		&self,
		scopes: Vec<Scope>,
		grant_type: &str,
		client: &Client,
		user_id: &UserId,
	) -> Result<Vec<Scope>, AuthorityError>;
}

/// Resolves resource owners from credentials.
pub trait UserAuthority
where
	Self: Send + Sync,
{
	/// Resolves the user for `username`/`password`; `None` means no match.
	///
	/// The email grant passes the email as `username` and an empty password.
	fn resolve_by_credentials(
		&self,
		username: &str,
		password: &str,
		grant_type: &str,
		client: &Client,
	) -> Result<Option<User>, AuthorityError>;
}

/// Mints, persists, and tracks revocation of access tokens.
pub trait TokenAuthority
where
	Self: Send + Sync,
{
	/// Mints a new, not yet persisted token for the request.
	fn issue(&self, request: TokenRequest<'_>) -> Result<IssuedToken, AuthorityError>;

	/// Durably stores a freshly minted token.
	fn persist(&self, token: &IssuedToken) -> Result<(), AuthorityError>;

	/// Returns `true` if the token has been revoked.
	fn is_revoked(&self, token_id: &TokenId) -> Result<bool, AuthorityError>;

	/// Revokes a token at the provided instant.
	fn revoke(&self, token_id: &TokenId, instant: OffsetDateTime) -> Result<(), AuthorityError>;
}

/// Parameters handed to [`TokenAuthority::issue`].
#[derive(Clone, Copy, Debug)]
pub struct TokenRequest<'a> {
	/// Authenticated client.
	pub client: &'a Client,
	/// Resolved user identifier.
	pub user_id: &'a UserId,
	/// Finalized scopes.
	pub scopes: &'a [Scope],
	/// Issue instant.
	pub issued_at: OffsetDateTime,
	/// Expiry instant (`issued_at + ttl`).
	pub expires_at: OffsetDateTime,
}

/// Error type produced by authority implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum AuthorityError {
	/// Backend-level failure for the underlying storage or service.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// A token with the same identifier was already persisted.
	#[error("Token identifier `{token_id}` already exists.")]
	DuplicateTokenId {
		/// Conflicting identifier.
		token_id: TokenId,
	},
	/// The authority could not assemble a token.
	#[error("Unable to build access token.")]
	TokenBuild(#[from] IssuedTokenBuilderError),
}
impl AuthorityError {
	/// Builds a backend failure from any displayable message.
	pub fn backend(message: impl Display) -> Self {
		Self::Backend { message: message.to_string() }
	}
}
