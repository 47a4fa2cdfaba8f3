//! Thread-safe in-memory authority implementations for local development and tests.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{
		Client, ClientId, IssuedToken, Scope, ScopeId, TokenId, User, UserId,
		token::secret::random_string,
	},
	authority::{
		AuthorityError, ClientAuthority, ScopeAuthority, TokenAuthority, TokenRequest,
		UserAuthority,
	},
};

const TOKEN_ID_LEN: usize = 40;

#[derive(Clone, Debug)]
struct RegisteredClient {
	client: Client,
	secret_digest: Option<Vec<u8>>,
	grants: Option<Vec<String>>,
}

/// Client registry that stores SHA-256 digests of client secrets.
///
/// Digests are compared with `==`, which is not constant-time; production authorities should
/// use a constant-time comparison.
#[derive(Clone, Debug, Default)]
pub struct MemoryClientAuthority(Arc<RwLock<HashMap<ClientId, RegisteredClient>>>);
impl MemoryClientAuthority {
	/// Registers (or replaces) a client with an optional secret.
	pub fn register(&self, client: Client, secret: Option<&str>) {
		let id = client.id.clone();
		let registered =
			RegisteredClient { client, secret_digest: secret.map(digest), grants: None };

		self.0.write().insert(id, registered);
	}

	/// Restricts a registered client to the provided grant types.
	pub fn restrict_grants<I, S>(&self, client_id: &ClientId, grants: I) -> bool
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		match self.0.write().get_mut(client_id) {
			Some(registered) => {
				registered.grants = Some(grants.into_iter().map(Into::into).collect());

				true
			},
			None => false,
		}
	}
}
impl ClientAuthority for MemoryClientAuthority {
	fn authenticate(
		&self,
		client_id: &ClientId,
		client_secret: Option<&str>,
		grant_type: &str,
	) -> Result<bool, AuthorityError> {
		let guard = self.0.read();
		let Some(registered) = guard.get(client_id) else {
			return Ok(false);
		};

		let grant_allowed = registered
			.grants
			.as_ref()
			.is_none_or(|grants| grants.iter().any(|grant| grant == grant_type));

		if !grant_allowed {
			return Ok(false);
		}

		let authenticated = match (registered.secret_digest.as_deref(), client_secret) {
			(Some(expected), Some(presented)) => expected == digest(presented).as_slice(),
			(Some(_), None) => false,
			(None, _) => !registered.client.confidential,
		};

		Ok(authenticated)
	}

	fn lookup(&self, client_id: &ClientId) -> Result<Option<Client>, AuthorityError> {
		Ok(self.0.read().get(client_id).map(|registered| registered.client.clone()))
	}
}

/// Scope registry; permissive mode resolves any identifier.
#[derive(Clone, Debug, Default)]
pub struct MemoryScopeAuthority {
	known: Arc<RwLock<HashMap<ScopeId, Scope>>>,
	permissive: bool,
}
impl MemoryScopeAuthority {
	/// Creates an authority that resolves every syntactically valid identifier.
	pub fn permissive() -> Self {
		Self { known: Default::default(), permissive: true }
	}

	/// Creates an authority that only resolves the provided scopes.
	pub fn with_scopes<I>(scopes: I) -> Self
	where
		I: IntoIterator<Item = Scope>,
	{
		let known = scopes.into_iter().map(|scope| (scope.id.clone(), scope)).collect();

		Self { known: Arc::new(RwLock::new(known)), permissive: false }
	}

	/// Registers (or replaces) a scope.
	pub fn register(&self, scope: Scope) {
		self.known.write().insert(scope.id.clone(), scope);
	}
}
impl ScopeAuthority for MemoryScopeAuthority {
	fn resolve(&self, identifier: &str) -> Result<Option<Scope>, AuthorityError> {
		if let Some(scope) = self.known.read().get(identifier) {
			return Ok(Some(scope.clone()));
		}
		if !self.permissive {
			return Ok(None);
		}

		Ok(ScopeId::new(identifier).ok().map(Scope::new))
	}

	fn finalize(
		&self,
		scopes: Vec<Scope>,
		_grant_type: &str,
		_client: &Client,
		_user_id: &UserId,
	) -> Result<Vec<Scope>, AuthorityError> {
		Ok(scopes)
	}
}

/// User registry keyed by lowercase email.
#[derive(Clone, Debug, Default)]
pub struct MemoryUserAuthority {
	users: Arc<RwLock<HashMap<String, User>>>,
	grant_type: Option<String>,
}
impl MemoryUserAuthority {
	/// Only resolve users for the provided grant type.
	pub fn for_grant(grant_type: impl Into<String>) -> Self {
		Self { users: Default::default(), grant_type: Some(grant_type.into()) }
	}

	/// Registers a user under its email; the user identifier is the email itself.
	pub fn register_email(&self, email: &str) -> Result<User, AuthorityError> {
		let user = User::new(UserId::new(email).map_err(AuthorityError::backend)?);

		self.users.write().insert(email.to_lowercase(), user.clone());

		Ok(user)
	}
}
impl UserAuthority for MemoryUserAuthority {
	fn resolve_by_credentials(
		&self,
		username: &str,
		_password: &str,
		grant_type: &str,
		_client: &Client,
	) -> Result<Option<User>, AuthorityError> {
		if self.grant_type.as_deref().is_some_and(|expected| expected != grant_type) {
			return Ok(None);
		}

		Ok(self.users.read().get(&username.to_lowercase()).cloned())
	}
}

/// Token store that mints random identifiers and secrets.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenAuthority(Arc<RwLock<HashMap<TokenId, IssuedToken>>>);
impl MemoryTokenAuthority {
	/// Fetches a persisted token.
	pub fn get(&self, token_id: &TokenId) -> Option<IssuedToken> {
		self.0.read().get(token_id).cloned()
	}

	/// Number of persisted tokens.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing was persisted.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl TokenAuthority for MemoryTokenAuthority {
	fn issue(&self, request: TokenRequest<'_>) -> Result<IssuedToken, AuthorityError> {
		let id = TokenId::new(random_string(TOKEN_ID_LEN)).map_err(AuthorityError::backend)?;
		let token = IssuedToken::builder(id, request.client.id.clone(), request.user_id.clone())
			.scopes(request.scopes.iter().cloned())
			.issued_at(request.issued_at)
			.expires_at(request.expires_at)
			.build()?;

		Ok(token)
	}

	fn persist(&self, token: &IssuedToken) -> Result<(), AuthorityError> {
		let mut guard = self.0.write();

		if guard.contains_key(&token.id) {
			return Err(AuthorityError::DuplicateTokenId { token_id: token.id.clone() });
		}

		guard.insert(token.id.clone(), token.clone());

		Ok(())
	}

	fn is_revoked(&self, token_id: &TokenId) -> Result<bool, AuthorityError> {
		Ok(self.0.read().get(token_id).is_some_and(IssuedToken::is_revoked))
	}

	fn revoke(&self, token_id: &TokenId, instant: OffsetDateTime) -> Result<(), AuthorityError> {
		if let Some(token) = self.0.write().get_mut(token_id) {
			token.revoke(instant);
		}

		Ok(())
	}
}

fn digest(secret: &str) -> Vec<u8> {
	Sha256::digest(secret.as_bytes()).to_vec()
}
