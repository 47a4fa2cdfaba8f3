//! Email grant: issues an access token for a user identified by email and delivers it out of
//! band.
//!
//! The token endpoint never returns the token. [`EmailGrant::handle_access_token_request`]
//! authenticates the client, validates the email, resolves the user, issues and persists a
//! token, hands it to the [`DeliveryCallback`] (e.g. to mail a recovery link), and answers with
//! an [`AcknowledgmentResponse`] that only reveals when the token expires.

pub mod common;
pub mod config;
pub mod delivery;
pub mod validator;

pub use config::*;
pub use delivery::*;
pub use validator::*;

// self
use crate::{
	_prelude::*,
	auth::{Client, ClientId, IssuedToken, Scope, User},
	authority::{ClientAuthority, ScopeAuthority, TokenAuthority, TokenRequest, UserAuthority},
	error::ConfigError,
	event::{EventSink, GrantEvent, NoopEventSink},
	http::GrantRequest,
	obs::{self, GrantOutcome, GrantSpan},
	response::{AcknowledgmentResponse, ResponseType},
};

/// Grant that trades an email credential for an out-of-band access token.
///
/// Configure the grant before sharing it: builders consume `self` and mutators take
/// `&mut self`, so reconfiguration cannot race in-flight requests.
#[derive(Clone)]
pub struct EmailGrant {
	users: Arc<dyn UserAuthority>,
	clients: Option<Arc<dyn ClientAuthority>>,
	scopes: Option<Arc<dyn ScopeAuthority>>,
	tokens: Option<Arc<dyn TokenAuthority>>,
	events: Arc<dyn EventSink>,
	delivery: DeliveryCallback,
	validator: EmailValidator,
	config: GrantConfig,
}
impl EmailGrant {
	/// Grant type identifier sent in the `grant_type` parameter.
	pub const IDENTIFIER: &'static str = "custom_email";

	/// Creates a grant with the default [`EmailValidator::NonEmpty`] validator.
	pub fn new(users: Arc<dyn UserAuthority>, delivery: DeliveryCallback) -> Self {
		Self {
			users,
			clients: None,
			scopes: None,
			tokens: None,
			events: Arc::new(NoopEventSink),
			delivery,
			validator: EmailValidator::default(),
			config: GrantConfig::default(),
		}
	}

	/// Sets the client authority.
	pub fn with_client_authority(mut self, clients: Arc<dyn ClientAuthority>) -> Self {
		self.clients = Some(clients);

		self
	}

	/// Sets the scope authority.
	pub fn with_scope_authority(mut self, scopes: Arc<dyn ScopeAuthority>) -> Self {
		self.scopes = Some(scopes);

		self
	}

	/// Sets the token authority.
	pub fn with_token_authority(mut self, tokens: Arc<dyn TokenAuthority>) -> Self {
		self.tokens = Some(tokens);

		self
	}

	/// Replaces the event sink (defaults to [`NoopEventSink`]).
	pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
		self.events = events;

		self
	}

	/// Sets the scope applied when the request carries none.
	///
	/// The scope is checked with [`GrantConfig::validate`] against the current delimiter.
	pub fn with_default_scope(mut self, scope: impl Into<String>) -> Result<Self, ConfigError> {
		self.set_default_scope(Some(scope.into()))?;

		Ok(self)
	}

	/// Replaces the email validator.
	pub fn with_email_validator(mut self, validator: EmailValidator) -> Self {
		self.validator = validator;

		self
	}

	/// Applies a validated [`GrantConfig`].
	pub fn with_config(mut self, config: GrantConfig) -> Result<Self, ConfigError> {
		config.validate()?;

		self.config = config;

		Ok(self)
	}

	/// Returns the grant type identifier.
	pub fn identifier(&self) -> &'static str {
		Self::IDENTIFIER
	}

	/// Returns the active configuration.
	pub fn config(&self) -> &GrantConfig {
		&self.config
	}

	/// Replaces the delivery callback for subsequent requests.
	pub fn set_delivery_callback(&mut self, delivery: DeliveryCallback) {
		self.delivery = delivery;
	}

	/// Replaces the email validator; `None` restores [`EmailValidator::NonEmpty`].
	pub fn set_email_validator(&mut self, validator: Option<EmailValidator>) {
		self.validator = validator.unwrap_or_default();
	}

	/// Replaces the default scope; `None` removes it.
	///
	/// An invalid scope leaves the current configuration untouched.
	pub fn set_default_scope(&mut self, scope: Option<String>) -> Result<(), ConfigError> {
		let config = GrantConfig { default_scope: scope, ..self.config.clone() };

		config.validate()?;

		self.config = config;

		Ok(())
	}

	/// Handles one token endpoint request.
	///
	/// Steps run in a fixed order and stop at the first failure: client authentication, scope
	/// parsing, email validation, user resolution, scope finalization, token issuance and
	/// persistence, response seeding, delivery. Whatever `response` was passed in, the result is
	/// always an [`AcknowledgmentResponse`].
	///
	/// A delivery failure is returned after the token was persisted; the token is not revoked.
	pub fn handle_access_token_request(
		&self,
		request: &GrantRequest,
		response: Box<dyn ResponseType>,
		ttl: Duration,
	) -> Result<AcknowledgmentResponse> {
		let _span = GrantSpan::new(Self::IDENTIFIER, "handle_access_token_request").entered();

		obs::record_grant_outcome(Self::IDENTIFIER, GrantOutcome::Attempt);

		let result = self.respond(request, response, ttl);

		match &result {
			Ok(_) => obs::record_grant_outcome(Self::IDENTIFIER, GrantOutcome::Success),
			Err(_) => obs::record_grant_outcome(Self::IDENTIFIER, GrantOutcome::Failure),
		}

		result
	}

	fn respond(
		&self,
		request: &GrantRequest,
		mut response: Box<dyn ResponseType>,
		ttl: Duration,
	) -> Result<AcknowledgmentResponse> {
		let clients = self.clients.as_deref().ok_or(missing("client"))?;
		let scope_authority = self.scopes.as_deref().ok_or(missing("scope"))?;
		let tokens = self.tokens.as_deref().ok_or(missing("token"))?;
		let client = self.validate_client(clients, request)?;
		let scopes = self.validate_scopes(scope_authority, request)?;
		let (email, user) = self.validate_user(request, &client)?;
		let scopes = scope_authority.finalize(scopes, Self::IDENTIFIER, &client, &user.id)?;
		let token = self.issue_access_token(tokens, &client, &user, &scopes, ttl)?;

		self.events.emit(&GrantEvent::AccessTokenIssued { request, token: &token });
		response.set_access_token(&token);
		self.delivery
			.deliver(&Delivery { email, token: &token, client: &client, user: &user, scopes: &scopes })
			.map_err(Error::Delivery)?;

		let acknowledgment = match response.into_acknowledgment() {
			Some(acknowledgment) => acknowledgment,
			None => AcknowledgmentResponse::for_token(&token),
		};

		Ok(acknowledgment)
	}

	fn validate_client(
		&self,
		clients: &dyn ClientAuthority,
		request: &GrantRequest,
	) -> Result<Client> {
		let credentials = common::client_credentials(request)?;
		let fail = |reason: &str| {
			self.events.emit(&GrantEvent::ClientAuthenticationFailed { request });

			Error::InvalidClient { reason: reason.to_owned() }
		};
		let Ok(client_id) = ClientId::new(&credentials.client_id) else {
			return Err(fail("malformed client identifier"));
		};

		if !clients.authenticate(
			&client_id,
			credentials.client_secret.as_deref(),
			Self::IDENTIFIER,
		)? {
			return Err(fail("invalid client credentials"));
		}

		clients.lookup(&client_id)?.ok_or_else(|| fail("unknown client"))
	}

	fn validate_scopes(
		&self,
		scopes: &dyn ScopeAuthority,
		request: &GrantRequest,
	) -> Result<Vec<Scope>> {
		common::requested_scopes(
			request,
			self.config.default_scope.as_deref(),
			self.config.scope_delimiter,
		)?
		.into_iter()
		.map(|identifier| -> Result<Scope> {
			match scopes.resolve(&identifier)? {
				Some(scope) => Ok(scope),
				None => Err(Error::InvalidScope { scope: identifier }),
			}
		})
		.collect()
	}

	fn validate_user<'r>(
		&self,
		request: &'r GrantRequest,
		client: &Client,
	) -> Result<(&'r str, User)> {
		let email = request
			.param_str("email")
			.filter(|email| self.validator.accepts(email))
			.ok_or_else(|| Error::invalid_request("email"))?;
		let user = self.users.resolve_by_credentials(email, "", Self::IDENTIFIER, client)?;

		match user {
			Some(user) => Ok((email, user)),
			None => {
				self.events.emit(&GrantEvent::UserAuthenticationFailed { request });

				Err(Error::InvalidCredentials)
			},
		}
	}

	fn issue_access_token(
		&self,
		tokens: &dyn TokenAuthority,
		client: &Client,
		user: &User,
		scopes: &[Scope],
		ttl: Duration,
	) -> Result<IssuedToken> {
		let issued_at = OffsetDateTime::now_utc();
		let expires_at = issued_at.checked_add(ttl).ok_or(ConfigError::TtlOutOfRange)?;
		let token = tokens.issue(TokenRequest {
			client,
			user_id: &user.id,
			scopes,
			issued_at,
			expires_at,
		})?;

		tokens.persist(&token)?;

		Ok(token)
	}
}
impl Debug for EmailGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("EmailGrant")
			.field("identifier", &Self::IDENTIFIER)
			.field("validator", &self.validator)
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

fn missing(collaborator: &'static str) -> ConfigError {
	ConfigError::MissingCollaborator { collaborator }
}
