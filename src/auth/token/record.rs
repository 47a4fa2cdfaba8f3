//! Issued access token records, revocation helpers, and builders.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, Scope, ScopeId, TokenId, UserId, token::secret::TokenSecret},
};

/// Errors produced by [`IssuedTokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum IssuedTokenBuilderError {
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// Issued when the relative expiry overflows the supported time range.
	#[error("Expiry exceeds the supported time range.")]
	ExpiryOutOfRange,
}

/// Access token minted by the token authority.
///
/// The grant only keeps this value long enough to persist it, hand it to the delivery
/// callback, and seed the response type with its expiry.
#[derive(Clone, Serialize, Deserialize)]
pub struct IssuedToken {
	/// Unique token identifier.
	pub id: TokenId,
	/// Client the token was issued to.
	pub client: ClientId,
	/// User the token was issued for.
	pub user: UserId,
	/// Finalized scopes granted to the token.
	pub scopes: Vec<Scope>,
	/// Access token secret; callers must avoid logging it.
	pub secret: TokenSecret,
	/// Issued-at instant.
	pub issued_at: OffsetDateTime,
	/// Expiry instant.
	pub expires_at: OffsetDateTime,
	/// Revocation instant if the token has been revoked.
	pub revoked_at: Option<OffsetDateTime>,
}
impl IssuedToken {
	/// Returns a builder for the provided identifier, client, and user.
	pub fn builder(id: TokenId, client: ClientId, user: UserId) -> IssuedTokenBuilder {
		IssuedTokenBuilder::new(id, client, user)
	}

	/// Returns `true` if the token has been revoked.
	pub fn is_revoked(&self) -> bool {
		self.revoked_at.is_some()
	}

	/// Marks the token as revoked.
	pub fn revoke(&mut self, instant: OffsetDateTime) {
		self.revoked_at = Some(instant);
	}

	/// Whole seconds remaining until expiry at `now`; negative once expired.
	pub fn expires_in_at(&self, now: OffsetDateTime) -> i64 {
		self.expires_at.unix_timestamp() - now.unix_timestamp()
	}

	/// Returns `true` if the token carries the provided scope.
	pub fn has_scope(&self, scope: &str) -> bool {
		self.scopes.iter().any(|candidate| candidate.identifier() == scope)
	}
}
impl Debug for IssuedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuedToken")
			.field("id", &self.id)
			.field("client", &self.client)
			.field("user", &self.user)
			.field("scopes", &self.scopes)
			.field("secret", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("revoked_at", &self.revoked_at)
			.finish()
	}
}

/// Builder for [`IssuedToken`].
#[derive(Clone, Debug)]
pub struct IssuedTokenBuilder {
	id: TokenId,
	client: ClientId,
	user: UserId,
	scopes: Vec<Scope>,
	secret: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl IssuedTokenBuilder {
	fn new(id: TokenId, client: ClientId, user: UserId) -> Self {
		Self {
			id,
			client,
			user,
			scopes: Vec::new(),
			secret: None,
			issued_at: None,
			expires_at: None,
			expires_in: None,
		}
	}

	/// Sets the granted scopes.
	pub fn scopes<I>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = Scope>,
	{
		self.scopes = scopes.into_iter().collect();

		self
	}

	/// Adds a single scope by identifier.
	pub fn scope(mut self, id: ScopeId) -> Self {
		self.scopes.push(Scope::new(id));

		self
	}

	/// Provides the access token value; a random secret is generated when omitted.
	pub fn secret(mut self, token: impl Into<String>) -> Self {
		self.secret = Some(TokenSecret::new(token));

		self
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces an [`IssuedToken`].
	pub fn build(self) -> Result<IssuedToken, IssuedTokenBuilderError> {
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) =>
				issued_at.checked_add(delta).ok_or(IssuedTokenBuilderError::ExpiryOutOfRange)?,
			(None, None) => return Err(IssuedTokenBuilderError::MissingExpiry),
		};

		Ok(IssuedToken {
			id: self.id,
			client: self.client,
			user: self.user,
			scopes: self.scopes,
			secret: self.secret.unwrap_or_else(TokenSecret::generate),
			issued_at,
			expires_at,
			revoked_at: None,
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn builder() -> IssuedTokenBuilder {
		IssuedToken::builder(
			TokenId::new("token-1").expect("Token fixture should be valid."),
			ClientId::new("Aladdin").expect("Client fixture should be valid."),
			UserId::new("user@example.com").expect("User fixture should be valid."),
		)
	}

	#[test]
	fn revoke_records_instant() {
		let mut token = builder()
			.secret("access")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_at(macros::datetime!(2025-01-01 01:00 UTC))
			.build()
			.expect("Token builder should succeed for revocation.");

		assert!(!token.is_revoked());

		token.revoke(macros::datetime!(2025-01-01 00:10 UTC));

		assert!(token.is_revoked());
		assert_eq!(token.revoked_at, Some(macros::datetime!(2025-01-01 00:10 UTC)));
	}

	#[test]
	fn builder_handles_relative_expiry_and_generated_secret() {
		let token = builder()
			.scope(ScopeId::new("foobar").expect("Scope fixture should be valid."))
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::minutes(15))
			.build()
			.expect("Token builder should support relative expiry calculations.");

		assert_eq!(token.expires_at, macros::datetime!(2025-01-01 00:15 UTC));
		assert_eq!(token.expires_in_at(macros::datetime!(2025-01-01 00:00 UTC)), 900);
		assert_eq!(token.expires_in_at(macros::datetime!(2025-01-01 00:20 UTC)), -300);
		assert!(token.has_scope("foobar"));
		assert!(!token.secret.expose().is_empty());
	}

	#[test]
	fn builder_rejects_missing_or_overflowing_expiry() {
		assert_eq!(builder().build().err(), Some(IssuedTokenBuilderError::MissingExpiry));
		assert_eq!(
			builder()
				.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
				.expires_in(Duration::MAX)
				.build()
				.err(),
			Some(IssuedTokenBuilderError::ExpiryOutOfRange)
		);
	}

	#[test]
	fn debug_redacts_secret() {
		let token = builder()
			.secret("super-secret")
			.expires_in(Duration::hours(1))
			.build()
			.expect("Token builder should succeed.");
		let rendered = format!("{token:?}");

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("super-secret"));
	}
}
