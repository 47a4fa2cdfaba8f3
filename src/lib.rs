//! OAuth 2.0 email grant: trade a user's email for an access token that is delivered out of
//! band, while the token endpoint only acknowledges when that token expires.
//!
//! [`grant::EmailGrant`] runs the request pipeline against four pluggable authorities
//! (clients, scopes, users, tokens); [`response::AcknowledgmentResponse`] renders the only
//! response shape the grant returns. In-memory authorities live in [`authority::memory`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod authority;
pub mod error;
pub mod event;
pub mod grant;
pub mod http;
pub mod obs;
pub mod response;

#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Fixtures shared by unit and integration tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{Client, ClientId, IssuedToken, Scope, ScopeId, UserId},
		authority::{
			MemoryClientAuthority, MemoryScopeAuthority, MemoryTokenAuthority, MemoryUserAuthority,
		},
		grant::{DeliveryCallback, EmailGrant},
		http::GrantRequest,
	};

	/// Confidential client registered by [`GrantFixture`].
	pub const CLIENT_ID: &str = "Aladdin";
	/// Secret of [`CLIENT_ID`].
	pub const CLIENT_SECRET: &str = "open sesame";
	/// Default scope configured on fixture grants.
	pub const DEFAULT_SCOPE: &str = "foobar";
	/// Emails registered as users.
	pub const KNOWN_EMAILS: [&str; 4] = [
		"fake1_email@example.dev",
		"fake2_email@example.dev",
		"fake_blacklisted@example.dev",
		"user@example.com",
	];

	/// Snapshot of one delivery callback invocation.
	#[derive(Clone, Debug)]
	pub struct DeliveredToken {
		/// Email passed to the callback.
		pub email: String,
		/// Delivered token.
		pub token: IssuedToken,
		/// Client identifier.
		pub client: ClientId,
		/// User identifier.
		pub user: UserId,
		/// Finalized scopes.
		pub scopes: Vec<Scope>,
	}

	/// In-memory authorities plus a recording delivery callback.
	#[derive(Clone, Debug)]
	pub struct GrantFixture {
		/// Client registry holding [`CLIENT_ID`].
		pub clients: MemoryClientAuthority,
		/// Strict scope registry holding `foobar`, `profile`, and `email`.
		pub scopes: MemoryScopeAuthority,
		/// User registry holding [`KNOWN_EMAILS`].
		pub users: MemoryUserAuthority,
		/// Token store.
		pub tokens: MemoryTokenAuthority,
		deliveries: Arc<Mutex<Vec<DeliveredToken>>>,
	}
	impl GrantFixture {
		/// Builds the fixture authorities.
		pub fn new() -> Self {
			let clients = MemoryClientAuthority::default();

			clients.register(
				Client::confidential(ClientId::new(CLIENT_ID).expect("Client fixture is valid."))
					.with_name("Fixture client"),
				Some(CLIENT_SECRET),
			);

			let scopes = MemoryScopeAuthority::with_scopes(["foobar", "profile", "email"].map(
				|id| Scope::new(ScopeId::new(id).expect("Scope fixtures are valid.")),
			));
			let users = MemoryUserAuthority::for_grant(EmailGrant::IDENTIFIER);

			for email in KNOWN_EMAILS {
				users.register_email(email).expect("User fixtures are valid.");
			}

			Self {
				clients,
				scopes,
				users,
				tokens: MemoryTokenAuthority::default(),
				deliveries: Default::default(),
			}
		}

		/// Delivery callback that records every invocation.
		pub fn delivery(&self) -> DeliveryCallback {
			let deliveries = self.deliveries.clone();

			DeliveryCallback::new(move |delivery| {
				deliveries.lock().push(DeliveredToken {
					email: delivery.email.to_owned(),
					token: delivery.token.clone(),
					client: delivery.client.id.clone(),
					user: delivery.user.id.clone(),
					scopes: delivery.scopes.to_vec(),
				});

				Ok(())
			})
		}

		/// Recorded deliveries in invocation order.
		pub fn deliveries(&self) -> Vec<DeliveredToken> {
			self.deliveries.lock().clone()
		}

		/// Fully wired grant with the `foobar` default scope.
		pub fn grant(&self) -> EmailGrant {
			EmailGrant::new(Arc::new(self.users.clone()), self.delivery())
				.with_client_authority(Arc::new(self.clients.clone()))
				.with_scope_authority(Arc::new(self.scopes.clone()))
				.with_token_authority(Arc::new(self.tokens.clone()))
				.with_default_scope(DEFAULT_SCOPE)
				.expect("Default scope fixture is valid.")
		}

		/// Request authenticated as [`CLIENT_ID`] carrying `email`.
		pub fn request(&self, email: &str) -> GrantRequest {
			GrantRequest::new()
				.with_basic_auth(CLIENT_ID, CLIENT_SECRET)
				.expect("Basic auth fixture is valid.")
				.with_param("grant_type", EmailGrant::IDENTIFIER)
				.with_param("email", email)
		}
	}
	impl Default for GrantFixture {
		fn default() -> Self {
			Self::new()
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(test)] use color_eyre as _;
