//! Fire-and-forget notifications emitted while handling a grant request.

// self
use crate::{
	_prelude::*,
	auth::{IssuedToken, TokenId},
	http::GrantRequest,
};

/// Notification emitted by the grant.
#[derive(Clone, Copy, Debug)]
pub enum GrantEvent<'a> {
	/// Client credentials were rejected or the client is unknown.
	ClientAuthenticationFailed {
		/// Request that failed.
		request: &'a GrantRequest,
	},
	/// The email was accepted but no user matched it.
	UserAuthenticationFailed {
		/// Request that failed.
		request: &'a GrantRequest,
	},
	/// A token was issued and persisted.
	AccessTokenIssued {
		/// Request that produced the token.
		request: &'a GrantRequest,
		/// Persisted token.
		token: &'a IssuedToken,
	},
}
impl GrantEvent<'_> {
	/// Returns the event kind without borrowed payloads.
	pub fn kind(&self) -> GrantEventKind {
		match self {
			Self::ClientAuthenticationFailed { .. } => GrantEventKind::ClientAuthenticationFailed,
			Self::UserAuthenticationFailed { .. } => GrantEventKind::UserAuthenticationFailed,
			Self::AccessTokenIssued { .. } => GrantEventKind::AccessTokenIssued,
		}
	}
}

/// Owned discriminant of [`GrantEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantEventKind {
	/// See [`GrantEvent::ClientAuthenticationFailed`].
	ClientAuthenticationFailed,
	/// See [`GrantEvent::UserAuthenticationFailed`].
	UserAuthenticationFailed,
	/// See [`GrantEvent::AccessTokenIssued`].
	AccessTokenIssued,
}
impl GrantEventKind {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::ClientAuthenticationFailed => "client.authentication.failed",
			Self::UserAuthenticationFailed => "user.authentication.failed",
			Self::AccessTokenIssued => "access_token.issued",
		}
	}
}
impl Display for GrantEventKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Receives grant notifications; implementations must not fail the request.
pub trait EventSink
where
	Self: Send + Sync,
{
	/// Handles a single notification.
	fn emit(&self, event: &GrantEvent<'_>);
}

/// Sink that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEventSink;
impl EventSink for NoopEventSink {
	fn emit(&self, _event: &GrantEvent<'_>) {}
}

/// Event captured by [`MemoryEventSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedEvent {
	/// Event kind.
	pub kind: GrantEventKind,
	/// Token identifier for issuance events.
	pub token_id: Option<TokenId>,
}

/// Sink that records events in order for inspection in tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryEventSink(Arc<Mutex<Vec<RecordedEvent>>>);
impl MemoryEventSink {
	/// Returns a snapshot of recorded events.
	pub fn events(&self) -> Vec<RecordedEvent> {
		self.0.lock().clone()
	}

	/// Returns the recorded event kinds.
	pub fn kinds(&self) -> Vec<GrantEventKind> {
		self.0.lock().iter().map(|event| event.kind).collect()
	}
}
impl EventSink for MemoryEventSink {
	fn emit(&self, event: &GrantEvent<'_>) {
		let token_id = match event {
			GrantEvent::AccessTokenIssued { token, .. } => Some(token.id.clone()),
			_ => None,
		};

		self.0.lock().push(RecordedEvent { kind: event.kind(), token_id });
	}
}

/// Sink that logs events through `tracing`; token secrets are never logged.
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingEventSink;
#[cfg(feature = "tracing")]
impl EventSink for TracingEventSink {
	fn emit(&self, event: &GrantEvent<'_>) {
		match event {
			GrantEvent::AccessTokenIssued { token, .. } => tracing::info!(
				event = event.kind().as_str(),
				token_id = %token.id,
				client_id = %token.client,
				user_id = %token.user,
				scopes = %crate::auth::join_scopes(&token.scopes, ' '),
				expires_at = %token.expires_at,
			),
			GrantEvent::ClientAuthenticationFailed { request }
			| GrantEvent::UserAuthenticationFailed { request } => tracing::warn!(
				event = event.kind().as_str(),
				client_id = presented_client_id(request).unwrap_or_default(),
			),
		}
	}
}

/// Client identifier presented with `request`: the `client_id` parameter, else the HTTP Basic user.
pub fn presented_client_id(request: &GrantRequest) -> Option<String> {
	request
		.param_str("client_id")
		.map(ToOwned::to_owned)
		.or_else(|| request.basic_auth_credentials().map(|(client_id, _)| client_id))
}
