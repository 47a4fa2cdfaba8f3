//! Response shapes produced for token endpoint calls.
//!
//! [`AcknowledgmentResponse`] is the only shape the email grant returns: it proves *when* the
//! issued token expires without carrying the token itself. [`BearerTokenResponse`] is the
//! generic shape of the base protocol; the grant replaces it when a caller passes one in.

// crates.io
use oauth2::{
	HttpResponse,
	http::{
		HeaderValue, StatusCode,
		header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA},
	},
};
// self
use crate::{
	_prelude::*,
	auth::{IssuedToken, join_scopes},
	error::ResponseError,
};

/// Contract shared by token endpoint response shapes.
pub trait ResponseType
where
	Self: Send,
{
	/// Seeds the response with the issued token.
	fn set_access_token(&mut self, token: &IssuedToken);

	/// Writes status, headers, and payload into `base`.
	fn render(&self, base: HttpResponse) -> Result<HttpResponse>;

	/// Returns the acknowledgment shape if this response already is one.
	fn into_acknowledgment(self: Box<Self>) -> Option<AcknowledgmentResponse> {
		None
	}
}

/// Payload written by [`AcknowledgmentResponse`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcknowledgmentPayload {
	/// Fixed human-readable acknowledgment.
	pub message: String,
	/// Whole seconds until the token expires; negative once expired.
	pub expires_in: i64,
}

/// Response that confirms delivery and reports only the token lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AcknowledgmentResponse {
	expires_at: Option<OffsetDateTime>,
}
impl AcknowledgmentResponse {
	/// Message sent with every acknowledgment.
	pub const MESSAGE: &'static str = "Mail with recover link has been sent to provided address";

	/// Creates an empty response; a token must be set before rendering.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a response already seeded with `token`.
	pub fn for_token(token: &IssuedToken) -> Self {
		let mut response = Self::new();

		response.set_access_token(token);

		response
	}

	/// Expiry instant of the seeded token.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_at
	}

	/// Builds the payload relative to `now`.
	pub fn payload_at(&self, now: OffsetDateTime) -> Result<AcknowledgmentPayload> {
		let expires_at = self.expires_at.ok_or(ResponseError::MissingAccessToken)?;

		Ok(AcknowledgmentPayload {
			message: Self::MESSAGE.to_owned(),
			expires_in: expires_at.unix_timestamp() - now.unix_timestamp(),
		})
	}

	/// Renders the response relative to `now`.
	pub fn render_at(&self, base: HttpResponse, now: OffsetDateTime) -> Result<HttpResponse> {
		let payload = self.payload_at(now)?;
		let body = serde_json::to_vec(&payload)
			.map_err(|source| ResponseError::Serialization { source })?;

		Ok(write_json(base, &body))
	}
}
impl ResponseType for AcknowledgmentResponse {
	fn set_access_token(&mut self, token: &IssuedToken) {
		self.expires_at = Some(token.expires_at);
	}

	fn render(&self, base: HttpResponse) -> Result<HttpResponse> {
		self.render_at(base, OffsetDateTime::now_utc())
	}

	fn into_acknowledgment(self: Box<Self>) -> Option<AcknowledgmentResponse> {
		Some(*self)
	}
}

#[derive(Serialize)]
struct BearerPayload<'a> {
	token_type: &'static str,
	expires_in: i64,
	access_token: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	scope: Option<String>,
}

/// Bearer token response of the base protocol.
///
/// Exposes the token secret in its body, which is why the email grant never returns it.
#[derive(Clone, Debug, Default)]
pub struct BearerTokenResponse {
	token: Option<IssuedToken>,
}
impl BearerTokenResponse {
	/// Creates an empty response.
	pub fn new() -> Self {
		Self::default()
	}
}
impl ResponseType for BearerTokenResponse {
	fn set_access_token(&mut self, token: &IssuedToken) {
		self.token = Some(token.clone());
	}

	fn render(&self, base: HttpResponse) -> Result<HttpResponse> {
		let token = self.token.as_ref().ok_or(ResponseError::MissingAccessToken)?;
		let payload = BearerPayload {
			token_type: "Bearer",
			expires_in: token.expires_in_at(OffsetDateTime::now_utc()),
			access_token: token.secret.expose(),
			scope: (!token.scopes.is_empty()).then(|| join_scopes(&token.scopes, ' ')),
		};
		let body = serde_json::to_vec(&payload)
			.map_err(|source| ResponseError::Serialization { source })?;

		Ok(write_json(base, &body))
	}
}

fn write_json(base: HttpResponse, body: &[u8]) -> HttpResponse {
	let (mut parts, mut buf) = base.into_parts();

	parts.status = StatusCode::OK;
	parts.headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
	parts.headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
	parts.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=UTF-8"));
	buf.extend_from_slice(body);

	HttpResponse::from_parts(parts, buf)
}
