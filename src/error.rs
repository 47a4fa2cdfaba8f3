//! Grant-level error types shared across the grant, collaborators, and response types.

// crates.io
use oauth2::{
	HttpResponse,
	http::{
		HeaderValue, StatusCode,
		header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA, WWW_AUTHENTICATE},
	},
};
// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error raised by caller-supplied hooks (delivery callbacks, email validators).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical grant error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Collaborator backend failure.
	#[error("{0}")]
	Authority(
		#[from]
		#[source]
		crate::authority::AuthorityError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Inbound transport request could not be decoded.
	#[error(transparent)]
	Request(#[from] RequestError),
	/// Response rendering failed; signals a defect rather than a caller mistake.
	#[error(transparent)]
	Response(#[from] ResponseError),

	/// Client authentication failed or the client is unknown.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Grant-supplied reason string.
		reason: String,
	},
	/// A requested scope identifier does not resolve.
	#[error("The requested scope is invalid, unknown, or malformed: {scope}.")]
	InvalidScope {
		/// The offending scope identifier.
		scope: String,
	},
	/// A required parameter is missing, has the wrong type, or was rejected.
	#[error("The request is missing or has an invalid `{parameter}` parameter.")]
	InvalidRequest {
		/// Name of the offending request parameter.
		parameter: String,
	},
	/// The email is well-formed but no matching user exists.
	#[error("The user credentials were incorrect.")]
	InvalidCredentials,
	/// The delivery callback failed after the token was issued and persisted.
	///
	/// The callback's error is carried untouched; downcast it to recover the original type.
	#[error("{0}")]
	Delivery(#[source] BoxError),
}
impl Error {
	/// Builds [`Error::InvalidRequest`] for the provided parameter name.
	pub fn invalid_request(parameter: impl Into<String>) -> Self {
		Self::InvalidRequest { parameter: parameter.into() }
	}

	/// Returns the RFC 6749 `error` code for this failure.
	pub fn error_type(&self) -> &'static str {
		match self {
			Self::InvalidClient { .. } => "invalid_client",
			Self::InvalidScope { .. } => "invalid_scope",
			Self::InvalidRequest { .. } | Self::Request(_) => "invalid_request",
			Self::InvalidCredentials => "invalid_grant",
			_ => "server_error",
		}
	}

	/// Returns the HTTP status code the token endpoint should answer with.
	pub fn http_status(&self) -> u16 {
		match self {
			Self::InvalidClient { .. } => 401,
			Self::InvalidScope { .. }
			| Self::InvalidRequest { .. }
			| Self::Request(_)
			| Self::InvalidCredentials => 400,
			_ => 500,
		}
	}

	/// Returns `true` for caller-visible protocol errors (as opposed to server defects).
	pub fn is_protocol_error(&self) -> bool {
		self.http_status() < 500
	}

	/// Builds the RFC 6749 error payload for this failure.
	///
	/// Server-side failures never leak their internal message; they report a generic
	/// description instead.
	pub fn error_response(&self) -> ErrorResponse {
		let (description, hint) = match self {
			Self::InvalidClient { .. } => ("Client authentication failed".to_owned(), None),
			Self::InvalidScope { scope } => (
				"The requested scope is invalid, unknown, or malformed".to_owned(),
				Some(format!("Check the `{scope}` scope")),
			),
			Self::InvalidRequest { parameter } => (
				"The request is missing a required parameter, includes an invalid parameter value, \
				 includes a parameter more than once, or is otherwise malformed."
					.to_owned(),
				Some(format!("Check the `{parameter}` parameter")),
			),
			Self::Request(_) => (
				"The request body could not be decoded.".to_owned(),
				Some("Check the request content type and body".to_owned()),
			),
			Self::InvalidCredentials => ("The user credentials were incorrect.".to_owned(), None),
			_ => (
				"The authorization server encountered an unexpected condition which prevented it \
				 from fulfilling the request."
					.to_owned(),
				None,
			),
		};

		ErrorResponse { error: self.error_type(), error_description: description, hint }
	}

	/// Writes the RFC 6749 error payload into `base`.
	pub fn render(&self, base: HttpResponse) -> Result<HttpResponse> {
		let body = serde_json::to_vec(&self.error_response())
			.map_err(|source| ResponseError::Serialization { source })?;
		let status =
			StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		let (mut parts, mut buf) = base.into_parts();

		parts.status = status;
		parts.headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
		parts.headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
		parts
			.headers
			.insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=UTF-8"));

		if status == StatusCode::UNAUTHORIZED {
			parts.headers.insert(WWW_AUTHENTICATE, HeaderValue::from_static("Basic realm=\"OAuth\""));
		}

		buf.extend_from_slice(&body);

		Ok(HttpResponse::from_parts(parts, buf))
	}
}

/// RFC 6749 error body returned by the token endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
	/// Error code (`invalid_request`, `invalid_client`, ...).
	pub error: &'static str,
	/// Human-readable description.
	pub error_description: String,
	/// Optional hint naming the offending parameter or scope.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub hint: Option<String>,
}

/// Configuration and validation failures raised by the grant.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// A collaborator required by the grant was never configured.
	#[error("The {collaborator} authority is not configured.")]
	MissingCollaborator {
		/// Collaborator label.
		collaborator: &'static str,
	},
	/// Default scope is blank or contains an invalid identifier.
	#[error("Default scope `{scope}` is invalid.")]
	InvalidDefaultScope {
		/// Offending default scope.
		scope: String,
	},
	/// Scope delimiter is a control character.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
	/// Issue instant plus TTL does not fit the supported time range.
	#[error("The access token TTL exceeds the supported range.")]
	TtlOutOfRange,
}

/// Failures raised while decoding inbound transport requests.
#[derive(Debug, ThisError)]
pub enum RequestError {
	/// JSON body is malformed or not an object.
	#[error("Request body is not a valid JSON object.")]
	MalformedJson {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A header value is not visible ASCII.
	#[error("Header `{name}` is not valid ASCII.")]
	InvalidHeader {
		/// Header name.
		name: String,
	},
}

/// Failures raised while rendering responses.
#[derive(Debug, ThisError)]
pub enum ResponseError {
	/// The response was rendered before an access token was set.
	#[error("Response type has no access token.")]
	MissingAccessToken,
	/// The payload could not be serialized.
	#[error("Error encountered JSON encoding response parameters.")]
	Serialization {
		/// Underlying encoder failure.
		#[source]
		source: serde_json::Error,
	},
}
