//! Transport-facing request model for token endpoint calls.
//!
//! [`GrantRequest`] is the immutable view the grant reads from: named parameters (kept as JSON
//! values so a present-but-non-string parameter stays distinguishable) plus request headers.
//! Requests are assembled programmatically or decoded from an [`HttpRequest`] whose body is
//! either `application/json` or `application/x-www-form-urlencoded`.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::{
	HttpRequest,
	http::{
		HeaderMap, HeaderName, HeaderValue,
		header::{AUTHORIZATION, CONTENT_TYPE},
	},
};
use serde_json::Value;
// self
use crate::{_prelude::*, error::RequestError};

/// Immutable token endpoint request consumed by the grant.
#[derive(Clone, Debug, Default)]
pub struct GrantRequest {
	params: BTreeMap<String, Value>,
	headers: HeaderMap,
}
impl GrantRequest {
	/// Creates an empty request.
	pub fn new() -> Self {
		Self::default()
	}

	/// Decodes the body of `request` according to its `content-type`.
	///
	/// JSON bodies must be objects. Form bodies keep the last value for repeated names. Any other
	/// content type yields an empty parameter set.
	pub fn from_http(request: &HttpRequest) -> Result<Self> {
		let content_type = request
			.headers()
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.map(|value| value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase());
		let params = match content_type.as_deref() {
			Some("application/json") => parse_json(request.body())?,
			Some("application/x-www-form-urlencoded") => parse_form(request.body()),
			_ => BTreeMap::new(),
		};

		let mut headers = request.headers().clone();

		if let Some(value) = headers.get_mut(AUTHORIZATION) {
			value.set_sensitive(true);
		}

		Ok(Self { params, headers })
	}

	/// Adds or replaces a parameter.
	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.params.insert(name.into(), value.into());

		self
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
		let header_name = HeaderName::from_bytes(name.as_bytes())
			.map_err(|_| RequestError::InvalidHeader { name: name.to_owned() })?;
		let mut header_value = HeaderValue::from_str(value)
			.map_err(|_| RequestError::InvalidHeader { name: name.to_owned() })?;

		header_value.set_sensitive(header_name == AUTHORIZATION);

		self.headers.insert(header_name, header_value);

		Ok(self)
	}

	/// Sets an HTTP Basic `Authorization` header for the client credentials.
	pub fn with_basic_auth(self, client_id: &str, client_secret: &str) -> Result<Self> {
		let encoded = STANDARD.encode(format!("{client_id}:{client_secret}"));

		self.with_header(AUTHORIZATION.as_str(), &format!("Basic {encoded}"))
	}

	/// Returns the raw parameter value.
	pub fn param(&self, name: &str) -> Option<&Value> {
		self.params.get(name)
	}

	/// Returns the parameter if it is present and a string.
	pub fn param_str(&self, name: &str) -> Option<&str> {
		self.param(name).and_then(Value::as_str)
	}

	/// Returns the header value if it is present and visible ASCII.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	/// Decodes `Authorization: Basic` credentials as `(user, password)`.
	///
	/// Returns `None` when the header is absent, uses another scheme, is not valid base64, or
	/// lacks the `:` separator.
	pub fn basic_auth_credentials(&self) -> Option<(String, String)> {
		let header = self.header(AUTHORIZATION.as_str())?;
		let encoded = header.strip_prefix("Basic ")?;
		let decoded = STANDARD.decode(encoded.trim()).ok()?;
		let decoded = String::from_utf8(decoded).ok()?;
		let (user, password) = decoded.split_once(':')?;

		Some((user.to_owned(), password.to_owned()))
	}
}

fn parse_json(body: &[u8]) -> Result<BTreeMap<String, Value>, RequestError> {
	if body.iter().all(u8::is_ascii_whitespace) {
		return Ok(BTreeMap::new());
	}

	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| RequestError::MalformedJson { source })
}

fn parse_form(body: &[u8]) -> BTreeMap<String, Value> {
	url::form_urlencoded::parse(body)
		.map(|(name, value)| (name.into_owned(), Value::String(value.into_owned())))
		.collect()
}
