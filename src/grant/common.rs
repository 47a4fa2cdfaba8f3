//! Request helpers shared by grant implementations (client credentials, scope parsing).

// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, http::GrantRequest};

/// Client credentials presented with a token request.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
	/// Raw `client_id` value.
	pub client_id: String,
	/// Raw `client_secret` value, if any.
	pub client_secret: Option<String>,
}
impl Debug for ClientCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// Extracts client credentials from the body, falling back to HTTP Basic auth.
///
/// Body parameters take precedence over the `Authorization` header. A missing `client_id`
/// fails with [`Error::InvalidRequest`].
pub fn client_credentials(request: &GrantRequest) -> Result<ClientCredentials> {
	let basic = request.basic_auth_credentials();
	let (basic_id, basic_secret) = match basic {
		Some((id, secret)) => (Some(id), Some(secret)),
		None => (None, None),
	};
	let client_id = request
		.param_str("client_id")
		.map(ToOwned::to_owned)
		.or(basic_id)
		.ok_or_else(|| Error::invalid_request("client_id"))?;
	let client_secret = request.param_str("client_secret").map(ToOwned::to_owned).or(basic_secret);

	Ok(ClientCredentials { client_id, client_secret })
}

/// Splits a scope string on `delimiter`, dropping empty entries.
pub fn split_scopes(scopes: &str, delimiter: char) -> Vec<String> {
	scopes
		.trim()
		.split(delimiter)
		.filter(|scope| !scope.is_empty())
		.map(ToOwned::to_owned)
		.collect()
}

/// Returns the requested scope identifiers, applying `default_scope` when `scope` is absent.
///
/// A string parameter is split on `delimiter`; a JSON array must contain only strings. Any other
/// type fails with [`Error::InvalidRequest`].
pub fn requested_scopes(
	request: &GrantRequest,
	default_scope: Option<&str>,
	delimiter: char,
) -> Result<Vec<String>> {
	match request.param("scope") {
		None | Some(Value::Null) =>
			Ok(default_scope.map(|scope| split_scopes(scope, delimiter)).unwrap_or_default()),
		Some(Value::String(scopes)) => Ok(split_scopes(scopes, delimiter)),
		Some(Value::Array(items)) => items
			.iter()
			.map(|item| item.as_str().map(ToOwned::to_owned))
			.collect::<Option<Vec<_>>>()
			.ok_or_else(|| Error::invalid_request("scope")),
		Some(_) => Err(Error::invalid_request("scope")),
	}
}
