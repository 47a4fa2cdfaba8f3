//! Side-channel delivery of issued tokens.

// self
use crate::{
	_prelude::*,
	auth::{Client, IssuedToken, Scope, User},
	error::BoxError,
};

type DeliveryFn = dyn Fn(&Delivery<'_>) -> Result<(), BoxError> + Send + Sync;

/// Everything the delivery callback needs to send the token to its owner.
#[derive(Clone, Copy, Debug)]
pub struct Delivery<'a> {
	/// Email exactly as it appeared in the request.
	pub email: &'a str,
	/// Persisted token, including its secret.
	pub token: &'a IssuedToken,
	/// Authenticated client.
	pub client: &'a Client,
	/// Resolved user.
	pub user: &'a User,
	/// Finalized scopes.
	pub scopes: &'a [Scope],
}

/// Callback invoked once per issued token, after persistence.
///
/// Errors are returned to the grant caller untouched as [`Error::Delivery`].
#[derive(Clone)]
pub struct DeliveryCallback(Arc<DeliveryFn>);
impl DeliveryCallback {
	/// Wraps a delivery function.
	pub fn new<F>(deliver: F) -> Self
	where
		F: 'static + Send + Sync + Fn(&Delivery<'_>) -> Result<(), BoxError>,
	{
		Self(Arc::new(deliver))
	}

	/// Invokes the callback.
	pub fn deliver(&self, delivery: &Delivery<'_>) -> Result<(), BoxError> {
		(self.0)(delivery)
	}
}
impl Debug for DeliveryCallback {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("DeliveryCallback(..)")
	}
}
