//! Pluggable email acceptance predicates.

// std
use std::panic::{self, AssertUnwindSafe};
// self
use crate::{_prelude::*, error::BoxError};

type ValidatorFn = dyn Fn(&str) -> Result<bool, BoxError> + Send + Sync;

/// Predicate deciding whether an email credential is acceptable.
///
/// Empty strings are always rejected. A custom predicate runs inside a failure boundary: an
/// `Err`, a panic, or `false` all count as rejection.
#[derive(Clone, Default)]
pub enum EmailValidator {
	/// Accepts every non-empty string.
	#[default]
	NonEmpty,
	/// Caller-supplied predicate applied after the non-empty check.
	Custom(Arc<ValidatorFn>),
}
impl EmailValidator {
	/// Wraps a caller-supplied predicate.
	pub fn custom<F>(predicate: F) -> Self
	where
		F: 'static + Send + Sync + Fn(&str) -> Result<bool, BoxError>,
	{
		Self::Custom(Arc::new(predicate))
	}

	/// Returns `true` when `email` is accepted.
	pub fn accepts(&self, email: &str) -> bool {
		if email.is_empty() {
			return false;
		}

		match self {
			Self::NonEmpty => true,
			Self::Custom(predicate) =>
				matches!(panic::catch_unwind(AssertUnwindSafe(|| predicate(email))), Ok(Ok(true))),
		}
	}
}
impl Debug for EmailValidator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::NonEmpty => f.write_str("NonEmpty"),
			Self::Custom(_) => f.write_str("Custom(..)"),
		}
	}
}
