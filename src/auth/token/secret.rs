//! Secure token secret wrapper that redacts sensitive material.

// std
use std::convert::Infallible;
// self
use crate::_prelude::*;

/// Redacted secret wrapper keeping access tokens, refresh tokens, and API keys out of logs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the secret holds no characters.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Compares against a presented value without short-circuiting on the first mismatch.
	pub fn matches(&self, presented: &str) -> bool {
		let expected = self.0.as_bytes();
		let presented = presented.as_bytes();

		if expected.len() != presented.len() {
			return false;
		}

		expected.iter().zip(presented).fold(0_u8, |acc, (a, b)| acc | (a ^ b)) == 0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl FromStr for TokenSecret {
	type Err = Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self::new(s))
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
