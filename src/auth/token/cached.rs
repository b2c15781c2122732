//! Access token cached alongside the instant it stops being served.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Access token held by the relay's single cache slot.
///
/// The token is served while `now < expires_at`. The expiry is derived from the provider's
/// `expires_in` minus [`CachedToken::EXPIRY_MARGIN`], so a token is treated as expired five
/// minutes before the provider would reject it.
#[derive(Clone, PartialEq, Eq)]
pub struct CachedToken {
	/// Bearer value presented to the projects API.
	pub value: TokenSecret,
	/// First instant at which the token is no longer served from cache.
	pub expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Lifetime assumed when the provider omits `expires_in`.
	pub const DEFAULT_LIFETIME: Duration = Duration::seconds(3_600);
	/// Safety margin subtracted from the provider-declared lifetime.
	pub const EXPIRY_MARGIN: Duration = Duration::seconds(300);

	/// Wraps a token with an explicit expiry instant.
	pub fn new(value: impl Into<String>, expires_at: OffsetDateTime) -> Self {
		Self { value: TokenSecret::new(value), expires_at }
	}

	/// Builds the cache entry for a freshly granted token observed at `now`.
	pub fn from_grant(
		value: TokenSecret,
		expires_in: Option<Duration>,
		now: OffsetDateTime,
	) -> Self {
		let lifetime = expires_in.unwrap_or(Self::DEFAULT_LIFETIME);
		let expires_at = now.saturating_add(lifetime.saturating_sub(Self::EXPIRY_MARGIN));

		Self { value, expires_at }
	}

	/// Returns `true` while the token may be served at the provided instant.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.expires_at
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("value", &self.value)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
