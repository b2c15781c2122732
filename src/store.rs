//! Process-local token cache holding a single access token slot.

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, TokenSecret},
};

type Slot = Arc<RwLock<Option<CachedToken>>>;

/// Thread-safe single-slot cache for the relay's access token.
///
/// Clones share the same slot. A stored token always replaces the previous one in a single
/// assignment under the write lock, so readers observe either the old or the new token.
#[derive(Clone, Debug, Default)]
pub struct TokenCache(Slot);
impl TokenCache {
	/// Returns the cached token if it may still be served at `instant`.
	pub fn valid_at(&self, instant: OffsetDateTime) -> Option<TokenSecret> {
		self.0
			.read()
			.as_ref()
			.filter(|token| token.is_valid_at(instant))
			.map(|token| token.value.clone())
	}

	/// Replaces the cached token.
	pub fn store(&self, token: CachedToken) {
		*self.0.write() = Some(token);
	}

	/// Returns a copy of the cached token regardless of its expiry.
	pub fn snapshot(&self) -> Option<CachedToken> {
		self.0.read().clone()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn expired_tokens_are_not_served() {
		let cache = TokenCache::default();
		let expires_at = macros::datetime!(2025-11-10 13:00 UTC);

		assert!(cache.valid_at(expires_at).is_none());

		cache.store(CachedToken::new("access-1", expires_at));

		assert_eq!(
			cache.valid_at(expires_at - Duration::minutes(1)).as_ref().map(TokenSecret::expose),
			Some("access-1")
		);
		assert!(cache.valid_at(expires_at).is_none());
		assert!(cache.snapshot().is_some(), "Expired tokens stay in the slot until replaced.");
	}

	#[test]
	fn store_replaces_previous_token_for_all_clones() {
		let cache = TokenCache::default();
		let shared = cache.clone();
		let now = macros::datetime!(2025-11-10 12:00 UTC);

		cache.store(CachedToken::new("access-1", now + Duration::hours(1)));
		shared.store(CachedToken::new("access-2", now + Duration::hours(2)));

		let current = cache.snapshot().expect("Cache should hold the latest token.");

		assert_eq!(current.value.expose(), "access-2");
		assert_eq!(current.expires_at, now + Duration::hours(2));
	}
}
