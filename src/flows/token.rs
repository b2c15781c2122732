//! Access token acquisition with a single-slot cache and a singleflight refresh guard.
//!
//! [`TokenManager::access_token`] serves the cached token while `now < expires_at`. Otherwise it
//! takes the refresh guard, re-checks the cache (another task may have refreshed while it
//! waited), performs one `grant_type=refresh_token` exchange, and replaces the cached token.
//! A failed exchange leaves the cache untouched.

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, TokenSecret},
	error::AuthenticationError,
	http::ReqwestHttpClient,
	oauth::RefreshFacade,
	obs::{self, Outcome, Stage, StageSpan},
	store::TokenCache,
};

/// Credentials for the refresh-token grant.
#[derive(Clone, Debug)]
pub struct OAuthCredentials {
	/// Identity provider token endpoint.
	pub token_url: Url,
	/// OAuth client identifier.
	pub client_id: Option<String>,
	/// OAuth client secret.
	pub client_secret: Option<TokenSecret>,
	/// Long-lived refresh token.
	pub refresh_token: Option<TokenSecret>,
}

/// Supplies bearer tokens for projects API calls.
pub struct TokenManager {
	cache: TokenCache,
	credentials: OAuthCredentials,
	http_client: ReqwestHttpClient,
	refresh_guard: AsyncMutex<()>,
}
impl TokenManager {
	/// Creates a manager over the provided cache.
	pub fn new(
		cache: TokenCache,
		credentials: OAuthCredentials,
		http_client: ReqwestHttpClient,
	) -> Self {
		Self { cache, credentials, http_client, refresh_guard: AsyncMutex::new(()) }
	}

	/// Cache the manager reads from and writes to.
	pub fn cache(&self) -> &TokenCache {
		&self.cache
	}

	/// Returns a valid access token, refreshing it when the cached one is absent or expired.
	pub async fn access_token(&self) -> Result<TokenSecret> {
		const STAGE: Stage = Stage::TokenRefresh;

		if let Some(token) = self.cache.valid_at(OffsetDateTime::now_utc()) {
			return Ok(token);
		}

		let span = StageSpan::new(STAGE, "access_token");

		obs::record_outcome(STAGE, Outcome::Attempt);

		let result = span
			.instrument(async {
				let _singleflight = self.refresh_guard.lock().await;

				if let Some(token) = self.cache.valid_at(OffsetDateTime::now_utc()) {
					return Ok(token);
				}

				let credentials = &self.credentials;
				let client_id = required(credentials.client_id.as_deref(), "ZOHO_CLIENT_ID")?;
				let client_secret =
					required_secret(credentials.client_secret.as_ref(), "ZOHO_CLIENT_SECRET")?;
				let refresh_token =
					required_secret(credentials.refresh_token.as_ref(), "ZOHO_REFRESH_TOKEN")?;
				let facade = RefreshFacade::new(
					&credentials.token_url,
					client_id,
					client_secret,
					self.http_client.clone(),
				)?;
				let grant = facade.refresh(refresh_token).await?;
				let now = OffsetDateTime::now_utc();
				let cached = CachedToken::from_grant(grant.access_token, grant.expires_in, now);
				let token = cached.value.clone();

				self.cache.store(cached);

				Ok(token)
			})
			.await;

		obs::record_result(STAGE, &result);

		result
	}
}
impl Debug for TokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("token_url", &self.credentials.token_url.as_str())
			.field("client_id", &self.credentials.client_id)
			.field("cached", &self.cache.snapshot().is_some())
			.finish()
	}
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str> {
	value
		.filter(|value| !value.is_empty())
		.ok_or_else(|| AuthenticationError::MissingCredential { field }.into())
}

fn required_secret<'a>(
	value: Option<&'a TokenSecret>,
	field: &'static str,
) -> Result<&'a TokenSecret> {
	value
		.filter(|value| !value.is_empty())
		.ok_or_else(|| AuthenticationError::MissingCredential { field }.into())
}
