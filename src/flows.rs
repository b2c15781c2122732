//! Request orchestration: caller authentication, token acquisition, and route dispatch.

pub mod assignee;
pub mod token;

mod dispatch;

pub use assignee::*;
pub use dispatch::*;
pub use token::*;

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::RelayConfig,
	error::{AuthenticationError, ConfigError},
	http::ReqwestHttpClient,
	store::TokenCache,
	upstream::ProjectsApi,
};

/// Relays the fixed route table against one portal.
///
/// The relay owns the token manager (and through it the token cache), the projects API client,
/// and the caller-facing API key. One instance is shared by every inbound request.
#[derive(Debug)]
pub struct Relay {
	/// Token manager supplying bearer tokens.
	pub tokens: TokenManager,
	/// Projects API client.
	pub projects: ProjectsApi,
	portal_id: Option<String>,
	api_key: Option<TokenSecret>,
}
impl Relay {
	/// Creates a relay with its own HTTP client and an empty token cache.
	pub fn new(config: &RelayConfig) -> Result<Self> {
		Self::with_http_client(config, ReqwestHttpClient::build()?, TokenCache::default())
	}

	/// Creates a relay that reuses the caller-provided HTTP client and token cache.
	pub fn with_http_client(
		config: &RelayConfig,
		http_client: ReqwestHttpClient,
		cache: TokenCache,
	) -> Result<Self> {
		let credentials = OAuthCredentials {
			token_url: config.token_url()?,
			client_id: config.client_id.clone(),
			client_secret: config.client_secret.clone(),
			refresh_token: config.refresh_token.clone(),
		};

		Ok(Self {
			tokens: TokenManager::new(cache, credentials, http_client.clone()),
			projects: ProjectsApi::new(http_client, config.projects_url.clone()),
			portal_id: config.portal_id.clone().filter(|portal| !portal.is_empty()),
			api_key: config.api_key.clone().filter(|key| !key.is_empty()),
		})
	}

	/// Checks the caller-presented API key against the configured one.
	///
	/// Fails with a configuration error when no key is configured, so an unset key never lets
	/// callers through.
	pub fn authorize(&self, presented: Option<&str>) -> Result<()> {
		let expected = self.api_key.as_ref().ok_or(ConfigError::MissingApiKey)?;

		match presented {
			Some(presented) if expected.matches(presented) => Ok(()),
			_ => Err(AuthenticationError::InvalidApiKey.into()),
		}
	}

	fn portal_id(&self) -> Result<&str> {
		self.portal_id.as_deref().ok_or_else(|| ConfigError::MissingPortalId.into())
	}
}
