//! Environment-driven relay configuration.

// std
use std::net::SocketAddr;
// crates.io
use clap::Parser;
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Relay settings, read from CLI flags or the matching environment variables.
///
/// Every credential is optional at startup: a missing `API_KEY` fails each request with a
/// configuration error, and missing OAuth values fail on the first token refresh.
#[derive(Clone, Debug, Parser)]
#[command(name = "zoho-relay", version, about)]
pub struct RelayConfig {
	/// OAuth client identifier registered with the identity provider.
	#[arg(long, env = "ZOHO_CLIENT_ID")]
	pub client_id: Option<String>,
	/// OAuth client secret.
	#[arg(long, env = "ZOHO_CLIENT_SECRET", hide_env_values = true)]
	pub client_secret: Option<TokenSecret>,
	/// Long-lived refresh token exchanged for access tokens.
	#[arg(long, env = "ZOHO_REFRESH_TOKEN", hide_env_values = true)]
	pub refresh_token: Option<TokenSecret>,
	/// Portal scoping every projects API path.
	#[arg(long, env = "ZOHO_PORTAL_ID")]
	pub portal_id: Option<String>,
	/// Static key callers must present via `x-api-key` or `api_key`.
	#[arg(long, env = "API_KEY", hide_env_values = true)]
	pub api_key: Option<TokenSecret>,
	/// Identity provider base URL.
	#[arg(long, env = "ZOHO_ACCOUNTS_URL", default_value = "https://accounts.zoho.com")]
	pub accounts_url: Url,
	/// Projects API base URL.
	#[arg(long, env = "ZOHO_PROJECTS_URL", default_value = "https://projectsapi.zoho.com")]
	pub projects_url: Url,
	/// Socket address the server binds to.
	#[arg(long, env = "RELAY_LISTEN", default_value = "0.0.0.0:3000")]
	pub listen: SocketAddr,
}
impl RelayConfig {
	const TOKEN_PATH: &'static str = "oauth/v2/token";

	/// Loads `.env` (when present) into the environment, then parses flags and variables.
	pub fn load() -> Self {
		let _ = dotenvy::dotenv();

		Self::parse()
	}

	/// Builds a configuration from explicit endpoints with every credential unset.
	pub fn new(accounts_url: Url, projects_url: Url) -> Self {
		Self {
			client_id: None,
			client_secret: None,
			refresh_token: None,
			portal_id: None,
			api_key: None,
			accounts_url,
			projects_url,
			listen: SocketAddr::from(([0, 0, 0, 0], 3000)),
		}
	}

	/// Resolves the identity provider's token endpoint.
	pub fn token_url(&self) -> Result<Url, ConfigError> {
		let mut base = self.accounts_url.clone();

		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());

			base.set_path(&path);
		}

		base.join(Self::TOKEN_PATH).map_err(|source| ConfigError::InvalidUrl {
			url: format!("{base}{}", Self::TOKEN_PATH),
			source,
		})
	}
}
