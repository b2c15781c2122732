//! Internal `oauth2` facade for the refresh-token grant.

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RefreshToken,
	RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{AuthenticationError, ConfigError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Access token returned by a successful refresh grant.
pub(crate) struct RefreshGrant {
	pub(crate) access_token: TokenSecret,
	pub(crate) expires_in: Option<Duration>,
}

pub(crate) struct RefreshFacade {
	oauth_client: ConfiguredBasicClient,
	http_client: ReqwestHttpClient,
}
impl RefreshFacade {
	/// Configures a client that posts its credentials in the request body.
	pub(crate) fn new(
		token_url: &Url,
		client_id: &str,
		client_secret: &TokenSecret,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		let token_url = TokenUrl::new(token_url.to_string()).map_err(|source| {
			ConfigError::InvalidUrl { url: token_url.to_string(), source }
		})?;
		let oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.expose().to_owned()))
			.set_auth_type(AuthType::RequestBody)
			.set_token_uri(token_url);

		Ok(Self { oauth_client, http_client })
	}

	/// Exchanges the refresh token for a new access token.
	pub(crate) async fn refresh(&self, refresh_token: &TokenSecret) -> Result<RefreshGrant> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&refresh_secret)
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;
		let expires_in =
			response.expires_in().and_then(|lifetime| Duration::try_from(lifetime).ok());

		Ok(RefreshGrant {
			access_token: TokenSecret::new(response.access_token().secret().to_owned()),
			expires_in,
		})
	}
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, status),
		RequestTokenError::Request(error) => map_transport_error(error, status),
		RequestTokenError::Parse(source, _body) =>
			AuthenticationError::TokenResponseParse { source, status }.into(),
		RequestTokenError::Other(message) => AuthenticationError::TokenRefresh {
			message: format!("token endpoint returned an unexpected response: {message}"),
			status,
		}
		.into(),
	}
}

fn map_server_response_error(response: BasicErrorResponse, status: Option<u16>) -> Error {
	let message = match response.error_description() {
		Some(description) => format!("token endpoint returned an OAuth error: {description}"),
		None => format!("token endpoint returned an OAuth error: {}", response.error().as_ref()),
	};

	AuthenticationError::TokenRefresh { message, status }.into()
}

fn map_transport_error(err: HttpClientError<ReqwestError>, status: Option<u16>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => AuthenticationError::network(*inner).into(),
		HttpClientError::Io(inner) => AuthenticationError::network(inner).into(),
		HttpClientError::Http(inner) => AuthenticationError::TokenRefresh {
			message: format!("token request could not be built: {inner}"),
			status,
		}
		.into(),
		HttpClientError::Other(message) => AuthenticationError::TokenRefresh {
			message: format!(
				"HTTP client error occurred while calling the token endpoint: {message}"
			),
			status,
		}
		.into(),
		_ => AuthenticationError::TokenRefresh {
			message: "HTTP client error occurred while calling the token endpoint".into(),
			status,
		}
		.into(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn builds_request_body_client() {
		let token_url = Url::parse("https://accounts.example.com/oauth/v2/token")
			.expect("Failed to parse URL.");
		let facade = RefreshFacade::new(
			&token_url,
			"client-id",
			&TokenSecret::new("secret"),
			ReqwestHttpClient::default(),
		);

		assert!(facade.is_ok());
	}

	#[test]
	fn oauth_errors_keep_provider_status() {
		let response = BasicErrorResponse::new(
			oauth2::basic::BasicErrorResponseType::InvalidGrant,
			Some("refresh token revoked".into()),
			None,
		);
		let err = map_server_response_error(response, Some(400));

		match err {
			Error::Authentication(AuthenticationError::TokenRefresh { message, status }) => {
				assert!(message.contains("refresh token revoked"));
				assert_eq!(status, Some(400));
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}
}
