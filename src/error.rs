//! Relay-level error types shared by the token manager, route translator, and HTTP surface.

// crates.io
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Server-side configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Caller or upstream authentication failure.
	#[error(transparent)]
	Authentication(#[from] AuthenticationError),
	/// Projects API failure.
	#[error(transparent)]
	Upstream(#[from] UpstreamError),

	/// Inbound request could not be interpreted.
	#[error("Invalid request: {reason}.")]
	Validation {
		/// Human-readable reason string.
		reason: String,
	},
	/// No entry of the route table matches the method + path pair.
	#[error("No route matches {method} {path}.")]
	RouteNotFound {
		/// Inbound HTTP method.
		method: String,
		/// Normalized inbound path.
		path: String,
	},
}
impl Error {
	pub(crate) const INVALID_PATH: &'static str = "invalid path";
	const INTERNAL: &'static str = "Internal server error";

	/// Builds a [`Error::Validation`] from any displayable reason.
	pub fn validation(reason: impl Into<String>) -> Self {
		Self::Validation { reason: reason.into() }
	}

	/// HTTP status the error maps to at the inbound surface.
	pub fn status(&self) -> StatusCode {
		match self {
			Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
			Error::Authentication(AuthenticationError::InvalidApiKey) => StatusCode::UNAUTHORIZED,
			Error::Authentication(_) => StatusCode::INTERNAL_SERVER_ERROR,
			Error::Upstream(UpstreamError::Status { status, .. }) =>
				StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
			Error::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
			Error::Validation { .. } => StatusCode::BAD_REQUEST,
			Error::RouteNotFound { .. } => StatusCode::NOT_FOUND,
		}
	}

	fn body(&self) -> ErrorBody {
		match self {
			Error::Config(ConfigError::MissingApiKey) =>
				ErrorBody::message("Server configuration error: API_KEY not set"),
			Error::Authentication(AuthenticationError::InvalidApiKey) =>
				ErrorBody::message("Unauthorized: Invalid or missing API key"),
			Error::Validation { reason } if reason == Self::INVALID_PATH =>
				ErrorBody::message("Invalid API path. Use /api/projects or /api?path=projects"),
			Error::Validation { .. } => ErrorBody::detailed("Invalid request", self),
			Error::RouteNotFound { .. } => ErrorBody::message("Endpoint not found"),
			Error::Authentication(_) => ErrorBody::detailed("Authentication failed", self),
			Error::Upstream(UpstreamError::Status { message, body, .. }) => ErrorBody {
				error: message.clone().unwrap_or_else(|| Self::INTERNAL.into()),
				details: Some(self.to_string()),
				upstream: Some(body.clone()),
			},
			Error::Config(_) | Error::Upstream(_) => ErrorBody::detailed(Self::INTERNAL, self),
		}
	}
}
impl IntoResponse for Error {
	fn into_response(self) -> Response {
		(self.status(), Json(self.body())).into_response()
	}
}

/// JSON payload rendered for every failed inbound request.
#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	details: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	upstream: Option<Value>,
}
impl ErrorBody {
	fn message(error: &str) -> Self {
		Self { error: error.into(), details: None, upstream: None }
	}

	fn detailed(error: &str, source: &Error) -> Self {
		Self { error: error.into(), details: Some(source.to_string()), upstream: None }
	}
}

/// Configuration failures detected while serving a request.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// No API key is configured, so no caller can be authenticated.
	#[error("API_KEY is not configured.")]
	MissingApiKey,
	/// No portal identifier is configured.
	#[error("ZOHO_PORTAL_ID is not configured.")]
	MissingPortalId,
	/// A configured base URL cannot carry path segments.
	#[error("Base URL `{url}` cannot be used to build endpoint paths.")]
	NotABaseUrl {
		/// Offending URL.
		url: String,
	},
	/// A derived endpoint URL is invalid.
	#[error("Endpoint URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Authentication failures, on either side of the relay.
#[derive(Debug, ThisError)]
pub enum AuthenticationError {
	/// Caller presented no API key or the wrong one.
	#[error("Caller API key is missing or invalid.")]
	InvalidApiKey,
	/// An OAuth credential needed for the refresh grant is not configured.
	#[error("OAuth credential `{field}` is not configured.")]
	MissingCredential {
		/// Environment variable that is missing.
		field: &'static str,
	},
	/// Identity provider rejected the refresh grant or answered unexpectedly.
	#[error("Token refresh failed: {message}.")]
	TokenRefresh {
		/// Provider- or relay-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with a body that is not a token response.
	#[error("Token endpoint returned a malformed token response.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Identity provider could not be reached.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl AuthenticationError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

/// Projects API failures.
#[derive(Debug, ThisError)]
pub enum UpstreamError {
	/// Projects API answered with a non-2xx status.
	#[error("Projects API returned HTTP {status}.")]
	Status {
		/// Status code reported by the projects API.
		status: u16,
		/// Message extracted from the error payload, if any.
		message: Option<String>,
		/// Parsed error payload.
		body: Value,
	},
	/// Projects API could not be reached or the response could not be read.
	#[error("Projects API is unreachable.")]
	Unreachable {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl UpstreamError {
	/// Wraps a transport-specific network error.
	pub fn unreachable(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Unreachable { source: Box::new(src) }
	}
}
