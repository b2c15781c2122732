//! Projects API client executing [`OutboundRequest`]s with the relay's bearer token.

// crates.io
use reqwest::header::AUTHORIZATION;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::UpstreamError,
	http::ReqwestHttpClient,
	obs::{self, Outcome, Stage, StageSpan},
	route::{OutboundRequest, Route},
};

/// Portal-scoped client for the projects API.
#[derive(Clone, Debug)]
pub struct ProjectsApi {
	http_client: ReqwestHttpClient,
	base_url: Url,
}
impl ProjectsApi {
	/// Authorization scheme the projects API expects in front of the access token.
	pub const AUTH_SCHEME: &'static str = "Zoho-oauthtoken";

	/// Creates a client rooted at `base_url`.
	pub fn new(http_client: ReqwestHttpClient, base_url: Url) -> Self {
		Self { http_client, base_url }
	}

	/// Base URL every endpoint is rendered against.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Sends the request and returns the parsed response body.
	///
	/// Non-2xx answers become [`UpstreamError::Status`] carrying the upstream status and body.
	pub async fn send(
		&self,
		route: &Route,
		token: &TokenSecret,
		request: &OutboundRequest,
	) -> Result<Value> {
		const STAGE: Stage = Stage::Upstream;

		let span = StageSpan::new(STAGE, route.as_str());

		obs::record_outcome(STAGE, Outcome::Attempt);

		let result = span.instrument(self.execute(token, request)).await;

		obs::record_result(STAGE, &result);

		result
	}

	async fn execute(&self, token: &TokenSecret, request: &OutboundRequest) -> Result<Value> {
		let mut builder = self
			.http_client
			.request(request.method.clone(), request.url.clone())
			.header(AUTHORIZATION, format!("{} {}", Self::AUTH_SCHEME, token.expose()));

		if request.form.is_some() {
			builder = builder.form(&request.form_pairs());
		}

		let response = builder.send().await.map_err(UpstreamError::unreachable)?;
		let status = response.status();
		let bytes = response.bytes().await.map_err(UpstreamError::unreachable)?;
		let body = parse_body(&bytes);

		if !status.is_success() {
			return Err(UpstreamError::Status {
				status: status.as_u16(),
				message: error_message(&body),
				body,
			}
			.into());
		}

		Ok(body)
	}
}

/// Parses a response body as JSON, keeping non-JSON payloads as a string.
fn parse_body(bytes: &[u8]) -> Value {
	if bytes.is_empty() {
		return Value::Null;
	}

	serde_json::from_slice(bytes)
		.unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Pulls a human-readable message out of the two error shapes the projects API uses.
fn error_message(body: &Value) -> Option<String> {
	body.get("message")
		.or_else(|| body.get("error").and_then(|error| error.get("message")))
		.and_then(Value::as_str)
		.map(str::to_owned)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn non_json_bodies_are_kept_as_text() {
		assert_eq!(parse_body(b""), Value::Null);
		assert_eq!(parse_body(b"{\"ok\":true}"), serde_json::json!({ "ok": true }));
		assert_eq!(parse_body(b"gateway timeout"), Value::String("gateway timeout".into()));
	}

	#[test]
	fn error_message_reads_both_shapes() {
		let flat = serde_json::json!({ "message": "Invalid project" });
		let nested =
			serde_json::json!({ "error": { "code": 6404, "message": "Resource not found" } });

		assert_eq!(error_message(&flat).as_deref(), Some("Invalid project"));
		assert_eq!(error_message(&nested).as_deref(), Some("Resource not found"));
		assert_eq!(error_message(&Value::String("boom".into())), None);
	}
}
