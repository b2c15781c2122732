//! Shared fixtures for the relay integration tests.
//!
//! One `httpmock` server plays both the identity provider and the projects API.

// Each test binary uses a different subset of the fixtures.
#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use axum::{
	Router,
	body::Body,
	http::{HeaderMap, Request, StatusCode},
};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;
// self
use zoho_relay::{
	auth::TokenSecret, config::RelayConfig, flows::Relay, http::ReqwestHttpClient,
	store::TokenCache,
};

/// Key the relay under test is configured with.
pub const API_KEY: &str = "relay-test-key";
/// Portal every projects API path is scoped to.
pub const PORTAL_ID: &str = "portal-7";
/// Path of the mocked token endpoint.
pub const TOKEN_PATH: &str = "/oauth/v2/token";

/// Relay wired to a mock server, plus the router serving it.
pub struct Harness {
	pub server: MockServer,
	pub relay: Arc<Relay>,
	pub router: Router,
}
impl Harness {
	/// Starts a mock server and a fully configured relay.
	pub async fn start() -> Self {
		Self::start_with(|_| {}).await
	}

	/// Starts a mock server and a relay whose config `configure` may adjust.
	pub async fn start_with(configure: impl FnOnce(&mut RelayConfig)) -> Self {
		let server = MockServer::start_async().await;
		let mut config = config(&server);

		configure(&mut config);

		let relay = Arc::new(
			Relay::with_http_client(&config, ReqwestHttpClient::default(), TokenCache::default())
				.expect("Relay should build from the test config."),
		);
		let router = zoho_relay::server::router(relay.clone());

		Self { server, relay, router }
	}

	/// Project API path under the `/api/v3` family.
	pub fn v3_path(tail: &str) -> String {
		format!("/api/v3/portal/{PORTAL_ID}/{tail}")
	}

	/// Project API path under the `/restapi` family.
	pub fn rest_path(tail: &str) -> String {
		format!("/restapi/portal/{PORTAL_ID}/{tail}/")
	}

	/// Mocks a successful refresh grant returning `access_token`.
	pub async fn mock_token(&self, access_token: &str, expires_in: i64) -> httpmock::Mock<'_> {
		let body = serde_json::json!({
			"access_token": access_token,
			"token_type": "Bearer",
			"expires_in": expires_in,
			"api_domain": "https://www.zohoapis.com",
		});

		self.server
			.mock_async(|when, then| {
				when.method(POST)
					.path(TOKEN_PATH)
					.form_urlencoded_tuple("grant_type", "refresh_token")
					.form_urlencoded_tuple("refresh_token", "refresh-test");
				then.status(200).header("content-type", "application/json").body(body.to_string());
			})
			.await
	}

	/// Sends `request` through the router and returns status, headers, and the JSON body.
	pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
		let response =
			self.router.clone().oneshot(request).await.expect("Router should always respond.");
		let status = response.status();
		let headers = response.headers().clone();
		let bytes = response
			.into_body()
			.collect()
			.await
			.expect("Response body should be readable.")
			.to_bytes();
		let body = if bytes.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&bytes).expect("Response body should be JSON.")
		};

		(status, headers, body)
	}
}

/// Relay configuration pointing both base URLs at `server`.
pub fn config(server: &MockServer) -> RelayConfig {
	let base = Url::parse(&server.base_url()).expect("Mock server URL should parse.");
	let mut config = RelayConfig::new(base.clone(), base);

	config.client_id = Some("client-test".into());
	config.client_secret = Some(TokenSecret::new("secret-test"));
	config.refresh_token = Some(TokenSecret::new("refresh-test"));
	config.portal_id = Some(PORTAL_ID.into());
	config.api_key = Some(TokenSecret::new(API_KEY));

	config
}

/// Authenticated `GET` request.
pub fn get(uri: &str) -> Request<Body> {
	Request::get(uri)
		.header("x-api-key", API_KEY)
		.body(Body::empty())
		.expect("Test request should build.")
}

/// Authenticated `POST` request with a JSON body.
pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
	Request::post(uri)
		.header("x-api-key", API_KEY)
		.header("content-type", "application/json")
		.body(Body::from(body.to_string()))
		.expect("Test request should build.")
}
