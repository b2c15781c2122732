mod common;

// crates.io
use axum::http::StatusCode;
use httpmock::prelude::*;
use serde_json::json;
use time::{Duration, OffsetDateTime};
// self
use common::*;
use zoho_relay::auth::{CachedToken, TokenSecret};

async fn mock_projects<'a>(harness: &'a Harness, access_token: &str) -> httpmock::Mock<'a> {
	let authorization = format!("Zoho-oauthtoken {access_token}");

	harness
		.server
		.mock_async(|when, then| {
			when.method(GET)
				.path(Harness::v3_path("projects"))
				.header("authorization", authorization.as_str());
			then.status(200).header("content-type", "application/json").body("{\"projects\":[]}");
		})
		.await
}

#[tokio::test]
async fn cached_token_is_reused_across_requests() {
	let harness = Harness::start().await;
	let token = harness.mock_token("access-cached", 3_600).await;
	let projects = mock_projects(&harness, "access-cached").await;

	for _ in 0..3 {
		let (status, _, _) = harness.send(get("/api/projects")).await;

		assert_eq!(status, StatusCode::OK);
	}

	token.assert_calls_async(1).await;
	projects.assert_calls_async(3).await;
}

#[tokio::test]
async fn expired_token_is_refreshed_once_and_replaced() {
	let harness = Harness::start().await;
	let cache = harness.relay.tokens.cache();

	cache.store(CachedToken::new("access-stale", OffsetDateTime::now_utc() - Duration::minutes(1)));

	let token = harness.mock_token("access-fresh", 3_600).await;
	let projects = mock_projects(&harness, "access-fresh").await;
	let (status, _, _) = harness.send(get("/api/projects")).await;

	assert_eq!(status, StatusCode::OK);

	token.assert_async().await;
	projects.assert_async().await;

	let cached = cache.snapshot().expect("Refreshed token should be cached.");

	assert_eq!(cached.value.expose(), "access-fresh");
	assert!(cached.is_valid_at(OffsetDateTime::now_utc()));
}

#[tokio::test]
async fn expiry_subtracts_the_safety_margin() {
	let harness = Harness::start().await;
	let token = harness.mock_token("access-margin", 1_000).await;
	let before = OffsetDateTime::now_utc();
	let access = harness.relay.tokens.access_token().await.expect("Refresh should succeed.");
	let after = OffsetDateTime::now_utc();

	token.assert_async().await;

	assert_eq!(access.expose(), "access-margin");

	let cached = harness.relay.tokens.cache().snapshot().expect("Token should be cached.");

	assert!(cached.expires_at >= before + Duration::seconds(700));
	assert!(cached.expires_at <= after + Duration::seconds(700));
}

#[tokio::test]
async fn missing_expires_in_defaults_to_one_hour() {
	let harness = Harness::start().await;
	let token = harness
		.server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-default\",\"token_type\":\"Bearer\"}");
		})
		.await;
	let before = OffsetDateTime::now_utc();

	harness.relay.tokens.access_token().await.expect("Refresh should succeed.");

	token.assert_async().await;

	let cached = harness.relay.tokens.cache().snapshot().expect("Token should be cached.");

	assert!(cached.expires_at >= before + Duration::seconds(3_300));
}

#[tokio::test]
async fn rejected_refresh_fails_and_keeps_the_cache() {
	let harness = Harness::start().await;
	let cache = harness.relay.tokens.cache();
	let stale =
		CachedToken::new("access-stale", OffsetDateTime::now_utc() - Duration::seconds(1));

	cache.store(stale.clone());

	let token = harness
		.server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\"}");
		})
		.await;
	let (status, _, body) = harness.send(get("/api/projects")).await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body["error"], "Authentication failed");
	assert!(body["details"].as_str().is_some_and(|details| details.contains("invalid_client")));

	token.assert_async().await;

	assert_eq!(cache.snapshot(), Some(stale));
}

#[tokio::test]
async fn error_shaped_success_body_is_a_refresh_failure() {
	let harness = Harness::start().await;
	let token = harness
		.server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_code\"}");
		})
		.await;
	let (status, _, body) = harness.send(get("/api/projects")).await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body["error"], "Authentication failed");

	token.assert_async().await;

	assert!(harness.relay.tokens.cache().snapshot().is_none());
}

#[tokio::test]
async fn missing_oauth_credentials_fail_without_calling_the_provider() {
	let harness = Harness::start_with(|config| config.client_secret = None).await;
	let token = harness.mock_token("access-unused", 3_600).await;
	let (status, _, body) = harness.send(get("/api/projects")).await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body["error"], "Authentication failed");
	assert!(
		body["details"].as_str().is_some_and(|details| details.contains("ZOHO_CLIENT_SECRET"))
	);

	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn concurrent_requests_share_one_refresh() {
	let harness = Harness::start().await;
	let token = harness.mock_token("access-shared", 3_600).await;
	let tokens = &harness.relay.tokens;
	let (first, second, third) =
		tokio::join!(tokens.access_token(), tokens.access_token(), tokens.access_token());

	for access in [first, second, third] {
		let access = access.expect("Concurrent refresh should succeed.");

		assert_eq!(access, TokenSecret::new("access-shared"));
	}

	token.assert_async().await;
}

#[tokio::test]
async fn client_credentials_travel_in_the_form_body() {
	let harness = Harness::start().await;
	let token = harness
		.server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.form_urlencoded_tuple("client_id", "client-test")
				.form_urlencoded_tuple("client_secret", "secret-test")
				.form_urlencoded_tuple("grant_type", "refresh_token");
			then.status(200).header("content-type", "application/json").body(
				json!({ "access_token": "access-form", "token_type": "Bearer", "expires_in": 3600 })
					.to_string(),
			);
		})
		.await;

	harness.relay.tokens.access_token().await.expect("Refresh should succeed.");

	token.assert_async().await;
}
