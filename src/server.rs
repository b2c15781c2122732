//! Inbound HTTP surface: CORS, caller authentication, and error rendering.

// std
use std::net::SocketAddr;
// crates.io
use axum::{
	Json, Router,
	body::Bytes,
	extract::State,
	http::{
		HeaderMap, HeaderName, HeaderValue, StatusCode, Uri,
		header::{
			ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
			CONTENT_TYPE,
		},
	},
	response::{IntoResponse, Response},
};
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
// self
use crate::{
	_prelude::*,
	flows::{InboundRequest, Relay},
	obs::{self, Outcome, Stage, StageSpan},
};

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Query parameter accepted in place of [`API_KEY_HEADER`].
pub const API_KEY_QUERY: &str = "api_key";

/// Builds the relay router: every path and method reaches one handler.
pub fn router(relay: Arc<Relay>) -> Router {
	Router::new()
		.fallback(handle)
		.with_state(relay)
		.layer(cors_header(ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
		.layer(cors_header(ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, PUT, DELETE, OPTIONS"))
		.layer(cors_header(ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"))
}

/// Binds `addr` and serves the relay until Ctrl-C.
pub async fn serve(relay: Arc<Relay>, addr: SocketAddr) -> std::io::Result<()> {
	let listener = TcpListener::bind(addr).await?;

	#[cfg(feature = "tracing")]
	tracing::info!(addr = %listener.local_addr()?, "relay listening");

	axum::serve(listener, router(relay)).with_graceful_shutdown(shutdown_signal()).await
}

fn cors_header(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
	SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

async fn shutdown_signal() {
	if tokio::signal::ctrl_c().await.is_err() {
		std::future::pending::<()>().await;
	}
}

async fn handle(
	State(relay): State<Arc<Relay>>,
	method: Method,
	uri: Uri,
	headers: HeaderMap,
	body: Bytes,
) -> Response {
	const STAGE: Stage = Stage::Inbound;

	if method == Method::OPTIONS {
		return StatusCode::OK.into_response();
	}

	let span = StageSpan::new(STAGE, "handle");

	obs::record_outcome(STAGE, Outcome::Attempt);

	let result = span.instrument(respond(&relay, method, &uri, &headers, body)).await;

	obs::record_result(STAGE, &result);

	match result {
		Ok(value) => (StatusCode::OK, Json(value)).into_response(),
		Err(e) => e.into_response(),
	}
}

async fn respond(
	relay: &Relay,
	method: Method,
	uri: &Uri,
	headers: &HeaderMap,
	body: Bytes,
) -> Result<Value> {
	let query = url::form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes())
		.into_owned()
		.collect::<Vec<_>>();

	relay.authorize(presented_key(headers, &query))?;

	let content_type =
		headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()).map(str::to_owned);
	let inbound = InboundRequest { method, path: uri.path().into(), query, content_type, body };

	relay.relay(&inbound).await
}

/// Picks the caller's API key: a non-empty header wins over the query parameter.
fn presented_key<'a>(headers: &'a HeaderMap, query: &'a [(String, String)]) -> Option<&'a str> {
	headers
		.get(API_KEY_HEADER)
		.and_then(|value| value.to_str().ok())
		.filter(|value| !value.is_empty())
		.or_else(|| {
			query
				.iter()
				.find(|(key, value)| key == API_KEY_QUERY && !value.is_empty())
				.map(|(_, value)| value.as_str())
		})
}
