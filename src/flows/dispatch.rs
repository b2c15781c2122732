//! Route dispatch: resolves an inbound request and performs the matching projects API call.

// crates.io
use axum::body::Bytes;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	flows::Relay,
	route::{self, Route},
};

/// Body field carrying the assignee email on create-task requests.
pub const ASSIGNEE_EMAIL_FIELD: &str = "assignee_email";
/// Media type of form-encoded inbound bodies; every other body is read as JSON.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Inbound request after the HTTP surface has authenticated the caller.
#[derive(Clone, Debug)]
pub struct InboundRequest {
	/// HTTP method.
	pub method: Method,
	/// Raw URL path, query string excluded.
	pub path: String,
	/// Decoded query parameters in arrival order.
	pub query: Vec<(String, String)>,
	/// `Content-Type` header, if one was sent.
	pub content_type: Option<String>,
	/// Raw body; only decoded for routes that forward one.
	pub body: Bytes,
}
impl InboundRequest {
	/// Returns the first value of the named query parameter.
	pub fn query_value(&self, name: &str) -> Option<&str> {
		self.query.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
	}

	/// Decodes the body into fields, as a form when the content type says so and as a JSON
	/// object otherwise. A blank body yields no fields.
	fn form_body(&self) -> Result<Map<String, Value>> {
		if self.body.iter().all(u8::is_ascii_whitespace) {
			return Ok(Map::new());
		}
		if self.is_form_encoded() {
			return Ok(url::form_urlencoded::parse(&self.body)
				.into_owned()
				.map(|(key, value)| (key, Value::String(value)))
				.collect());
		}

		match serde_json::from_slice(&self.body) {
			Ok(Value::Null) => Ok(Map::new()),
			Ok(Value::Object(fields)) => Ok(fields),
			Ok(_) => Err(Error::validation("request body must be a JSON object")),
			Err(e) => Err(Error::validation(format!("request body is not valid JSON ({e})"))),
		}
	}

	fn is_form_encoded(&self) -> bool {
		self.content_type.as_deref().is_some_and(|content_type| {
			content_type
				.split(';')
				.next()
				.is_some_and(|media| media.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
		})
	}
}

impl Relay {
	/// Resolves the inbound request against the route table and relays it.
	///
	/// Path and body validation happen before a token is requested, so malformed or unknown
	/// requests never reach the identity provider.
	pub async fn relay(&self, inbound: &InboundRequest) -> Result<Value> {
		let path = route::normalize_path(&inbound.query, &inbound.path)?;
		let route = Route::resolve(&inbound.method, &path)?;
		let form = if route.carries_body() { Some(inbound.form_body()?) } else { None };
		let portal_id = self.portal_id()?;
		let token = self.tokens.access_token().await?;

		match route {
			Route::SearchProjects =>
				self.search_projects(&token, portal_id, inbound.query_value("query")).await,
			Route::CreateTask { .. } => {
				let mut form = form.unwrap_or_default();

				self.resolve_assignee(&token, &mut form).await;
				self.forward(&route, &token, portal_id, Some(form)).await
			},
			_ => self.forward(&route, &token, portal_id, form).await,
		}
	}

	async fn forward(
		&self,
		route: &Route,
		token: &TokenSecret,
		portal_id: &str,
		form: Option<Map<String, Value>>,
	) -> Result<Value> {
		let request = route.outbound(self.projects.base_url(), portal_id, form)?;

		self.projects.send(route, token, &request).await
	}

	/// Replaces `assignee_email` with `person_responsible` + `owner` when the email resolves.
	///
	/// The email field is removed in every case. An unresolved email forwards the task without
	/// a responsible person.
	async fn resolve_assignee(&self, token: &TokenSecret, form: &mut Map<String, Value>) {
		let Some(email) = form.remove(ASSIGNEE_EMAIL_FIELD) else {
			return;
		};
		let Some(email) = email.as_str().filter(|email| !email.is_empty()) else {
			return;
		};

		if let Some(user_id) = self.lookup_assignee_by_email(token, email).await {
			form.insert("person_responsible".into(), Value::String(user_id.clone()));
			form.insert("owner".into(), Value::String(user_id));
		}
	}

	async fn search_projects(
		&self,
		token: &TokenSecret,
		portal_id: &str,
		query: Option<&str>,
	) -> Result<Value> {
		let listing = self.forward(&Route::SearchProjects, token, portal_id, None).await?;

		Ok(serde_json::json!({ "projects": filter_projects(listing, query.unwrap_or_default()) }))
	}
}

/// Keeps the projects whose `name` contains `term`, ignoring case.
///
/// Accepts either `{ "projects": [...] }` or a bare array. An empty term keeps every project.
pub fn filter_projects(listing: Value, term: &str) -> Value {
	let projects = match listing {
		Value::Object(mut fields) => fields
			.remove("projects")
			.filter(|projects| !projects.is_null())
			.unwrap_or(Value::Object(fields)),
		other => other,
	};

	if term.is_empty() {
		return projects;
	}

	let Value::Array(projects) = projects else {
		return Value::Array(Vec::new());
	};
	let term = term.to_lowercase();

	projects
		.into_iter()
		.filter(|project| {
			project
				.get("name")
				.and_then(Value::as_str)
				.is_some_and(|name| name.to_lowercase().contains(&term))
		})
		.collect()
}
