//! Route table translating simplified relay paths into projects API requests.
//!
//! [`normalize_path`] extracts the relay path from an inbound request, [`Route::resolve`] walks
//! the fixed table in order (first match wins), and [`Route::outbound`] renders the matching
//! projects API request for a portal.

// self
use crate::{_prelude::*, error::ConfigError};

/// One row of the route table, carrying the extracted path parameter where the shape has one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
	/// `GET projects`
	ListProjects,
	/// `GET projects/{id}/tasks`
	ListTasks {
		/// Project identifier.
		project_id: String,
	},
	/// `GET projects/{id}/bugs`
	ListBugs {
		/// Project identifier.
		project_id: String,
	},
	/// `POST projects/{id}/tasks`
	CreateTask {
		/// Project identifier.
		project_id: String,
	},
	/// `POST projects/{id}/bugs`
	CreateBug {
		/// Project identifier.
		project_id: String,
	},
	/// `GET users`
	ListUsers,
	/// `GET projects/search`
	SearchProjects,
}
impl Route {
	/// Matches a method + normalized path against the table, in table order.
	pub fn resolve(method: &Method, path: &str) -> Result<Self> {
		let segments = path.split('/').collect::<Vec<_>>();
		let is_get = *method == Method::GET;
		let is_post = *method == Method::POST;
		let route = match segments.as_slice() {
			["projects"] if is_get => Some(Route::ListProjects),
			["projects", id, "tasks"] if is_get && is_path_id(id) =>
				Some(Route::ListTasks { project_id: (*id).into() }),
			["projects", id, "bugs"] if is_get && is_path_id(id) =>
				Some(Route::ListBugs { project_id: (*id).into() }),
			["projects", id, "tasks"] if is_post && is_path_id(id) =>
				Some(Route::CreateTask { project_id: (*id).into() }),
			["projects", id, "bugs"] if is_post && is_path_id(id) =>
				Some(Route::CreateBug { project_id: (*id).into() }),
			["users"] if is_get => Some(Route::ListUsers),
			["projects", "search"] if is_get => Some(Route::SearchProjects),
			_ => None,
		};

		route.ok_or_else(|| Error::RouteNotFound { method: method.to_string(), path: path.into() })
	}

	/// Stable label suitable for span fields.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Route::ListProjects => "list_projects",
			Route::ListTasks { .. } => "list_tasks",
			Route::ListBugs { .. } => "list_bugs",
			Route::CreateTask { .. } => "create_task",
			Route::CreateBug { .. } => "create_bug",
			Route::ListUsers => "list_users",
			Route::SearchProjects => "search_projects",
		}
	}

	/// Returns `true` for routes that forward a request body.
	pub const fn carries_body(&self) -> bool {
		matches!(self, Route::CreateTask { .. } | Route::CreateBug { .. })
	}

	/// Renders the projects API request for this route.
	pub fn outbound(
		&self,
		base: &Url,
		portal_id: &str,
		form: Option<Map<String, Value>>,
	) -> Result<OutboundRequest> {
		let (method, url) = match self {
			Route::ListProjects | Route::SearchProjects =>
				(Method::GET, v3_url(base, portal_id, &["projects"])?),
			Route::ListTasks { project_id } => {
				let tail = ["projects", project_id.as_str(), "tasks"];

				(Method::GET, v3_url(base, portal_id, &tail)?)
			},
			Route::ListBugs { project_id } => {
				let tail = ["projects", project_id.as_str(), "bugs"];
				let mut url = v3_url(base, portal_id, &tail)?;

				url.query_pairs_mut().append_pair("is_desc_needed", "true");

				(Method::GET, url)
			},
			Route::CreateTask { project_id } => {
				let tail = ["projects", project_id.as_str(), "tasks"];

				(Method::POST, rest_url(base, portal_id, &tail)?)
			},
			Route::CreateBug { project_id } => {
				let tail = ["projects", project_id.as_str(), "bugs"];

				(Method::POST, rest_url(base, portal_id, &tail)?)
			},
			Route::ListUsers => (Method::GET, rest_url(base, portal_id, &["users"])?),
		};
		let form = if self.carries_body() { Some(form.unwrap_or_default()) } else { None };

		Ok(OutboundRequest { method, url, form })
	}
}
impl Display for Route {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Request the relay issues against the projects API.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL with path parameters substituted.
	pub url: Url,
	/// Body fields, form-encoded when sent.
	pub form: Option<Map<String, Value>>,
}
impl OutboundRequest {
	/// Flattens the body into form pairs.
	///
	/// Strings are sent as-is, numbers and booleans as their JSON text, nested values as compact
	/// JSON. Nulls are dropped.
	pub fn form_pairs(&self) -> Vec<(String, String)> {
		let Some(form) = &self.form else {
			return Vec::new();
		};

		form.iter()
			.filter_map(|(key, value)| {
				let value = match value {
					Value::Null => return None,
					Value::String(text) => text.clone(),
					other => other.to_string(),
				};

				Some((key.clone(), value))
			})
			.collect()
	}
}

/// Extracts the relay path from the `path` query parameter(s) or the URL path.
///
/// Non-empty `path` parameters win and are joined with `/`. Otherwise everything after the
/// first `/api/` of the URL path is used. An empty result is a validation error.
pub fn normalize_path(query: &[(String, String)], url_path: &str) -> Result<String> {
	let from_query = query
		.iter()
		.filter(|(key, value)| key == "path" && !value.is_empty())
		.map(|(_, value)| value.as_str())
		.collect::<Vec<_>>()
		.join("/");

	if !from_query.is_empty() {
		return Ok(from_query);
	}

	url_path
		.split_once("/api/")
		.map(|(_, rest)| rest)
		.filter(|rest| !rest.is_empty())
		.map(str::to_owned)
		.ok_or_else(|| Error::validation(Error::INVALID_PATH))
}

fn is_path_id(segment: &str) -> bool {
	!segment.is_empty()
		&& segment.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-')
}

fn v3_url(base: &Url, portal_id: &str, tail: &[&str]) -> Result<Url> {
	portal_url(base, &["api", "v3", "portal", portal_id], tail, false)
}

fn rest_url(base: &Url, portal_id: &str, tail: &[&str]) -> Result<Url> {
	portal_url(base, &["restapi", "portal", portal_id], tail, true)
}

fn portal_url(base: &Url, head: &[&str], tail: &[&str], trailing_slash: bool) -> Result<Url> {
	let mut url = base.clone();

	{
		let mut segments = url
			.path_segments_mut()
			.map_err(|_| ConfigError::NotABaseUrl { url: base.to_string() })?;

		segments.pop_if_empty();
		segments.extend(head);
		segments.extend(tail);

		if trailing_slash {
			segments.push("");
		}
	}

	Ok(url)
}
