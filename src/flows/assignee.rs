//! Best-effort resolution of an assignee email to a portal user identifier.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	flows::Relay,
	obs::{self, Outcome, Stage, StageSpan},
	route::Route,
};

impl Relay {
	/// Resolves `email` against the portal's user list.
	///
	/// Returns `None` when no user matches and also when the listing call fails: the lookup only
	/// enriches a create-task body and never fails the parent request.
	pub async fn lookup_assignee_by_email(
		&self,
		token: &TokenSecret,
		email: &str,
	) -> Option<String> {
		const STAGE: Stage = Stage::AssigneeLookup;

		let span = StageSpan::new(STAGE, "lookup_assignee_by_email");

		obs::record_outcome(STAGE, Outcome::Attempt);

		let listing = span.instrument(self.list_users(token)).await;

		obs::record_result(STAGE, &listing);

		match listing {
			Ok(users) => find_user_id(&users, email),
			Err(_) => None,
		}
	}

	async fn list_users(&self, token: &TokenSecret) -> Result<Value> {
		let route = Route::ListUsers;
		let request = route.outbound(self.projects.base_url(), self.portal_id()?, None)?;

		self.projects.send(&route, token, &request).await
	}
}

/// Finds the identifier of the first user whose email matches `email` case-insensitively.
///
/// Entries are read as `{ "email", "id" }` or `{ "user": { "email", "id" } }`. A flat field that
/// is null, empty, zero, or `false` defers to the nested one. Numeric ids are rendered as decimal
/// text.
pub fn find_user_id(users: &Value, email: &str) -> Option<String> {
	let wanted = email.to_lowercase();
	let entry = users.get("users")?.as_array()?.iter().find(|entry| {
		user_field(entry, "email")
			.and_then(Value::as_str)
			.is_some_and(|candidate| candidate.to_lowercase() == wanted)
	})?;

	match user_field(entry, "id")? {
		Value::String(id) => Some(id.clone()),
		Value::Number(id) => Some(id.to_string()),
		_ => None,
	}
}

fn user_field<'a>(entry: &'a Value, field: &str) -> Option<&'a Value> {
	entry
		.get(field)
		.filter(|value| is_present(value))
		.or_else(|| entry.get("user").and_then(|user| user.get(field)))
}

fn is_present(value: &Value) -> bool {
	match value {
		Value::Null | Value::Bool(false) => false,
		Value::String(text) => !text.is_empty(),
		Value::Number(number) => number.as_f64() != Some(0.0),
		_ => true,
	}
}
