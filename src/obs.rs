//! Optional observability helpers for relay stages.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit spans named `zoho_relay.stage` with the `stage` and `op`
//!   fields, and `warn` events for failures.
//! - Enable `metrics` to increment the `zoho_relay_stage_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Stages of a relayed request observed by the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// Inbound request handling, from authentication to response.
	Inbound,
	/// Refresh-token grant against the identity provider.
	TokenRefresh,
	/// Call against the projects API.
	Upstream,
	/// Best-effort assignee email resolution.
	AssigneeLookup,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::Inbound => "inbound",
			Stage::TokenRefresh => "token_refresh",
			Stage::Upstream => "upstream",
			Stage::AssigneeLookup => "assignee_lookup",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller, or swallowed by a best-effort stage.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the final outcome of a stage and traces the failure, if any.
pub fn record_result<T, E>(stage: Stage, result: &Result<T, E>)
where
	E: Display,
{
	match result {
		Ok(_) => record_outcome(stage, Outcome::Success),
		Err(err) => {
			record_outcome(stage, Outcome::Failure);
			trace_failure(stage, err);
		},
	}
}
