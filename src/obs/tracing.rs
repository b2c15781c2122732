// self
use crate::{_prelude::*, obs::Stage};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedStage<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedStage<F> = F;

/// A span builder used by relay stages.
#[derive(Clone, Debug)]
pub struct StageSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl StageSpan {
	/// Creates a new span tagged with the provided stage + operation.
	pub fn new(stage: Stage, op: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("zoho_relay.stage", stage = stage.as_str(), op);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, op);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStage<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `warn` event describing a failed stage.
pub fn trace_failure(stage: Stage, err: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(stage = stage.as_str(), error = %err, "relay stage failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, err);
	}
}

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (defaults to `info`).
///
/// Does nothing when a global subscriber is already set or the `tracing` feature is off.
pub fn init_subscriber() {
	#[cfg(feature = "tracing")]
	{
		use tracing_subscriber::EnvFilter;

		let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
		let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
	}
}
