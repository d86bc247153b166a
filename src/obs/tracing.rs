// self
use crate::{
	_prelude::*,
	obs::{AcquireMode, AcquireOutcome},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedAcquire<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedAcquire<F> = F;

/// Span covering one acquisition, from the first refill check to grant or cancellation.
///
/// Fields: `mode`, the limiter's `capacity` and `window_ms`, and `outcome` once known.
#[derive(Clone, Debug)]
pub struct AcquireSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl AcquireSpan {
	/// Opens a span for an acquisition against a `capacity`-per-`window` bucket.
	pub fn new(mode: AcquireMode, capacity: u32, window: Duration) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"quota_throttle.acquire",
				mode = mode.as_str(),
				capacity,
				window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
				outcome = tracing::field::Empty
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (mode, capacity, window);

			Self {}
		}
	}

	/// Fills in the `outcome` field.
	pub fn record_outcome(&self, outcome: AcquireOutcome) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = outcome;
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> AcquireSpanGuard {
		#[cfg(feature = "tracing")]
		{
			AcquireSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			AcquireSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedAcquire<Fut>
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

/// RAII guard returned by [`AcquireSpan::entered`].
pub struct AcquireSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for AcquireSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("AcquireSpanGuard(..)")
	}
}

/// Emits a `debug` event describing a computed wait (when tracing is enabled).
pub fn trace_wait(wait: Duration, available: f64) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(wait_ms = wait.as_secs_f64() * 1_000., available, "Waiting for quota.");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (wait, available);
	}
}
