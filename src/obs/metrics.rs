// self
use crate::{
	_prelude::*,
	obs::{AcquireMode, AcquireOutcome},
};

/// Records an acquisition outcome via the global metrics recorder (when enabled).
pub fn record_acquire_outcome(mode: AcquireMode, outcome: AcquireOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"quota_throttle_acquire_total",
			"mode" => mode.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (mode, outcome);
	}
}

/// Records the total time a caller spent waiting for quota (when enabled).
pub fn record_wait(mode: AcquireMode, waited: Duration) {
	#[cfg(feature = "metrics")]
	{
		metrics::histogram!("quota_throttle_wait_seconds", "mode" => mode.as_str())
			.record(waited.as_secs_f64());
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (mode, waited);
	}
}
