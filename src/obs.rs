//! Optional observability helpers for limiter acquisitions.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to wrap each acquisition in a span named `quota_throttle.acquire` with a
//!   `mode` field, and to emit a `debug` event for every computed wait.
//! - Enable `metrics` to increment the `quota_throttle_acquire_total` counter, labeled by `mode`
//!   + `outcome`, and to record `quota_throttle_wait_seconds` for delayed acquisitions.

mod metrics;
mod tracing;

pub use self::metrics::*;
pub use self::tracing::*;

// self
use crate::_prelude::*;

/// Entry points into the limiter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AcquireMode {
	/// [`acquire`](crate::limiter::RateLimiter::acquire).
	Blocking,
	/// [`acquire_cancellable`](crate::limiter::RateLimiter::acquire_cancellable).
	Cancellable,
	/// [`acquire_async`](crate::limiter::RateLimiter::acquire_async).
	Async,
	/// [`try_acquire`](crate::limiter::RateLimiter::try_acquire).
	Probe,
}
impl AcquireMode {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AcquireMode::Blocking => "blocking",
			AcquireMode::Cancellable => "cancellable",
			AcquireMode::Async => "async",
			AcquireMode::Probe => "probe",
		}
	}
}
impl Display for AcquireMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AcquireOutcome {
	/// Quota was available on the first check.
	Immediate,
	/// Quota was granted after at least one wait.
	Delayed,
	/// The caller gave up while waiting.
	Cancelled,
	/// A probe found no quota and consumed nothing.
	Denied,
}
impl AcquireOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AcquireOutcome::Immediate => "immediate",
			AcquireOutcome::Delayed => "delayed",
			AcquireOutcome::Cancelled => "cancelled",
			AcquireOutcome::Denied => "denied",
		}
	}
}
impl Display for AcquireOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
