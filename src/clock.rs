//! Time sources for the limiter.
//!
//! [`SystemClock`] reads the monotonic clock and parks real threads. [`ManualClock`] keeps a
//! virtual timeline so tests can drive refill arithmetic without sleeping.

// std
use std::thread;
// self
use crate::{_prelude::*, cancel::CancelToken};

/// Result of [`Clock::park`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParkOutcome {
	/// The requested duration passed.
	Elapsed,
	/// The cancel token fired first.
	Cancelled,
}

/// Monotonic time source plus the blocking wait the limiter uses between refill checks.
pub trait Clock
where
	Self: Debug + Send + Sync,
{
	/// Current monotonic instant.
	fn now(&self) -> Instant;

	/// Blocks the calling thread for at most `duration`.
	///
	/// Implementations return [`ParkOutcome::Cancelled`] as soon as `cancel` fires and must
	/// never spin.
	fn park(&self, duration: Duration, cancel: Option<&CancelToken>) -> ParkOutcome;
}

/// Wall-time clock backed by [`Instant::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> Instant {
		Instant::now()
	}

	fn park(&self, duration: Duration, cancel: Option<&CancelToken>) -> ParkOutcome {
		match cancel {
			Some(token) if token.wait_timeout(duration) => ParkOutcome::Cancelled,
			Some(_) => ParkOutcome::Elapsed,
			None => {
				thread::sleep(duration);

				ParkOutcome::Elapsed
			},
		}
	}
}

/// Deterministic clock; clones share one timeline.
///
/// Parking advances the shared timeline by the requested duration instead of sleeping.
#[derive(Clone, Debug)]
pub struct ManualClock {
	origin: Instant,
	offset: Arc<Mutex<Duration>>,
}
impl ManualClock {
	/// Starts a timeline anchored at the current instant.
	pub fn new() -> Self {
		Self { origin: Instant::now(), offset: Arc::new(Mutex::new(Duration::ZERO)) }
	}

	/// Moves the timeline forward.
	pub fn advance(&self, by: Duration) {
		*self.offset.lock() += by;
	}

	/// Virtual time elapsed since the clock was created.
	pub fn elapsed(&self) -> Duration {
		*self.offset.lock()
	}
}
impl Default for ManualClock {
	fn default() -> Self {
		Self::new()
	}
}
impl Clock for ManualClock {
	fn now(&self) -> Instant {
		self.origin + self.elapsed()
	}

	fn park(&self, duration: Duration, cancel: Option<&CancelToken>) -> ParkOutcome {
		if cancel.is_some_and(CancelToken::is_cancelled) {
			return ParkOutcome::Cancelled;
		}

		self.advance(duration);

		ParkOutcome::Elapsed
	}
}
