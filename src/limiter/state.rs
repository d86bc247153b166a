//! Token accounting for the continuous-refill bucket.
//!
//! Quota is tracked in fixed point: one token is `window_nanos` units and every elapsed
//! nanosecond credits `capacity` units. Fractional tokens are therefore exact, and the wait
//! for a deficit is an exact (rounded up) number of nanoseconds.

// self
use crate::{_prelude::*, config::RateLimitConfig};

/// Precomputed refill rate.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Refill {
	capacity: u128,
	window_nanos: u128,
}
impl Refill {
	pub(crate) fn new(config: &RateLimitConfig) -> Self {
		Self { capacity: u128::from(config.capacity()), window_nanos: config.window().as_nanos() }
	}

	fn max_level(&self) -> u128 {
		self.capacity.saturating_mul(self.window_nanos)
	}

	fn credit(&self, elapsed: Duration) -> u128 {
		elapsed.as_nanos().saturating_mul(self.capacity)
	}

	/// Time needed to regenerate `deficit` units.
	fn wait_for(&self, deficit: u128) -> Duration {
		let nanos = deficit.div_ceil(self.capacity);

		Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
	}
}

/// Mutable bucket state; always guarded by the limiter's mutex.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BucketState {
	level: u128,
	last_refill: Instant,
}
impl BucketState {
	pub(crate) fn full(refill: &Refill, now: Instant) -> Self {
		Self { level: refill.max_level(), last_refill: now }
	}

	/// Spendable quota in tokens.
	pub(crate) fn tokens(&self, refill: &Refill) -> f64 {
		self.level as f64 / refill.window_nanos as f64
	}

	/// Credits tokens for the time since the last refill, capped at capacity.
	pub(crate) fn refill(&mut self, refill: &Refill, now: Instant) {
		let elapsed = now.saturating_duration_since(self.last_refill);

		if elapsed.is_zero() {
			return;
		}

		self.level = self.level.saturating_add(refill.credit(elapsed)).min(refill.max_level());
		self.last_refill = now;
	}

	/// Consumes one token, or returns how long until one will be available.
	pub(crate) fn take(&mut self, refill: &Refill) -> Result<(), Duration> {
		match self.level.checked_sub(refill.window_nanos) {
			Some(level) => {
				self.level = level;

				Ok(())
			},
			None => Err(refill.wait_for(refill.window_nanos - self.level)),
		}
	}
}
