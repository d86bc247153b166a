//! Shared token-bucket limiter that blocks callers until quota regenerates.
//!
//! A [`RateLimiter`] admits at most `capacity` operations per `window`. Tokens regenerate
//! continuously, proportionally to elapsed time, so a drained bucket releases one waiter every
//! `window / capacity` instead of waking every waiter at a window boundary. Callers are never
//! rejected: [`RateLimiter::acquire`] computes the exact deficit wait, parks outside the
//! critical section, and re-checks until a token is available.
//!
//! One instance throttles everything that shares it, so construct it once and hand out
//! `Arc<RateLimiter>` clones.

mod metrics;
mod state;

pub use self::metrics::LimiterMetrics;

// self
use crate::{
	_prelude::*,
	cancel::CancelToken,
	clock::{Clock, ParkOutcome, SystemClock},
	config::RateLimitConfig,
	error::{CancelledError, ConfigError},
	obs::{self, AcquireMode, AcquireOutcome, AcquireSpan},
	policy::{RateLimitDecision, RetryDirective},
};
use self::state::{BucketState, Refill};

/// Process-local token bucket shared by every caller that must be throttled together.
#[derive(Debug)]
pub struct RateLimiter {
	config: RateLimitConfig,
	refill: Refill,
	state: Mutex<BucketState>,
	clock: Arc<dyn Clock>,
	metrics: LimiterMetrics,
}
impl RateLimiter {
	/// Creates a full limiter driven by the system clock.
	pub fn new(config: RateLimitConfig) -> Self {
		Self::with_clock(config, SystemClock)
	}

	/// Validates `capacity`/`window` and creates a full limiter driven by the system clock.
	pub fn with_quota(capacity: u32, window: Duration) -> Result<Self, ConfigError> {
		Ok(Self::new(RateLimitConfig::new(capacity, window)?))
	}

	/// Creates a full limiter driven by a custom clock.
	pub fn with_clock(config: RateLimitConfig, clock: impl 'static + Clock) -> Self {
		let clock: Arc<dyn Clock> = Arc::new(clock);
		let refill = Refill::new(&config);
		let state = Mutex::new(BucketState::full(&refill, clock.now()));

		Self { config, refill, state, clock, metrics: LimiterMetrics::default() }
	}

	/// Maximum operations admitted per window.
	pub fn capacity(&self) -> u32 {
		self.config.capacity()
	}

	/// Refill period.
	pub fn window(&self) -> Duration {
		self.config.window()
	}

	/// Configuration the limiter was built from.
	pub fn config(&self) -> &RateLimitConfig {
		&self.config
	}

	/// Counters describing the limiter's history.
	pub fn metrics(&self) -> &LimiterMetrics {
		&self.metrics
	}

	/// Currently spendable quota after crediting elapsed time; always within `[0, capacity]`.
	pub fn available_tokens(&self) -> f64 {
		let mut state = self.state.lock();

		state.refill(&self.refill, self.clock.now());

		state.tokens(&self.refill)
	}

	/// Blocks until one unit of quota is available, then consumes it.
	///
	/// Never fails: excess callers are delayed, not rejected. No FIFO order is guaranteed
	/// between waiters.
	pub fn acquire(&self) {
		let mut pending = PendingAcquire::new(self, AcquireMode::Blocking);
		let _entered = pending.span.clone().entered();

		// Without a cancel token an early wake-up only means another refill check.
		while let Err(wait) = self.grab() {
			pending.delayed = true;

			self.clock.park(wait, None);
		}

		pending.complete();
	}

	/// Like [`acquire`](Self::acquire), but gives up once `cancel` fires.
	///
	/// A cancelled caller consumes nothing and leaves the bucket untouched for other waiters.
	pub fn acquire_cancellable(&self, cancel: &CancelToken) -> Result<()> {
		let mut pending = PendingAcquire::new(self, AcquireMode::Cancellable);
		let _entered = pending.span.clone().entered();

		loop {
			if cancel.is_cancelled() {
				return Err(pending.cancel().into());
			}

			match self.grab() {
				Ok(()) => {
					pending.complete();

					return Ok(());
				},
				Err(wait) => {
					pending.delayed = true;

					// A clock may wake early on its own; only the token itself cancels.
					if self.clock.park(wait, Some(cancel)) == ParkOutcome::Cancelled
						&& cancel.is_cancelled()
					{
						return Err(pending.cancel().into());
					}
				},
			}
		}
	}

	/// Async variant of [`acquire`](Self::acquire) that waits with the caller's `sleep`.
	///
	/// Passing the runtime's timer (for example `tokio::time::sleep`) keeps this crate runtime
	/// agnostic. Dropping the returned future cancels the wait without consuming quota; the
	/// bucket lock is never held across an `.await`.
	pub async fn acquire_async<S, F>(&self, sleep: S)
	where
		S: Fn(Duration) -> F,
		F: Future<Output = ()>,
	{
		let mut pending = PendingAcquire::new(self, AcquireMode::Async);
		let span = pending.span.clone();

		span.instrument(async move {
			while let Err(wait) = self.grab() {
				pending.delayed = true;

				sleep(wait).await;
			}

			pending.complete();
		})
		.await
	}

	/// Non-blocking probe: consumes one unit and returns [`RateLimitDecision::Allow`], or
	/// returns [`RateLimitDecision::Delay`] with the exact wait and consumes nothing.
	pub fn try_acquire(&self) -> RateLimitDecision {
		match self.grab() {
			Ok(()) => {
				self.metrics.record_acquired(false);
				obs::record_acquire_outcome(AcquireMode::Probe, AcquireOutcome::Immediate);

				RateLimitDecision::Allow
			},
			Err(wait) => {
				self.metrics.record_denied();
				obs::record_acquire_outcome(AcquireMode::Probe, AcquireOutcome::Denied);

				let reason =
					format!("Quota of {} per {:?} is spent.", self.capacity(), self.window());

				RateLimitDecision::Delay(
					RetryDirective::new(OffsetDateTime::now_utc() + wait, wait).with_reason(reason),
				)
			},
		}
	}

	// Refill, check and decrement in one critical section; the guard drops before any wait.
	fn grab(&self) -> Result<(), Duration> {
		let (outcome, tokens) = {
			let mut state = self.state.lock();

			state.refill(&self.refill, self.clock.now());

			let outcome = state.take(&self.refill);

			(outcome, state.tokens(&self.refill))
		};

		if let Err(wait) = outcome {
			obs::trace_wait(wait, tokens);
		}

		outcome
	}
}

// Tracks one in-flight acquisition; dropping it unfinished counts as a cancellation.
struct PendingAcquire<'a> {
	limiter: &'a RateLimiter,
	mode: AcquireMode,
	span: AcquireSpan,
	started: Instant,
	delayed: bool,
	done: bool,
}
impl<'a> PendingAcquire<'a> {
	fn new(limiter: &'a RateLimiter, mode: AcquireMode) -> Self {
		let span = AcquireSpan::new(mode, limiter.capacity(), limiter.window());

		Self { limiter, mode, span, started: limiter.clock.now(), delayed: false, done: false }
	}

	fn waited(&self) -> Duration {
		self.limiter.clock.now().saturating_duration_since(self.started)
	}

	fn complete(&mut self) {
		self.done = true;
		self.limiter.metrics.record_acquired(self.delayed);

		let outcome =
			if self.delayed { AcquireOutcome::Delayed } else { AcquireOutcome::Immediate };

		if self.delayed {
			obs::record_wait(self.mode, self.waited());
		}

		self.span.record_outcome(outcome);
		obs::record_acquire_outcome(self.mode, outcome);
	}

	fn cancel(&mut self) -> CancelledError {
		self.done = true;
		self.record_cancelled();

		CancelledError { waited: self.waited() }
	}

	fn record_cancelled(&self) {
		self.limiter.metrics.record_cancelled();
		self.span.record_outcome(AcquireOutcome::Cancelled);
		obs::record_acquire_outcome(self.mode, AcquireOutcome::Cancelled);
	}
}
impl Drop for PendingAcquire<'_> {
	fn drop(&mut self) {
		if !self.done {
			self.record_cancelled();
		}
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::future;
	// self
	use super::*;
	use crate::clock::ManualClock;

	fn manual_limiter(capacity: u32, window: Duration) -> (RateLimiter, ManualClock) {
		let clock = ManualClock::new();
		let config =
			RateLimitConfig::new(capacity, window).expect("Limiter fixture config should validate.");

		(RateLimiter::with_clock(config, clock.clone()), clock)
	}

	#[test]
	fn starts_full_and_bursts_up_to_capacity() {
		let (limiter, clock) = manual_limiter(10, Duration::from_secs(1));

		assert_eq!(limiter.available_tokens(), 10.);

		for _ in 0..10 {
			limiter.acquire();
		}

		assert_eq!(clock.elapsed(), Duration::ZERO);
		assert_eq!(limiter.metrics().acquired(), 10);
		assert_eq!(limiter.metrics().delayed(), 0);
	}

	#[test]
	fn eleventh_caller_waits_one_tenth_of_window() {
		let (limiter, clock) = manual_limiter(10, Duration::from_secs(1));

		for _ in 0..10 {
			limiter.acquire();
		}

		limiter.acquire();

		assert_eq!(clock.elapsed(), Duration::from_millis(100));
		assert_eq!(limiter.metrics().delayed(), 1);
		assert!(limiter.available_tokens() < 1.);
	}

	#[test]
	fn sequential_callers_never_exceed_quota_after_burst() {
		let capacity = 5;
		let window = Duration::from_millis(200);
		let (limiter, clock) = manual_limiter(capacity, window);
		let mut stamps = Vec::new();

		for _ in 0..60 {
			limiter.acquire();
			stamps.push(clock.elapsed());

			let tokens = limiter.available_tokens();

			assert!((0. ..=f64::from(capacity)).contains(&tokens));
		}

		let burst_end = stamps[capacity as usize - 1];

		for (i, start) in stamps.iter().enumerate().filter(|(_, s)| **s > burst_end) {
			let in_window = stamps[i..].iter().take_while(|s| **s < *start + window).count();

			assert!(
				in_window <= capacity as usize + 1,
				"{in_window} completions within one window starting at {start:?}."
			);
		}

		// 55 callers beyond the initial burst at one token every 40ms.
		assert_eq!(clock.elapsed(), Duration::from_millis(55 * 40));
	}

	#[test]
	fn cancelled_token_consumes_nothing() {
		let (limiter, _clock) = manual_limiter(1, Duration::from_secs(1));
		let token = CancelToken::new();

		token.cancel();

		let err = limiter
			.acquire_cancellable(&token)
			.expect_err("A cancelled token should abort the acquisition.");

		assert!(err.is_cancelled());
		assert_eq!(limiter.available_tokens(), 1.);
		assert_eq!(limiter.metrics().cancelled(), 1);
		assert_eq!(limiter.metrics().acquired(), 0);
	}

	#[test]
	fn try_acquire_reports_deficit_without_consuming() {
		let (limiter, clock) = manual_limiter(10, Duration::from_secs(1));

		for _ in 0..10 {
			assert_eq!(limiter.try_acquire(), RateLimitDecision::Allow);
		}

		clock.advance(Duration::from_millis(30));

		let RateLimitDecision::Delay(directive) = limiter.try_acquire() else {
			panic!("An empty bucket should ask the caller to wait.");
		};

		assert_eq!(directive.recommended_backoff, Duration::from_millis(70));
		assert!(directive.reason.is_some());
		assert_eq!(limiter.metrics().denied(), 1);

		clock.advance(Duration::from_millis(70));

		assert_eq!(limiter.try_acquire(), RateLimitDecision::Allow);
		assert_eq!(limiter.metrics().acquired(), 11);
	}

	#[tokio::test]
	async fn acquire_async_sleeps_the_exact_deficit() {
		let (limiter, clock) = manual_limiter(2, Duration::from_secs(1));
		let sleeper = clock.clone();
		let sleep = move |wait: Duration| {
			sleeper.advance(wait);

			future::ready(())
		};

		limiter.acquire_async(&sleep).await;
		limiter.acquire_async(&sleep).await;

		assert_eq!(clock.elapsed(), Duration::ZERO);

		limiter.acquire_async(&sleep).await;

		assert_eq!(clock.elapsed(), Duration::from_millis(500));
		assert_eq!(limiter.metrics().delayed(), 1);
	}

	#[tokio::test]
	async fn dropped_async_acquire_counts_as_cancelled() {
		let (limiter, _clock) = manual_limiter(1, Duration::from_secs(1));

		limiter.acquire();

		let timed_out = tokio::time::timeout(
			Duration::from_millis(20),
			limiter.acquire_async(|_| future::pending::<()>()),
		)
		.await;

		assert!(timed_out.is_err());
		assert_eq!(limiter.metrics().cancelled(), 1);
		assert_eq!(limiter.metrics().acquired(), 1);
		assert_eq!(limiter.available_tokens(), 0.);
	}

	// Reports every park as cancelled even though no token was ever handed to it.
	#[derive(Debug, Default)]
	struct InterruptingClock(ManualClock);
	impl Clock for InterruptingClock {
		fn now(&self) -> Instant {
			self.0.now()
		}

		fn park(&self, duration: Duration, _cancel: Option<&CancelToken>) -> ParkOutcome {
			self.0.advance(duration);

			ParkOutcome::Cancelled
		}
	}

	#[test]
	fn spurious_cancelled_park_never_grants_free_quota() {
		let clock = InterruptingClock::default();
		let timeline = clock.0.clone();
		let config = RateLimitConfig::new(1, Duration::from_secs(3_600))
			.expect("Limiter fixture config should validate.");
		let limiter = RateLimiter::with_clock(config, clock);

		for _ in 0..3 {
			limiter.acquire();
		}

		assert_eq!(timeline.elapsed(), Duration::from_secs(2 * 3_600));
		assert_eq!(limiter.metrics().acquired(), 3);
		assert_eq!(limiter.metrics().cancelled(), 0);
		assert_eq!(limiter.available_tokens(), 0.);

		let token = CancelToken::new();

		limiter.acquire_cancellable(&token).expect("An untouched token should not cancel the wait.");

		assert_eq!(timeline.elapsed(), Duration::from_secs(3 * 3_600));
		assert_eq!(limiter.metrics().cancelled(), 0);
	}

	#[cfg(feature = "tracing")]
	mod traced {
		// std
		use std::sync::atomic::{AtomicUsize, Ordering};
		// crates.io
		use tracing::{
			Event, Metadata, Subscriber,
			field::{Field, Visit},
			span::{Attributes, Id, Record},
		};
		// self
		use super::*;

		#[derive(Debug, Default)]
		struct Observed {
			waits_outside_lock: AtomicUsize,
			waits_inside_lock: AtomicUsize,
			outcomes: Mutex<Vec<String>>,
		}

		struct LockAwareSubscriber {
			limiter: Arc<RateLimiter>,
			observed: Arc<Observed>,
		}
		impl Subscriber for LockAwareSubscriber {
			fn enabled(&self, _: &Metadata<'_>) -> bool {
				true
			}

			fn new_span(&self, _: &Attributes<'_>) -> Id {
				Id::from_u64(1)
			}

			fn record(&self, _: &Id, values: &Record<'_>) {
				values.record(&mut OutcomeVisitor(&self.observed));
			}

			fn record_follows_from(&self, _: &Id, _: &Id) {}

			fn event(&self, _: &Event<'_>) {
				let counter = if self.limiter.state.try_lock().is_some() {
					&self.observed.waits_outside_lock
				} else {
					&self.observed.waits_inside_lock
				};

				counter.fetch_add(1, Ordering::SeqCst);
			}

			fn enter(&self, _: &Id) {}

			fn exit(&self, _: &Id) {}
		}

		struct OutcomeVisitor<'a>(&'a Observed);
		impl Visit for OutcomeVisitor<'_> {
			fn record_str(&mut self, field: &Field, value: &str) {
				if field.name() == "outcome" {
					self.0.outcomes.lock().push(value.to_owned());
				}
			}

			fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
				if field.name() == "outcome" {
					self.0.outcomes.lock().push(format!("{value:?}"));
				}
			}
		}

		#[test]
		fn wait_events_fire_outside_the_bucket_lock() {
			let clock = ManualClock::new();
			let config = RateLimitConfig::new(1, Duration::from_secs(1))
				.expect("Limiter fixture config should validate.");
			let limiter = Arc::new(RateLimiter::with_clock(config, clock));
			let observed = Arc::new(Observed::default());
			let subscriber =
				LockAwareSubscriber { limiter: limiter.clone(), observed: observed.clone() };

			tracing::subscriber::with_default(subscriber, || {
				limiter.acquire();
				limiter.acquire();
			});

			assert_eq!(observed.waits_outside_lock.load(Ordering::SeqCst), 1);
			assert_eq!(observed.waits_inside_lock.load(Ordering::SeqCst), 0);
			assert_eq!(*observed.outcomes.lock(), ["immediate", "delayed"]);
		}
	}
}
