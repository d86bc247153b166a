//! Non-blocking rate-limit decisions for callers that schedule their own retries.
//!
//! [`RateLimiter::acquire`](crate::limiter::RateLimiter::acquire) is the primary contract and
//! never rejects. [`RateLimitPolicy`] exposes the same bucket as a probe so a scheduler can
//! defer work instead of parking a thread.

// self
use crate::{_prelude::*, limiter::RateLimiter};

/// Strategy consulted before an outbound call is made.
pub trait RateLimitPolicy
where
	Self: Send + Sync,
{
	/// Evaluates whether the next call may proceed now. `Allow` consumes quota.
	fn evaluate(&self) -> RateLimitDecision;
}
impl RateLimitPolicy for RateLimiter {
	fn evaluate(&self) -> RateLimitDecision {
		self.try_acquire()
	}
}

/// Result emitted by a [`RateLimitPolicy`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
	/// The request may proceed immediately.
	Allow,
	/// The request should be delayed.
	Delay(RetryDirective),
}
impl RateLimitDecision {
	/// Returns `true` for [`RateLimitDecision::Allow`].
	pub fn is_allow(&self) -> bool {
		matches!(self, Self::Allow)
	}
}

/// Advises callers when to retry after a [`RateLimitDecision::Delay`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryDirective {
	/// Wall-clock instant when one unit of quota will be available.
	pub earliest_retry_at: OffsetDateTime,
	/// Wait until that instant, measured on the limiter's clock.
	pub recommended_backoff: Duration,
	/// Optional descriptive string.
	pub reason: Option<String>,
}
impl RetryDirective {
	/// Creates a new directive with the provided timing metadata.
	pub fn new(earliest_retry_at: OffsetDateTime, recommended_backoff: Duration) -> Self {
		Self { earliest_retry_at, recommended_backoff, reason: None }
	}

	/// Adds a human-readable reason.
	pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());

		self
	}
}
