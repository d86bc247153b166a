//! Cooperative cancellation for callers parked inside
//! [`RateLimiter::acquire_cancellable`](crate::limiter::RateLimiter::acquire_cancellable).

// self
use crate::_prelude::*;

/// Cloneable cancellation handle; every clone observes the same flag.
///
/// Cancelling wakes all threads currently parked on the token.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<CancelState>);
impl CancelToken {
	/// Creates a token that has not been cancelled.
	pub fn new() -> Self {
		Self::default()
	}

	/// Flags the token and wakes every parked waiter. Idempotent.
	pub fn cancel(&self) {
		let mut cancelled = self.0.cancelled.lock();

		*cancelled = true;

		self.0.signal.notify_all();
	}

	/// Returns `true` once [`cancel`](Self::cancel) has been called.
	pub fn is_cancelled(&self) -> bool {
		*self.0.cancelled.lock()
	}

	/// Blocks for up to `timeout`, returning `true` if the token was cancelled.
	pub fn wait_timeout(&self, timeout: Duration) -> bool {
		let mut cancelled = self.0.cancelled.lock();

		match Instant::now().checked_add(timeout) {
			Some(deadline) =>
				while !*cancelled {
					if self.0.signal.wait_until(&mut cancelled, deadline).timed_out() {
						break;
					}
				},
			None =>
				while !*cancelled {
					self.0.signal.wait(&mut cancelled);
				},
		}

		*cancelled
	}
}

#[derive(Debug, Default)]
struct CancelState {
	cancelled: Mutex<bool>,
	signal: Condvar,
}

#[cfg(test)]
mod tests {
	// std
	use std::thread;
	// self
	use super::*;

	#[test]
	fn wait_times_out_when_not_cancelled() {
		let token = CancelToken::new();
		let started = Instant::now();

		assert!(!token.wait_timeout(Duration::from_millis(20)));
		assert!(started.elapsed() >= Duration::from_millis(20));
	}

	#[test]
	fn cancel_wakes_parked_waiter() {
		let token = CancelToken::new();
		let waiter = {
			let token = token.clone();

			thread::spawn(move || token.wait_timeout(Duration::from_secs(30)))
		};

		thread::sleep(Duration::from_millis(20));
		token.cancel();

		assert!(waiter.join().expect("Waiter thread should not panic."));
		assert!(token.is_cancelled());
	}
}
