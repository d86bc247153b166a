// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for limiter acquisitions.
#[derive(Debug, Default)]
pub struct LimiterMetrics {
	acquired: AtomicU64,
	delayed: AtomicU64,
	cancelled: AtomicU64,
	denied: AtomicU64,
}
impl LimiterMetrics {
	/// Returns the number of units handed out (immediate or after waiting).
	pub fn acquired(&self) -> u64 {
		self.acquired.load(Ordering::Relaxed)
	}

	/// Returns the number of acquisitions that had to wait at least once.
	pub fn delayed(&self) -> u64 {
		self.delayed.load(Ordering::Relaxed)
	}

	/// Returns the number of waits abandoned through cancellation.
	pub fn cancelled(&self) -> u64 {
		self.cancelled.load(Ordering::Relaxed)
	}

	/// Returns the number of non-blocking probes that found no quota.
	pub fn denied(&self) -> u64 {
		self.denied.load(Ordering::Relaxed)
	}

	pub(crate) fn record_acquired(&self, delayed: bool) {
		self.acquired.fetch_add(1, Ordering::Relaxed);

		if delayed {
			self.delayed.fetch_add(1, Ordering::Relaxed);
		}
	}

	pub(crate) fn record_cancelled(&self) {
		self.cancelled.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_denied(&self) {
		self.denied.fetch_add(1, Ordering::Relaxed);
	}
}
