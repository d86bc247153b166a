//! Throttle-level error types shared by the limiter, its configuration, and the throttled
//! client seam.
//!
//! There is deliberately no "limit exceeded" variant: excess demand is absorbed by blocking.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Construction-time configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// A blocked caller's wait was cancelled before quota became available.
	#[error(transparent)]
	Cancelled(#[from] CancelledError),
}
impl Error {
	/// Returns `true` when the error signals a cancelled wait.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled(_))
	}
}

/// Configuration and validation failures raised while building a limiter.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Capacity of zero would never admit a caller.
	#[error("Capacity must allow at least one operation per window.")]
	ZeroCapacity,
	/// Capacity was negative.
	#[error("Capacity must not be negative, got {capacity}.")]
	NegativeCapacity {
		/// Raw capacity supplied by the caller.
		capacity: i64,
	},
	/// Capacity does not fit the supported range.
	#[error("Capacity {capacity} exceeds the supported range.")]
	CapacityOutOfRange {
		/// Raw capacity supplied by the caller.
		capacity: i64,
	},
	/// Window was zero or negative.
	#[error("The window must be a positive duration.")]
	NonPositiveWindow,
	/// Both `window_ms` and `unit` were supplied.
	#[error("Specify either window_ms or unit, not both.")]
	AmbiguousWindow,
	/// Neither `window_ms` nor `unit` was supplied.
	#[error("Rate limit configuration is missing a window.")]
	MissingWindow,
	/// Configuration document could not be parsed.
	#[error("Rate limit configuration is malformed.")]
	Parse {
		/// Structured parsing failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
	},
}

/// Raised to a caller whose wait was cancelled; no quota was consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("Acquire was cancelled after waiting {waited:?}.")]
pub struct CancelledError {
	/// Time spent parked before the cancellation was observed.
	pub waited: Duration,
}
