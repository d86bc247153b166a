//! Construction surface for [`RateLimiter`](crate::limiter::RateLimiter).
//!
//! A configuration is `{capacity, window}`: at most `capacity` operations per `window`.
//! Values are validated once, here, so a built limiter never re-checks them.
//!
//! The JSON form accepts either a millisecond window or a named unit:
//!
//! ```json
//! { "capacity": 10, "window_ms": 1000 }
//! { "capacity": 10, "unit": "minute" }
//! ```

// self
use crate::{_prelude::*, error::ConfigError};

/// Named refill periods, matching the common "N requests per second/minute" quotas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
	/// One second.
	Second,
	/// One minute.
	Minute,
	/// One hour.
	Hour,
}
impl TimeUnit {
	/// Returns the unit as a [`Duration`].
	pub const fn as_duration(self) -> Duration {
		match self {
			TimeUnit::Second => Duration::from_secs(1),
			TimeUnit::Minute => Duration::from_secs(60),
			TimeUnit::Hour => Duration::from_secs(60 * 60),
		}
	}

	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			TimeUnit::Second => "second",
			TimeUnit::Minute => "minute",
			TimeUnit::Hour => "hour",
		}
	}
}
impl Display for TimeUnit {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Validated quota: `capacity` operations per `window`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRateLimitConfig", into = "RawRateLimitConfig")]
pub struct RateLimitConfig {
	capacity: u32,
	window: Duration,
}
impl RateLimitConfig {
	/// Creates a configuration, rejecting a zero capacity or an empty window.
	pub fn new(capacity: u32, window: Duration) -> Result<Self, ConfigError> {
		if capacity == 0 {
			return Err(ConfigError::ZeroCapacity);
		}
		if window.is_zero() {
			return Err(ConfigError::NonPositiveWindow);
		}

		Ok(Self { capacity, window })
	}

	/// Creates a configuration allowing `capacity` operations per `unit`.
	pub fn per(unit: TimeUnit, capacity: u32) -> Result<Self, ConfigError> {
		Self::new(capacity, unit.as_duration())
	}

	/// Parses a JSON document, reporting the failing path on malformed input.
	pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
		let de = &mut serde_json::Deserializer::from_str(input);
		let raw: RawRateLimitConfig = serde_path_to_error::deserialize(de)
			.map_err(|source| ConfigError::Parse { source })?;

		Self::try_from(raw)
	}

	/// Maximum operations admitted per window.
	pub fn capacity(&self) -> u32 {
		self.capacity
	}

	/// Refill period.
	pub fn window(&self) -> Duration {
		self.window
	}
}

// Signed fields so negative input surfaces as a validation error rather than a type error.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRateLimitConfig {
	capacity: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	window_ms: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	unit: Option<TimeUnit>,
}
impl TryFrom<RawRateLimitConfig> for RateLimitConfig {
	type Error = ConfigError;

	fn try_from(raw: RawRateLimitConfig) -> Result<Self, Self::Error> {
		let capacity = match raw.capacity {
			c if c < 0 => return Err(ConfigError::NegativeCapacity { capacity: c }),
			c => u32::try_from(c).map_err(|_| ConfigError::CapacityOutOfRange { capacity: c })?,
		};
		let window = match (raw.window_ms, raw.unit) {
			(Some(_), Some(_)) => return Err(ConfigError::AmbiguousWindow),
			(None, None) => return Err(ConfigError::MissingWindow),
			(Some(ms), None) => match u64::try_from(ms) {
				Ok(ms) => Duration::from_millis(ms),
				Err(_) => return Err(ConfigError::NonPositiveWindow),
			},
			(None, Some(unit)) => unit.as_duration(),
		};

		Self::new(capacity, window)
	}
}
impl From<RateLimitConfig> for RawRateLimitConfig {
	fn from(config: RateLimitConfig) -> Self {
		Self {
			capacity: i64::from(config.capacity),
			window_ms: Some(i64::try_from(config.window.as_millis()).unwrap_or(i64::MAX)),
			unit: None,
		}
	}
}
