//! Shared token-bucket throttle for outbound API clients: callers over quota are delayed until
//! capacity regenerates, never rejected.
//!
//! Build one [`RateLimiter`] per quota, share it through `Arc`, and call
//! [`RateLimiter::acquire`] (or wrap the client in [`Throttled`]) before every outbound
//! operation.
//!
//! ```
//! use std::{sync::Arc, time::Duration};
//!
//! use quota_throttle::{RateLimiter, Throttled};
//!
//! let limiter = Arc::new(RateLimiter::with_quota(10, Duration::from_secs(1))?);
//! let client = Throttled::new("client", limiter.clone());
//!
//! assert_eq!(client.call(|name| name.len()), 6);
//! assert_eq!(limiter.metrics().acquired(), 1);
//! # Ok::<(), quota_throttle::error::ConfigError>(())
//! ```

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cancel;
pub mod clock;
pub mod config;
pub mod error;
pub mod limiter;
pub mod obs;
pub mod policy;
pub mod throttle;

pub use cancel::CancelToken;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RateLimitConfig, TimeUnit};
pub use error::{Error, Result};
pub use limiter::{LimiterMetrics, RateLimiter};
pub use policy::{RateLimitDecision, RateLimitPolicy, RetryDirective};
pub use throttle::Throttled;

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		sync::Arc,
		time::{Duration, Instant},
	};

	pub use parking_lot::{Condvar, Mutex};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;

	pub use crate::error::{Error, Result};
}

#[cfg(test)] use color_eyre as _;
