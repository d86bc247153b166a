//! Seam between the limiter and the API client it gates.
//!
//! [`Throttled`] pairs any collaborator with a shared [`RateLimiter`] and acquires exactly one
//! unit before every operation it runs. What the operation does (transport, payload encoding,
//! authentication) stays with the collaborator.

// self
use crate::{_prelude::*, cancel::CancelToken, limiter::RateLimiter};

/// A collaborator whose every call is gated by a shared [`RateLimiter`].
///
/// Several `Throttled` values built from clones of one `Arc<RateLimiter>` share one quota.
#[derive(Debug)]
pub struct Throttled<T> {
	inner: T,
	limiter: Arc<RateLimiter>,
}
impl<T> Throttled<T> {
	/// Gates `inner` behind `limiter`.
	pub fn new(inner: T, limiter: Arc<RateLimiter>) -> Self {
		Self { inner, limiter }
	}

	/// Shared limiter handle.
	pub fn limiter(&self) -> &Arc<RateLimiter> {
		&self.limiter
	}

	/// Borrows the collaborator without consuming quota.
	pub fn inner(&self) -> &T {
		&self.inner
	}

	/// Releases the collaborator.
	pub fn into_inner(self) -> T {
		self.inner
	}

	/// Blocks for one unit of quota, then runs `op`.
	pub fn call<R>(&self, op: impl FnOnce(&T) -> R) -> R {
		self.limiter.acquire();

		op(&self.inner)
	}

	/// Like [`call`](Self::call), but skips `op` entirely if `cancel` fires while waiting.
	pub fn call_cancellable<R>(&self, cancel: &CancelToken, op: impl FnOnce(&T) -> R) -> Result<R> {
		self.limiter.acquire_cancellable(cancel)?;

		Ok(op(&self.inner))
	}

	/// Async form of [`call`](Self::call); `sleep` is the runtime's timer.
	pub async fn call_async<'a, S, F, Op, Fut>(&'a self, sleep: S, op: Op) -> Fut::Output
	where
		S: Fn(Duration) -> F,
		F: Future<Output = ()>,
		Op: FnOnce(&'a T) -> Fut,
		Fut: Future,
	{
		self.limiter.acquire_async(sleep).await;

		op(&self.inner).await
	}
}
