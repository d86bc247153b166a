//! Demonstrates several workers sharing one quota through [`Throttled`].
//!
//! Run with `cargo run --example throttled_client`.

// std
use std::{sync::Arc, thread, time::Instant};
// self
use quota_throttle::{RateLimitConfig, RateLimiter, TimeUnit, Throttled};

/// Stand-in for an outbound API client; every method is one network operation.
#[derive(Debug)]
struct DocumentClient {
	base_url: String,
}
impl DocumentClient {
	fn fetch_auth_key(&self) -> String {
		format!("GET {}/auth/cert/key", self.base_url)
	}

	fn create_document(&self, worker: usize) -> String {
		format!("POST {}/lk/documents/create (worker {worker})", self.base_url)
	}
}

fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let limiter = Arc::new(RateLimiter::new(RateLimitConfig::per(TimeUnit::Second, 3)?));
	let client = Arc::new(Throttled::new(
		DocumentClient { base_url: "https://api.example.com/v3".into() },
		limiter.clone(),
	));
	let started = Instant::now();

	println!("{:>6.0?} {}", started.elapsed(), client.call(DocumentClient::fetch_auth_key));

	let workers = (0..6)
		.map(|worker| {
			let client = client.clone();

			thread::spawn(move || {
				let line = client.call(|c| c.create_document(worker));

				println!("{:>6.0?} {line}", started.elapsed());
			})
		})
		.collect::<Vec<_>>();

	for worker in workers {
		worker.join().map_err(|_| color_eyre::eyre::eyre!("Worker thread panicked."))?;
	}

	println!(
		"acquired={} delayed={} available={:.2}",
		limiter.metrics().acquired(),
		limiter.metrics().delayed(),
		limiter.available_tokens()
	);

	Ok(())
}
