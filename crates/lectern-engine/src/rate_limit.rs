//! Minimum spacing between outbound fetches.
//!
//! One limiter is shared by every caller in a run. The lock is held across
//! the wait, so concurrent callers queue up and the aggregate request rate
//! stays bounded regardless of how many cells are in flight.

use std::time::Duration;

use tokio::{sync::Mutex, time::Instant};

pub struct RateLimiter {
  last_request: Mutex<Option<Instant>>,
  min_interval: Duration,
}

impl RateLimiter {
  pub fn new(min_interval: Duration) -> Self {
    Self {
      last_request: Mutex::new(None),
      min_interval,
    }
  }

  pub fn min_interval(&self) -> Duration { self.min_interval }

  /// Wait until at least `min_interval` has passed since the previous
  /// request, then claim the slot.
  pub async fn throttle(&self) {
    let mut last = self.last_request.lock().await;

    if let Some(last_time) = *last {
      let elapsed = last_time.elapsed();
      if elapsed < self.min_interval {
        let wait_time = self.min_interval - elapsed;
        tracing::debug!("Rate limiting: waiting {:?}", wait_time);
        tokio::time::sleep(wait_time).await;
      }
    }

    *last = Some(Instant::now());
  }
}
