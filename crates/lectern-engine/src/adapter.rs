//! Source adapter: rate limiting, retry and validation around a
//! [`VerseSource`].
//!
//! A fetch either yields usable data or a [`FetchFailed`] value. Nothing
//! escapes as a run-aborting error: callers treat a failure as "no data
//! available for this reference" and carry on. Once the run's cancellation
//! token fires no further request is issued, and the pending fetch fails
//! with [`SourceError::Cancelled`].

use std::{future::Future, sync::Arc, time::Duration};

use lectern_core::source::{
  ChapterRef, FetchedVerse, Reference, SourceError, VerseRef, VerseSource,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::rate_limit::RateLimiter;

// ─── Retry policy ────────────────────────────────────────────────────────────

/// Linear backoff: after failed attempt `n` the adapter waits
/// `base_delay * n` before attempt `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Upper bound on requests issued for a single reference. Zero is
  /// treated as one.
  pub max_attempts: u32,
  pub base_delay:   Duration,
}

impl RetryPolicy {
  pub fn delay_after(&self, attempt: u32) -> Duration {
    self.base_delay.saturating_mul(attempt)
  }
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      base_delay:   Duration::from_secs(1),
    }
  }
}

// ─── Failure ─────────────────────────────────────────────────────────────────

/// Every attempt for a reference failed, or the provider rejected it
/// outright.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fetch failed for {reference} after {attempts} attempt(s): {last_error}")]
pub struct FetchFailed {
  pub reference:  Reference,
  pub attempts:   u32,
  pub last_error: SourceError,
}

// ─── Adapter ─────────────────────────────────────────────────────────────────

pub struct SourceAdapter<V> {
  source:  V,
  limiter: Arc<RateLimiter>,
  policy:  RetryPolicy,
}

impl<V: VerseSource> SourceAdapter<V> {
  pub fn new(source: V, limiter: Arc<RateLimiter>, policy: RetryPolicy) -> Self {
    Self { source, limiter, policy }
  }

  pub fn source(&self) -> &V { &self.source }

  /// Fetch a whole chapter. Entries with blank text are dropped; a response
  /// with no remaining entries counts as a failed attempt.
  pub async fn fetch_chapter(
    &self,
    reference: &ChapterRef,
    cancel: &CancellationToken,
  ) -> Result<Vec<FetchedVerse>, FetchFailed> {
    self
      .with_retry(Reference::Chapter(reference.clone()), cancel, move || {
        self.attempt_chapter(reference)
      })
      .await
  }

  /// Fetch a single verse's text. Blank text counts as a failed attempt.
  pub async fn fetch_verse(
    &self,
    reference: &VerseRef,
    cancel: &CancellationToken,
  ) -> Result<String, FetchFailed> {
    self
      .with_retry(Reference::Verse(reference.clone()), cancel, move || {
        self.attempt_verse(reference)
      })
      .await
  }

  async fn attempt_chapter(
    &self,
    reference: &ChapterRef,
  ) -> Result<Vec<FetchedVerse>, SourceError> {
    let verses: Vec<FetchedVerse> = self
      .source
      .fetch_chapter(reference)
      .await?
      .into_iter()
      .filter(|v| v.verse_number > 0 && !v.text.trim().is_empty())
      .collect();
    if verses.is_empty() {
      return Err(SourceError::Empty);
    }
    Ok(verses)
  }

  async fn attempt_verse(&self, reference: &VerseRef) -> Result<String, SourceError> {
    let text = self.source.fetch_verse(reference).await?;
    let text = text.trim();
    if text.is_empty() {
      return Err(SourceError::Empty);
    }
    Ok(text.to_owned())
  }

  async fn with_retry<T, F, Fut>(
    &self,
    reference: Reference,
    cancel: &CancellationToken,
    mut attempt_once: F,
  ) -> Result<T, FetchFailed>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
  {
    let max_attempts = self.policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
      let throttled = !cancel.is_cancelled()
        && tokio::select! {
          _ = cancel.cancelled() => false,
          _ = self.limiter.throttle() => true,
        };
      if !throttled {
        tracing::debug!(reference = %reference, attempts = attempt, "Fetch abandoned");
        return Err(FetchFailed {
          reference,
          attempts: attempt,
          last_error: SourceError::Cancelled,
        });
      }
      attempt += 1;

      match attempt_once().await {
        Ok(value) => {
          if attempt > 1 {
            tracing::debug!(reference = %reference, attempt, "Fetch succeeded after retry");
          }
          return Ok(value);
        }
        Err(error) if error.is_transient() && attempt < max_attempts => {
          let delay = self.policy.delay_after(attempt);
          tracing::warn!(
            reference = %reference,
            attempt,
            max_attempts,
            error = %error,
            "Fetch failed; retrying in {delay:?}"
          );
          tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(delay) => {}
          }
        }
        Err(last_error) => {
          return Err(FetchFailed {
            reference,
            attempts: attempt,
            last_error,
          });
        }
      }
    }
  }
}
