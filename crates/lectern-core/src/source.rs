//! The `VerseSource` trait: a remote provider of verse text.
//!
//! A source performs exactly one outbound request per call. Retries,
//! rate limiting and response validation are layered on top by the engine's
//! source adapter, so implementations stay thin.

use std::{fmt, future::Future};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── References ──────────────────────────────────────────────────────────────

/// Address of a whole chapter under one translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChapterRef {
  pub book:        String,
  pub chapter:     u32,
  pub translation: String,
}

impl fmt::Display for ChapterRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {} ({})", self.book, self.chapter, self.translation)
  }
}

/// Address of a single verse under one translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VerseRef {
  pub book:        String,
  pub chapter:     u32,
  pub verse:       u32,
  pub translation: String,
}

impl fmt::Display for VerseRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} {}:{} ({})",
      self.book, self.chapter, self.verse, self.translation
    )
  }
}

/// A reference of either shape, carried by fetch failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
  Chapter(ChapterRef),
  Verse(VerseRef),
}

impl fmt::Display for Reference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Chapter(r) => fmt::Display::fmt(r, f),
      Self::Verse(r) => fmt::Display::fmt(r, f),
    }
  }
}

// ─── Payload ─────────────────────────────────────────────────────────────────

/// One verse of a fetched chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedVerse {
  pub verse_number: u32,
  pub text:         String,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Why a single fetch attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
  #[error("network error: {0}")]
  Network(String),

  #[error("request timed out")]
  Timeout,

  #[error("provider returned HTTP {0}")]
  Status(u16),

  #[error("reference not found")]
  NotFound,

  #[error("malformed response: {0}")]
  Malformed(String),

  #[error("response contained no verse text")]
  Empty,

  /// The run was interrupted before the request went out.
  #[error("interrupted")]
  Cancelled,
}

impl SourceError {
  /// Whether another attempt could plausibly succeed.
  ///
  /// Client errors other than 429 describe the request itself, so retrying
  /// them only burns quota.
  pub fn is_transient(&self) -> bool {
    match self {
      Self::NotFound | Self::Cancelled => false,
      Self::Status(code) => *code == 429 || !(400..500).contains(code),
      Self::Network(_) | Self::Timeout | Self::Malformed(_) | Self::Empty => {
        true
      }
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a remote verse-text provider.
pub trait VerseSource: Send + Sync {
  /// Fetch every verse of a chapter.
  fn fetch_chapter<'a>(
    &'a self,
    reference: &'a ChapterRef,
  ) -> impl Future<Output = Result<Vec<FetchedVerse>, SourceError>> + Send + 'a;

  /// Fetch the text of a single verse.
  fn fetch_verse<'a>(
    &'a self,
    reference: &'a VerseRef,
  ) -> impl Future<Output = Result<String, SourceError>> + Send + 'a;
}
