//! Error type for `lectern-engine`.
//!
//! These errors abort a run. Per-cell failures never surface here; they are
//! collected into the run summary instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("unknown book: {0:?}")]
  UnknownBook(String),

  #[error("base translation must not be empty")]
  EmptyBaseTranslation,
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
