//! Error types for `lectern-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("chapter number must be 1-based, got 0")]
  ZeroChapter,

  #[error("verse number must be 1-based, got 0")]
  ZeroVerse,

  #[error("verse text must not be empty")]
  EmptyText,

  #[error("translation code must not be empty")]
  EmptyTranslation,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
