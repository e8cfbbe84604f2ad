//! Error type for `lectern-source-http`.
//!
//! Only construction can fail here. Per-request failures are reported as
//! [`lectern_core::source::SourceError`] so the engine can classify them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid base url {0:?}")]
  InvalidBaseUrl(String),

  #[error("failed to build HTTP client: {0}")]
  Client(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
