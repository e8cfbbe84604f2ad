//! HTTP verse provider for Lectern.
//!
//! [`BibleApiClient`] implements [`lectern_core::source::VerseSource`]
//! against a bible-api style endpoint: `GET {base}/{book}+{chapter}` for a
//! whole chapter and `GET {base}/{book}+{chapter}:{verse}` for a single
//! verse, each with a `translation` query selector.

mod client;
mod wire;

pub mod error;

pub use client::{BibleApiClient, ClientConfig};
pub use error::{Error, Result};
