//! Core types and trait definitions for the Lectern scripture corpus.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::CorpusStore`]; remote text providers
//! implement [`source::VerseSource`]. The reconciliation engine depends only
//! on these two abstractions.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod model;
pub mod source;
pub mod store;

pub use error::{Error, Result};

/// Minimum number of non-whitespace characters a verse text must carry to
/// count as populated.
///
/// This is a heuristic: short placeholder text is indistinguishable from a
/// verse that was never fetched, so anything at or below this length is
/// treated as absent by the overlay builder and rejected when fetched.
pub const DEFAULT_MIN_TEXT_LEN: usize = 3;

/// Returns `true` if `text` carries more than `min_len` non-whitespace
/// characters.
pub fn is_usable_text(text: &str, min_len: usize) -> bool {
  text.chars().filter(|c| !c.is_whitespace()).count() > min_len
}
