//! Response bodies returned by the provider.

use serde::Deserialize;

/// Body of a successful lookup. Chapter and single-verse lookups share this
/// shape; a single-verse lookup carries one entry in `verses`.
#[derive(Debug, Deserialize)]
pub struct PassageResponse {
  #[serde(default)]
  pub verses: Vec<WireVerse>,
  /// Concatenated passage text.
  #[serde(default)]
  pub text:   Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireVerse {
  pub chapter: u32,
  pub verse:   u32,
  pub text:    String,
}
