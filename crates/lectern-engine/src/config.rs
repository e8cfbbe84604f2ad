//! Engine-wide settings shared by every component of a run.

use lectern_core::{DEFAULT_MIN_TEXT_LEN, model::normalize_translation};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
  /// Translation code that defines the addressable universe of verses.
  pub base_translation: String,
  /// See [`lectern_core::DEFAULT_MIN_TEXT_LEN`].
  pub min_text_len:     usize,
}

impl EngineConfig {
  /// Build a config with the base translation code normalised.
  pub fn new(base_translation: &str, min_text_len: usize) -> Result<Self> {
    let base_translation = normalize_translation(base_translation);
    if base_translation.is_empty() {
      return Err(Error::EmptyBaseTranslation);
    }
    Ok(Self { base_translation, min_text_len })
  }

  pub fn is_base(&self, translation: &str) -> bool {
    normalize_translation(translation) == self.base_translation
  }
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      base_translation: "WEB".to_owned(),
      min_text_len:     DEFAULT_MIN_TEXT_LEN,
    }
  }
}
