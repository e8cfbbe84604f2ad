//! Runtime settings, layered from an optional TOML file and `LECTERN_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context as _, ensure};
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use lectern_core::DEFAULT_MIN_TEXT_LEN;
use lectern_engine::{EngineConfig, RetryPolicy};
use lectern_source_http::ClientConfig;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub store_path:           PathBuf,
  pub base_translation:     String,
  pub min_text_len:         usize,
  /// Translations `lectern overlay` fills when none are named.
  pub overlay_translations: Vec<String>,
  pub source:               SourceSettings,
  pub rate_limit:           RateLimitSettings,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path:           PathBuf::from("lectern.db"),
      base_translation:     "WEB".to_owned(),
      min_text_len:         DEFAULT_MIN_TEXT_LEN,
      overlay_translations: ["KJV", "ASV", "BBE", "DARBY", "YLT"]
        .into_iter()
        .map(String::from)
        .collect(),
      source:               SourceSettings::default(),
      rate_limit:           RateLimitSettings::default(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
  pub base_url:            String,
  pub timeout_secs:        u64,
  pub max_attempts:        u32,
  pub retry_base_delay_ms: u64,
}

impl Default for SourceSettings {
  fn default() -> Self {
    Self {
      base_url:            "https://bible-api.com".to_owned(),
      timeout_secs:        15,
      max_attempts:        3,
      retry_base_delay_ms: 1000,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
  /// Minimum spacing between consecutive provider requests.
  pub interval_ms: u64,
}

impl Default for RateLimitSettings {
  fn default() -> Self { Self { interval_ms: 300 } }
}

impl Settings {
  /// Read `path` (required only when `explicit`) and the environment.
  pub fn load(path: &Path, explicit: bool) -> anyhow::Result<Self> {
    let builder = Config::builder()
      .add_source(File::from(path).required(explicit))
      .add_source(
        Environment::with_prefix("LECTERN")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("overlay_translations"),
      );
    Self::from_builder(builder)
      .with_context(|| format!("failed to load settings from {}", path.display()))
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    let mut settings: Settings = builder
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise Settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    settings.validate()?;
    Ok(settings)
  }

  /// Reject settings no run could succeed with.
  pub fn validate(&self) -> anyhow::Result<()> {
    ensure!(!self.source.base_url.trim().is_empty(), "source.base_url must not be empty");
    ensure!(self.source.max_attempts > 0, "source.max_attempts must be at least 1");
    ensure!(!self.base_translation.trim().is_empty(), "base_translation must not be empty");
    Ok(())
  }

  pub fn engine_config(&self) -> anyhow::Result<EngineConfig> {
    Ok(EngineConfig::new(&self.base_translation, self.min_text_len)?)
  }

  pub fn client_config(&self) -> ClientConfig {
    ClientConfig {
      base_url: self.source.base_url.clone(),
      timeout:  Duration::from_secs(self.source.timeout_secs),
    }
  }

  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy {
      max_attempts: self.source.max_attempts,
      base_delay:   Duration::from_millis(self.source.retry_base_delay_ms),
    }
  }

  pub fn rate_interval(&self) -> Duration { Duration::from_millis(self.rate_limit.interval_ms) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
