//! Async HTTP client for the verse provider.

use std::time::Duration;

use lectern_core::source::{ChapterRef, FetchedVerse, SourceError, VerseRef, VerseSource};
use reqwest::{Client, StatusCode};

use crate::{
  Error, Result,
  wire::PassageResponse,
};

const USER_AGENT: &str = concat!("lectern/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the provider.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  pub base_url: String,
  /// Per-request timeout covering connect, send and body read.
  pub timeout:  Duration,
}

/// HTTP client for a bible-api style provider.
///
/// Issues exactly one request per call; retries and spacing are the
/// caller's concern. Cheap to clone; the inner [`reqwest::Client`] is
/// `Arc`-based.
#[derive(Clone)]
pub struct BibleApiClient {
  client:   Client,
  base_url: String,
}

impl BibleApiClient {
  pub fn new(config: ClientConfig) -> Result<Self> {
    let base_url = config.base_url.trim_end_matches('/').to_owned();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
      return Err(Error::InvalidBaseUrl(config.base_url));
    }

    let client = Client::builder()
      .user_agent(USER_AGENT)
      .timeout(config.timeout)
      .build()?;
    Ok(Self { client, base_url })
  }

  /// `{base}/{book}+{passage}`, with spaces in multi-word book names joined
  /// by `+` the way the provider expects.
  fn url(&self, book: &str, passage: &str) -> String {
    format!("{}/{}+{}", self.base_url, book.trim().replace(' ', "+"), passage)
  }

  async fn get_passage(&self, url: &str, translation: &str) -> Result<PassageResponse, SourceError> {
    tracing::debug!(url = %url, translation = %translation, "Querying verse provider");

    let resp = self
      .client
      .get(url)
      .query(&[("translation", translation.to_ascii_lowercase())])
      .send()
      .await
      .map_err(map_reqwest_error)?;

    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
      return Err(SourceError::NotFound);
    }
    if !status.is_success() {
      return Err(SourceError::Status(status.as_u16()));
    }

    let body = resp.text().await.map_err(map_reqwest_error)?;
    serde_json::from_str(&body).map_err(|e| SourceError::Malformed(e.to_string()))
  }
}

fn map_reqwest_error(e: reqwest::Error) -> SourceError {
  if e.is_timeout() {
    SourceError::Timeout
  } else {
    SourceError::Network(e.to_string())
  }
}

impl VerseSource for BibleApiClient {
  async fn fetch_chapter(&self, reference: &ChapterRef) -> Result<Vec<FetchedVerse>, SourceError> {
    let url = self.url(&reference.book, &reference.chapter.to_string());
    let passage = self.get_passage(&url, &reference.translation).await?;

    // Some providers spill into the next chapter; keep only the one asked for.
    Ok(
      passage
        .verses
        .into_iter()
        .filter(|v| v.chapter == reference.chapter)
        .map(|v| FetchedVerse {
          verse_number: v.verse,
          text:         v.text.trim().to_owned(),
        })
        .collect(),
    )
  }

  async fn fetch_verse(&self, reference: &VerseRef) -> Result<String, SourceError> {
    let url = self.url(
      &reference.book,
      &format!("{}:{}", reference.chapter, reference.verse),
    );
    let passage = self.get_passage(&url, &reference.translation).await?;

    // The passage-level text only stands in when no per-verse entries came
    // back; otherwise it may belong to a neighbouring verse.
    let text = if passage.verses.is_empty() {
      passage.text
    } else {
      passage
        .verses
        .into_iter()
        .find(|v| v.chapter == reference.chapter && v.verse == reference.verse)
        .map(|v| v.text)
    };

    match text.map(|t| t.trim().to_owned()) {
      Some(text) if !text.is_empty() => Ok(text),
      _ => Err(SourceError::Empty),
    }
  }
}
