//! The `CorpusStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `lectern-store-sqlite`).
//! The reconciliation engine depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Book, Chapter, NewBook, NewChapter, NewVerse, Verse};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Filter for [`CorpusStore::find_verses`] and [`CorpusStore::count_verses`].
///
/// Every field left as `None` is unconstrained. Soft-deleted verses are
/// excluded unless `include_inactive` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerseQuery {
  pub book_id:          Option<Uuid>,
  pub chapter_number:   Option<u32>,
  pub verse_number:     Option<u32>,
  pub translation:      Option<String>,
  pub include_inactive: bool,
}

impl VerseQuery {
  /// All active verses of one chapter in one translation.
  pub fn chapter(book_id: Uuid, chapter_number: u32, translation: &str) -> Self {
    Self {
      book_id: Some(book_id),
      chapter_number: Some(chapter_number),
      translation: Some(translation.to_owned()),
      ..Self::default()
    }
  }
}

// ─── Write outcomes ──────────────────────────────────────────────────────────

/// Result of [`CorpusStore::upsert_verse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upserted {
  Inserted(Verse),
  Updated(Verse),
}

impl Upserted {
  pub fn verse(&self) -> &Verse {
    match self {
      Self::Inserted(v) | Self::Updated(v) => v,
    }
  }
}

/// Number of active verses stored under one translation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationCount {
  pub translation: String,
  pub verses:      u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a persisted scripture corpus.
///
/// Every read filters on `is_active = true` unless stated otherwise.
/// Verses are never deleted through this trait.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait CorpusStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Books ─────────────────────────────────────────────────────────────

  /// Create and persist a new book. Book names are unique.
  fn add_book(
    &self,
    input: NewBook,
  ) -> impl Future<Output = Result<Book, Self::Error>> + Send + '_;

  /// Look up an active book by its exact name.
  fn find_book_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Book>, Self::Error>> + Send + 'a;

  /// List books in canonical order.
  fn list_books(
    &self,
    include_inactive: bool,
  ) -> impl Future<Output = Result<Vec<Book>, Self::Error>> + Send + '_;

  // ── Chapters ──────────────────────────────────────────────────────────

  /// Create and persist a chapter of an existing book.
  fn add_chapter(
    &self,
    input: NewChapter,
  ) -> impl Future<Output = Result<Chapter, Self::Error>> + Send + '_;

  /// List the active chapters of a book, ordered by chapter number.
  fn list_chapters(
    &self,
    book_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Chapter>, Self::Error>> + Send + '_;

  /// Overwrite a chapter's cached verse count.
  fn set_chapter_verse_count(
    &self,
    chapter_id: Uuid,
    verses: u32,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Verses: reads ────────────────────────────────────────────────────

  /// Return every verse matching `query`, ordered by
  /// `(chapter_number, verse_number)`.
  fn find_verses<'a>(
    &'a self,
    query: &'a VerseQuery,
  ) -> impl Future<Output = Result<Vec<Verse>, Self::Error>> + Send + 'a;

  /// Count the verses matching `query`.
  fn count_verses<'a>(
    &'a self,
    query: &'a VerseQuery,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Active verse totals grouped by translation, ordered by code.
  fn count_by_translation(
    &self,
  ) -> impl Future<Output = Result<Vec<TranslationCount>, Self::Error>> + Send + '_;

  // ── Verses: writes ───────────────────────────────────────────────────

  /// Insert a new verse. Returns an error if an active verse already
  /// occupies the same composite identity.
  fn insert_verse(
    &self,
    input: NewVerse,
  ) -> impl Future<Output = Result<Verse, Self::Error>> + Send + '_;

  /// Replace the text of an existing verse.
  fn update_verse_text(
    &self,
    verse_id: Uuid,
    text: String,
  ) -> impl Future<Output = Result<Verse, Self::Error>> + Send + '_;

  /// Insert or update keyed on the composite identity
  /// `(book, chapter_number, verse_number, translation)`.
  fn upsert_verse(
    &self,
    input: NewVerse,
  ) -> impl Future<Output = Result<Upserted, Self::Error>> + Send + '_;
}
