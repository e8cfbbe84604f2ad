//! Test fixtures: a seeded in-memory store, a scripted verse source, and a
//! store wrapper that fails writes for one chapter.

use std::{
  collections::{HashMap, HashSet},
  sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
  },
  time::Duration,
};

use lectern_core::{
  model::{Book, Chapter, NewBook, NewChapter, NewVerse, Verse},
  source::{ChapterRef, FetchedVerse, SourceError, VerseRef, VerseSource},
  store::{CorpusStore, TranslationCount, Upserted, VerseQuery},
};
use lectern_store_sqlite::SqliteStore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{RateLimiter, RetryPolicy, SourceAdapter};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An in-memory store holding one book per entry, with chapters declared at
/// the given verse counts. Books take their canonical order from position.
pub async fn seeded_store(books: &[(&str, &[u32])]) -> (SqliteStore, Vec<Book>) {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  let mut seeded = Vec::new();

  for (i, (name, verse_counts)) in books.iter().enumerate() {
    let book = store
      .add_book(NewBook {
        name:     (*name).to_owned(),
        order:    i as u32 + 1,
        chapters: verse_counts.len() as u32,
      })
      .await
      .unwrap();
    for (c, verses) in verse_counts.iter().enumerate() {
      store
        .add_chapter(NewChapter {
          book_id:        book.book_id,
          chapter_number: c as u32 + 1,
          verses:         *verses,
        })
        .await
        .unwrap();
    }
    seeded.push(book);
  }

  (store, seeded)
}

pub fn verse_text(book: &str, chapter: u32, verse: u32, translation: &str) -> String {
  format!("{book} {chapter}:{verse} in the {translation} rendering")
}

/// Insert base verses `numbers` for one chapter.
pub async fn insert_verses(
  store: &SqliteStore,
  book: &Book,
  chapter: u32,
  translation: &str,
  numbers: impl IntoIterator<Item = u32>,
) {
  for n in numbers {
    store
      .insert_verse(NewVerse {
        book_id:        book.book_id,
        chapter_number: chapter,
        verse_number:   n,
        translation:    translation.to_owned(),
        text:           verse_text(&book.name, chapter, n, translation),
      })
      .await
      .unwrap();
  }
}

pub async fn chapter_numbers(store: &SqliteStore, book: &Book, chapter: u32, translation: &str) -> Vec<u32> {
  store
    .find_verses(&VerseQuery::chapter(book.book_id, chapter, translation))
    .await
    .unwrap()
    .into_iter()
    .map(|v| v.verse_number)
    .collect()
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// A [`VerseSource`] answering from fixed tables.
///
/// Unknown references answer `NotFound`. Broken chapters and the first
/// `fail_first` calls answer HTTP 503. An attached token is cancelled by the
/// first call, as an interrupt arriving mid-request would be.
#[derive(Default)]
pub struct ScriptedSource {
  chapters:        HashMap<(String, u32, String), Vec<FetchedVerse>>,
  verses:          HashMap<(String, u32, u32, String), String>,
  broken_chapters: HashSet<(String, u32)>,
  fail_first:      AtomicU32,
  calls:           AtomicU32,
  cancel_on_call:  Option<CancellationToken>,
}

impl ScriptedSource {
  pub fn new() -> Self { Self::default() }

  /// Serve a chapter, and each of its verses individually.
  pub fn with_chapter(mut self, book: &str, chapter: u32, translation: &str, verses: &[(u32, &str)]) -> Self {
    for (n, text) in verses {
      self
        .verses
        .insert((book.into(), chapter, *n, translation.into()), (*text).into());
    }
    self.chapters.insert(
      (book.into(), chapter, translation.into()),
      verses
        .iter()
        .map(|(n, text)| FetchedVerse {
          verse_number: *n,
          text:         (*text).into(),
        })
        .collect(),
    );
    self
  }

  /// Serve verses `1..=count` with generated text.
  pub fn with_full_chapter(self, book: &str, chapter: u32, translation: &str, count: u32) -> Self {
    let texts: Vec<(u32, String)> = (1..=count)
      .map(|n| (n, verse_text(book, chapter, n, translation)))
      .collect();
    let borrowed: Vec<(u32, &str)> = texts.iter().map(|(n, t)| (*n, t.as_str())).collect();
    self.with_chapter(book, chapter, translation, &borrowed)
  }

  pub fn with_verse(mut self, book: &str, chapter: u32, verse: u32, translation: &str, text: &str) -> Self {
    self
      .verses
      .insert((book.into(), chapter, verse, translation.into()), text.into());
    self
  }

  pub fn broken_chapter(mut self, book: &str, chapter: u32) -> Self {
    self.broken_chapters.insert((book.into(), chapter));
    self
  }

  pub fn failing_first(self, n: u32) -> Self {
    self.fail_first.store(n, Ordering::SeqCst);
    self
  }

  pub fn cancel_on_first_call(mut self, cancel: CancellationToken) -> Self {
    self.cancel_on_call = Some(cancel);
    self
  }

  pub fn calls(&self) -> u32 { self.calls.load(Ordering::SeqCst) }

  fn check_failure(&self, book: &str, chapter: u32) -> Result<(), SourceError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if let Some(cancel) = &self.cancel_on_call {
      cancel.cancel();
    }
    let scripted = self
      .fail_first
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok();
    if scripted || self.broken_chapters.contains(&(book.to_owned(), chapter)) {
      return Err(SourceError::Status(503));
    }
    Ok(())
  }
}

impl VerseSource for ScriptedSource {
  async fn fetch_chapter(&self, reference: &ChapterRef) -> Result<Vec<FetchedVerse>, SourceError> {
    self.check_failure(&reference.book, reference.chapter)?;
    self
      .chapters
      .get(&(reference.book.clone(), reference.chapter, reference.translation.clone()))
      .cloned()
      .ok_or(SourceError::NotFound)
  }

  async fn fetch_verse(&self, reference: &VerseRef) -> Result<String, SourceError> {
    self.check_failure(&reference.book, reference.chapter)?;
    self
      .verses
      .get(&(
        reference.book.clone(),
        reference.chapter,
        reference.verse,
        reference.translation.clone(),
      ))
      .cloned()
      .ok_or(SourceError::NotFound)
  }
}

/// An adapter with no spacing or backoff delays.
pub fn adapter<V: VerseSource>(source: V, max_attempts: u32) -> SourceAdapter<V> {
  SourceAdapter::new(
    source,
    Arc::new(RateLimiter::new(Duration::ZERO)),
    RetryPolicy {
      max_attempts,
      base_delay: Duration::ZERO,
    },
  )
}

// ─── Failing store ───────────────────────────────────────────────────────────

/// Delegates to a [`SqliteStore`] but rejects every verse write to one
/// chapter number, as a duplicate-key conflict would.
pub struct FailingWrites {
  pub inner:        SqliteStore,
  pub fail_chapter: u32,
}

impl FailingWrites {
  fn conflict(&self, input: &NewVerse) -> lectern_store_sqlite::Error {
    lectern_store_sqlite::Error::DuplicateVerse {
      book_id:     input.book_id,
      chapter:     input.chapter_number,
      verse:       input.verse_number,
      translation: input.translation.clone(),
    }
  }
}

impl CorpusStore for FailingWrites {
  type Error = lectern_store_sqlite::Error;

  async fn add_book(&self, input: NewBook) -> Result<Book, Self::Error> { self.inner.add_book(input).await }

  async fn find_book_by_name(&self, name: &str) -> Result<Option<Book>, Self::Error> {
    self.inner.find_book_by_name(name).await
  }

  async fn list_books(&self, include_inactive: bool) -> Result<Vec<Book>, Self::Error> {
    self.inner.list_books(include_inactive).await
  }

  async fn add_chapter(&self, input: NewChapter) -> Result<Chapter, Self::Error> {
    self.inner.add_chapter(input).await
  }

  async fn list_chapters(&self, book_id: Uuid) -> Result<Vec<Chapter>, Self::Error> {
    self.inner.list_chapters(book_id).await
  }

  async fn set_chapter_verse_count(&self, chapter_id: Uuid, verses: u32) -> Result<(), Self::Error> {
    self.inner.set_chapter_verse_count(chapter_id, verses).await
  }

  async fn find_verses(&self, query: &VerseQuery) -> Result<Vec<Verse>, Self::Error> {
    self.inner.find_verses(query).await
  }

  async fn count_verses(&self, query: &VerseQuery) -> Result<u64, Self::Error> {
    self.inner.count_verses(query).await
  }

  async fn count_by_translation(&self) -> Result<Vec<TranslationCount>, Self::Error> {
    self.inner.count_by_translation().await
  }

  async fn insert_verse(&self, input: NewVerse) -> Result<Verse, Self::Error> {
    if input.chapter_number == self.fail_chapter {
      return Err(self.conflict(&input));
    }
    self.inner.insert_verse(input).await
  }

  async fn update_verse_text(&self, verse_id: Uuid, text: String) -> Result<Verse, Self::Error> {
    self.inner.update_verse_text(verse_id, text).await
  }

  async fn upsert_verse(&self, input: NewVerse) -> Result<Upserted, Self::Error> {
    if input.chapter_number == self.fail_chapter {
      return Err(self.conflict(&input));
    }
    self.inner.upsert_verse(input).await
  }
}
