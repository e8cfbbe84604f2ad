//! Error type for `lectern-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] lectern_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("book not found: {0}")]
  BookNotFound(uuid::Uuid),

  #[error("chapter not found: {0}")]
  ChapterNotFound(uuid::Uuid),

  #[error("verse not found: {0}")]
  VerseNotFound(uuid::Uuid),

  #[error("a book named {0:?} already exists")]
  DuplicateBook(String),

  #[error("chapter {chapter} of book {book_id} already exists")]
  DuplicateChapter { book_id: uuid::Uuid, chapter: u32 },

  /// An active verse already occupies this composite identity.
  #[error("duplicate verse {chapter}:{verse} ({translation}) in book {book_id}")]
  DuplicateVerse {
    book_id:     uuid::Uuid,
    chapter:     u32,
    verse:       u32,
    translation: String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
