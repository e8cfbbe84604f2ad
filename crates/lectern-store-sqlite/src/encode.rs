//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. UUIDs are stored as hyphenated
//! lowercase strings. Booleans are stored as 0/1 integers.

use chrono::{DateTime, Utc};
use lectern_core::model::{Book, Chapter, Verse};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const BOOK_COLUMNS: &str =
  "book_id, name, sort_order, chapters, is_active, created_at";

/// Raw values read directly from a `books` row.
pub struct RawBook {
  pub book_id:    String,
  pub name:       String,
  pub sort_order: u32,
  pub chapters:   u32,
  pub is_active:  bool,
  pub created_at: String,
}

impl RawBook {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      book_id:    row.get(0)?,
      name:       row.get(1)?,
      sort_order: row.get(2)?,
      chapters:   row.get(3)?,
      is_active:  row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_book(self) -> Result<Book> {
    Ok(Book {
      book_id:    decode_uuid(&self.book_id)?,
      name:       self.name,
      order:      self.sort_order,
      chapters:   self.chapters,
      is_active:  self.is_active,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const CHAPTER_COLUMNS: &str =
  "chapter_id, book_id, chapter_number, verses, is_active";

/// Raw values read directly from a `chapters` row.
pub struct RawChapter {
  pub chapter_id:     String,
  pub book_id:        String,
  pub chapter_number: u32,
  pub verses:         u32,
  pub is_active:      bool,
}

impl RawChapter {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      chapter_id:     row.get(0)?,
      book_id:        row.get(1)?,
      chapter_number: row.get(2)?,
      verses:         row.get(3)?,
      is_active:      row.get(4)?,
    })
  }

  pub fn into_chapter(self) -> Result<Chapter> {
    Ok(Chapter {
      chapter_id:     decode_uuid(&self.chapter_id)?,
      book_id:        decode_uuid(&self.book_id)?,
      chapter_number: self.chapter_number,
      verses:         self.verses,
      is_active:      self.is_active,
    })
  }
}

pub const VERSE_COLUMNS: &str = "verse_id, book_id, chapter_number, \
                                 verse_number, translation, text, is_active, \
                                 created_at, updated_at";

/// Raw values read directly from a `verses` row.
pub struct RawVerse {
  pub verse_id:       String,
  pub book_id:        String,
  pub chapter_number: u32,
  pub verse_number:   u32,
  pub translation:    String,
  pub text:           String,
  pub is_active:      bool,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawVerse {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      verse_id:       row.get(0)?,
      book_id:        row.get(1)?,
      chapter_number: row.get(2)?,
      verse_number:   row.get(3)?,
      translation:    row.get(4)?,
      text:           row.get(5)?,
      is_active:      row.get(6)?,
      created_at:     row.get(7)?,
      updated_at:     row.get(8)?,
    })
  }

  pub fn into_verse(self) -> Result<Verse> {
    Ok(Verse {
      verse_id:       decode_uuid(&self.verse_id)?,
      book_id:        decode_uuid(&self.book_id)?,
      chapter_number: self.chapter_number,
      verse_number:   self.verse_number,
      translation:    self.translation,
      text:           self.text,
      is_active:      self.is_active,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

/// Returns `true` if `err` is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &tokio_rusqlite::Error) -> bool {
  matches!(
    err,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}
