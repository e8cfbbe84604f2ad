//! Reference model: the book → chapter → verse hierarchy.
//!
//! Books and chapters are seeded once; verses carry the additional
//! per-translation dimension. A verse's identity is the composite
//! `(book, chapter_number, verse_number, translation)` and that tuple is
//! unique among active verses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Translation codes ───────────────────────────────────────────────────────

/// Normalise a translation code to its canonical upper-case form.
///
/// Providers accept codes case-insensitively; the store keys on the
/// normalised form so `"kjv"` and `"KJV"` address the same verses.
pub fn normalize_translation(code: &str) -> String {
  code.trim().to_ascii_uppercase()
}

// ─── Book ────────────────────────────────────────────────────────────────────

/// A book of the canon. Immutable once seeded except for soft-deactivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
  pub book_id:    Uuid,
  /// Unique, human-readable name (e.g. "Romans"); also the provider address.
  pub name:       String,
  /// Canonical sequence position.
  pub order:      u32,
  /// Declared chapter count.
  pub chapters:   u32,
  pub is_active:  bool,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::CorpusStore::add_book`].
#[derive(Debug, Clone)]
pub struct NewBook {
  pub name:     String,
  pub order:    u32,
  pub chapters: u32,
}

// ─── Chapter ─────────────────────────────────────────────────────────────────

/// A chapter, owned by exactly one [`Book`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
  pub chapter_id:     Uuid,
  pub book_id:        Uuid,
  /// 1-based, unique within the book.
  pub chapter_number: u32,
  /// Declared verse count. A cached projection corrected by reconciliation
  /// whenever the provider disagrees with it.
  pub verses:         u32,
  pub is_active:      bool,
}

/// Input to [`crate::store::CorpusStore::add_chapter`].
#[derive(Debug, Clone)]
pub struct NewChapter {
  pub book_id:        Uuid,
  pub chapter_number: u32,
  pub verses:         u32,
}

impl NewChapter {
  pub fn validate(&self) -> Result<()> {
    if self.chapter_number == 0 {
      return Err(Error::ZeroChapter);
    }
    Ok(())
  }
}

// ─── Verse ───────────────────────────────────────────────────────────────────

/// A single verse in a single translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
  pub verse_id:       Uuid,
  /// Denormalised back-reference to the owning book, copied from the
  /// chapter's parent at creation time.
  pub book_id:        Uuid,
  pub chapter_number: u32,
  pub verse_number:   u32,
  pub translation:    String,
  pub text:           String,
  pub is_active:      bool,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

/// Input to [`crate::store::CorpusStore::insert_verse`] and
/// [`crate::store::CorpusStore::upsert_verse`]. Timestamps and the id are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVerse {
  pub book_id:        Uuid,
  pub chapter_number: u32,
  pub verse_number:   u32,
  pub translation:    String,
  pub text:           String,
}

impl NewVerse {
  /// Check the structural invariants every stored verse must satisfy.
  pub fn validate(&self) -> Result<()> {
    if self.chapter_number == 0 {
      return Err(Error::ZeroChapter);
    }
    if self.verse_number == 0 {
      return Err(Error::ZeroVerse);
    }
    if self.translation.trim().is_empty() {
      return Err(Error::EmptyTranslation);
    }
    if self.text.trim().is_empty() {
      return Err(Error::EmptyText);
    }
    Ok(())
  }
}
