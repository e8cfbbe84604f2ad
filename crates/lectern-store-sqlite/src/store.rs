//! [`SqliteStore`]: the SQLite implementation of [`CorpusStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use lectern_core::{
  model::{Book, Chapter, NewBook, NewChapter, NewVerse, Verse},
  store::{CorpusStore, TranslationCount, Upserted, VerseQuery},
};

use crate::{
  encode::{
    BOOK_COLUMNS, CHAPTER_COLUMNS, RawBook, RawChapter, RawVerse, VERSE_COLUMNS,
    encode_dt, encode_uuid, is_unique_violation,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lectern corpus store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Soft deletion ─────────────────────────────────────────────────────────

  /// Mark a book inactive. Its chapters and verses drop out of every
  /// default read.
  pub async fn deactivate_book(&self, book_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(book_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE books SET is_active = 0 WHERE book_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(Error::BookNotFound(book_id));
    }
    Ok(())
  }

  /// Mark a single verse inactive, freeing its composite identity.
  pub async fn deactivate_verse(&self, verse_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(verse_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE verses SET is_active = 0 WHERE verse_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(Error::VerseNotFound(verse_id));
    }
    Ok(())
  }

  async fn get_book(&self, book_id: Uuid) -> Result<Option<Book>> {
    let id_str = encode_uuid(book_id);
    let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE book_id = ?1");

    let raw: Option<RawBook> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawBook::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBook::into_book).transpose()
  }
}

// ─── CorpusStore impl ────────────────────────────────────────────────────────

impl CorpusStore for SqliteStore {
  type Error = Error;

  // ── Books ─────────────────────────────────────────────────────────────────

  async fn add_book(&self, input: NewBook) -> Result<Book> {
    let book = Book {
      book_id:    Uuid::new_v4(),
      name:       input.name,
      order:      input.order,
      chapters:   input.chapters,
      is_active:  true,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(book.book_id);
    let name     = book.name.clone();
    let order    = book.order;
    let chapters = book.chapters;
    let at_str   = encode_dt(book.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO books (book_id, name, sort_order, chapters, is_active, created_at)
           VALUES (?1, ?2, ?3, ?4, 1, ?5)",
          rusqlite::params![id_str, name, order, chapters, at_str],
        )?;
        Ok(())
      })
      .await;

    match inserted {
      Ok(()) => Ok(book),
      Err(e) if is_unique_violation(&e) => Err(Error::DuplicateBook(book.name)),
      Err(e) => Err(e.into()),
    }
  }

  async fn find_book_by_name(&self, name: &str) -> Result<Option<Book>> {
    let name = name.to_owned();
    let sql = format!(
      "SELECT {BOOK_COLUMNS} FROM books WHERE name = ?1 AND is_active = 1"
    );

    let raw: Option<RawBook> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![name], RawBook::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBook::into_book).transpose()
  }

  async fn list_books(&self, include_inactive: bool) -> Result<Vec<Book>> {
    let sql = format!(
      "SELECT {BOOK_COLUMNS} FROM books
       WHERE (?1 OR is_active = 1)
       ORDER BY sort_order, name"
    );

    let raws: Vec<RawBook> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![include_inactive], RawBook::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBook::into_book).collect()
  }

  // ── Chapters ──────────────────────────────────────────────────────────────

  async fn add_chapter(&self, input: NewChapter) -> Result<Chapter> {
    input.validate()?;
    if self.get_book(input.book_id).await?.is_none() {
      return Err(Error::BookNotFound(input.book_id));
    }

    let chapter = Chapter {
      chapter_id:     Uuid::new_v4(),
      book_id:        input.book_id,
      chapter_number: input.chapter_number,
      verses:         input.verses,
      is_active:      true,
    };

    let id_str      = encode_uuid(chapter.chapter_id);
    let book_id_str = encode_uuid(chapter.book_id);
    let number      = chapter.chapter_number;
    let verses      = chapter.verses;

    let inserted = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO chapters (chapter_id, book_id, chapter_number, verses, is_active)
           VALUES (?1, ?2, ?3, ?4, 1)",
          rusqlite::params![id_str, book_id_str, number, verses],
        )?;
        Ok(())
      })
      .await;

    match inserted {
      Ok(()) => Ok(chapter),
      Err(e) if is_unique_violation(&e) => Err(Error::DuplicateChapter {
        book_id: chapter.book_id,
        chapter: chapter.chapter_number,
      }),
      Err(e) => Err(e.into()),
    }
  }

  async fn list_chapters(&self, book_id: Uuid) -> Result<Vec<Chapter>> {
    let book_id_str = encode_uuid(book_id);
    let sql = format!(
      "SELECT {CHAPTER_COLUMNS} FROM chapters
       WHERE book_id = ?1 AND is_active = 1
       ORDER BY chapter_number"
    );

    let raws: Vec<RawChapter> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![book_id_str], RawChapter::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChapter::into_chapter).collect()
  }

  async fn set_chapter_verse_count(&self, chapter_id: Uuid, verses: u32) -> Result<()> {
    let id_str = encode_uuid(chapter_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE chapters SET verses = ?1 WHERE chapter_id = ?2",
          rusqlite::params![verses, id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ChapterNotFound(chapter_id));
    }
    Ok(())
  }

  // ── Verses: reads ────────────────────────────────────────────────────────

  async fn find_verses(&self, query: &VerseQuery) -> Result<Vec<Verse>> {
    let (book, chapter, verse, translation, include_inactive) = filter_params(query);
    let sql = format!(
      "SELECT {VERSE_COLUMNS} FROM verses
       WHERE {VERSE_FILTER}
       ORDER BY book_id, chapter_number, verse_number, translation"
    );

    let raws: Vec<RawVerse> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![book, chapter, verse, translation, include_inactive],
            RawVerse::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVerse::into_verse).collect()
  }

  async fn count_verses(&self, query: &VerseQuery) -> Result<u64> {
    let (book, chapter, verse, translation, include_inactive) = filter_params(query);
    let sql = format!("SELECT COUNT(*) FROM verses WHERE {VERSE_FILTER}");

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &sql,
          rusqlite::params![book, chapter, verse, translation, include_inactive],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count.max(0) as u64)
  }

  async fn count_by_translation(&self) -> Result<Vec<TranslationCount>> {
    let rows: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT translation, COUNT(*) FROM verses
           WHERE is_active = 1
           GROUP BY translation
           ORDER BY translation",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(translation, verses)| TranslationCount {
          translation,
          verses: verses.max(0) as u64,
        })
        .collect(),
    )
  }

  // ── Verses: writes ───────────────────────────────────────────────────────

  async fn insert_verse(&self, input: NewVerse) -> Result<Verse> {
    input.validate()?;

    let now = Utc::now();
    let verse = Verse {
      verse_id:       Uuid::new_v4(),
      book_id:        input.book_id,
      chapter_number: input.chapter_number,
      verse_number:   input.verse_number,
      translation:    input.translation,
      text:           input.text,
      is_active:      true,
      created_at:     now,
      updated_at:     now,
    };

    let id_str      = encode_uuid(verse.verse_id);
    let book_id_str = encode_uuid(verse.book_id);
    let chapter     = verse.chapter_number;
    let number      = verse.verse_number;
    let translation = verse.translation.clone();
    let text        = verse.text.clone();
    let at_str      = encode_dt(now);

    let inserted = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO verses (
             verse_id, book_id, chapter_number, verse_number, translation,
             text, is_active, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
          rusqlite::params![id_str, book_id_str, chapter, number, translation, text, at_str],
        )?;
        Ok(())
      })
      .await;

    match inserted {
      Ok(()) => Ok(verse),
      Err(e) if is_unique_violation(&e) => Err(Error::DuplicateVerse {
        book_id:     verse.book_id,
        chapter:     verse.chapter_number,
        verse:       verse.verse_number,
        translation: verse.translation,
      }),
      Err(e) => Err(e.into()),
    }
  }

  async fn update_verse_text(&self, verse_id: Uuid, text: String) -> Result<Verse> {
    if text.trim().is_empty() {
      return Err(lectern_core::Error::EmptyText.into());
    }

    let id_str = encode_uuid(verse_id);
    let at_str = encode_dt(Utc::now());
    let sql = format!("SELECT {VERSE_COLUMNS} FROM verses WHERE verse_id = ?1");

    let raw: Option<RawVerse> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE verses SET text = ?1, updated_at = ?2 WHERE verse_id = ?3",
          rusqlite::params![text, at_str, id_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawVerse::from_row)
            .optional()?,
        )
      })
      .await?;

    raw
      .ok_or(Error::VerseNotFound(verse_id))?
      .into_verse()
  }

  async fn upsert_verse(&self, input: NewVerse) -> Result<Upserted> {
    input.validate()?;

    let new_id_str  = encode_uuid(Uuid::new_v4());
    let book_id_str = encode_uuid(input.book_id);
    let chapter     = input.chapter_number;
    let number      = input.verse_number;
    let translation = input.translation;
    let text        = input.text;
    let at_str      = encode_dt(Utc::now());
    let select_sql  = format!(
      "SELECT {VERSE_COLUMNS} FROM verses
       WHERE book_id = ?1 AND chapter_number = ?2 AND verse_number = ?3
         AND translation = ?4 AND is_active = 1"
    );

    let (raw, inserted): (RawVerse, bool) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing = tx
          .query_row(
            &select_sql,
            rusqlite::params![book_id_str, chapter, number, translation],
            RawVerse::from_row,
          )
          .optional()?;

        let outcome = match existing {
          Some(mut raw) => {
            tx.execute(
              "UPDATE verses SET text = ?1, updated_at = ?2 WHERE verse_id = ?3",
              rusqlite::params![text, at_str, raw.verse_id],
            )?;
            raw.text = text;
            raw.updated_at = at_str;
            (raw, false)
          }
          None => {
            tx.execute(
              "INSERT INTO verses (
                 verse_id, book_id, chapter_number, verse_number, translation,
                 text, is_active, created_at, updated_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
              rusqlite::params![
                new_id_str,
                book_id_str,
                chapter,
                number,
                translation,
                text,
                at_str,
              ],
            )?;
            let raw = RawVerse {
              verse_id: new_id_str,
              book_id: book_id_str,
              chapter_number: chapter,
              verse_number: number,
              translation,
              text,
              is_active: true,
              created_at: at_str.clone(),
              updated_at: at_str,
            };
            (raw, true)
          }
        };

        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    let verse = raw.into_verse()?;
    Ok(if inserted {
      Upserted::Inserted(verse)
    } else {
      Upserted::Updated(verse)
    })
  }
}

// ─── Filtering ───────────────────────────────────────────────────────────────

/// WHERE clause shared by verse reads. Each `NULL` parameter leaves its
/// column unconstrained.
const VERSE_FILTER: &str = "(?1 IS NULL OR book_id = ?1)
         AND (?2 IS NULL OR chapter_number = ?2)
         AND (?3 IS NULL OR verse_number = ?3)
         AND (?4 IS NULL OR translation = ?4)
         AND (?5 OR is_active = 1)";

type FilterParams = (
  Option<String>,
  Option<u32>,
  Option<u32>,
  Option<String>,
  bool,
);

fn filter_params(query: &VerseQuery) -> FilterParams {
  (
    query.book_id.map(encode_uuid),
    query.chapter_number,
    query.verse_number,
    query.translation.clone(),
    query.include_inactive,
  )
}
