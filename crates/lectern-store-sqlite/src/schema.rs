//! SQL schema for the Lectern SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS books (
    book_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    sort_order  INTEGER NOT NULL,
    chapters    INTEGER NOT NULL,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chapters (
    chapter_id      TEXT PRIMARY KEY,
    book_id         TEXT NOT NULL REFERENCES books(book_id),
    chapter_number  INTEGER NOT NULL CHECK (chapter_number > 0),
    verses          INTEGER NOT NULL,  -- cached; corrected by reconciliation
    is_active       INTEGER NOT NULL DEFAULT 1,
    UNIQUE (book_id, chapter_number)
);

-- Verses are never deleted; soft-deleted rows keep is_active = 0.
CREATE TABLE IF NOT EXISTS verses (
    verse_id        TEXT PRIMARY KEY,
    book_id         TEXT NOT NULL REFERENCES books(book_id),
    chapter_number  INTEGER NOT NULL CHECK (chapter_number > 0),
    verse_number    INTEGER NOT NULL CHECK (verse_number > 0),
    translation     TEXT NOT NULL,
    text            TEXT NOT NULL,
    is_active       INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

-- The composite identity is unique among active verses only.
CREATE UNIQUE INDEX IF NOT EXISTS verses_identity_idx
    ON verses(book_id, chapter_number, verse_number, translation)
    WHERE is_active = 1;

CREATE INDEX IF NOT EXISTS verses_translation_idx ON verses(translation);
CREATE INDEX IF NOT EXISTS chapters_book_idx      ON chapters(book_id);

PRAGMA user_version = 1;
";
