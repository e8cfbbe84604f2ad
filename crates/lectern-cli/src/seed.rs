//! Canon seeding: creates the book and chapter skeleton a reconciliation
//! run walks.
//!
//! ```toml
//! [[books]]
//! name   = "Ruth"
//! order  = 8
//! verses = [22, 23, 18, 22]
//! ```

use anyhow::Context as _;
use lectern_core::{
  model::{NewBook, NewChapter},
  store::CorpusStore,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct Canon {
  pub books: Vec<CanonBook>,
}

#[derive(Debug, Deserialize)]
pub struct CanonBook {
  pub name:   String,
  pub order:  u32,
  /// Declared verse count of each chapter, in chapter order.
  pub verses: Vec<u32>,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
  pub books_created:    usize,
  pub chapters_created: usize,
  pub books_existing:   usize,
}

pub fn parse(raw: &str) -> anyhow::Result<Canon> {
  let canon: Canon = toml::from_str(raw).context("failed to parse canon file")?;
  for book in &canon.books {
    anyhow::ensure!(!book.name.trim().is_empty(), "canon book with empty name");
    anyhow::ensure!(!book.verses.is_empty(), "canon book {} declares no chapters", book.name);
  }
  Ok(canon)
}

/// Create every canon book not already in `store`. Books that exist are left
/// as they are, chapters included.
pub async fn seed<S: CorpusStore>(store: &S, canon: &Canon) -> anyhow::Result<SeedReport> {
  let mut report = SeedReport::default();

  for entry in &canon.books {
    if store.find_book_by_name(&entry.name).await?.is_some() {
      tracing::debug!(book = %entry.name, "Book already present; leaving it untouched");
      report.books_existing += 1;
      continue;
    }

    let book = store
      .add_book(NewBook {
        name:     entry.name.clone(),
        order:    entry.order,
        chapters: entry.verses.len() as u32,
      })
      .await
      .with_context(|| format!("failed to add book {}", entry.name))?;
    report.books_created += 1;

    for (i, verses) in entry.verses.iter().enumerate() {
      store
        .add_chapter(NewChapter {
          book_id:        book.book_id,
          chapter_number: i as u32 + 1,
          verses:         *verses,
        })
        .await
        .with_context(|| format!("failed to add {} {}", entry.name, i + 1))?;
      report.chapters_created += 1;
    }
    tracing::info!(book = %book.name, chapters = entry.verses.len(), "Seeded book");
  }

  Ok(report)
}
