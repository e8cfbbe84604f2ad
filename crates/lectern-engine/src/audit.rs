//! Completeness auditor: read-only expected-versus-actual report.
//!
//! Safe to run at any time, including while a reconciliation is in
//! progress.

use std::sync::Arc;

use lectern_core::{
  model::normalize_translation,
  store::{CorpusStore, VerseQuery},
};

use crate::{
  Error, Result,
  config::EngineConfig,
  plan::chapter_cells,
  summary::{AuditReport, DeficientChapter, completion_percent},
};

pub struct Auditor<S> {
  store:  Arc<S>,
  config: EngineConfig,
}

impl<S: CorpusStore> Auditor<S> {
  pub fn new(store: Arc<S>, config: EngineConfig) -> Self { Self { store, config } }

  /// Audit `translation` (the base translation when `None`) across the
  /// named books (all active books when `books` is empty).
  ///
  /// For the base translation a chapter is expected to hold its declared
  /// verse count. For any other translation it is expected to hold one verse
  /// per active base-translation verse, since the base translation defines
  /// which addresses exist.
  pub async fn audit(&self, translation: Option<&str>, books: &[String]) -> Result<AuditReport> {
    let translation = translation
      .map(normalize_translation)
      .unwrap_or_else(|| self.config.base_translation.clone());
    let is_base = self.config.is_base(&translation);

    let cells = chapter_cells(self.store.as_ref(), books).await?;

    let mut expected_total = 0;
    let mut actual_total = 0;
    let mut deficient_chapters = Vec::new();

    for cell in &cells {
      let actual = self
        .store
        .count_verses(&VerseQuery::chapter(cell.book.book_id, cell.number(), &translation))
        .await
        .map_err(Error::store)?;

      let expected = if is_base {
        u64::from(cell.chapter.verses)
      } else {
        self
          .store
          .count_verses(&VerseQuery::chapter(
            cell.book.book_id,
            cell.number(),
            &self.config.base_translation,
          ))
          .await
          .map_err(Error::store)?
      };

      expected_total += expected;
      actual_total += actual;

      if actual < expected {
        tracing::debug!(
          book = %cell.book.name,
          chapter = cell.number(),
          expected,
          actual,
          "deficient chapter"
        );
        deficient_chapters.push(DeficientChapter {
          book: cell.book.name.clone(),
          chapter: cell.number(),
          expected,
          actual,
          missing: expected - actual,
        });
      }
    }

    let report = AuditReport {
      translation,
      chapters_audited: cells.len(),
      expected_total,
      actual_total,
      completion_percent: completion_percent(actual_total, expected_total),
      deficient_chapters,
    };
    tracing::info!(
      translation = %report.translation,
      chapters = report.chapters_audited,
      deficient = report.deficient_chapters.len(),
      completion = report.completion_percent,
      "Audit finished"
    );
    Ok(report)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{insert_verses, seeded_store};

  #[tokio::test]
  async fn reports_exactly_the_deficient_chapters() {
    let (store, books) = seeded_store(&[("Ruth", &[22, 23, 18, 22]), ("Jude", &[25])]).await;
    let ruth = &books[0];
    let jude = &books[1];
    insert_verses(&store, ruth, 1, "WEB", 1..=22).await;
    insert_verses(&store, ruth, 2, "WEB", 1..=20).await;
    insert_verses(&store, ruth, 4, "WEB", 1..=22).await;
    insert_verses(&store, jude, 1, "WEB", [1, 2, 3, 4, 5]).await;

    let auditor = Auditor::new(Arc::new(store), EngineConfig::default());
    let report = auditor.audit(None, &[]).await.unwrap();

    assert_eq!(report.translation, "WEB");
    assert_eq!(report.chapters_audited, 5);
    assert_eq!(report.expected_total, 22 + 23 + 18 + 22 + 25);
    assert_eq!(report.actual_total, 22 + 20 + 22 + 5);
    assert_eq!(
      report.deficient_chapters,
      vec![
        DeficientChapter { book: "Ruth".into(), chapter: 2, expected: 23, actual: 20, missing: 3 },
        DeficientChapter { book: "Ruth".into(), chapter: 3, expected: 18, actual: 0, missing: 18 },
        DeficientChapter { book: "Jude".into(), chapter: 1, expected: 25, actual: 5, missing: 20 },
      ]
    );
    assert_eq!(report.completion_percent, 62.73);
  }

  #[tokio::test]
  async fn complete_corpus_has_no_deficiencies() {
    let (store, books) = seeded_store(&[("Jude", &[25])]).await;
    insert_verses(&store, &books[0], 1, "WEB", 1..=25).await;

    let report = Auditor::new(Arc::new(store), EngineConfig::default())
      .audit(None, &[])
      .await
      .unwrap();

    assert!(report.deficient_chapters.is_empty());
    assert_eq!(report.completion_percent, 100.0);
  }

  #[tokio::test]
  async fn audit_does_not_write() {
    let (store, books) = seeded_store(&[("Jude", &[25])]).await;
    insert_verses(&store, &books[0], 1, "WEB", 1..=3).await;
    let store = Arc::new(store);

    Auditor::new(Arc::clone(&store), EngineConfig::default())
      .audit(None, &[])
      .await
      .unwrap();

    let chapters = store.list_chapters(books[0].book_id).await.unwrap();
    assert_eq!(chapters[0].verses, 25);
    assert_eq!(store.count_verses(&VerseQuery::default()).await.unwrap(), 3);
  }

  #[tokio::test]
  async fn overlay_audit_measures_against_base_addresses() {
    let (store, books) = seeded_store(&[("Jude", &[25])]).await;
    insert_verses(&store, &books[0], 1, "WEB", 1..=10).await;
    insert_verses(&store, &books[0], 1, "KJV", 1..=4).await;

    let report = Auditor::new(Arc::new(store), EngineConfig::default())
      .audit(Some("kjv"), &[])
      .await
      .unwrap();

    assert_eq!(report.translation, "KJV");
    assert_eq!(report.expected_total, 10);
    assert_eq!(report.actual_total, 4);
    assert_eq!(report.deficient_chapters[0].missing, 6);
  }

  #[tokio::test]
  async fn inactive_books_excluded() {
    let (store, books) = seeded_store(&[("Ruth", &[22]), ("Tobit", &[22])]).await;
    store.deactivate_book(books[1].book_id).await.unwrap();

    let report = Auditor::new(Arc::new(store), EngineConfig::default())
      .audit(None, &[])
      .await
      .unwrap();

    assert_eq!(report.chapters_audited, 1);
    assert_eq!(report.expected_total, 22);
  }
}
