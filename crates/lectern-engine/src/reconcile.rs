//! Reconciler: brings base-translation chapters to completeness.
//!
//! For each `(book, chapter)` cell the persisted verse numbers are diffed
//! against a freshly fetched chapter. Missing verses are inserted, and the
//! chapter's cached verse count is corrected whenever it disagrees with the
//! fetched count. The provider's latest answer is always authoritative for
//! chapter sizing.
//!
//! Re-running against a cell already at parity performs no writes.

use std::{
  collections::{BTreeMap, BTreeSet},
  sync::Arc,
};

use lectern_core::{
  model::NewVerse,
  source::{ChapterRef, SourceError, VerseSource},
  store::{CorpusStore, VerseQuery},
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument as _;

use crate::{
  Result,
  adapter::SourceAdapter,
  cell::{CellReport, CellState, ChapterCell},
  config::EngineConfig,
  plan::chapter_cells,
  summary::RunSummary,
};

pub struct Reconciler<S, V> {
  store:  Arc<S>,
  source: Arc<SourceAdapter<V>>,
  config: EngineConfig,
  cancel: CancellationToken,
}

impl<S, V> Reconciler<S, V>
where
  S: CorpusStore,
  V: VerseSource,
{
  pub fn new(store: Arc<S>, source: Arc<SourceAdapter<V>>, config: EngineConfig) -> Self {
    Self {
      store,
      source,
      config,
      cancel: CancellationToken::new(),
    }
  }

  /// Stop issuing fetches once `cancel` fires. Writes already applied stay.
  pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
    self.cancel = cancel;
    self
  }

  /// Reconcile every chapter of the named books (all active books when
  /// `books` is empty).
  ///
  /// Only planning failures are returned as errors; each cell's failure is
  /// recorded in the summary and the run continues.
  pub async fn run(&self, books: &[String]) -> Result<RunSummary> {
    let cells = chapter_cells(self.store.as_ref(), books).await?;
    tracing::info!(
      cells = cells.len(),
      translation = %self.config.base_translation,
      "Starting reconciliation"
    );

    let mut summary = RunSummary::default();
    for cell in &cells {
      if self.cancel.is_cancelled() {
        tracing::warn!("Reconciliation interrupted; no further chapters will be fetched");
        summary.interrupted = true;
        break;
      }
      let report = self.reconcile_cell(cell).await;
      summary.record(&report);
    }
    summary.interrupted |= self.cancel.is_cancelled();

    tracing::info!(
      cells = summary.cells_processed,
      added = summary.verses_added,
      corrected = summary.chapters_corrected,
      errors = summary.errors.len(),
      "Reconciliation finished"
    );
    Ok(summary)
  }

  /// Reconcile a single chapter cell. Never fails; errors end up in the
  /// returned report.
  pub async fn reconcile_cell(&self, cell: &ChapterCell) -> CellReport {
    let span = tracing::info_span!(
      "reconcile",
      book = %cell.book.name,
      chapter = cell.number(),
    );
    self.process(cell).instrument(span).await
  }

  async fn process(&self, cell: &ChapterCell) -> CellReport {
    let mut report = CellReport::new(cell, None);
    let base = &self.config.base_translation;

    let persisted: BTreeSet<u32> = match self
      .store
      .find_verses(&VerseQuery::chapter(cell.book.book_id, cell.number(), base))
      .await
    {
      Ok(verses) => verses.into_iter().map(|v| v.verse_number).collect(),
      Err(e) => return report.fail(format!("failed to load stored verses: {e}")),
    };

    report.state.advance(CellState::Fetching);
    let reference = ChapterRef {
      book:        cell.book.name.clone(),
      chapter:     cell.number(),
      translation: base.clone(),
    };
    let fetched = match self.source.fetch_chapter(&reference, &self.cancel).await {
      Ok(verses) => verses,
      Err(failed) if failed.last_error == SourceError::Cancelled => {
        return report.skip("interrupted before the chapter was fetched");
      }
      Err(failed) => return report.fail(failed.to_string()),
    };

    report.state.advance(CellState::Applying);

    // Duplicate verse numbers in a response keep their first text.
    let mut by_number: BTreeMap<u32, String> = BTreeMap::new();
    for verse in fetched {
      by_number.entry(verse.verse_number).or_insert(verse.text);
    }

    let extra = persisted
      .iter()
      .filter(|n| !by_number.contains_key(*n))
      .count();
    if extra > 0 {
      tracing::debug!(extra, "stored verses absent from provider response");
    }

    for (number, text) in &by_number {
      if persisted.contains(number) {
        continue;
      }
      let input = NewVerse {
        book_id:        cell.book.book_id,
        chapter_number: cell.number(),
        verse_number:   *number,
        translation:    base.clone(),
        text:           text.clone(),
      };
      match self.store.insert_verse(input).await {
        Ok(_) => report.added += 1,
        Err(e) => return report.fail(format!("failed to insert verse {number}: {e}")),
      }
    }

    let fetched_count = by_number.len() as u32;
    if fetched_count != cell.chapter.verses {
      tracing::info!(
        declared = cell.chapter.verses,
        fetched = fetched_count,
        "correcting chapter verse count"
      );
      if let Err(e) = self
        .store
        .set_chapter_verse_count(cell.chapter.chapter_id, fetched_count)
        .await
      {
        return report.fail(format!("failed to correct verse count: {e}"));
      }
      report.chapter_corrected = true;
    }

    report.finish()
  }
}
