//! Translation overlay builder: fills additional translations at the
//! addresses the base translation already defines.
//!
//! Cells are `(book, chapter, translation)` triples. A chapter with no base
//! verses is skipped outright, and every write targets an address copied
//! from an existing base verse, so no overlay verse can appear where the
//! base translation has none.

use std::{collections::HashMap, sync::Arc};

use lectern_core::{
  is_usable_text,
  model::{NewVerse, Verse, normalize_translation},
  source::{SourceError, VerseRef, VerseSource},
  store::{CorpusStore, Upserted, VerseQuery},
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument as _;

use crate::{
  Result,
  adapter::SourceAdapter,
  cell::{CellReport, CellState, ChapterCell},
  config::EngineConfig,
  plan::chapter_cells,
  summary::{OverlayReport, RunSummary, TranslationReport},
};

pub struct OverlayBuilder<S, V> {
  store:  Arc<S>,
  source: Arc<SourceAdapter<V>>,
  config: EngineConfig,
  cancel: CancellationToken,
}

impl<S, V> OverlayBuilder<S, V>
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

  /// Overlay each translation in `translations` across the named books (all
  /// active books when `books` is empty).
  ///
  /// The base translation code is ignored if listed. Duplicate codes are
  /// processed once.
  pub async fn run(&self, translations: &[String], books: &[String]) -> Result<OverlayReport> {
    let mut codes: Vec<String> = Vec::new();
    for code in translations.iter().map(|t| normalize_translation(t)) {
      if code.is_empty() || codes.contains(&code) {
        continue;
      }
      if self.config.is_base(&code) {
        tracing::warn!(translation = %code, "Ignoring overlay request for the base translation");
        continue;
      }
      codes.push(code);
    }

    let cells = chapter_cells(self.store.as_ref(), books).await?;
    let mut report = OverlayReport::default();

    for code in &codes {
      if self.cancel.is_cancelled() {
        report.summary.interrupted = true;
        break;
      }
      tracing::info!(translation = %code, cells = cells.len(), "Starting overlay");

      let mut summary = RunSummary::default();
      for cell in &cells {
        if self.cancel.is_cancelled() {
          tracing::warn!("Overlay interrupted; no further verses will be fetched");
          summary.interrupted = true;
          break;
        }
        let cell_report = self.overlay_cell(cell, code).await;
        summary.record(&cell_report);
      }
      summary.interrupted |= self.cancel.is_cancelled();

      tracing::info!(
        translation = %code,
        added = summary.verses_added,
        updated = summary.verses_updated,
        skipped = summary.verses_skipped,
        errors = summary.errors.len(),
        "Overlay finished"
      );
      report.translations.push(TranslationReport {
        translation: code.clone(),
        added:       summary.verses_added,
        updated:     summary.verses_updated,
        skipped:     summary.verses_skipped,
        errors:      summary.errors.len(),
        final_count: None,
      });
      report.summary.merge(summary);
    }

    match self.store.count_by_translation().await {
      Ok(counts) => {
        for t in &mut report.translations {
          t.final_count = Some(
            counts
              .iter()
              .find(|c| c.translation == t.translation)
              .map_or(0, |c| c.verses),
          );
        }
      }
      Err(e) => tracing::warn!(error = %e, "Failed to read final translation counts"),
    }

    Ok(report)
  }

  /// Overlay a single `(book, chapter)` cell under `translation`. Never
  /// fails; errors end up in the returned report.
  pub async fn overlay_cell(&self, cell: &ChapterCell, translation: &str) -> CellReport {
    let span = tracing::info_span!(
      "overlay",
      book = %cell.book.name,
      chapter = cell.number(),
      translation = %translation,
    );
    self.process(cell, translation).instrument(span).await
  }

  async fn process(&self, cell: &ChapterCell, translation: &str) -> CellReport {
    let mut report = CellReport::new(cell, Some(translation));
    let min_len = self.config.min_text_len;

    let base_verses = match self
      .store
      .find_verses(&VerseQuery::chapter(
        cell.book.book_id,
        cell.number(),
        &self.config.base_translation,
      ))
      .await
    {
      Ok(verses) => verses,
      Err(e) => return report.fail(format!("failed to load base verses: {e}")),
    };
    if base_verses.is_empty() {
      return report.skip("no base-translation verses");
    }

    let existing: HashMap<u32, Verse> = match self
      .store
      .find_verses(&VerseQuery::chapter(cell.book.book_id, cell.number(), translation))
      .await
    {
      Ok(verses) => verses.into_iter().map(|v| (v.verse_number, v)).collect(),
      Err(e) => return report.fail(format!("failed to load {translation} verses: {e}")),
    };

    report.state.advance(CellState::Fetching);
    report.state.advance(CellState::Applying);

    for base in &base_verses {
      let current = existing.get(&base.verse_number);
      if current.is_some_and(|v| is_usable_text(&v.text, min_len)) {
        report.skipped += 1;
        continue;
      }

      let reference = VerseRef {
        book:        cell.book.name.clone(),
        chapter:     base.chapter_number,
        verse:       base.verse_number,
        translation: translation.to_owned(),
      };
      let text = match self.source.fetch_verse(&reference, &self.cancel).await {
        Ok(text) if is_usable_text(&text, min_len) => text,
        Ok(text) => {
          tracing::debug!(verse = base.verse_number, len = text.len(), "Fetched text too short; skipping");
          report.skipped += 1;
          continue;
        }
        Err(failed) if failed.last_error == SourceError::Cancelled => {
          tracing::warn!("Overlay interrupted mid-chapter");
          break;
        }
        Err(failed) => {
          tracing::warn!(error = %failed, "Verse unavailable; skipping");
          report.skipped += 1;
          continue;
        }
      };

      let written = self
        .store
        .upsert_verse(NewVerse {
          book_id:        base.book_id,
          chapter_number: base.chapter_number,
          verse_number:   base.verse_number,
          translation:    translation.to_owned(),
          text,
        })
        .await;
      match written {
        Ok(Upserted::Inserted(_)) => report.added += 1,
        Ok(Upserted::Updated(_)) => report.updated += 1,
        Err(e) => {
          return report.fail(format!("failed to write verse {}: {e}", base.verse_number));
        }
      }
    }

    report.finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{
    FailingWrites, ScriptedSource, adapter, chapter_numbers, insert_verses, seeded_store, verse_text,
  };

  fn builder<S: CorpusStore>(store: S, source: ScriptedSource) -> OverlayBuilder<S, ScriptedSource> {
    OverlayBuilder::new(
      Arc::new(store),
      Arc::new(adapter(source, 2)),
      EngineConfig::default(),
    )
  }

  fn codes(codes: &[&str]) -> Vec<String> { codes.iter().map(|c| (*c).to_owned()).collect() }

  #[tokio::test]
  async fn overlays_every_base_address() {
    let (store, books) = seeded_store(&[("Jude", &[25])]).await;
    insert_verses(&store, &books[0], 1, "WEB", 1..=5).await;
    let source = ScriptedSource::new().with_full_chapter("Jude", 1, "KJV", 25);

    let report = builder(store.clone(), source)
      .run(&codes(&["KJV"]), &[])
      .await
      .unwrap();

    assert_eq!(report.summary.verses_added, 5);
    assert_eq!(chapter_numbers(&store, &books[0], 1, "KJV").await, [1, 2, 3, 4, 5]);
    assert_eq!(report.translations[0].final_count, Some(5));

    let kjv = store
      .find_verses(&VerseQuery::chapter(books[0].book_id, 1, "KJV"))
      .await
      .unwrap();
    assert!(kjv.iter().all(|v| v.book_id == books[0].book_id));
    assert_eq!(kjv[0].text, verse_text("Jude", 1, 1, "KJV"));
  }

  #[tokio::test]
  async fn never_writes_outside_base_addresses() {
    let (store, books) = seeded_store(&[("Ruth", &[22, 23])]).await;
    insert_verses(&store, &books[0], 1, "WEB", [1, 3]).await;
    let source = ScriptedSource::new()
      .with_full_chapter("Ruth", 1, "ASV", 22)
      .with_full_chapter("Ruth", 2, "ASV", 23);

    let report = builder(store.clone(), source)
      .run(&codes(&["ASV"]), &[])
      .await
      .unwrap();

    assert_eq!(report.summary.verses_added, 2);
    assert_eq!(chapter_numbers(&store, &books[0], 1, "ASV").await, [1, 3]);
    assert!(chapter_numbers(&store, &books[0], 2, "ASV").await.is_empty());
  }

  #[tokio::test]
  async fn chapter_without_base_verses_is_skipped_not_errored() {
    let (store, books) = seeded_store(&[("Ruth", &[22, 23])]).await;
    insert_verses(&store, &books[0], 1, "WEB", 1..=2).await;
    let source = ScriptedSource::new().with_full_chapter("Ruth", 1, "KJV", 22);
    let b = builder(store, source);

    let report = b.run(&codes(&["KJV"]), &[]).await.unwrap();

    assert_eq!(report.summary.cells_processed, 2);
    assert!(report.summary.errors.is_empty());
    assert_eq!(b.source.source().calls(), 2);
  }

  #[tokio::test]
  async fn second_run_is_idempotent() {
    let (store, books) = seeded_store(&[("Jude", &[25])]).await;
    insert_verses(&store, &books[0], 1, "WEB", 1..=4).await;
    let source = ScriptedSource::new().with_full_chapter("Jude", 1, "BBE", 25);
    let b = builder(store, source);

    let first = b.run(&codes(&["BBE"]), &[]).await.unwrap();
    assert_eq!(first.summary.verses_added, 4);
    let calls_after_first = b.source.source().calls();

    let second = b.run(&codes(&["BBE"]), &[]).await.unwrap();
    assert_eq!(second.summary.writes(), 0);
    assert_eq!(second.summary.verses_skipped, 4);
    assert_eq!(b.source.source().calls(), calls_after_first);
  }

  #[tokio::test]
  async fn short_fetched_text_is_rejected() {
    let (store, books) = seeded_store(&[("John", &[3])]).await;
    insert_verses(&store, &books[0], 1, "WEB", 1..=3).await;
    let source = ScriptedSource::new()
      .with_verse("John", 1, 1, "YLT", "In a beginning was the Word")
      .with_verse("John", 1, 2, "YLT", "")
      .with_verse("John", 1, 3, "YLT", "ab");

    let report = builder(store.clone(), source)
      .run(&codes(&["YLT"]), &[])
      .await
      .unwrap();

    assert_eq!(report.summary.verses_added, 1);
    assert_eq!(report.summary.verses_skipped, 2);
    assert!(report.summary.errors.is_empty());
    assert_eq!(chapter_numbers(&store, &books[0], 1, "YLT").await, [1]);
  }

  #[tokio::test]
  async fn placeholder_text_is_replaced() {
    let (store, books) = seeded_store(&[("John", &[1])]).await;
    insert_verses(&store, &books[0], 1, "WEB", [1]).await;
    let placeholder = store
      .insert_verse(NewVerse {
        book_id:        books[0].book_id,
        chapter_number: 1,
        verse_number:   1,
        translation:    "KJV".into(),
        text:           "..".into(),
      })
      .await
      .unwrap();
    let source = ScriptedSource::new().with_verse("John", 1, 1, "KJV", "In the beginning was the Word");

    let report = builder(store.clone(), source)
      .run(&codes(&["KJV"]), &[])
      .await
      .unwrap();

    assert_eq!(report.summary.verses_updated, 1);
    assert_eq!(report.summary.verses_added, 0);
    let kjv = store
      .find_verses(&VerseQuery::chapter(books[0].book_id, 1, "KJV"))
      .await
      .unwrap();
    assert_eq!(kjv.len(), 1);
    assert_eq!(kjv[0].verse_id, placeholder.verse_id);
    assert_eq!(kjv[0].text, "In the beginning was the Word");
  }

  #[tokio::test]
  async fn unavailable_verses_are_skipped() {
    let (store, books) = seeded_store(&[("Ruth", &[2, 2])]).await;
    insert_verses(&store, &books[0], 1, "WEB", 1..=2).await;
    insert_verses(&store, &books[0], 2, "WEB", 1..=2).await;
    let source = ScriptedSource::new()
      .with_full_chapter("Ruth", 1, "DARBY", 2)
      .with_full_chapter("Ruth", 2, "DARBY", 2)
      .broken_chapter("Ruth", 2);

    let report = builder(store, source)
      .run(&codes(&["DARBY"]), &[])
      .await
      .unwrap();

    assert_eq!(report.summary.verses_added, 2);
    assert_eq!(report.summary.verses_skipped, 2);
    assert!(report.summary.errors.is_empty());
  }

  #[tokio::test]
  async fn write_failure_errors_only_its_cell() {
    let (inner, books) = seeded_store(&[("Ruth", &[2, 2, 2])]).await;
    for chapter in 1..=3 {
      insert_verses(&inner, &books[0], chapter, "WEB", 1..=2).await;
    }
    let store = FailingWrites { inner, fail_chapter: 2 };
    let mut source = ScriptedSource::new();
    for chapter in 1..=3 {
      source = source.with_full_chapter("Ruth", chapter, "KJV", 2);
    }

    let report = builder(store, source)
      .run(&codes(&["KJV"]), &[])
      .await
      .unwrap();

    assert_eq!(report.summary.cells_processed, 3);
    assert_eq!(report.summary.verses_added, 4);
    assert_eq!(report.summary.errors.len(), 1);
    let error = &report.summary.errors[0];
    assert_eq!(error.chapter, 2);
    assert_eq!(error.translation.as_deref(), Some("KJV"));
  }

  #[tokio::test]
  async fn aggregates_across_translations_and_ignores_base() {
    let (store, books) = seeded_store(&[("Jude", &[3])]).await;
    insert_verses(&store, &books[0], 1, "WEB", 1..=3).await;
    let source = ScriptedSource::new()
      .with_full_chapter("Jude", 1, "KJV", 3)
      .with_full_chapter("Jude", 1, "ASV", 3);

    let report = builder(store, source)
      .run(&codes(&["kjv", "WEB", "ASV", "KJV"]), &[])
      .await
      .unwrap();

    let per: Vec<_> = report
      .translations
      .iter()
      .map(|t| (t.translation.as_str(), t.added, t.final_count))
      .collect();
    assert_eq!(per, [("KJV", 3, Some(3)), ("ASV", 3, Some(3))]);
    assert_eq!(report.summary.verses_added, 6);
    assert_eq!(report.summary.cells_processed, 2);
  }

  #[tokio::test]
  async fn cancellation_stops_fetching() {
    let (store, books) = seeded_store(&[("Jude", &[3])]).await;
    insert_verses(&store, &books[0], 1, "WEB", 1..=3).await;
    let source = ScriptedSource::new().with_full_chapter("Jude", 1, "KJV", 3);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let b = builder(store, source).with_cancellation(cancel);

    let report = b.run(&codes(&["KJV"]), &[]).await.unwrap();

    assert!(report.summary.interrupted);
    assert_eq!(b.source.source().calls(), 0);
  }

  #[tokio::test]
  async fn interrupt_mid_chapter_stops_fetching() {
    let (store, books) = seeded_store(&[("Jude", &[3])]).await;
    insert_verses(&store, &books[0], 1, "WEB", 1..=3).await;
    let cancel = CancellationToken::new();
    let source = ScriptedSource::new()
      .with_full_chapter("Jude", 1, "KJV", 3)
      .cancel_on_first_call(cancel.clone());
    let b = builder(store.clone(), source).with_cancellation(cancel);

    let report = b.run(&codes(&["KJV"]), &[]).await.unwrap();

    assert_eq!(b.source.source().calls(), 1);
    assert!(report.summary.interrupted);
    assert!(report.summary.errors.is_empty());
    assert_eq!(chapter_numbers(&store, &books[0], 1, "KJV").await, [1]);
  }
}
