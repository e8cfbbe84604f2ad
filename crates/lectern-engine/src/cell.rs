//! Cells, the independent units of reconciliation work, and the state
//! machine each one moves through.
//!
//! ```text
//! pending → fetching → { applying | skipped | errored } → done
//! ```
//!
//! A missing prerequisite may skip a cell straight from `pending`, and a
//! store failure may error it from `pending` or `applying`. No cell moves
//! backwards.

use lectern_core::model::{Book, Chapter};
use strum::Display;

use crate::summary::CellError;

// ─── State machine ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CellState {
  Pending,
  Fetching,
  Applying,
  Skipped,
  Errored,
  Done,
}

impl CellState {
  pub fn can_advance_to(self, next: CellState) -> bool {
    use CellState::*;
    matches!(
      (self, next),
      (Pending, Fetching | Skipped | Errored)
        | (Fetching, Applying | Skipped | Errored)
        | (Applying, Errored)
        | (Applying | Skipped | Errored, Done)
    )
  }

  pub fn is_terminal(self) -> bool { self == CellState::Done }

  /// Move to `next`, logging the transition in the current span.
  pub fn advance(&mut self, next: CellState) {
    debug_assert!(
      self.can_advance_to(next),
      "illegal cell transition {self} -> {next}"
    );
    tracing::debug!(from = %self, to = %next, "cell transition");
    *self = next;
  }
}

// ─── Cells ───────────────────────────────────────────────────────────────────

/// A `(book, chapter)` pair, planned up front so a store failure while
/// listing the corpus aborts the run before any work starts.
#[derive(Debug, Clone)]
pub struct ChapterCell {
  pub book:    Book,
  pub chapter: Chapter,
}

impl ChapterCell {
  pub fn number(&self) -> u32 { self.chapter.chapter_number }
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// How a cell finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellOutcome {
  /// Verses were written.
  Added(usize),
  /// Already at parity; nothing written.
  Complete,
  /// Prerequisite missing; nothing attempted.
  Skipped(String),
  Error(String),
}

/// What one cell did, fed into the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellReport {
  pub book:              String,
  pub chapter:           u32,
  pub translation:       Option<String>,
  pub state:             CellState,
  pub outcome:           CellOutcome,
  pub added:             usize,
  pub updated:           usize,
  pub skipped:           usize,
  pub chapter_corrected: bool,
}

impl CellReport {
  pub fn new(cell: &ChapterCell, translation: Option<&str>) -> Self {
    Self {
      book:              cell.book.name.clone(),
      chapter:           cell.number(),
      translation:       translation.map(str::to_owned),
      state:             CellState::Pending,
      outcome:           CellOutcome::Complete,
      added:             0,
      updated:           0,
      skipped:           0,
      chapter_corrected: false,
    }
  }

  /// Close the cell as errored. Writes already applied stay counted.
  pub fn fail(mut self, reason: impl Into<String>) -> Self {
    let reason = reason.into();
    tracing::warn!(reason = %reason, "cell failed");
    self.state.advance(CellState::Errored);
    self.state.advance(CellState::Done);
    self.outcome = CellOutcome::Error(reason);
    self
  }

  /// Close the cell as skipped.
  pub fn skip(mut self, reason: impl Into<String>) -> Self {
    let reason = reason.into();
    tracing::info!(reason = %reason, "cell skipped");
    self.state.advance(CellState::Skipped);
    self.state.advance(CellState::Done);
    self.outcome = CellOutcome::Skipped(reason);
    self
  }

  /// Close the cell after its writes were applied.
  pub fn finish(mut self) -> Self {
    self.state.advance(CellState::Done);
    self.outcome = if self.added > 0 {
      CellOutcome::Added(self.added)
    } else {
      CellOutcome::Complete
    };
    tracing::info!(
      added = self.added,
      updated = self.updated,
      skipped = self.skipped,
      corrected = self.chapter_corrected,
      "cell done"
    );
    self
  }

  pub fn error(&self) -> Option<CellError> {
    match &self.outcome {
      CellOutcome::Error(reason) => Some(CellError {
        book:        self.book.clone(),
        chapter:     self.chapter,
        translation: self.translation.clone(),
        reason:      reason.clone(),
      }),
      _ => None,
    }
  }
}
