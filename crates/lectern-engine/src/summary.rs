//! Structured run outputs, serialised as camelCase JSON by the binary.

use serde::Serialize;

use crate::cell::CellReport;

// ─── Mutating runs ───────────────────────────────────────────────────────────

/// A cell that ended in error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellError {
  pub book:        String,
  pub chapter:     u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub translation: Option<String>,
  pub reason:      String,
}

/// Totals for a reconciliation or overlay run. Always complete, even when
/// some cells failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
  pub cells_processed:    usize,
  pub verses_added:       usize,
  pub verses_updated:     usize,
  pub verses_skipped:     usize,
  pub chapters_corrected: usize,
  pub errors:             Vec<CellError>,
  /// The run was cancelled before every cell was processed.
  pub interrupted:        bool,
}

impl RunSummary {
  pub fn record(&mut self, report: &CellReport) {
    self.cells_processed += 1;
    self.verses_added += report.added;
    self.verses_updated += report.updated;
    self.verses_skipped += report.skipped;
    if report.chapter_corrected {
      self.chapters_corrected += 1;
    }
    if let Some(error) = report.error() {
      self.errors.push(error);
    }
  }

  pub fn merge(&mut self, other: RunSummary) {
    self.cells_processed += other.cells_processed;
    self.verses_added += other.verses_added;
    self.verses_updated += other.verses_updated;
    self.verses_skipped += other.verses_skipped;
    self.chapters_corrected += other.chapters_corrected;
    self.errors.extend(other.errors);
    self.interrupted |= other.interrupted;
  }

  /// Total store writes performed.
  pub fn writes(&self) -> usize {
    self.verses_added + self.verses_updated + self.chapters_corrected
  }
}

/// Per-translation totals from an overlay run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationReport {
  pub translation: String,
  pub added:       usize,
  pub updated:     usize,
  pub skipped:     usize,
  pub errors:      usize,
  /// Active verses stored under this translation once the run finished.
  /// `None` if the final count could not be read.
  pub final_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayReport {
  #[serde(flatten)]
  pub summary:      RunSummary,
  pub translations: Vec<TranslationReport>,
}

// ─── Audit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeficientChapter {
  pub book:     String,
  pub chapter:  u32,
  pub expected: u64,
  pub actual:   u64,
  pub missing:  u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
  pub translation:        String,
  pub chapters_audited:   usize,
  pub expected_total:     u64,
  pub actual_total:       u64,
  /// `actual_total / expected_total` as a percentage, rounded to two
  /// decimals. An empty corpus is 100% complete.
  pub completion_percent: f64,
  pub deficient_chapters: Vec<DeficientChapter>,
}

pub(crate) fn completion_percent(actual: u64, expected: u64) -> f64 {
  if expected == 0 {
    return 100.0;
  }
  let pct = actual as f64 / expected as f64 * 100.0;
  (pct * 100.0).round() / 100.0
}
