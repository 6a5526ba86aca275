//! Per-run summaries surfaced to administrators instead of raw errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Which trigger produced a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunKind {
  Recalculate,
  ImportExternal,
  Merge,
}

/// What one transactional merge pass did to the persisted entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
  /// Candidates considered after reconciliation.
  pub candidates: usize,
  /// New entries created for first-seen candidates.
  pub inserted:   usize,
  /// Existing entries whose score, ranks or cohort details changed.
  pub updated:    usize,
  /// Existing entries left byte-identical.
  pub unchanged:  usize,
  /// Candidates that matched a locked entry and were skipped.
  pub preserved:  usize,
  /// Candidates with an unusable score, skipped.
  pub invalid:    usize,
  /// External candidates dropped in favour of internal ones.
  pub superseded: usize,
}

impl MergeSummary {
  /// Rows written by the pass.
  pub fn written(&self) -> usize { self.inserted + self.updated }
}

/// The full summary of one engine invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
  pub kind:               RunKind,
  pub sport:              String,
  pub started_at:         DateTime<Utc>,
  pub finished_at:        DateTime<Utc>,
  pub merge:              MergeSummary,
  /// Internal athletes that produced a score (`recalculate`).
  pub scored:             usize,
  /// Internal athletes with no evaluation data (`recalculate`).
  pub unscored:           usize,
  /// External rows accepted as candidates (`import_external`).
  pub imported:           usize,
  /// Malformed rows or athletes skipped during normalisation.
  pub rejected:           usize,
  /// External names matching several internal athletes (`import_external`).
  pub ambiguous:          usize,
  /// Repeated external rows for one identity and cohort (`import_external`).
  pub duplicates:         usize,
  /// Resolved external rows filed under a different graduation year than
  /// the athlete's profile (`import_external`).
  pub cohort_mismatches:  usize,
  /// Whether the caller asked for overrides to be preserved. Overrides are
  /// always honored; this only records the request.
  pub preserve_overrides: bool,
}

impl RunSummary {
  pub fn new(kind: RunKind, sport: &str, started_at: DateTime<Utc>) -> Self {
    Self {
      kind,
      sport: sport.to_owned(),
      started_at,
      finished_at: started_at,
      merge: MergeSummary::default(),
      scored: 0,
      unscored: 0,
      imported: 0,
      rejected: 0,
      ambiguous: 0,
      duplicates: 0,
      cohort_mismatches: 0,
      preserve_overrides: true,
    }
  }
}
