//! The `RankingStore` trait and supporting request types.
//!
//! The trait is implemented by storage backends (e.g. `podium-store-sqlite`).
//! The engine and the API depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  candidate::{Candidate, CandidateOrigin},
  entry::{EntryPatch, NewEntry, RankingEntry},
  summary::MergeSummary,
};

// ─── Error classification ────────────────────────────────────────────────────

/// Backend errors the upper layers need to tell apart.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The addressed entry does not exist.
  fn is_not_found(&self) -> bool;

  /// A concurrent writer held the data; the whole invocation may be retried.
  fn is_conflict(&self) -> bool;

  /// The write would create a second entry for one athlete in one cohort.
  fn is_duplicate(&self) -> bool;

  /// The caller supplied a value the domain rejects (score or rank range).
  fn is_invalid_input(&self) -> bool;
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// Filter for [`RankingStore::list_entries`].
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
  pub sport:           Option<String>,
  pub graduation_year: Option<i32>,
  pub locked_only:     bool,
  pub limit:           Option<usize>,
  pub offset:          Option<usize>,
}

/// One transactional merge pass for a sport.
#[derive(Debug, Clone)]
pub struct MergeRequest {
  pub sport:    String,
  /// Freshly normalised candidates replacing the stored snapshot of their
  /// origin before the merge. `None` re-merges the stored snapshots as-is.
  pub snapshot: Option<(CandidateOrigin, Vec<Candidate>)>,
  pub at:       DateTime<Utc>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the persisted ranking table.
///
/// Automated writes go through [`RankingStore::run_merge`] only, which must
/// read the entries (including their lock flags), compute the next state and
/// write it within one transaction. Everything else here is an administrator
/// action and ignores locks.
pub trait RankingStore: Send + Sync {
  type Error: StoreError;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn get_entry(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<RankingEntry>, Self::Error>> + Send + '_;

  /// Entries matching `query`, best overall rank first (unranked last).
  fn list_entries<'a>(
    &'a self,
    query: &'a EntryQuery,
  ) -> impl Future<Output = Result<Vec<RankingEntry>, Self::Error>> + Send + 'a;

  // ── Batch merge ───────────────────────────────────────────────────────

  /// Replace the snapshot (if any), reconcile the stored snapshots, merge
  /// them into the sport's entries and reassign ranks, all in one
  /// transaction.
  fn run_merge(
    &self,
    request: MergeRequest,
  ) -> impl Future<Output = Result<MergeSummary, Self::Error>> + Send + '_;

  // ── Override store ────────────────────────────────────────────────────

  /// Lock an entry against automated writes. Locking a locked entry
  /// refreshes the audit fields.
  fn lock<'a>(
    &'a self,
    id: Uuid,
    actor: &'a str,
  ) -> impl Future<Output = Result<RankingEntry, Self::Error>> + Send + 'a;

  /// Unlock an entry. Its values stay as they are until the next merge.
  fn unlock<'a>(
    &'a self,
    id: Uuid,
    actor: &'a str,
  ) -> impl Future<Output = Result<RankingEntry, Self::Error>> + Send + 'a;

  // ── Direct admin CRUD ─────────────────────────────────────────────────

  fn create_manual_entry<'a>(
    &'a self,
    input: NewEntry,
    actor: &'a str,
  ) -> impl Future<Output = Result<RankingEntry, Self::Error>> + Send + 'a;

  fn update_entry<'a>(
    &'a self,
    id: Uuid,
    patch: &'a EntryPatch,
  ) -> impl Future<Output = Result<RankingEntry, Self::Error>> + Send + 'a;

  fn delete_entry(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
