//! [`RankingEngine`]: the triggerable batch jobs.

use std::future::Future;

use chrono::{DateTime, Utc};
use podium_core::{
  candidate::{AthleteProfile, Candidate, CandidateOrigin},
  normalize::{external_candidates, internal_candidates},
  source::{EvaluationSource, ExternalRankingSource},
  store::{MergeRequest, RankingStore},
  summary::{MergeSummary, RunKind, RunSummary},
};
use tracing::{debug, error, info, warn};

use crate::{EngineConfig, Error, Result, SourceKind};

/// Runs batch jobs against a store, an evaluation source and an external feed.
pub struct RankingEngine<S, E, X> {
  store:       S,
  evaluations: E,
  external:    X,
  config:      EngineConfig,
}

impl<S, E, X> RankingEngine<S, E, X>
where
  S: RankingStore,
  E: EvaluationSource,
  X: ExternalRankingSource,
{
  pub fn new(store: S, evaluations: E, external: X, config: EngineConfig) -> Self {
    Self { store, evaluations, external, config }
  }

  /// The backing store, for admin CRUD that bypasses the batch jobs.
  pub fn store(&self) -> &S { &self.store }

  // ─── Jobs ──────────────────────────────────────────────────────────────────

  /// Rescore every internal athlete of `sport` from its latest evaluation,
  /// replace the internal candidate snapshot and merge.
  pub async fn recalculate(&self, sport: &str) -> Result<RunSummary> {
    let sport = checked_sport(sport)?;
    let mut summary = RunSummary::new(RunKind::Recalculate, sport, Utc::now());
    info!(%sport, "recalculation started");

    let records = self.fetch(SourceKind::Evaluations, self.evaluations.athletes(sport)).await?;
    let batch = internal_candidates(&records, sport);
    for (athlete_id, reason) in &batch.rejected {
      warn!(%sport, %athlete_id, %reason, "skipping athlete with malformed metrics");
    }

    summary.scored = batch.candidates.len();
    summary.unscored = batch.unscored;
    summary.rejected = batch.rejected.len();
    summary.merge = self
      .run_merge(sport, Some((CandidateOrigin::Internal, batch.candidates)), summary.started_at)
      .await?;

    Ok(finish(summary))
  }

  /// Fetch the external feed for `sport`/`season`, normalise it against the
  /// internal roster, replace the external candidate snapshot and merge.
  pub async fn import_external(&self, sport: &str, season: &str) -> Result<RunSummary> {
    let sport = checked_sport(sport)?;
    let mut summary = RunSummary::new(RunKind::ImportExternal, sport, Utc::now());
    info!(%sport, %season, "external import started");

    // Both fetches finish before anything is written.
    let (rows, records) = tokio::try_join!(
      self.fetch(SourceKind::External, self.external.fetch(sport, season)),
      self.fetch(SourceKind::Evaluations, self.evaluations.athletes(sport)),
    )?;
    let roster: Vec<AthleteProfile> = records.into_iter().map(|r| r.profile).collect();

    let batch = external_candidates(&rows, sport, &roster);
    for (row, reason) in &batch.rejected {
      warn!(%sport, row, %reason, "rejected external row");
    }
    for name in &batch.ambiguous {
      warn!(%sport, %name, "ambiguous external identity; keeping as external-only");
    }
    for m in &batch.cohort_mismatches {
      warn!(
        %sport,
        athlete_id = %m.athlete_id,
        profile_year = ?m.profile_year,
        feed_year = m.feed_year,
        "external row places athlete in a different cohort than the profile"
      );
    }

    summary.imported = batch.candidates.len();
    summary.rejected = batch.rejected.len();
    summary.ambiguous = batch.ambiguous.len();
    summary.duplicates = batch.duplicates;
    summary.cohort_mismatches = batch.cohort_mismatches.len();
    summary.merge = self
      .run_merge(sport, Some((CandidateOrigin::External, batch.candidates)), summary.started_at)
      .await?;

    Ok(finish(summary))
  }

  /// Re-merge the stored candidate snapshots of `sport` without fetching.
  ///
  /// Locked entries are never overwritten; `preserve_overrides` is recorded
  /// in the summary and nothing else.
  pub async fn merge(&self, sport: &str, preserve_overrides: bool) -> Result<RunSummary> {
    let sport = checked_sport(sport)?;
    let mut summary = RunSummary::new(RunKind::Merge, sport, Utc::now());
    summary.preserve_overrides = preserve_overrides;
    if !preserve_overrides {
      warn!(%sport, "preserve_overrides=false requested; locked entries stay frozen");
    }

    summary.merge = self.run_merge(sport, None, summary.started_at).await?;
    if preserve_overrides {
      info!(%sport, preserved = summary.merge.preserved, "overrides honored");
    }

    Ok(finish(summary))
  }

  // ─── Helpers ───────────────────────────────────────────────────────────────

  async fn fetch<T, F, FE>(&self, kind: SourceKind, fut: F) -> Result<T>
  where
    F: Future<Output = std::result::Result<T, FE>>,
    FE: std::fmt::Display,
  {
    let after = self.config.fetch_timeout();
    match tokio::time::timeout(after, fut).await {
      Ok(Ok(value)) => Ok(value),
      Ok(Err(e)) => {
        error!(source = %kind, error = %e, "source unavailable; aborting run");
        Err(Error::SourceUnavailable { kind, message: e.to_string() })
      }
      Err(_) => {
        error!(source = %kind, secs = after.as_secs(), "source timed out; aborting run");
        Err(Error::SourceTimeout { kind, after })
      }
    }
  }

  async fn run_merge(
    &self,
    sport: &str,
    snapshot: Option<(CandidateOrigin, Vec<Candidate>)>,
    at: DateTime<Utc>,
  ) -> Result<MergeSummary> {
    let request = MergeRequest { sport: sport.to_owned(), snapshot, at };
    let merged = self.store.run_merge(request).await.map_err(Error::store)?;
    if merged.preserved > 0 {
      debug!(%sport, preserved = merged.preserved, "skipped locked entries");
    }
    Ok(merged)
  }
}

fn checked_sport(sport: &str) -> Result<&str> {
  let sport = sport.trim();
  if sport.is_empty() {
    return Err(podium_core::Error::EmptySport.into());
  }
  Ok(sport)
}

fn finish(mut summary: RunSummary) -> RunSummary {
  summary.finished_at = Utc::now();
  let m = &summary.merge;
  info!(
    kind = %summary.kind,
    sport = %summary.sport,
    inserted = m.inserted,
    updated = m.updated,
    unchanged = m.unchanged,
    preserved = m.preserved,
    rejected = summary.rejected,
    "run finished"
  );
  summary
}
