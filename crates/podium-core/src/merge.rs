//! Override-Aware Merge Engine.
//!
//! Computes the next persisted state of a sport's ranking entries from the
//! current entries and a fresh candidate list. The function is pure; the
//! store runs it between reading and writing inside one transaction.
//!
//! Locked entries are frozen in every respect, `last_calculated` included.
//! Entries absent from the candidate list are never deleted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  candidate::Candidate,
  entry::{EntryKey, RankingEntry, Ranks, validate_score},
  rank::assign_ranks,
  summary::MergeSummary,
};

/// The writes a merge pass needs.
#[derive(Debug, Default)]
pub struct MergePlan {
  pub inserts: Vec<RankingEntry>,
  pub updates: Vec<RankingEntry>,
  pub summary: MergeSummary,
}

/// Merge `candidates` into `existing` as of `at`.
///
/// Only entries whose computed fields actually change are returned as
/// updates (with `last_calculated = at`), so running the same merge twice
/// yields no writes the second time.
pub fn merge(existing: &[RankingEntry], candidates: &[Candidate], at: DateTime<Utc>) -> MergePlan {
  let mut summary = MergeSummary { candidates: candidates.len(), ..Default::default() };

  let mut working: Vec<RankingEntry> = existing.to_vec();
  let mut index: HashMap<EntryKey, usize> =
    working.iter().enumerate().map(|(i, e)| (e.key(), i)).collect();

  for candidate in candidates {
    let Ok(score) = validate_score(candidate.composite_score) else {
      summary.invalid += 1;
      continue;
    };

    match index.get(&candidate.key()) {
      Some(&i) if working[i].is_manual_override => summary.preserved += 1,
      Some(&i) => {
        let entry = &mut working[i];
        entry.composite_score = Some(score);
        if candidate.position.is_some() {
          entry.position = candidate.position.clone();
        }
        if candidate.state.is_some() {
          entry.state = candidate.state.clone();
        }
        entry.ranks = Ranks::NONE;
      }
      None => {
        index.insert(candidate.key(), working.len());
        working.push(RankingEntry {
          entry_id:           Uuid::new_v4(),
          identity:           candidate.identity.clone(),
          sport:              candidate.sport.clone(),
          graduation_year:    candidate.graduation_year,
          position:           candidate.position.clone(),
          state:              candidate.state.clone(),
          composite_score:    Some(score),
          ranks:              Ranks::NONE,
          is_manual_override: false,
          overridden_by:      None,
          overridden_at:      None,
          last_calculated:    at,
        });
      }
    }
  }

  assign_ranks(&mut working);

  let mut plan = MergePlan::default();
  let mut working = working.into_iter();

  for (before, mut after) in existing.iter().zip(working.by_ref()) {
    if after.computed_fields_differ(before) {
      after.last_calculated = at;
      plan.updates.push(after);
    } else {
      summary.unchanged += 1;
    }
  }
  plan.inserts.extend(working);

  summary.inserted = plan.inserts.len();
  summary.updated = plan.updates.len();
  plan.summary = summary;
  plan
}
