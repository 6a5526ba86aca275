//! Ranking Candidate Normalizer.
//!
//! Converts internal athlete records and loosely-typed external feed rows into
//! [`Candidate`]s. External rows are parsed into a strict [`ExternalRow`] at
//! this boundary; anything that does not fit is rejected and counted, never
//! passed inward.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  candidate::{AthleteProfile, AthleteRecord, Candidate, CandidateOrigin},
  entry::{AthleteIdentity, EntryKey},
  score::{composite_score, round2},
};

/// Implied score per star of an external rank tier (1–5 stars).
pub const POINTS_PER_STAR: f64 = 20.0;

// ─── Internal ────────────────────────────────────────────────────────────────

/// Result of scoring the internal athlete roster.
#[derive(Debug, Default)]
pub struct InternalBatch {
  pub candidates: Vec<Candidate>,
  /// Athletes with no evaluation data; they yield no candidate.
  pub unscored:   usize,
  /// Athletes whose metrics were malformed.
  pub rejected:   Vec<(Uuid, crate::Error)>,
}

/// One candidate per athlete of `sport` with a non-null composite score.
pub fn internal_candidates(records: &[AthleteRecord], sport: &str) -> InternalBatch {
  let mut batch = InternalBatch::default();

  for record in records {
    let profile = &record.profile;
    if !profile.sport.trim().eq_ignore_ascii_case(sport) {
      continue;
    }
    let Some(metrics) = &record.metrics else {
      batch.unscored += 1;
      continue;
    };
    match composite_score(metrics) {
      Ok(Some(score)) => batch.candidates.push(Candidate {
        identity:        AthleteIdentity::internal(profile.athlete_id),
        sport:           sport.to_owned(),
        graduation_year: profile.graduation_year,
        position:        profile.position.clone(),
        state:           profile.state.clone(),
        composite_score: score,
        origin:          CandidateOrigin::Internal,
      }),
      Ok(None) => batch.unscored += 1,
      Err(e) => batch.rejected.push((profile.athlete_id, e)),
    }
  }

  batch
}

// ─── External rows ───────────────────────────────────────────────────────────

/// Why an external row was dropped.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum RowRejection {
  #[error("row is not a JSON object")]
  NotAnObject,
  #[error("row has no athlete name")]
  MissingName,
  #[error("row has no sport")]
  MissingSport,
  #[error("row sport {found:?} does not match requested sport {expected:?}")]
  SportMismatch { expected: String, found: String },
  #[error("row has neither a rating nor a rank tier")]
  MissingScore,
  #[error("rating {0} is outside 0..=100")]
  RatingOutOfRange(f64),
  #[error("rank tier {0} is outside 1..=5")]
  TierOutOfRange(f64),
  #[error("field {0:?} has an unusable value")]
  InvalidField(&'static str),
}

/// A strictly-typed external ranking row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalRow {
  pub name:            String,
  pub sport:           String,
  pub graduation_year: Option<i32>,
  pub position:        Option<String>,
  pub state:           Option<String>,
  /// Score implied by the row's rating or rank tier, in `0..=100`.
  pub implied_score:   f64,
}

impl ExternalRow {
  /// Parse one raw feed row.
  pub fn from_value(value: &Value) -> Result<Self, RowRejection> {
    let obj = value.as_object().ok_or(RowRejection::NotAnObject)?;

    let name = text(obj, &["name", "full_name"]).ok_or(RowRejection::MissingName)?;
    let sport = text(obj, &["sport"]).ok_or(RowRejection::MissingSport)?;

    let graduation_year = match number(obj, &["graduation_year", "class"])? {
      None => None,
      Some(year) if year.fract() == 0.0 && (1900.0..=2200.0).contains(&year) => Some(year as i32),
      Some(_) => return Err(RowRejection::InvalidField("graduation_year")),
    };

    let implied_score = match number(obj, &["rating"])? {
      Some(rating) if (0.0..=100.0).contains(&rating) => rating,
      Some(rating) => return Err(RowRejection::RatingOutOfRange(rating)),
      None => match number(obj, &["stars", "rank_tier"])? {
        Some(tier) if tier.fract() == 0.0 && (1.0..=5.0).contains(&tier) => tier * POINTS_PER_STAR,
        Some(tier) => return Err(RowRejection::TierOutOfRange(tier)),
        None => return Err(RowRejection::MissingScore),
      },
    };

    Ok(Self {
      name,
      sport,
      graduation_year,
      position: text(obj, &["position"]),
      state: text(obj, &["state"]),
      implied_score: round2(implied_score),
    })
  }
}

/// First non-blank string under any of `keys`, trimmed.
fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
  keys
    .iter()
    .filter_map(|k| obj.get(*k))
    .filter_map(Value::as_str)
    .map(str::trim)
    .find(|s| !s.is_empty())
    .map(str::to_owned)
}

/// First number under any of `keys`. Numeric strings are accepted; `null` and
/// blank strings count as absent; anything else is unusable.
fn number(obj: &Map<String, Value>, keys: &[&'static str]) -> Result<Option<f64>, RowRejection> {
  for key in keys {
    let parsed = match obj.get(*key) {
      None | Some(Value::Null) => continue,
      Some(Value::Number(n)) => n.as_f64(),
      Some(Value::String(s)) if s.trim().is_empty() => continue,
      Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
      Some(_) => None,
    };
    return match parsed {
      Some(v) if v.is_finite() => Ok(Some(v)),
      _ => Err(RowRejection::InvalidField(key)),
    };
  }
  Ok(None)
}

/// Result of normalising one external import.
#[derive(Debug, Default)]
pub struct ExternalBatch {
  pub candidates:        Vec<Candidate>,
  /// `(row index, reason)` for every dropped row.
  pub rejected:          Vec<(usize, RowRejection)>,
  /// Names that matched more than one internal athlete.
  pub ambiguous:         Vec<String>,
  /// Rows repeating an identity + cohort already seen in this import.
  pub duplicates:        usize,
  /// Resolved rows whose graduation year disagrees with the athlete profile.
  /// They still become candidates, in the feed's cohort.
  pub cohort_mismatches: Vec<CohortMismatch>,
}

/// A feed row placed an internal athlete in a different cohort than the
/// athlete's own profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortMismatch {
  pub athlete_id:   Uuid,
  pub profile_year: Option<i32>,
  pub feed_year:    i32,
}

/// One candidate per usable external row for `sport`.
///
/// Identity is resolved by exact (trimmed) full-name match against the
/// athletes of `roster` in the same sport. A single match yields an internal
/// identity, inheriting any cohort fields the row omits; zero or several
/// matches yield an external-only identity.
pub fn external_candidates(rows: &[Value], sport: &str, roster: &[AthleteProfile]) -> ExternalBatch {
  let mut by_name: HashMap<&str, Vec<&AthleteProfile>> = HashMap::new();
  for profile in roster.iter().filter(|p| p.sport.trim().eq_ignore_ascii_case(sport)) {
    by_name.entry(profile.full_name.trim()).or_default().push(profile);
  }

  let mut batch = ExternalBatch::default();
  let mut seen: HashSet<EntryKey> = HashSet::new();

  for (index, value) in rows.iter().enumerate() {
    let row = match ExternalRow::from_value(value) {
      Ok(row) => row,
      Err(reason) => {
        batch.rejected.push((index, reason));
        continue;
      }
    };
    if !row.sport.eq_ignore_ascii_case(sport) {
      batch.rejected.push((index, RowRejection::SportMismatch {
        expected: sport.to_owned(),
        found:    row.sport,
      }));
      continue;
    }

    let candidate = match by_name.get(row.name.as_str()).map(Vec::as_slice) {
      Some([profile]) => {
        if let Some(feed_year) = row.graduation_year
          && profile.graduation_year != Some(feed_year)
        {
          batch.cohort_mismatches.push(CohortMismatch {
            athlete_id: profile.athlete_id,
            profile_year: profile.graduation_year,
            feed_year,
          });
        }
        Candidate {
          identity:        AthleteIdentity::internal(profile.athlete_id),
          sport:           sport.to_owned(),
          graduation_year: row.graduation_year.or(profile.graduation_year),
          position:        row.position.or_else(|| profile.position.clone()),
          state:           row.state.or_else(|| profile.state.clone()),
          composite_score: row.implied_score,
          origin:          CandidateOrigin::External,
        }
      }
      matches => {
        if matches.is_some_and(|m| m.len() > 1) {
          batch.ambiguous.push(row.name.clone());
        }
        Candidate {
          identity:        AthleteIdentity::ExternalOnly { name: row.name },
          sport:           sport.to_owned(),
          graduation_year: row.graduation_year,
          position:        row.position,
          state:           row.state,
          composite_score: row.implied_score,
          origin:          CandidateOrigin::External,
        }
      }
    };

    if seen.insert(candidate.key()) {
      batch.candidates.push(candidate);
    } else {
      batch.duplicates += 1;
    }
  }

  batch
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

/// The combined candidate list for a merge pass.
#[derive(Debug, Default)]
pub struct Reconciled {
  pub candidates: Vec<Candidate>,
  /// External candidates dropped in favour of an internal one.
  pub superseded: usize,
}

/// Combine internal and external candidates. Internal evaluation data is
/// authoritative: an external candidate for the same identity and cohort is
/// discarded.
pub fn reconcile(internal: Vec<Candidate>, external: Vec<Candidate>) -> Reconciled {
  let internal_keys: HashSet<EntryKey> = internal.iter().map(Candidate::key).collect();

  let mut out = Reconciled { candidates: internal, superseded: 0 };
  for candidate in external {
    if internal_keys.contains(&candidate.key()) {
      out.superseded += 1;
    } else {
      out.candidates.push(candidate);
    }
  }
  out
}
