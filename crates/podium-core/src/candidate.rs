//! Ranking candidates and the athlete records they are built from.
//!
//! A candidate is a uniform-shaped proposal for one entry's score, produced
//! either from internal evaluation data or from an external ranking feed.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  entry::{AthleteIdentity, EntryKey},
  score::EvaluationMetrics,
};

/// Where a candidate came from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CandidateOrigin {
  /// Computed from the platform's own evaluations.
  Internal,
  /// Implied by an external ranking feed.
  External,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
  pub identity:        AthleteIdentity,
  pub sport:           String,
  pub graduation_year: Option<i32>,
  pub position:        Option<String>,
  pub state:           Option<String>,
  pub composite_score: f64,
  pub origin:          CandidateOrigin,
}

impl Candidate {
  pub fn key(&self) -> EntryKey {
    EntryKey {
      identity:        self.identity.clone(),
      sport:           self.sport.clone(),
      graduation_year: self.graduation_year,
    }
  }
}

// ─── Athlete records (from the evaluation source) ────────────────────────────

/// Identity and cohort data for an internal athlete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
  pub athlete_id:      Uuid,
  pub full_name:       String,
  pub sport:           String,
  pub graduation_year: Option<i32>,
  pub position:        Option<String>,
  pub state:           Option<String>,
}

/// An athlete and their latest evaluation, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteRecord {
  pub profile: AthleteProfile,
  pub metrics: Option<EvaluationMetrics>,
}
