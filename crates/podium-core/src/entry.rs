//! Ranking entries: the persisted unit of ranking state.
//!
//! An entry belongs to exactly one cohort (`sport` + `graduation_year`) and
//! identifies its athlete either by internal UUID or, for athletes known only
//! from an external feed, by name. The [`AthleteIdentity`] enum makes the two
//! modes mutually exclusive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Who a ranking entry (or candidate) is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AthleteIdentity {
  /// An athlete owned by the platform's athlete records.
  Internal { athlete_id: Uuid },
  /// An athlete seen only in an external ranking feed.
  ExternalOnly { name: String },
}

impl AthleteIdentity {
  pub fn internal(athlete_id: Uuid) -> Self { Self::Internal { athlete_id } }

  /// Build an external-only identity, trimming the name.
  pub fn external(name: &str) -> Result<Self> {
    let name = name.trim();
    if name.is_empty() {
      return Err(Error::EmptyName);
    }
    Ok(Self::ExternalOnly { name: name.to_owned() })
  }

  pub fn is_external_only(&self) -> bool { matches!(self, Self::ExternalOnly { .. }) }

  pub fn athlete_id(&self) -> Option<Uuid> {
    match self {
      Self::Internal { athlete_id } => Some(*athlete_id),
      Self::ExternalOnly { .. } => None,
    }
  }

  pub fn external_name(&self) -> Option<&str> {
    match self {
      Self::Internal { .. } => None,
      Self::ExternalOnly { name } => Some(name),
    }
  }

  /// A stable string key, unique across both identity modes.
  pub fn key(&self) -> String {
    match self {
      Self::Internal { athlete_id } => format!("athlete:{athlete_id}"),
      Self::ExternalOnly { name } => format!("external:{name}"),
    }
  }
}

// ─── Cohort ──────────────────────────────────────────────────────────────────

/// The uniqueness key of an entry: one entry per athlete per cohort.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKey {
  pub identity:        AthleteIdentity,
  pub sport:           String,
  pub graduation_year: Option<i32>,
}

// ─── Ranks ───────────────────────────────────────────────────────────────────

/// The four rank dimensions. `None` means "not enough data for that
/// dimension", never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranks {
  pub overall:  Option<u32>,
  pub position: Option<u32>,
  pub state:    Option<u32>,
  pub national: Option<u32>,
}

impl Ranks {
  pub const NONE: Ranks =
    Ranks { overall: None, position: None, state: None, national: None };

  /// Reject zero in any dimension; ranks start at 1.
  pub fn validate(&self) -> Result<()> {
    for rank in [self.overall, self.position, self.state, self.national].into_iter().flatten() {
      if rank == 0 {
        return Err(Error::InvalidRank(rank));
      }
    }
    Ok(())
  }
}

/// Validate a composite score: finite and within `0..=100`.
pub fn validate_score(score: f64) -> Result<f64> {
  if score.is_finite() && (0.0..=100.0).contains(&score) {
    Ok(score)
  } else {
    Err(Error::ScoreOutOfRange(score))
  }
}

// ─── RankingEntry ────────────────────────────────────────────────────────────

/// A persisted ranking entry.
///
/// While `is_manual_override` is set, no automated pass may change any field
/// of the entry; only administrator actions may.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
  pub entry_id:           Uuid,
  pub identity:           AthleteIdentity,
  pub sport:              String,
  pub graduation_year:    Option<i32>,
  pub position:           Option<String>,
  pub state:              Option<String>,
  pub composite_score:    Option<f64>,
  pub ranks:              Ranks,
  pub is_manual_override: bool,
  pub overridden_by:      Option<String>,
  pub overridden_at:      Option<DateTime<Utc>>,
  /// Set on creation and on every write that changes computed fields.
  pub last_calculated:    DateTime<Utc>,
}

impl RankingEntry {
  pub fn key(&self) -> EntryKey {
    EntryKey {
      identity:        self.identity.clone(),
      sport:           self.sport.clone(),
      graduation_year: self.graduation_year,
    }
  }

  pub fn is_external_only(&self) -> bool { self.identity.is_external_only() }

  /// True when any field an automated pass may write differs.
  pub fn computed_fields_differ(&self, other: &RankingEntry) -> bool {
    self.composite_score != other.composite_score
      || self.ranks != other.ranks
      || self.position != other.position
      || self.state != other.state
  }
}

// ─── Admin inputs ────────────────────────────────────────────────────────────

/// Input to [`crate::store::RankingStore::create_manual_entry`].
#[derive(Debug, Clone)]
pub struct NewEntry {
  pub identity:        AthleteIdentity,
  pub sport:           String,
  pub graduation_year: Option<i32>,
  pub position:        Option<String>,
  pub state:           Option<String>,
  pub composite_score: Option<f64>,
  pub ranks:           Ranks,
  /// Create the entry already locked, with the creating admin as the
  /// override author.
  pub lock:            bool,
}

impl NewEntry {
  /// Convenience constructor with every optional field unset.
  pub fn new(identity: AthleteIdentity, sport: impl Into<String>) -> Self {
    Self {
      identity,
      sport: sport.into(),
      graduation_year: None,
      position: None,
      state: None,
      composite_score: None,
      ranks: Ranks::NONE,
      lock: false,
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.sport.trim().is_empty() {
      return Err(Error::EmptySport);
    }
    if let Some(score) = self.composite_score {
      validate_score(score)?;
    }
    self.ranks.validate()
  }

  /// Materialise the entry as of `at`.
  pub fn into_entry(self, actor: &str, at: DateTime<Utc>) -> RankingEntry {
    RankingEntry {
      entry_id:           Uuid::new_v4(),
      identity:           self.identity,
      sport:              self.sport.trim().to_owned(),
      graduation_year:    self.graduation_year,
      position:           self.position,
      state:              self.state,
      composite_score:    self.composite_score,
      ranks:              self.ranks,
      is_manual_override: self.lock,
      overridden_by:      self.lock.then(|| actor.to_owned()),
      overridden_at:      self.lock.then_some(at),
      last_calculated:    at,
    }
  }
}

/// A direct administrator edit. `None` leaves a field alone; `Some(None)`
/// clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
  pub graduation_year: Option<Option<i32>>,
  pub position:        Option<Option<String>>,
  pub state:           Option<Option<String>>,
  pub composite_score: Option<Option<f64>>,
  pub overall_rank:    Option<Option<u32>>,
  pub position_rank:   Option<Option<u32>>,
  pub state_rank:      Option<Option<u32>>,
  pub national_rank:   Option<Option<u32>>,
}

impl EntryPatch {
  /// Apply the patch to `entry`, validating every value written. Lock state
  /// is not consulted.
  pub fn apply(&self, entry: &mut RankingEntry, at: DateTime<Utc>) -> Result<()> {
    if let Some(Some(score)) = self.composite_score {
      validate_score(score)?;
    }
    let ranks = Ranks {
      overall:  self.overall_rank.unwrap_or(entry.ranks.overall),
      position: self.position_rank.unwrap_or(entry.ranks.position),
      state:    self.state_rank.unwrap_or(entry.ranks.state),
      national: self.national_rank.unwrap_or(entry.ranks.national),
    };
    ranks.validate()?;

    if let Some(year) = self.graduation_year {
      entry.graduation_year = year;
    }
    if let Some(position) = &self.position {
      entry.position = position.clone();
    }
    if let Some(state) = &self.state {
      entry.state = state.clone();
    }
    if let Some(score) = self.composite_score {
      entry.composite_score = score;
    }
    entry.ranks = ranks;
    entry.last_calculated = at;
    Ok(())
  }
}
