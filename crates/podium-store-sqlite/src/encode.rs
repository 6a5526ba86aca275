//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings with fixed microsecond
//! precision, so they sort lexically. UUIDs are stored as
//! hyphenated lowercase strings. Candidate snapshots are stored as compact
//! JSON.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use podium_core::{
  candidate::Candidate,
  entry::{AthleteIdentity, RankingEntry, Ranks},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Candidates ───────────────────────────────────────────────────────────────

pub fn encode_candidates(candidates: &[Candidate]) -> Result<String> {
  Ok(serde_json::to_string(candidates)?)
}

pub fn decode_candidates(s: &str) -> Result<Vec<Candidate>> { Ok(serde_json::from_str(s)?) }

// ─── Entries ──────────────────────────────────────────────────────────────────

/// Column list shared by every `SELECT` that feeds [`read_raw_entry`].
pub const ENTRY_COLUMNS: &str = "
  entry_id, athlete_id, external_athlete_name, is_external_only,
  sport, graduation_year, position, state, composite_score,
  overall_rank, position_rank, state_rank, national_rank,
  is_manual_override, overridden_by, overridden_at, last_calculated";

/// Raw values read directly from a `ranking_entries` row.
pub struct RawEntry {
  pub entry_id:              String,
  pub athlete_id:            Option<String>,
  pub external_athlete_name: Option<String>,
  pub is_external_only:      bool,
  pub sport:                 String,
  pub graduation_year:       Option<i32>,
  pub position:              Option<String>,
  pub state:                 Option<String>,
  pub composite_score:       Option<f64>,
  pub overall_rank:          Option<u32>,
  pub position_rank:         Option<u32>,
  pub state_rank:            Option<u32>,
  pub national_rank:         Option<u32>,
  pub is_manual_override:    bool,
  pub overridden_by:         Option<String>,
  pub overridden_at:         Option<String>,
  pub last_calculated:       String,
}

/// Read a row selected with [`ENTRY_COLUMNS`].
pub fn read_raw_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
  Ok(RawEntry {
    entry_id:              row.get(0)?,
    athlete_id:            row.get(1)?,
    external_athlete_name: row.get(2)?,
    is_external_only:      row.get(3)?,
    sport:                 row.get(4)?,
    graduation_year:       row.get(5)?,
    position:              row.get(6)?,
    state:                 row.get(7)?,
    composite_score:       row.get(8)?,
    overall_rank:          row.get(9)?,
    position_rank:         row.get(10)?,
    state_rank:            row.get(11)?,
    national_rank:         row.get(12)?,
    is_manual_override:    row.get(13)?,
    overridden_by:         row.get(14)?,
    overridden_at:         row.get(15)?,
    last_calculated:       row.get(16)?,
  })
}

impl RawEntry {
  pub fn into_entry(self) -> Result<RankingEntry> {
    let identity = match (self.athlete_id, self.external_athlete_name, self.is_external_only) {
      (Some(id), None, false) => AthleteIdentity::internal(decode_uuid(&id)?),
      (None, Some(name), true) => AthleteIdentity::ExternalOnly { name },
      _ => {
        return Err(Error::Corrupt(format!(
          "entry {} has an inconsistent identity",
          self.entry_id
        )));
      }
    };

    Ok(RankingEntry {
      entry_id: decode_uuid(&self.entry_id)?,
      identity,
      sport: self.sport,
      graduation_year: self.graduation_year,
      position: self.position,
      state: self.state,
      composite_score: self.composite_score,
      ranks: Ranks {
        overall:  self.overall_rank,
        position: self.position_rank,
        state:    self.state_rank,
        national: self.national_rank,
      },
      is_manual_override: self.is_manual_override,
      overridden_by: self.overridden_by,
      overridden_at: self.overridden_at.as_deref().map(decode_dt).transpose()?,
      last_calculated: decode_dt(&self.last_calculated)?,
    })
  }
}
