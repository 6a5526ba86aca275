//! [`SqliteStore`], the SQLite implementation of [`RankingStore`].

use std::path::Path;

use chrono::SubsecRound as _;
use podium_core::{
  candidate::{Candidate, CandidateOrigin},
  entry::{EntryPatch, NewEntry, RankingEntry},
  merge::merge,
  normalize::reconcile,
  store::{EntryQuery, MergeRequest, RankingStore},
  summary::MergeSummary,
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;

use crate::{
  encode::{
    decode_candidates, encode_candidates, encode_dt, encode_uuid, now, read_raw_entry,
    RawEntry, ENTRY_COLUMNS,
  },
  error::in_call,
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A podium ranking store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a throwaway in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Set or clear the lock flag and record who toggled it.
  async fn set_override(&self, id: Uuid, actor: &str, locked: bool) -> Result<RankingEntry> {
    let id_str = encode_uuid(id);
    let actor = actor.to_owned();
    let at_str = encode_dt(now());

    let raw: Option<RawEntry> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE ranking_entries
           SET is_manual_override = ?1, overridden_by = ?2, overridden_at = ?3
           WHERE entry_id = ?4",
          rusqlite::params![locked, actor, at_str, id_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = select_entry(&tx, &id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.ok_or(Error::EntryNotFound(id))?.into_entry()
  }
}

// ─── SQL helpers (run inside `call` closures) ────────────────────────────────

fn select_entry(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<RawEntry>> {
  conn
    .query_row(
      &format!("SELECT {ENTRY_COLUMNS} FROM ranking_entries WHERE entry_id = ?1"),
      rusqlite::params![id],
      read_raw_entry,
    )
    .optional()
}

/// The spelling a sport is already stored under, or `sport` (trimmed) if it
/// is new. Every row of a sport shares one spelling, so cohort keys built in
/// memory agree with the NOCASE columns.
fn canonical_sport(conn: &rusqlite::Connection, sport: &str) -> rusqlite::Result<String> {
  let sport = sport.trim();
  for sql in [
    "SELECT sport FROM ranking_entries WHERE sport = ?1 LIMIT 1",
    "SELECT sport FROM candidate_snapshots WHERE sport = ?1 LIMIT 1",
  ] {
    if let Some(stored) = conn.query_row(sql, rusqlite::params![sport], |row| row.get(0)).optional()? {
      return Ok(stored);
    }
  }
  Ok(sport.to_owned())
}

fn select_sport_entries(conn: &rusqlite::Connection, sport: &str) -> rusqlite::Result<Vec<RawEntry>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {ENTRY_COLUMNS} FROM ranking_entries WHERE sport = ?1 ORDER BY entry_id"
  ))?;
  stmt
    .query_map(rusqlite::params![sport], read_raw_entry)?
    .collect::<rusqlite::Result<Vec<_>>>()
}

fn decode_entries(raws: Vec<RawEntry>) -> Result<Vec<RankingEntry>> {
  raws.into_iter().map(RawEntry::into_entry).collect()
}

fn insert_entry(conn: &rusqlite::Connection, e: &RankingEntry) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO ranking_entries (
       entry_id, athlete_id, external_athlete_name, is_external_only,
       sport, graduation_year, position, state, composite_score,
       overall_rank, position_rank, state_rank, national_rank,
       is_manual_override, overridden_by, overridden_at, last_calculated
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
    rusqlite::params![
      encode_uuid(e.entry_id),
      e.identity.athlete_id().map(encode_uuid),
      e.identity.external_name(),
      e.is_external_only(),
      e.sport,
      e.graduation_year,
      e.position,
      e.state,
      e.composite_score,
      e.ranks.overall,
      e.ranks.position,
      e.ranks.state,
      e.ranks.national,
      e.is_manual_override,
      e.overridden_by,
      e.overridden_at.map(encode_dt),
      encode_dt(e.last_calculated),
    ],
  )?;
  Ok(())
}

/// Write the fields a merge pass may change. The lock flag is re-checked in
/// the statement itself.
fn update_computed(conn: &rusqlite::Connection, e: &RankingEntry) -> rusqlite::Result<usize> {
  conn.execute(
    "UPDATE ranking_entries
     SET composite_score = ?1, position = ?2, state = ?3,
         overall_rank = ?4, position_rank = ?5, state_rank = ?6, national_rank = ?7,
         last_calculated = ?8
     WHERE entry_id = ?9 AND is_manual_override = 0",
    rusqlite::params![
      e.composite_score,
      e.position,
      e.state,
      e.ranks.overall,
      e.ranks.position,
      e.ranks.state,
      e.ranks.national,
      encode_dt(e.last_calculated),
      encode_uuid(e.entry_id),
    ],
  )
}

/// Write every admin-editable field, regardless of lock state.
fn update_edited(conn: &rusqlite::Connection, e: &RankingEntry) -> rusqlite::Result<usize> {
  conn.execute(
    "UPDATE ranking_entries
     SET graduation_year = ?1, position = ?2, state = ?3, composite_score = ?4,
         overall_rank = ?5, position_rank = ?6, state_rank = ?7, national_rank = ?8,
         last_calculated = ?9
     WHERE entry_id = ?10",
    rusqlite::params![
      e.graduation_year,
      e.position,
      e.state,
      e.composite_score,
      e.ranks.overall,
      e.ranks.position,
      e.ranks.state,
      e.ranks.national,
      encode_dt(e.last_calculated),
      encode_uuid(e.entry_id),
    ],
  )
}

fn load_snapshot(
  conn: &rusqlite::Connection,
  sport: &str,
  origin: CandidateOrigin,
) -> rusqlite::Result<Option<String>> {
  conn
    .query_row(
      "SELECT candidates_json FROM candidate_snapshots WHERE sport = ?1 AND origin = ?2",
      rusqlite::params![sport, origin.as_ref()],
      |row| row.get(0),
    )
    .optional()
}

fn decode_snapshot(json: Option<String>) -> Result<Vec<Candidate>> {
  json.as_deref().map(decode_candidates).transpose().map(Option::unwrap_or_default)
}

// ─── RankingStore impl ───────────────────────────────────────────────────────

impl RankingStore for SqliteStore {
  type Error = Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_entry(&self, id: Uuid) -> Result<Option<RankingEntry>> {
    let id_str = encode_uuid(id);
    let raw = self.conn.call(move |conn| Ok(select_entry(conn, &id_str)?)).await?;
    raw.map(RawEntry::into_entry).transpose()
  }

  async fn list_entries(&self, query: &EntryQuery) -> Result<Vec<RankingEntry>> {
    let sport = query.sport.clone();
    let year = query.graduation_year;
    let locked_only = query.locked_only;
    let limit_val = query.limit.map_or(-1, |l| l as i64);
    let offset_val = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ENTRY_COLUMNS}
           FROM ranking_entries
           WHERE (?1 IS NULL OR sport = ?1)
             AND (?2 IS NULL OR graduation_year = ?2)
             AND (?3 = 0 OR is_manual_override = 1)
           ORDER BY sport, graduation_year, overall_rank IS NULL, overall_rank,
                    composite_score DESC, entry_id
           LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![sport, year, locked_only, limit_val, offset_val],
            read_raw_entry,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    decode_entries(raws)
  }

  // ── Batch merge ───────────────────────────────────────────────────────────

  async fn run_merge(&self, request: MergeRequest) -> Result<MergeSummary> {
    let MergeRequest { sport, snapshot, at } = request;
    let at = at.trunc_subsecs(6);
    let snapshot = snapshot
      .map(|(origin, candidates)| encode_candidates(&candidates).map(|json| (origin, json)))
      .transpose()?;
    let sport_for_log = sport.clone();

    let summary = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock up front: a concurrent run either
        // waits for this one or fails with BUSY, and the lock flags read
        // below cannot change before commit.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let sport = canonical_sport(&tx, &sport)?;

        if let Some((origin, json)) = &snapshot {
          tx.execute(
            "INSERT INTO candidate_snapshots (sport, origin, candidates_json, normalized_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (sport, origin) DO UPDATE
             SET candidates_json = excluded.candidates_json,
                 normalized_at   = excluded.normalized_at",
            rusqlite::params![sport, origin.as_ref(), json, encode_dt(at)],
          )?;
        }

        let mut internal = decode_snapshot(load_snapshot(&tx, &sport, CandidateOrigin::Internal)?)
          .map_err(in_call)?;
        let mut external = decode_snapshot(load_snapshot(&tx, &sport, CandidateOrigin::External)?)
          .map_err(in_call)?;
        for candidate in internal.iter_mut().chain(external.iter_mut()) {
          candidate.sport.clone_from(&sport);
        }
        let reconciled = reconcile(internal, external);

        let existing = decode_entries(select_sport_entries(&tx, &sport)?).map_err(in_call)?;
        let plan = merge(&existing, &reconciled.candidates, at);

        for entry in &plan.inserts {
          insert_entry(&tx, entry)?;
        }
        for entry in &plan.updates {
          update_computed(&tx, entry)?;
        }
        tx.commit()?;

        Ok(MergeSummary { superseded: reconciled.superseded, ..plan.summary })
      })
      .await?;

    debug!(
      sport = %sport_for_log,
      inserted = summary.inserted,
      updated = summary.updated,
      preserved = summary.preserved,
      "merge committed"
    );
    Ok(summary)
  }

  // ── Override store ────────────────────────────────────────────────────────

  async fn lock(&self, id: Uuid, actor: &str) -> Result<RankingEntry> {
    self.set_override(id, actor, true).await
  }

  async fn unlock(&self, id: Uuid, actor: &str) -> Result<RankingEntry> {
    self.set_override(id, actor, false).await
  }

  // ── Direct admin CRUD ─────────────────────────────────────────────────────

  async fn create_manual_entry(&self, input: NewEntry, actor: &str) -> Result<RankingEntry> {
    input.validate()?;
    let mut entry = input.into_entry(actor, now());

    let entry = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        entry.sport = canonical_sport(&tx, &entry.sport)?;
        insert_entry(&tx, &entry)?;
        tx.commit()?;
        Ok(entry)
      })
      .await?;

    Ok(entry)
  }

  async fn update_entry(&self, id: Uuid, patch: &EntryPatch) -> Result<RankingEntry> {
    let id_str = encode_uuid(id);
    let patch = patch.clone();
    let at = now();

    let updated: Option<RankingEntry> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(raw) = select_entry(&tx, &id_str)? else {
          return Ok(None);
        };
        let mut entry = raw.into_entry().map_err(in_call)?;
        patch.apply(&mut entry, at).map_err(in_call)?;
        update_edited(&tx, &entry)?;
        tx.commit()?;
        Ok(Some(entry))
      })
      .await?;

    updated.ok_or(Error::EntryNotFound(id))
  }

  async fn delete_entry(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM ranking_entries WHERE entry_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    if deleted == 0 {
      return Err(Error::EntryNotFound(id));
    }
    Ok(())
  }
}
