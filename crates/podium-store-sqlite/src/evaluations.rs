//! Read-side [`EvaluationSource`] over the `athletes` and `evaluations`
//! tables, plus the writes the profile application uses to fill them.

use chrono::{DateTime, Utc};
use podium_core::{
  candidate::{AthleteProfile, AthleteRecord},
  score::EvaluationMetrics,
  source::EvaluationSource,
};
use uuid::Uuid;

use crate::{
  encode::{decode_uuid, encode_dt, encode_uuid},
  Error, Result, SqliteStore,
};

/// Raw values from an `athletes` row joined with its latest evaluation.
struct RawAthlete {
  athlete_id:        String,
  full_name:         String,
  sport:             String,
  graduation_year:   Option<i32>,
  position:          Option<String>,
  state:             Option<String>,
  courses_completed: u32,
  evaluation_id:     Option<String>,
  technical_skill:   Option<f64>,
  game_knowledge:    Option<f64>,
  athleticism:       Option<f64>,
  mental_game:       Option<f64>,
}

impl RawAthlete {
  fn into_record(self) -> Result<AthleteRecord> {
    let metrics = self.evaluation_id.map(|_| EvaluationMetrics {
      technical_skill:   self.technical_skill,
      game_knowledge:    self.game_knowledge,
      athleticism:       self.athleticism,
      mental_game:       self.mental_game,
      courses_completed: self.courses_completed,
    });
    Ok(AthleteRecord {
      profile: AthleteProfile {
        athlete_id:      decode_uuid(&self.athlete_id)?,
        full_name:       self.full_name,
        sport:           self.sport,
        graduation_year: self.graduation_year,
        position:        self.position,
        state:           self.state,
      },
      metrics,
    })
  }
}

impl SqliteStore {
  /// Insert or replace an athlete's profile.
  pub async fn upsert_athlete(&self, profile: &AthleteProfile, courses_completed: u32) -> Result<()> {
    let profile = profile.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO athletes (
             athlete_id, full_name, sport, graduation_year, position, state, courses_completed
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (athlete_id) DO UPDATE SET
             full_name = excluded.full_name,
             sport = excluded.sport,
             graduation_year = excluded.graduation_year,
             position = excluded.position,
             state = excluded.state,
             courses_completed = excluded.courses_completed",
          rusqlite::params![
            encode_uuid(profile.athlete_id),
            profile.full_name,
            profile.sport,
            profile.graduation_year,
            profile.position,
            profile.state,
            courses_completed,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Record a new evaluation; the most recent one is what gets scored.
  /// `courses_completed` on `metrics` is ignored here (it lives on the
  /// athlete).
  pub async fn record_evaluation(
    &self,
    athlete_id: Uuid,
    metrics: &EvaluationMetrics,
    recorded_at: DateTime<Utc>,
  ) -> Result<Uuid> {
    let evaluation_id = Uuid::new_v4();
    let id_str = encode_uuid(evaluation_id);
    let athlete_str = encode_uuid(athlete_id);
    let at_str = encode_dt(recorded_at);
    let m = *metrics;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO evaluations (
             evaluation_id, athlete_id, technical_skill, game_knowledge,
             athleticism, mental_game, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            athlete_str,
            m.technical_skill,
            m.game_knowledge,
            m.athleticism,
            m.mental_game,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(evaluation_id)
  }
}

impl EvaluationSource for SqliteStore {
  type Error = Error;

  async fn athletes(&self, sport: &str) -> Result<Vec<AthleteRecord>> {
    let sport = sport.to_owned();

    let raws: Vec<RawAthlete> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             a.athlete_id, a.full_name, a.sport, a.graduation_year,
             a.position, a.state, a.courses_completed,
             e.evaluation_id, e.technical_skill, e.game_knowledge,
             e.athleticism, e.mental_game
           FROM athletes a
           LEFT JOIN evaluations e ON e.evaluation_id = (
             SELECT evaluation_id FROM evaluations
             WHERE athlete_id = a.athlete_id
             ORDER BY recorded_at DESC, evaluation_id DESC
             LIMIT 1
           )
           WHERE a.sport = ?1 COLLATE NOCASE
           ORDER BY a.athlete_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![sport], |row| {
            Ok(RawAthlete {
              athlete_id:        row.get(0)?,
              full_name:         row.get(1)?,
              sport:             row.get(2)?,
              graduation_year:   row.get(3)?,
              position:          row.get(4)?,
              state:             row.get(5)?,
              courses_completed: row.get(6)?,
              evaluation_id:     row.get(7)?,
              technical_skill:   row.get(8)?,
              game_knowledge:    row.get(9)?,
              athleticism:       row.get(10)?,
              mental_game:       row.get(11)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAthlete::into_record).collect()
  }
}
