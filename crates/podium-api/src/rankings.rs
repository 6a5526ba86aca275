//! Handlers for `/rankings` endpoints: direct administrator CRUD.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/rankings` | `?sport=&graduation_year=&locked=&limit=&offset=` |
//! | `POST`   | `/rankings` | Manual entry; 409 on a duplicate athlete + cohort |
//! | `GET`    | `/rankings/{id}` | 404 if not found |
//! | `PATCH`  | `/rankings/{id}` | Admin edit; `null` clears a field; ignores locks |
//! | `DELETE` | `/rankings/{id}` | 204; ignores locks |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use podium_core::{
  entry::{AthleteIdentity, EntryPatch, NewEntry, RankingEntry, Ranks},
  source::{EvaluationSource, ExternalRankingSource},
  store::{EntryQuery, RankingStore},
};
use serde::{Deserialize, Deserializer};
use tracing::info;
use uuid::Uuid;

use crate::{Admin, AppState, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub sport:           Option<String>,
  pub graduation_year: Option<i32>,
  #[serde(default)]
  pub locked:          bool,
  pub limit:           Option<usize>,
  pub offset:          Option<usize>,
}

/// `GET /rankings`
pub async fn list<S, E, X>(
  State(state): State<AppState<S, E, X>>,
  _admin: Admin,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<RankingEntry>>, ApiError>
where
  S: RankingStore + 'static,
  E: EvaluationSource + 'static,
  X: ExternalRankingSource + 'static,
{
  let query = EntryQuery {
    sport:           params.sport,
    graduation_year: params.graduation_year,
    locked_only:     params.locked,
    limit:           params.limit,
    offset:          params.offset,
  };
  let entries = state
    .engine
    .store()
    .list_entries(&query)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(entries))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// Exactly one of `athlete_id` and `external_name` identifies the athlete.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub athlete_id:      Option<Uuid>,
  pub external_name:   Option<String>,
  pub sport:           String,
  pub graduation_year: Option<i32>,
  pub position:        Option<String>,
  pub state:           Option<String>,
  pub composite_score: Option<f64>,
  #[serde(default)]
  pub ranks:           Ranks,
  #[serde(default)]
  pub lock:            bool,
}

impl CreateBody {
  fn into_new_entry(self) -> Result<NewEntry, ApiError> {
    let identity = match (self.athlete_id, self.external_name) {
      (Some(id), None) => AthleteIdentity::internal(id),
      (None, Some(name)) => {
        AthleteIdentity::external(&name).map_err(|e| ApiError::BadRequest(e.to_string()))?
      }
      _ => {
        return Err(ApiError::BadRequest(
          "exactly one of athlete_id and external_name is required".into(),
        ));
      }
    };
    Ok(NewEntry {
      graduation_year: self.graduation_year,
      position: self.position,
      state: self.state,
      composite_score: self.composite_score,
      ranks: self.ranks,
      lock: self.lock,
      ..NewEntry::new(identity, self.sport.trim())
    })
  }
}

/// `POST /rankings`
pub async fn create<S, E, X>(
  State(state): State<AppState<S, E, X>>,
  Admin(actor): Admin,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RankingStore + 'static,
  E: EvaluationSource + 'static,
  X: ExternalRankingSource + 'static,
{
  let input = body.into_new_entry()?;
  let entry = state
    .engine
    .store()
    .create_manual_entry(input, &actor)
    .await
    .map_err(ApiError::from_store)?;
  info!(%actor, entry_id = %entry.entry_id, locked = entry.is_manual_override, "manual entry created");
  Ok((StatusCode::CREATED, Json(entry)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /rankings/{id}`
pub async fn get_one<S, E, X>(
  State(state): State<AppState<S, E, X>>,
  _admin: Admin,
  Path(id): Path<Uuid>,
) -> Result<Json<RankingEntry>, ApiError>
where
  S: RankingStore + 'static,
  E: EvaluationSource + 'static,
  X: ExternalRankingSource + 'static,
{
  let entry = state
    .engine
    .store()
    .get_entry(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("ranking entry {id} not found")))?;
  Ok(Json(entry))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, T, D>(d: D) -> Result<Option<Option<T>>, D::Error>
where
  T: Deserialize<'de>,
  D: Deserializer<'de>,
{
  Option::<T>::deserialize(d).map(Some)
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchBody {
  #[serde(default, deserialize_with = "nullable")]
  pub graduation_year: Option<Option<i32>>,
  #[serde(default, deserialize_with = "nullable")]
  pub position:        Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub state:           Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub composite_score: Option<Option<f64>>,
  #[serde(default, deserialize_with = "nullable")]
  pub overall_rank:    Option<Option<u32>>,
  #[serde(default, deserialize_with = "nullable")]
  pub position_rank:   Option<Option<u32>>,
  #[serde(default, deserialize_with = "nullable")]
  pub state_rank:      Option<Option<u32>>,
  #[serde(default, deserialize_with = "nullable")]
  pub national_rank:   Option<Option<u32>>,
}

impl From<PatchBody> for EntryPatch {
  fn from(b: PatchBody) -> Self {
    EntryPatch {
      graduation_year: b.graduation_year,
      position:        b.position,
      state:           b.state,
      composite_score: b.composite_score,
      overall_rank:    b.overall_rank,
      position_rank:   b.position_rank,
      state_rank:      b.state_rank,
      national_rank:   b.national_rank,
    }
  }
}

/// `PATCH /rankings/{id}`
pub async fn update<S, E, X>(
  State(state): State<AppState<S, E, X>>,
  Admin(actor): Admin,
  Path(id): Path<Uuid>,
  Json(body): Json<PatchBody>,
) -> Result<Json<RankingEntry>, ApiError>
where
  S: RankingStore + 'static,
  E: EvaluationSource + 'static,
  X: ExternalRankingSource + 'static,
{
  let patch = EntryPatch::from(body);
  let entry = state
    .engine
    .store()
    .update_entry(id, &patch)
    .await
    .map_err(ApiError::from_store)?;
  info!(%actor, entry_id = %id, "entry edited");
  Ok(Json(entry))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /rankings/{id}`
pub async fn delete<S, E, X>(
  State(state): State<AppState<S, E, X>>,
  Admin(actor): Admin,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: RankingStore + 'static,
  E: EvaluationSource + 'static,
  X: ExternalRankingSource + 'static,
{
  state.engine.store().delete_entry(id).await.map_err(ApiError::from_store)?;
  info!(%actor, entry_id = %id, "entry deleted");
  Ok(StatusCode::NO_CONTENT)
}
