//! Handlers for the override store: `POST /rankings/{id}/lock` and
//! `POST /rankings/{id}/unlock`. The authenticated admin is the actor.

use axum::{
  Json,
  extract::{Path, State},
};
use podium_core::{
  entry::RankingEntry,
  source::{EvaluationSource, ExternalRankingSource},
  store::RankingStore,
};
use tracing::info;
use uuid::Uuid;

use crate::{Admin, AppState, error::ApiError};

/// `POST /rankings/{id}/lock`
pub async fn lock<S, E, X>(
  State(state): State<AppState<S, E, X>>,
  Admin(actor): Admin,
  Path(id): Path<Uuid>,
) -> Result<Json<RankingEntry>, ApiError>
where
  S: RankingStore + 'static,
  E: EvaluationSource + 'static,
  X: ExternalRankingSource + 'static,
{
  let entry = state.engine.store().lock(id, &actor).await.map_err(ApiError::from_store)?;
  info!(%actor, entry_id = %id, "entry locked");
  Ok(Json(entry))
}

/// `POST /rankings/{id}/unlock`. Values stay until the next merge.
pub async fn unlock<S, E, X>(
  State(state): State<AppState<S, E, X>>,
  Admin(actor): Admin,
  Path(id): Path<Uuid>,
) -> Result<Json<RankingEntry>, ApiError>
where
  S: RankingStore + 'static,
  E: EvaluationSource + 'static,
  X: ExternalRankingSource + 'static,
{
  let entry = state.engine.store().unlock(id, &actor).await.map_err(ApiError::from_store)?;
  info!(%actor, entry_id = %id, "entry unlocked");
  Ok(Json(entry))
}
