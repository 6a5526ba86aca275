//! Handlers for `/jobs/*`: the batch triggers. Each returns the run's
//! [`RunSummary`]; a source failure is a retryable 503 with nothing written.

use axum::{Json, extract::State};
use podium_core::{
  source::{EvaluationSource, ExternalRankingSource},
  store::RankingStore,
  summary::RunSummary,
};
use serde::Deserialize;
use tracing::info;

use crate::{Admin, AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct RecalculateBody {
  pub sport: String,
}

/// `POST /jobs/recalculate`, body `{"sport":"Football"}`
pub async fn recalculate<S, E, X>(
  State(state): State<AppState<S, E, X>>,
  Admin(actor): Admin,
  Json(body): Json<RecalculateBody>,
) -> Result<Json<RunSummary>, ApiError>
where
  S: RankingStore + 'static,
  E: EvaluationSource + 'static,
  X: ExternalRankingSource + 'static,
{
  info!(%actor, sport = %body.sport, "recalculation triggered");
  Ok(Json(state.engine.recalculate(&body.sport).await?))
}

#[derive(Debug, Deserialize)]
pub struct ImportBody {
  pub sport:  String,
  pub season: String,
}

/// `POST /jobs/import`, body `{"sport":"Football","season":"2025"}`
pub async fn import<S, E, X>(
  State(state): State<AppState<S, E, X>>,
  Admin(actor): Admin,
  Json(body): Json<ImportBody>,
) -> Result<Json<RunSummary>, ApiError>
where
  S: RankingStore + 'static,
  E: EvaluationSource + 'static,
  X: ExternalRankingSource + 'static,
{
  info!(%actor, sport = %body.sport, season = %body.season, "external import triggered");
  Ok(Json(state.engine.import_external(&body.sport, &body.season).await?))
}

fn default_preserve() -> bool { true }

#[derive(Debug, Deserialize)]
pub struct MergeBody {
  pub sport:              String,
  #[serde(default = "default_preserve")]
  pub preserve_overrides: bool,
}

/// `POST /jobs/merge`, body `{"sport":"Football","preserve_overrides":true}`
pub async fn merge<S, E, X>(
  State(state): State<AppState<S, E, X>>,
  Admin(actor): Admin,
  Json(body): Json<MergeBody>,
) -> Result<Json<RunSummary>, ApiError>
where
  S: RankingStore + 'static,
  E: EvaluationSource + 'static,
  X: ExternalRankingSource + 'static,
{
  info!(%actor, sport = %body.sport, "merge triggered");
  Ok(Json(state.engine.merge(&body.sport, body.preserve_overrides).await?))
}
