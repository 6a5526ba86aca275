//! JSON REST API for podium.
//!
//! Exposes the batch jobs and the administrator CRUD of a [`RankingEngine`]
//! as an axum [`Router`]. Everything under `/api` requires HTTP Basic auth;
//! the authenticated username is recorded as the actor on lock toggles and
//! manual entries.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = podium_api::router(Arc::new(engine), auth);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod error;
pub mod jobs;
pub mod overrides;
pub mod rankings;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use podium_core::{
  source::{EvaluationSource, ExternalRankingSource},
  store::RankingStore,
};
use podium_engine::RankingEngine;
use tower_http::trace::TraceLayer;

pub use auth::{Admin, AuthConfig};
pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, E, X> {
  pub engine: Arc<RankingEngine<S, E, X>>,
  pub auth:   Arc<AuthConfig>,
}

impl<S, E, X> Clone for AppState<S, E, X> {
  fn clone(&self) -> Self {
    Self { engine: Arc::clone(&self.engine), auth: Arc::clone(&self.auth) }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full application: `/health` plus the authenticated `/api` tree,
/// wrapped in request tracing.
pub fn router<S, E, X>(engine: Arc<RankingEngine<S, E, X>>, auth: AuthConfig) -> Router
where
  S: RankingStore + 'static,
  E: EvaluationSource + 'static,
  X: ExternalRankingSource + 'static,
{
  let state = AppState { engine, auth: Arc::new(auth) };
  Router::new()
    .route("/health", get(health))
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

/// The `/api` routes on their own, for nesting into another router.
pub fn api_router<S, E, X>(state: AppState<S, E, X>) -> Router<()>
where
  S: RankingStore + 'static,
  E: EvaluationSource + 'static,
  X: ExternalRankingSource + 'static,
{
  Router::new()
    // Entries
    .route("/rankings", get(rankings::list::<S, E, X>).post(rankings::create::<S, E, X>))
    .route(
      "/rankings/{id}",
      get(rankings::get_one::<S, E, X>)
        .patch(rankings::update::<S, E, X>)
        .delete(rankings::delete::<S, E, X>),
    )
    // Overrides
    .route("/rankings/{id}/lock", post(overrides::lock::<S, E, X>))
    .route("/rankings/{id}/unlock", post(overrides::unlock::<S, E, X>))
    // Jobs
    .route("/jobs/recalculate", post(jobs::recalculate::<S, E, X>))
    .route("/jobs/import", post(jobs::import::<S, E, X>))
    .route("/jobs/merge", post(jobs::merge::<S, E, X>))
    .with_state(state)
}

async fn health() -> &'static str { "ok" }

#[cfg(test)]
mod tests;
