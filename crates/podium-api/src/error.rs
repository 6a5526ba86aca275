//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use podium_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The entry already exists for that athlete and cohort.
  #[error("conflict: {0}")]
  Conflict(String),

  /// A concurrent run held the cohort. Nothing was written.
  #[error("busy: {0}")]
  Busy(String),

  /// A data source failed or timed out. Nothing was written.
  #[error("unavailable: {0}")]
  Unavailable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn from_store<E: StoreError>(e: E) -> Self {
    if e.is_not_found() {
      Self::NotFound(e.to_string())
    } else if e.is_duplicate() {
      Self::Conflict(e.to_string())
    } else if e.is_conflict() {
      Self::Busy(e.to_string())
    } else if e.is_invalid_input() {
      Self::BadRequest(e.to_string())
    } else {
      Self::Store(Box::new(e))
    }
  }
}

impl From<podium_engine::Error> for ApiError {
  fn from(e: podium_engine::Error) -> Self {
    use podium_engine::Error as E;
    match e {
      E::Core(_) => Self::BadRequest(e.to_string()),
      E::SourceUnavailable { .. } | E::SourceTimeout { .. } => Self::Unavailable(e.to_string()),
      E::StoreConflict(_) => Self::Busy(e.to_string()),
      E::Store(inner) => Self::Store(inner),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message, retryable) = match &self {
      ApiError::Unauthorized => {
        let mut res = (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" })))
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"podium\""),
        );
        return res;
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone(), false),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone(), false),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone(), false),
      ApiError::Busy(m) => (StatusCode::CONFLICT, m.clone(), true),
      ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m.clone(), true),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), false)
      }
    };
    let body = if retryable {
      json!({ "error": message, "retryable": true })
    } else {
      json!({ "error": message })
    };
    (status, Json(body)).into_response()
  }
}
