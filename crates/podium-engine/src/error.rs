//! Error type for `podium-engine`.

use std::time::Duration;

use podium_core::store::StoreError;
use strum::Display;
use thiserror::Error;

/// The collaborator a run was waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SourceKind {
  Evaluations,
  External,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] podium_core::Error),

  #[error("{kind} source unavailable: {message}")]
  SourceUnavailable { kind: SourceKind, message: String },

  #[error("{kind} source timed out after {}s", after.as_secs())]
  SourceTimeout { kind: SourceKind, after: Duration },

  /// Another batch run held the cohort; retry the whole invocation.
  #[error("concurrent run conflict: {0}")]
  StoreConflict(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  pub(crate) fn store<E: StoreError>(e: E) -> Self {
    if e.is_conflict() {
      Self::StoreConflict(Box::new(e))
    } else {
      Self::Store(Box::new(e))
    }
  }

  /// Whether the caller may retry the same invocation unchanged. Nothing was
  /// written in any of these cases.
  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      Self::SourceUnavailable { .. } | Self::SourceTimeout { .. } | Self::StoreConflict(_)
    )
  }
}
