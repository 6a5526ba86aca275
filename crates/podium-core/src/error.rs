//! Error types for `podium-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("composite score {0} is outside 0..=100")]
  ScoreOutOfRange(f64),

  #[error("evaluation metric {metric} = {value} is outside 0..=100")]
  MetricOutOfRange { metric: &'static str, value: f64 },

  #[error("rank must be a positive integer, got {0}")]
  InvalidRank(u32),

  #[error("athlete name must not be empty")]
  EmptyName,

  #[error("sport must not be empty")]
  EmptySport,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
