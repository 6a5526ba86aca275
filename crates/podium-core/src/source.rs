//! Collaborator contracts: where evaluation data and external rankings come
//! from. Their implementations live outside this crate.

use std::future::Future;

use crate::candidate::AthleteRecord;

/// Supplies internal athletes of a sport together with their latest
/// evaluation metrics.
pub trait EvaluationSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn athletes<'a>(
    &'a self,
    sport: &'a str,
  ) -> impl Future<Output = Result<Vec<AthleteRecord>, Self::Error>> + Send + 'a;
}

/// Supplies raw third-party ranking rows for a sport and season.
///
/// Rows are returned untyped; the normaliser decides what is usable.
pub trait ExternalRankingSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch<'a>(
    &'a self,
    sport: &'a str,
    season: &'a str,
  ) -> impl Future<Output = Result<Vec<serde_json::Value>, Self::Error>> + Send + 'a;
}
