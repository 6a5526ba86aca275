//! Composite Score Calculator.
//!
//! Four evaluation sub-scores are averaged with equal weight into a base in
//! `0..=100`; completed courses add a capped bonus. The result is clamped to
//! 100 and rounded to two decimals so that ties compare exactly.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Points added per completed course.
pub const COURSE_BONUS_PER_COMPLETION: f64 = 2.0;

/// Upper bound on the course-completion bonus.
pub const COURSE_BONUS_CAP: f64 = 10.0;

/// Raw evaluation metrics for one athlete. Each sub-score is in `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
  pub technical_skill:   Option<f64>,
  pub game_knowledge:    Option<f64>,
  pub athleticism:       Option<f64>,
  pub mental_game:       Option<f64>,
  #[serde(default)]
  pub courses_completed: u32,
}

impl EvaluationMetrics {
  fn sub_scores(&self) -> [(&'static str, Option<f64>); 4] {
    [
      ("technical_skill", self.technical_skill),
      ("game_knowledge", self.game_knowledge),
      ("athleticism", self.athleticism),
      ("mental_game", self.mental_game),
    ]
  }
}

/// Compute the composite score for `metrics`.
///
/// Returns `Ok(None)` when no sub-score is present: zero is a valid poor
/// score and is never used to mean "no data". A sub-score outside `0..=100`
/// is an error.
pub fn composite_score(metrics: &EvaluationMetrics) -> Result<Option<f64>> {
  let mut sum = 0.0;
  let mut count = 0u32;
  for (metric, value) in metrics.sub_scores() {
    let Some(value) = value else { continue };
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
      return Err(Error::MetricOutOfRange { metric, value });
    }
    sum += value;
    count += 1;
  }

  if count == 0 {
    return Ok(None);
  }

  let base = sum / f64::from(count);
  let bonus = (f64::from(metrics.courses_completed) * COURSE_BONUS_PER_COMPLETION)
    .min(COURSE_BONUS_CAP);

  Ok(Some(round2((base + bonus).min(100.0))))
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 { (value * 100.0).round() / 100.0 }
