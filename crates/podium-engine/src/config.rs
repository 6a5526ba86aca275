//! Engine tuning, deserialised as the `[engine]` table of the server config.

use std::time::Duration;

use serde::Deserialize;

fn default_fetch_timeout_secs() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
  /// Upper bound for each source fetch (evaluations and external feed).
  #[serde(default = "default_fetch_timeout_secs")]
  pub fetch_timeout_secs: u64,
}

impl Default for EngineConfig {
  fn default() -> Self { Self { fetch_timeout_secs: default_fetch_timeout_secs() } }
}

impl EngineConfig {
  pub fn fetch_timeout(&self) -> Duration { Duration::from_secs(self.fetch_timeout_secs) }
}
