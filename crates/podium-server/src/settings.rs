//! Runtime configuration: `podium.toml` overlaid with `PODIUM_*` variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use podium_engine::EngineConfig;
use serde::Deserialize;

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/podium/podium.db") }

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  /// Required by `serve` only.
  pub auth_username:      Option<String>,
  pub auth_password_hash: Option<String>,
  #[serde(default)]
  pub engine:             EngineConfig,
  #[serde(default)]
  pub feed:               FeedConfig,
}

/// Where `import` reads external rankings from. Set one of the two.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedConfig {
  pub url:  Option<String>,
  pub file: Option<PathBuf>,
}

impl ServerConfig {
  /// Layer the optional TOML file at `path` under the environment.
  ///
  /// Nested keys use a double underscore, e.g. `PODIUM_FEED__URL`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("PODIUM").separator("__"))
      .build()
      .context("failed to read config file")?;
    settings.try_deserialize().context("failed to deserialise ServerConfig")
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use config::{Config, File, FileFormat};

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn defaults_fill_missing_keys() {
    let cfg = parse("");
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.engine.fetch_timeout_secs, 30);
    assert!(cfg.feed.url.is_none() && cfg.feed.file.is_none());
    assert!(cfg.auth_username.is_none());
  }

  #[test]
  fn nested_tables_are_read() {
    let cfg = parse(
      r#"
        port = 9000
        auth_username = "coach"
        [engine]
        fetch_timeout_secs = 5
        [feed]
        url = "https://feeds.example.com/rankings"
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.auth_username.as_deref(), Some("coach"));
    assert_eq!(cfg.engine.fetch_timeout_secs, 5);
    assert_eq!(cfg.feed.url.as_deref(), Some("https://feeds.example.com/rankings"));
  }

  #[test]
  fn tilde_expands_only_at_start() {
    let home = std::env::var("HOME").unwrap_or_default();
    if !home.is_empty() {
      assert_eq!(expand_tilde(Path::new("~/db.sqlite")), PathBuf::from(&home).join("db.sqlite"));
    }
    assert_eq!(expand_tilde(Path::new("/var/db/~/x")), PathBuf::from("/var/db/~/x"));
  }
}
