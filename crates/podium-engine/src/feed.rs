//! Concrete external ranking feeds.
//!
//! Rows come back untyped; [`podium_core::normalize`] decides what is usable.

use std::{path::PathBuf, time::Duration};

use podium_core::source::ExternalRankingSource;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
  #[error("no external feed configured")]
  Unconfigured,

  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("feed did not return a list of rows")]
  UnexpectedShape,
}

/// Accepts a bare array, or an object wrapping one under `rankings` or `data`.
fn into_rows(body: Value) -> Result<Vec<Value>, FeedError> {
  match body {
    Value::Array(rows) => Ok(rows),
    Value::Object(mut map) => match map.remove("rankings").or_else(|| map.remove("data")) {
      Some(Value::Array(rows)) => Ok(rows),
      _ => Err(FeedError::UnexpectedShape),
    },
    _ => Err(FeedError::UnexpectedShape),
  }
}

// ─── HTTP ────────────────────────────────────────────────────────────────────

/// `GET <url>?sport=<sport>&season=<season>` returning JSON rows.
#[derive(Debug, Clone)]
pub struct HttpFeed {
  client: Client,
  url:    String,
}

impl HttpFeed {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, url: url.into() })
  }
}

impl ExternalRankingSource for HttpFeed {
  type Error = FeedError;

  async fn fetch(&self, sport: &str, season: &str) -> Result<Vec<Value>, FeedError> {
    let body: Value = self
      .client
      .get(&self.url)
      .query(&[("sport", sport), ("season", season)])
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;
    into_rows(body)
  }
}

// ─── File ────────────────────────────────────────────────────────────────────

/// A JSON export on disk. The season is ignored; rows of other sports are
/// rejected by the normaliser.
#[derive(Debug, Clone)]
pub struct FileFeed {
  path: PathBuf,
}

impl FileFeed {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
}

impl ExternalRankingSource for FileFeed {
  type Error = FeedError;

  async fn fetch(&self, _sport: &str, _season: &str) -> Result<Vec<Value>, FeedError> {
    let bytes = tokio::fs::read(&self.path).await?;
    into_rows(serde_json::from_slice(&bytes)?)
  }
}

// ─── Configured feed ─────────────────────────────────────────────────────────

/// Whichever feed the deployment configured.
#[derive(Debug, Clone)]
pub enum Feed {
  Http(HttpFeed),
  File(FileFeed),
  /// Imports fail as source-unavailable without touching the store.
  Unconfigured,
}

impl ExternalRankingSource for Feed {
  type Error = FeedError;

  async fn fetch(&self, sport: &str, season: &str) -> Result<Vec<Value>, FeedError> {
    match self {
      Feed::Http(feed) => feed.fetch(sport, season).await,
      Feed::File(feed) => feed.fetch(sport, season).await,
      Feed::Unconfigured => Err(FeedError::Unconfigured),
    }
  }
}
