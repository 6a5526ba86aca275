//! podium server and batch CLI.
//!
//! Reads `podium.toml` (or the path given with `--config`) plus `PODIUM_*`
//! environment variables, opens the SQLite store, and either serves the JSON
//! API or runs one batch job and prints its summary as JSON.
//!
//! ```text
//! podium serve
//! podium recalculate --sport Football
//! podium import --sport Football --season 2025
//! podium merge --sport Football
//! podium hash-password
//! ```

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, bail};
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::{Parser, Subcommand};
use podium_api::AuthConfig;
use podium_core::summary::RunSummary;
use podium_engine::{Feed, FileFeed, HttpFeed, RankingEngine};
use podium_store_sqlite::SqliteStore;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{FeedConfig, ServerConfig, expand_tilde};

type Engine = RankingEngine<SqliteStore, SqliteStore, Feed>;

#[derive(Parser)]
#[command(author, version, about = "Athlete ranking engine")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "podium.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API.
  Serve,
  /// Rescore internal athletes of a sport and merge.
  Recalculate {
    #[arg(long)]
    sport: String,
  },
  /// Fetch the external feed for a sport and season and merge.
  Import {
    #[arg(long)]
    sport:  String,
    #[arg(long)]
    season: String,
  },
  /// Re-merge the stored candidates of a sport without fetching.
  Merge {
    #[arg(long)]
    sport: String,
    /// Recorded in the summary; locked entries are never overwritten.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    preserve_overrides: bool,
  },
  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  if let Command::HashPassword = cli.command {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let cfg = ServerConfig::load(&cli.config)?;
  let engine = build_engine(&cfg).await?;

  match cli.command {
    Command::Serve => serve(engine, &cfg).await,
    Command::Recalculate { sport } => print_summary(engine.recalculate(&sport).await?),
    Command::Import { sport, season } => {
      print_summary(engine.import_external(&sport, &season).await?)
    }
    Command::Merge { sport, preserve_overrides } => {
      print_summary(engine.merge(&sport, preserve_overrides).await?)
    }
    Command::HashPassword => Ok(()),
  }
}

async fn build_engine(cfg: &ServerConfig) -> anyhow::Result<Engine> {
  let store_path = expand_tilde(&cfg.store_path);
  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let feed = build_feed(&cfg.feed, cfg.engine.fetch_timeout())?;
  Ok(RankingEngine::new(store.clone(), store, feed, cfg.engine.clone()))
}

fn build_feed(cfg: &FeedConfig, timeout: std::time::Duration) -> anyhow::Result<Feed> {
  match (&cfg.url, &cfg.file) {
    (Some(_), Some(_)) => bail!("set only one of feed.url and feed.file"),
    (Some(url), None) => Ok(Feed::Http(
      HttpFeed::new(url.clone(), timeout).context("failed to build HTTP client")?,
    )),
    (None, Some(path)) => Ok(Feed::File(FileFeed::new(expand_tilde(path)))),
    (None, None) => Ok(Feed::Unconfigured),
  }
}

async fn serve(engine: Engine, cfg: &ServerConfig) -> anyhow::Result<()> {
  let (Some(username), Some(password_hash)) = (&cfg.auth_username, &cfg.auth_password_hash)
  else {
    bail!("auth_username and auth_password_hash are required to serve");
  };
  let auth = AuthConfig { username: username.clone(), password_hash: password_hash.clone() };

  let app = podium_api::router(Arc::new(engine), auth);
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

fn print_summary(summary: RunSummary) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(&summary)?);
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
