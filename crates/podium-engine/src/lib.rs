//! Batch orchestration for podium.
//!
//! [`RankingEngine`] runs the three triggerable jobs (`recalculate`,
//! `import_external`, `merge`) as fetch → normalise → one transactional
//! merge. Every fetch completes, or the run aborts, before the store is
//! touched.

pub mod config;
pub mod engine;
pub mod error;
pub mod feed;

pub use config::EngineConfig;
pub use engine::RankingEngine;
pub use error::{Error, Result, SourceKind};
pub use feed::{Feed, FeedError, FileFeed, HttpFeed};
