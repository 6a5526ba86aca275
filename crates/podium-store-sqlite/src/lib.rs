//! SQLite backend for the podium ranking store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every merge pass runs inside a single
//! `BEGIN IMMEDIATE` transaction, so concurrent batch runs serialise on the
//! write lock and lock toggles are never read from a stale snapshot.

mod encode;
mod evaluations;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
