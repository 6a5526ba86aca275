//! Core types and trait definitions for the podium ranking engine.
//!
//! No HTTP or database code lives here.
//! Scoring, normalisation, merging and rank assignment are pure functions;
//! persistence and data sources are reached only through the traits in
//! [`store`] and [`source`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod candidate;
pub mod entry;
pub mod error;
pub mod merge;
pub mod normalize;
pub mod rank;
pub mod score;
pub mod source;
pub mod store;
pub mod summary;

pub use error::{Error, Result};
