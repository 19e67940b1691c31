//! Core types and trait definitions for the Tally sales pipeline.
//!
//! This crate is deliberately free of HTTP, CSV and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod analysis;
pub mod error;
pub mod record;
pub mod snapshot;
pub mod source;
pub mod store;
pub mod table;

pub use error::{Error, Result};
