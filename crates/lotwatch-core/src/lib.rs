//! Core types and trait definitions for the lotwatch listing store.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! normalizer, the SQLite backend and the ingest pipeline all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod attrs;
pub mod dealer;
pub mod error;
pub mod history;
pub mod listing;
pub mod store;

pub use error::{Error, Result, StoreError, StoreResult};
