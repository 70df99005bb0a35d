//! SQLite backend for the lotwatch listing store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Each
//! [`ListingStore::transact`](lotwatch_core::store::ListingStore::transact)
//! call is one `BEGIN IMMEDIATE` transaction on that thread.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
