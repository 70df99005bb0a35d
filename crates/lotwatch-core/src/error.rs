//! Error types for `lotwatch-core`.

use thiserror::Error;

/// Domain validation failures raised by the core value types.
#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid VIN: {0:?}")]
  InvalidVin(String),

  #[error("invalid price: {0}")]
  InvalidPrice(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Backend-neutral failures of a [`crate::store::StoreTx`] operation.
///
/// Backends classify their native errors into these variants so that the
/// ingest pipeline can tell a lost insert race from a broken database.
#[derive(Debug, Error)]
pub enum StoreError {
  /// An insert collided with an existing row on a unique key.
  #[error("unique constraint violated: {0}")]
  UniqueViolation(String),

  /// A row referenced a parent row that does not exist.
  #[error("foreign key constraint violated: {0}")]
  ForeignKeyViolation(String),

  /// A conditional update found the row changed since it was read.
  #[error("stale write to listing {0}")]
  StaleWrite(String),

  /// The database is locked by another writer.
  #[error("store busy: {0}")]
  Busy(String),

  /// The connection to the store is gone; nothing further will succeed.
  #[error("store unavailable: {0}")]
  Unavailable(String),

  #[error("store backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
