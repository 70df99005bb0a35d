//! Error type for `lotwatch-store-sqlite`, and its mapping onto the
//! backend-neutral [`StoreError`].

use lotwatch_core::StoreError;
use rusqlite::{ErrorCode, ffi};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] lotwatch_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value outside its domain (unknown enum text, a
  /// negative mileage, a malformed hex color).
  #[error("unexpected value in column {column}: {value:?}")]
  Decode { column: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Sort a native SQLite failure into the store error taxonomy.
pub(crate) fn classify(err: rusqlite::Error) -> StoreError {
  if let rusqlite::Error::SqliteFailure(failure, msg) = &err {
    let detail = msg.clone().unwrap_or_else(|| failure.to_string());
    match (failure.code, failure.extended_code) {
      (
        ErrorCode::ConstraintViolation,
        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
      ) => return StoreError::UniqueViolation(detail),
      (ErrorCode::ConstraintViolation, ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
        return StoreError::ForeignKeyViolation(detail);
      }
      (ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked, _) => {
        return StoreError::Busy(detail);
      }
      _ => {}
    }
  }
  StoreError::Backend(Box::new(err))
}

/// `.classified()` on any `rusqlite` result.
pub(crate) trait Classify<T> {
  fn classified(self) -> Result<T, StoreError>;
}

impl<T> Classify<T> for rusqlite::Result<T> {
  fn classified(self) -> Result<T, StoreError> { self.map_err(classify) }
}

impl From<Error> for StoreError {
  fn from(err: Error) -> Self {
    match err {
      Error::Database(tokio_rusqlite::Error::Rusqlite(e)) => classify(e),
      Error::Database(tokio_rusqlite::Error::ConnectionClosed) => {
        StoreError::Unavailable("connection closed".into())
      }
      other => StoreError::Backend(Box::new(other)),
    }
  }
}
