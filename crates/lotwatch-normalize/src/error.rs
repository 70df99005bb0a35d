//! Error types for the record normalizer.

use thiserror::Error;

/// Why a raw payload could not be turned into a listing record.
///
/// Every variant is recoverable: the batch records it against the offending
/// payload and moves on.
#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid VIN: {0:?}")]
  InvalidVin(String),

  #[error("malformed {field}: {value:?}")]
  MalformedField { field: &'static str, value: String },

  #[error("payload does not match the expected shape: {0}")]
  MalformedPayload(#[from] serde_json::Error),

  /// The payload is well-formed but deliberately not ingested.
  #[error("skipped: {0}")]
  Skipped(&'static str),
}

impl Error {
  pub(crate) fn field(field: &'static str, value: impl ToString) -> Self {
    Self::MalformedField { field, value: value.to_string() }
  }
}

impl From<lotwatch_core::Error> for Error {
  fn from(err: lotwatch_core::Error) -> Self {
    match err {
      lotwatch_core::Error::InvalidVin(raw) => Self::InvalidVin(raw),
      lotwatch_core::Error::InvalidPrice(raw) => Self::field("price", raw),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
