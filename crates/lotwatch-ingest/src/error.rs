//! Error taxonomy for the ingest pipeline.
//!
//! Per-record errors land in the batch report and the batch carries on.
//! Systemic errors ([`IngestError::is_fatal`]) abort the batch.

use lotwatch_core::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Failure of the fetch collaborator feeding a batch.
#[derive(Debug, Error)]
pub enum TransportError {
  #[error("feed i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("fetch failed: {0}")]
  Fetch(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
  /// The raw payload could not be normalized. Recoverable; skip the record.
  #[error("normalization failed: {0}")]
  Normalization(#[from] lotwatch_normalize::Error),

  /// An insert-if-absent lost a race and the winning row could not be read
  /// back.
  #[error("resolution conflict on {0}")]
  ResolutionConflict(String),

  /// Another writer changed the listing mid-transaction, or the database
  /// was locked.
  #[error("stale write conflict: {0}")]
  StaleWriteConflict(String),

  /// A listing referenced a dealer or attrs row that does not exist.
  #[error("foreign key violation: {0}")]
  ForeignKeyViolation(String),

  #[error("transport error: {0}")]
  Transport(#[from] TransportError),

  #[error("store error: {0}")]
  Store(#[source] StoreError),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;

impl From<StoreError> for IngestError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::StaleWrite(m) | StoreError::Busy(m) => Self::StaleWriteConflict(m),
      StoreError::ForeignKeyViolation(m) => Self::ForeignKeyViolation(m),
      other => Self::Store(other),
    }
  }
}

/// Coarse error classification, used for report counts.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  strum::Display,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
  Normalization,
  ResolutionConflict,
  StaleWriteConflict,
  ForeignKeyViolation,
  Transport,
  Store,
}

impl IngestError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Normalization(_) => ErrorKind::Normalization,
      Self::ResolutionConflict(_) => ErrorKind::ResolutionConflict,
      Self::StaleWriteConflict(_) => ErrorKind::StaleWriteConflict,
      Self::ForeignKeyViolation(_) => ErrorKind::ForeignKeyViolation,
      Self::Transport(_) => ErrorKind::Transport,
      Self::Store(_) => ErrorKind::Store,
    }
  }

  /// Errors that end the batch. A foreign-key violation means the pipeline's
  /// own ordering is broken, so nothing after it can be trusted either.
  pub fn is_fatal(&self) -> bool {
    matches!(
      self,
      Self::Transport(_)
        | Self::ForeignKeyViolation(_)
        | Self::Store(StoreError::Unavailable(_))
    )
  }

  /// Errors worth another attempt at the same record.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::StaleWriteConflict(_) | Self::ResolutionConflict(_))
  }

  /// The payload was deliberately not ingested; not an error for reporting.
  pub fn is_skip(&self) -> bool {
    matches!(self, Self::Normalization(lotwatch_normalize::Error::Skipped(_)))
  }
}
