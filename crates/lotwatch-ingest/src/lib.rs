//! Ingest pipeline for lotwatch.
//!
//! Takes raw per-source scrape payloads through normalization, dealer and
//! YMMS attribute resolution, and listing reconciliation, one store
//! transaction per payload. [`BatchCoordinator`] drives a whole feed and
//! reports what happened to every payload.

pub mod attrs;
mod backfill;
pub mod batch;
pub mod config;
pub mod dealer;
pub mod error;
pub mod feed;
pub mod reconcile;

pub use attrs::resolve_attrs;
pub use batch::{
  BatchAborted, BatchCoordinator, BatchOptions, BatchReport, BatchSummary,
  RecordError, ingest_record,
};
pub use config::IngestConfig;
pub use dealer::resolve_dealer;
pub use error::{ErrorKind, IngestError, Result, TransportError};
pub use reconcile::{ReconcileOutcome, reconcile};
