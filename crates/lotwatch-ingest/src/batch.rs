//! The batch coordinator.
//!
//! Drains a stream of raw payloads from one source. Each payload is
//! normalized and then resolved and reconciled inside its own store
//! transaction, so a batch interrupted halfway leaves every record before
//! the interruption committed and nothing half-written.

use std::{collections::BTreeMap, pin::pin, sync::Arc, time::Duration};

use chrono::{DateTime, SubsecRound, Utc};
use futures::{Stream, StreamExt};
use lotwatch_core::{
  listing::Source,
  store::{ListingStore, StoreTx},
};
use lotwatch_normalize::NormalizedListing;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
  attrs::resolve_attrs,
  dealer::resolve_dealer,
  error::{ErrorKind, IngestError, Result, TransportError},
  reconcile::{ReconcileOutcome, reconcile},
};

// ─── Options ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
  pub max_stale_retries: u32,
  pub retry_backoff:     Duration,
}

impl Default for BatchOptions {
  fn default() -> Self {
    Self { max_stale_retries: 3, retry_backoff: Duration::from_millis(25) }
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// A payload that could not be ingested, kept verbatim for inspection.
#[derive(Debug)]
pub struct RecordError {
  pub payload: Value,
  pub error:   IngestError,
}

#[derive(Debug)]
pub struct BatchReport {
  pub run_id:      Uuid,
  pub source:      Source,
  pub started_at:  DateTime<Utc>,
  pub finished_at: Option<DateTime<Utc>>,
  pub created:     usize,
  pub updated:     usize,
  pub unchanged:   usize,
  /// Payloads the normalizer deliberately declined.
  pub skipped:     usize,
  pub errors:      Vec<RecordError>,
}

/// The serializable counts of a [`BatchReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
  pub run_id:         Uuid,
  pub source:         Source,
  pub started_at:     DateTime<Utc>,
  pub finished_at:    Option<DateTime<Utc>>,
  pub created:        usize,
  pub updated:        usize,
  pub unchanged:      usize,
  pub skipped:        usize,
  pub errors:         usize,
  pub errors_by_kind: BTreeMap<ErrorKind, usize>,
}

impl BatchReport {
  fn new(source: Source) -> Self {
    Self {
      run_id: Uuid::new_v4(),
      source,
      started_at: Utc::now(),
      finished_at: None,
      created: 0,
      updated: 0,
      unchanged: 0,
      skipped: 0,
      errors: Vec::new(),
    }
  }

  fn count(&mut self, outcome: ReconcileOutcome) {
    match outcome {
      ReconcileOutcome::Created => self.created += 1,
      ReconcileOutcome::Updated => self.updated += 1,
      ReconcileOutcome::Unchanged => self.unchanged += 1,
    }
  }

  /// Payloads accounted for so far, whatever their fate.
  pub fn processed(&self) -> usize {
    self.created + self.updated + self.unchanged + self.skipped + self.errors.len()
  }

  pub fn errors_by_kind(&self) -> BTreeMap<ErrorKind, usize> {
    let mut counts = BTreeMap::new();
    for record in &self.errors {
      *counts.entry(record.error.kind()).or_insert(0) += 1;
    }
    counts
  }

  pub fn summary(&self) -> BatchSummary {
    BatchSummary {
      run_id:         self.run_id,
      source:         self.source,
      started_at:     self.started_at,
      finished_at:    self.finished_at,
      created:        self.created,
      updated:        self.updated,
      unchanged:      self.unchanged,
      skipped:        self.skipped,
      errors:         self.errors.len(),
      errors_by_kind: self.errors_by_kind(),
    }
  }
}

/// A batch stopped by a systemic error. `report` covers everything
/// committed before the abort.
#[derive(Debug, Error)]
#[error("batch aborted after {} payloads: {error}", .report.processed())]
pub struct BatchAborted {
  pub report: BatchReport,
  #[source]
  pub error:  IngestError,
}

// ─── Unit of work ────────────────────────────────────────────────────────────

/// Resolve both parents and reconcile the listing, all against `tx`.
pub fn ingest_record(
  tx: &mut dyn StoreTx,
  listing: &NormalizedListing,
  now: DateTime<Utc>,
) -> Result<ReconcileOutcome> {
  let record = &listing.record;
  if let Some(id) = &listing.raw_listing_id
    && let Some(first_seen) = tx.record_raw_listing(record.source, id, &record.vin, now)?
  {
    tracing::debug!(listing_id = %id, %first_seen, "listing id seen before");
  }
  let dealer = resolve_dealer(tx, &record.dealer_key, &listing.dealer)?;
  let attrs = resolve_attrs(tx, &record.ymms_key, &listing.attrs)?;
  reconcile(tx, record, dealer, attrs, now)
}

// ─── Coordinator ─────────────────────────────────────────────────────────────

pub struct BatchCoordinator<S> {
  store:   Arc<S>,
  options: BatchOptions,
}

impl<S: ListingStore> BatchCoordinator<S> {
  pub fn new(store: Arc<S>, options: BatchOptions) -> Self { Self { store, options } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Ingest every payload in `feed`, stamping each with the wall clock at
  /// the moment it is processed.
  pub async fn run_batch<R>(
    &self,
    source: Source,
    feed: R,
  ) -> Result<BatchReport, BatchAborted>
  where
    R: Stream<Item = Result<Value, TransportError>>,
  {
    self.run(source, feed, Utc::now).await
  }

  /// Like [`run_batch`](Self::run_batch) with every payload observed at
  /// `now`. Reprocessing an archived scrape goes through here.
  pub async fn run_batch_at<R>(
    &self,
    source: Source,
    feed: R,
    now: DateTime<Utc>,
  ) -> Result<BatchReport, BatchAborted>
  where
    R: Stream<Item = Result<Value, TransportError>>,
  {
    self.run(source, feed, move || now).await
  }

  async fn run<R, C>(
    &self,
    source: Source,
    feed: R,
    clock: C,
  ) -> Result<BatchReport, BatchAborted>
  where
    R: Stream<Item = Result<Value, TransportError>>,
    C: Fn() -> DateTime<Utc>,
  {
    let mut report = BatchReport::new(source);
    let span = tracing::info_span!("batch", %source, run_id = %report.run_id);

    async move {
      let mut feed = pin!(feed);
      while let Some(item) = feed.next().await {
        let payload = match item {
          Ok(payload) => payload,
          Err(err) => return Err(abort(report, err.into())),
        };

        // The store keeps microseconds; every layer sees the same instant.
        let now = clock().trunc_subsecs(6);
        match self.ingest(source, &payload, now).await {
          Ok(outcome) => {
            tracing::debug!(%outcome, "record reconciled");
            report.count(outcome);
          }
          Err(err) if err.is_skip() => {
            tracing::debug!(%err, "record skipped");
            report.skipped += 1;
          }
          Err(err) if err.is_fatal() => return Err(abort(report, err)),
          Err(err) => {
            tracing::warn!(kind = %err.kind(), %err, "record failed");
            report.errors.push(RecordError { payload, error: err });
          }
        }
      }

      report.finished_at = Some(Utc::now());
      tracing::info!(
        created = report.created,
        updated = report.updated,
        unchanged = report.unchanged,
        skipped = report.skipped,
        errors = report.errors.len(),
        "batch finished",
      );
      Ok(report)
    }
    .instrument(span)
    .await
  }

  /// Normalize one payload and apply it, retrying write conflicts.
  async fn ingest(
    &self,
    source: Source,
    payload: &Value,
    now: DateTime<Utc>,
  ) -> Result<ReconcileOutcome> {
    let listing = lotwatch_normalize::normalize(payload, source, now)?;

    let mut attempt = 0;
    loop {
      let work = listing.clone();
      let result = self
        .store
        .transact(move |tx| ingest_record(tx, &work, now))
        .await;

      match result {
        Err(err) if err.is_retryable() && attempt < self.options.max_stale_retries => {
          attempt += 1;
          tracing::warn!(attempt, vin = %listing.record.vin, %err, "retrying record");
          tokio::time::sleep(self.options.retry_backoff * attempt).await;
        }
        other => return other,
      }
    }
  }
}

fn abort(mut report: BatchReport, error: IngestError) -> BatchAborted {
  report.finished_at = Some(Utc::now());
  tracing::error!(
    kind = %error.kind(),
    %error,
    processed = report.processed(),
    "batch aborted",
  );
  BatchAborted { report, error }
}
