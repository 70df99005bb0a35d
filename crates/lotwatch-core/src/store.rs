//! The store abstraction consumed by the ingest pipeline.
//!
//! Two layers:
//!
//! - [`StoreTx`] is a live transaction. Resolvers and the reconciliation
//!   engine receive one as an explicit argument; every read and write they
//!   perform goes through it, so a record's whole unit of work commits or
//!   rolls back together.
//! - [`ListingStore`] is the backend handle. Its only primitive is
//!   [`ListingStore::transact`], which opens a transaction, runs a closure
//!   against it, and commits if the closure returns `Ok`.
//!
//! Backends classify their native failures into [`StoreError`].

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  StoreError, StoreResult,
  attrs::{AttrFields, AttrsRef, YmmsAttrs, YmmsKey},
  dealer::{DealerFields, DealerKey, DealerRef, Dealership},
  listing::{Source, StoredListing, Vin},
};

// ─── Transaction ─────────────────────────────────────────────────────────────

/// Operations available inside one store transaction.
///
/// Inserts fail with [`StoreError::UniqueViolation`] when the natural key is
/// already taken, and with [`StoreError::ForeignKeyViolation`] when a listing
/// references a missing parent row. Nothing here retries.
pub trait StoreTx {
  // ── YMMS attributes ───────────────────────────────────────────────────

  fn find_attrs(&mut self, key: &YmmsKey) -> StoreResult<Option<YmmsAttrs>>;

  fn insert_attrs(
    &mut self,
    key: &YmmsKey,
    fields: &AttrFields,
  ) -> StoreResult<AttrsRef>;

  /// Overwrite the descriptive fields of an existing row. The key is never
  /// rewritten.
  fn update_attrs(&mut self, attrs: &YmmsAttrs) -> StoreResult<()>;

  // ── Dealerships ───────────────────────────────────────────────────────

  fn find_dealer(&mut self, key: &DealerKey) -> StoreResult<Option<Dealership>>;

  fn insert_dealer(
    &mut self,
    key: &DealerKey,
    fields: &DealerFields,
  ) -> StoreResult<DealerRef>;

  fn update_dealer(&mut self, dealer: &Dealership) -> StoreResult<()>;

  // ── Listings ──────────────────────────────────────────────────────────

  fn find_listing(
    &mut self,
    source: Source,
    vin: &Vin,
  ) -> StoreResult<Option<StoredListing>>;

  /// Insert a brand-new listing row. `first_seen` is taken from `listing`
  /// and never written again.
  fn insert_listing(&mut self, listing: &StoredListing) -> StoreResult<()>;

  /// Write the mutable fields and `last_seen` of `listing`, provided the
  /// stored revision still equals `listing.revision`.
  ///
  /// Returns the new revision. Fails with [`StoreError::StaleWrite`] when the
  /// row has moved on since it was read.
  fn update_listing(&mut self, listing: &StoredListing) -> StoreResult<i64>;

  /// Every source's row for `vin`, ordered by source.
  fn listings_for_vin(&mut self, vin: &Vin) -> StoreResult<Vec<StoredListing>>;

  // ── Raw listing ids ───────────────────────────────────────────────────

  /// Note that `source` published `vin` under its own `listing_id` at `now`.
  ///
  /// Inserts into the source's side table if the id is new, otherwise
  /// advances its `last_seen`. Returns the id's `first_seen` if it was
  /// already known. Sources without a side table return `Ok(None)`.
  fn record_raw_listing(
    &mut self,
    source: Source,
    listing_id: &str,
    vin: &Vin,
    now: DateTime<Utc>,
  ) -> StoreResult<Option<DateTime<Utc>>>;
}

// ─── Store handle ────────────────────────────────────────────────────────────

/// A transactional listing store.
///
/// All methods return `Send` futures so the store can be shared between
/// concurrent batch runs on a multi-threaded runtime.
pub trait ListingStore: Send + Sync {
  /// Run `work` inside a single transaction.
  ///
  /// The transaction commits if `work` returns `Ok` and rolls back
  /// otherwise. Failures to open or commit the transaction are reported as
  /// `E::from(StoreError)`.
  fn transact<F, T, E>(
    &self,
    work: F,
  ) -> impl Future<Output = Result<T, E>> + Send + '_
  where
    F: FnOnce(&mut dyn StoreTx) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<StoreError> + Send + 'static;

  // ── Read helpers ──────────────────────────────────────────────────────

  fn get_listing(
    &self,
    source: Source,
    vin: Vin,
  ) -> impl Future<Output = StoreResult<Option<StoredListing>>> + Send + '_ {
    self.transact(move |tx| tx.find_listing(source, &vin))
  }

  fn listings_for_vin(
    &self,
    vin: Vin,
  ) -> impl Future<Output = StoreResult<Vec<StoredListing>>> + Send + '_ {
    self.transact(move |tx| tx.listings_for_vin(&vin))
  }

  fn get_attrs(
    &self,
    key: YmmsKey,
  ) -> impl Future<Output = StoreResult<Option<YmmsAttrs>>> + Send + '_ {
    self.transact(move |tx| tx.find_attrs(&key))
  }

  fn get_dealer(
    &self,
    key: DealerKey,
  ) -> impl Future<Output = StoreResult<Option<Dealership>>> + Send + '_ {
    self.transact(move |tx| tx.find_dealer(&key))
  }
}
