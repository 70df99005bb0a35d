//! Listing reconciliation.
//!
//! A listing row is keyed by `(source, vin)`. The first observation creates
//! it; every later one advances `last_seen` and, if the source's data moved,
//! overwrites the mutable fields. `first_seen` is written exactly once.

use chrono::{DateTime, Utc};
use lotwatch_core::{
  StoreError,
  attrs::AttrsRef,
  dealer::DealerRef,
  listing::{ListingFields, ListingRecord, StoredListing},
  store::StoreTx,
};
use serde::Serialize;

use crate::error::{IngestError, Result};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReconcileOutcome {
  Created,
  Updated,
  Unchanged,
}

/// Names of the mutable fields that differ between `stored` and `incoming`.
pub fn changed_fields(
  stored: &ListingFields,
  incoming: &ListingFields,
) -> Vec<&'static str> {
  let mut changed = Vec::new();
  if stored.dealer != incoming.dealer {
    changed.push("dealer");
  }
  if stored.attrs != incoming.attrs {
    changed.push("attrs");
  }
  if stored.mileage != incoming.mileage {
    changed.push("mileage");
  }
  if stored.price != incoming.price {
    changed.push("price");
  }
  if stored.exterior_color != incoming.exterior_color {
    changed.push("exterior_color");
  }
  if stored.interior_color != incoming.interior_color {
    changed.push("interior_color");
  }
  if stored.history_flags != incoming.history_flags {
    changed.push("history_flags");
  }
  changed
}

/// Apply one observation of `record` at `now` to the store.
///
/// `dealer` and `attrs` must already exist in the same transaction.
pub fn reconcile(
  tx: &mut dyn StoreTx,
  record: &ListingRecord,
  dealer: DealerRef,
  attrs: AttrsRef,
  now: DateTime<Utc>,
) -> Result<ReconcileOutcome> {
  let Some(mut stored) = tx.find_listing(record.source, &record.vin)? else {
    let row = StoredListing::first_observation(record, dealer, attrs, now);
    return match tx.insert_listing(&row) {
      Ok(()) => Ok(ReconcileOutcome::Created),
      // Someone else created it between our read and our insert.
      Err(StoreError::UniqueViolation(m)) => Err(IngestError::StaleWriteConflict(m)),
      Err(err) => Err(err.into()),
    };
  };

  if now < stored.last_seen {
    tracing::debug!(
      source = %record.source,
      vin = %record.vin,
      last_seen = %stored.last_seen,
      observed = %now,
      "observation older than stored row, leaving it alone",
    );
    return Ok(ReconcileOutcome::Unchanged);
  }

  let incoming = ListingFields::from_record(record, dealer, attrs);
  let changed = changed_fields(&stored.fields(), &incoming);
  let outcome = if changed.is_empty() {
    ReconcileOutcome::Unchanged
  } else {
    tracing::debug!(source = %record.source, vin = %record.vin, ?changed, "listing changed");
    stored.apply(incoming);
    ReconcileOutcome::Updated
  };
  stored.last_seen = now;
  tx.update_listing(&stored)?;
  Ok(outcome)
}
