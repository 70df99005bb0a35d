//! Dealership resolution.
//!
//! Contact fields fill in once. Location is different: a geocode can be
//! superseded by one of strictly higher precision.

use lotwatch_core::{
  StoreResult,
  dealer::{DealerFields, DealerKey, DealerRef, Dealership},
  store::StoreTx,
};

use crate::{
  Result,
  backfill::{self, Resolvable, fill},
};

struct Dealer;

impl Resolvable for Dealer {
  type Key = DealerKey;
  type Fields = DealerFields;
  type Row = Dealership;
  type Ref = DealerRef;

  const TABLE: &'static str = "dealerships";

  fn insert(
    tx: &mut dyn StoreTx,
    key: &DealerKey,
    fields: &DealerFields,
  ) -> StoreResult<DealerRef> {
    tx.insert_dealer(key, fields)
  }

  fn find(tx: &mut dyn StoreTx, key: &DealerKey) -> StoreResult<Option<Dealership>> {
    tx.find_dealer(key)
  }

  fn update(tx: &mut dyn StoreTx, row: &Dealership) -> StoreResult<()> {
    tx.update_dealer(row)
  }

  fn row_ref(row: &Dealership) -> DealerRef { row.id }

  fn backfill(row: &mut Dealership, incoming: &DealerFields) -> bool {
    merge_dealer(&mut row.fields, incoming)
  }
}

pub(crate) fn merge_dealer(stored: &mut DealerFields, incoming: &DealerFields) -> bool {
  let mut changed = fill(&mut stored.name, &incoming.name)
    | fill(&mut stored.city, &incoming.city)
    | fill(&mut stored.state, &incoming.state)
    | fill(&mut stored.phone, &incoming.phone)
    | fill(&mut stored.website, &incoming.website);

  if let Some(location) = incoming.location
    && (stored.location.is_none() || incoming.precision > stored.precision)
  {
    stored.location = Some(location);
    stored.precision = incoming.precision;
    changed = true;
  }
  changed
}

/// Ensure a dealership row exists for `key` and return its id, backfilling
/// contact details and upgrading the geocode where `partial` allows.
pub fn resolve_dealer(
  tx: &mut dyn StoreTx,
  key: &DealerKey,
  partial: &DealerFields,
) -> Result<DealerRef> {
  backfill::resolve::<Dealer>(tx, key, partial)
}
