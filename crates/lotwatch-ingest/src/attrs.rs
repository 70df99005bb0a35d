//! YMMS attribute resolution.
//!
//! Every descriptive field of a `(year, make, model, style)` row fills in
//! once and then sticks. A later source reporting a different value for an
//! already-populated field is ignored.

use lotwatch_core::{
  StoreResult,
  attrs::{AttrFields, AttrsRef, YmmsAttrs, YmmsKey},
  store::StoreTx,
};

use crate::{
  Result,
  backfill::{self, Resolvable, fill},
};

struct Attrs;

impl Resolvable for Attrs {
  type Key = YmmsKey;
  type Fields = AttrFields;
  type Row = YmmsAttrs;
  type Ref = AttrsRef;

  const TABLE: &'static str = "ymms_attrs";

  fn insert(
    tx: &mut dyn StoreTx,
    key: &YmmsKey,
    fields: &AttrFields,
  ) -> StoreResult<AttrsRef> {
    tx.insert_attrs(key, fields)
  }

  fn find(tx: &mut dyn StoreTx, key: &YmmsKey) -> StoreResult<Option<YmmsAttrs>> {
    tx.find_attrs(key)
  }

  fn update(tx: &mut dyn StoreTx, row: &YmmsAttrs) -> StoreResult<()> {
    tx.update_attrs(row)
  }

  fn row_ref(row: &YmmsAttrs) -> AttrsRef { row.id }

  fn backfill(row: &mut YmmsAttrs, incoming: &AttrFields) -> bool {
    merge_attrs(&mut row.fields, incoming)
  }
}

/// Fill every empty field of `stored` from `incoming`.
pub(crate) fn merge_attrs(stored: &mut AttrFields, incoming: &AttrFields) -> bool {
  // Non-short-circuiting on purpose: every field gets its chance.
  fill(&mut stored.trim_slug, &incoming.trim_slug)
    | fill(&mut stored.mpg_city, &incoming.mpg_city)
    | fill(&mut stored.mpg_highway, &incoming.mpg_highway)
    | fill(&mut stored.fuel_type, &incoming.fuel_type)
    | fill(&mut stored.transmission, &incoming.transmission)
    | fill(&mut stored.drivetrain, &incoming.drivetrain)
    | fill(&mut stored.body, &incoming.body)
    | fill(&mut stored.engine, &incoming.engine)
    | fill(&mut stored.source, &incoming.source)
}

/// Ensure a YMMS row exists for `key` and return its id, backfilling any of
/// its empty fields from `partial`.
pub fn resolve_attrs(
  tx: &mut dyn StoreTx,
  key: &YmmsKey,
  partial: &AttrFields,
) -> Result<AttrsRef> {
  backfill::resolve::<Attrs>(tx, key, partial)
}
