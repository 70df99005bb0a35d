//! Insert-if-absent, else backfill.
//!
//! Both resolvers follow the same optimistic pattern: try the insert, and if
//! the natural key is already taken, re-read the existing row and fill in
//! whatever it is missing. The common path (a new key, or an existing row
//! with nothing to add) costs one statement plus at most one read.

use std::fmt::Display;

use lotwatch_core::{StoreError, StoreResult, store::StoreTx};

use crate::error::{IngestError, Result};

/// A table keyed by a natural key whose descriptive fields only ever fill in.
pub(crate) trait Resolvable {
  type Key: Display + ?Sized;
  type Fields;
  type Row;
  type Ref: Copy;

  const TABLE: &'static str;

  fn insert(
    tx: &mut dyn StoreTx,
    key: &Self::Key,
    fields: &Self::Fields,
  ) -> StoreResult<Self::Ref>;

  fn find(tx: &mut dyn StoreTx, key: &Self::Key) -> StoreResult<Option<Self::Row>>;

  fn update(tx: &mut dyn StoreTx, row: &Self::Row) -> StoreResult<()>;

  fn row_ref(row: &Self::Row) -> Self::Ref;

  /// Merge `incoming` into `row`. Returns whether anything changed.
  fn backfill(row: &mut Self::Row, incoming: &Self::Fields) -> bool;
}

pub(crate) fn resolve<R: Resolvable>(
  tx: &mut dyn StoreTx,
  key: &R::Key,
  fields: &R::Fields,
) -> Result<R::Ref> {
  match R::insert(tx, key, fields) {
    Ok(id) => {
      tracing::debug!(table = R::TABLE, %key, "inserted");
      Ok(id)
    }
    Err(StoreError::UniqueViolation(_)) => {
      let Some(mut row) = R::find(tx, key)? else {
        return Err(IngestError::ResolutionConflict(format!("{} {key}", R::TABLE)));
      };
      if R::backfill(&mut row, fields) {
        R::update(tx, &row)?;
        tracing::debug!(table = R::TABLE, %key, "backfilled");
      }
      Ok(R::row_ref(&row))
    }
    Err(err) => Err(err.into()),
  }
}

/// Fill `slot` from `incoming` if `slot` is empty. Never overwrites.
pub(crate) fn fill<T: Clone>(slot: &mut Option<T>, incoming: &Option<T>) -> bool {
  match (&slot, incoming) {
    (None, Some(value)) => {
      *slot = Some(value.clone());
      true
    }
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fill_only_when_empty() {
    let mut slot = None;
    assert!(fill(&mut slot, &Some(30.0)));
    assert_eq!(slot, Some(30.0));

    assert!(!fill(&mut slot, &Some(99.0)));
    assert_eq!(slot, Some(30.0));

    assert!(!fill(&mut slot, &None));
    assert_eq!(slot, Some(30.0));
  }
}
