//! [`SqliteStore`], the SQLite implementation of [`ListingStore`].

use std::{path::Path, time::Duration};

use chrono::{DateTime, Utc};
use lotwatch_core::{
  StoreError, StoreResult,
  attrs::{AttrFields, AttrsRef, YmmsAttrs, YmmsKey},
  dealer::{DealerFields, DealerKey, DealerRef, Dealership},
  listing::{Source, StoredListing, Vin},
  store::{ListingStore, StoreTx},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior, params};

use crate::{
  Result,
  encode::{
    ATTRS_COLUMNS, DEALER_COLUMNS, LISTING_COLUMNS, RawAttrs, RawDealer,
    RawListing, decode_dt, encode_dt, encode_rgb,
  },
  error::Classify as _,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A listing store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  ///
  /// `busy_timeout` bounds how long a write waits on another process's lock
  /// before failing with [`StoreError::Busy`].
  pub async fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init(busy_timeout).await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init(Duration::ZERO).await?;
    Ok(store)
  }

  async fn init(&self, busy_timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("sqlite schema ready");
    Ok(())
  }
}

// ─── ListingStore impl ───────────────────────────────────────────────────────

impl ListingStore for SqliteStore {
  async fn transact<F, T, E>(&self, work: F) -> Result<T, E>
  where
    F: FnOnce(&mut dyn StoreTx) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<StoreError> + Send + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = work(&mut SqliteTx { conn: &tx });
        match result {
          Ok(value) => {
            tx.commit()?;
            Ok(Ok(value))
          }
          Err(err) => {
            // Dropping an uncommitted transaction rolls it back.
            drop(tx);
            Ok(Err(err))
          }
        }
      })
      .await;

    match outcome {
      Ok(result) => result,
      Err(err) => Err(E::from(StoreError::from(crate::Error::Database(err)))),
    }
  }
}

// ─── Transaction ─────────────────────────────────────────────────────────────

/// A [`StoreTx`] over an open `rusqlite` transaction.
struct SqliteTx<'a> {
  conn: &'a rusqlite::Connection,
}

impl StoreTx for SqliteTx<'_> {
  // ── YMMS attributes ───────────────────────────────────────────────────

  fn find_attrs(&mut self, key: &YmmsKey) -> StoreResult<Option<YmmsAttrs>> {
    let raw = self
      .conn
      .query_row(
        &format!(
          "SELECT {ATTRS_COLUMNS} FROM ymms_attrs
           WHERE year = ?1 AND make = ?2 AND model = ?3 AND style = ?4"
        ),
        params![key.year, key.make, key.model, key.style],
        RawAttrs::from_row,
      )
      .optional()
      .classified()?;
    Ok(raw.map(RawAttrs::into_attrs).transpose()?)
  }

  fn insert_attrs(
    &mut self,
    key: &YmmsKey,
    fields: &AttrFields,
  ) -> StoreResult<AttrsRef> {
    self
      .conn
      .execute(
        "INSERT INTO ymms_attrs (
           year, make, model, style, trim_slug, mpg_city, mpg_highway,
           fuel_type, transmission, drivetrain, body, engine, source
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
          key.year,
          key.make,
          key.model,
          key.style,
          fields.trim_slug,
          fields.mpg_city,
          fields.mpg_highway,
          fields.fuel_type.map(|v| v.to_string()),
          fields.transmission.map(|v| v.to_string()),
          fields.drivetrain.map(|v| v.to_string()),
          fields.body.map(|v| v.to_string()),
          fields.engine,
          fields.source.map(|v| v.to_string()),
        ],
      )
      .classified()?;
    Ok(AttrsRef(self.conn.last_insert_rowid()))
  }

  fn update_attrs(&mut self, attrs: &YmmsAttrs) -> StoreResult<()> {
    let f = &attrs.fields;
    self
      .conn
      .execute(
        "UPDATE ymms_attrs SET
           trim_slug = ?2, mpg_city = ?3, mpg_highway = ?4, fuel_type = ?5,
           transmission = ?6, drivetrain = ?7, body = ?8, engine = ?9,
           source = ?10
         WHERE id = ?1",
        params![
          attrs.id.0,
          f.trim_slug,
          f.mpg_city,
          f.mpg_highway,
          f.fuel_type.map(|v| v.to_string()),
          f.transmission.map(|v| v.to_string()),
          f.drivetrain.map(|v| v.to_string()),
          f.body.map(|v| v.to_string()),
          f.engine,
          f.source.map(|v| v.to_string()),
        ],
      )
      .classified()?;
    Ok(())
  }

  // ── Dealerships ───────────────────────────────────────────────────────

  fn find_dealer(&mut self, key: &DealerKey) -> StoreResult<Option<Dealership>> {
    let raw = self
      .conn
      .query_row(
        &format!(
          "SELECT {DEALER_COLUMNS} FROM dealerships WHERE address = ?1 AND zip = ?2"
        ),
        params![key.address, key.zip],
        RawDealer::from_row,
      )
      .optional()
      .classified()?;
    Ok(raw.map(RawDealer::into_dealer).transpose()?)
  }

  fn insert_dealer(
    &mut self,
    key: &DealerKey,
    fields: &DealerFields,
  ) -> StoreResult<DealerRef> {
    self
      .conn
      .execute(
        "INSERT INTO dealerships (
           address, zip, name, city, state, lat, lon, precision, phone, website
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
          key.address,
          key.zip,
          fields.name,
          fields.city,
          fields.state,
          fields.location.map(|p| p.lat),
          fields.location.map(|p| p.lon),
          fields.precision.as_ref(),
          fields.phone,
          fields.website,
        ],
      )
      .classified()?;
    Ok(DealerRef(self.conn.last_insert_rowid()))
  }

  fn update_dealer(&mut self, dealer: &Dealership) -> StoreResult<()> {
    let f = &dealer.fields;
    self
      .conn
      .execute(
        "UPDATE dealerships SET
           name = ?2, city = ?3, state = ?4, lat = ?5, lon = ?6,
           precision = ?7, phone = ?8, website = ?9
         WHERE id = ?1",
        params![
          dealer.id.0,
          f.name,
          f.city,
          f.state,
          f.location.map(|p| p.lat),
          f.location.map(|p| p.lon),
          f.precision.as_ref(),
          f.phone,
          f.website,
        ],
      )
      .classified()?;
    Ok(())
  }

  // ── Listings ──────────────────────────────────────────────────────────

  fn find_listing(
    &mut self,
    source: Source,
    vin: &Vin,
  ) -> StoreResult<Option<StoredListing>> {
    let raw = self
      .conn
      .query_row(
        &format!(
          "SELECT {LISTING_COLUMNS} FROM listings WHERE source = ?1 AND vin = ?2"
        ),
        params![source.as_ref(), vin.as_str()],
        RawListing::from_row,
      )
      .optional()
      .classified()?;
    Ok(raw.map(RawListing::into_listing).transpose()?)
  }

  fn insert_listing(&mut self, l: &StoredListing) -> StoreResult<()> {
    self
      .conn
      .execute(
        &format!(
          "INSERT INTO listings ({LISTING_COLUMNS})
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
        ),
        params![
          l.source.as_ref(),
          l.vin.as_str(),
          l.dealer.0,
          l.attrs.0,
          l.mileage,
          l.price.cents(),
          l.exterior_color.name,
          encode_rgb(&l.exterior_color),
          l.interior_color.name,
          encode_rgb(&l.interior_color),
          l.history_flags.map(|h| h.bits()),
          encode_dt(l.first_seen),
          encode_dt(l.last_seen),
          l.revision,
        ],
      )
      .classified()?;
    Ok(())
  }

  fn update_listing(&mut self, l: &StoredListing) -> StoreResult<i64> {
    let changed = self
      .conn
      .execute(
        "UPDATE listings SET
           dealer_id = ?4, ymms_id = ?5, mileage = ?6, price_cents = ?7,
           ext_color_name = ?8, ext_color_rgb = ?9,
           int_color_name = ?10, int_color_rgb = ?11,
           history_flags = ?12, last_seen = ?13, revision = revision + 1
         WHERE source = ?1 AND vin = ?2 AND revision = ?3",
        params![
          l.source.as_ref(),
          l.vin.as_str(),
          l.revision,
          l.dealer.0,
          l.attrs.0,
          l.mileage,
          l.price.cents(),
          l.exterior_color.name,
          encode_rgb(&l.exterior_color),
          l.interior_color.name,
          encode_rgb(&l.interior_color),
          l.history_flags.map(|h| h.bits()),
          encode_dt(l.last_seen),
        ],
      )
      .classified()?;
    if changed == 0 {
      return Err(StoreError::StaleWrite(format!("{}/{}", l.source, l.vin)));
    }
    Ok(l.revision + 1)
  }

  fn listings_for_vin(&mut self, vin: &Vin) -> StoreResult<Vec<StoredListing>> {
    let mut stmt = self
      .conn
      .prepare(&format!(
        "SELECT {LISTING_COLUMNS} FROM listings WHERE vin = ?1 ORDER BY source"
      ))
      .classified()?;
    let raws = stmt
      .query_map(params![vin.as_str()], RawListing::from_row)
      .classified()?
      .collect::<rusqlite::Result<Vec<_>>>()
      .classified()?;
    let listings = raws
      .into_iter()
      .map(RawListing::into_listing)
      .collect::<crate::Result<Vec<_>>>()?;
    Ok(listings)
  }

  // ── Raw listing ids ───────────────────────────────────────────────────

  fn record_raw_listing(
    &mut self,
    source: Source,
    listing_id: &str,
    vin: &Vin,
    now: DateTime<Utc>,
  ) -> StoreResult<Option<DateTime<Utc>>> {
    let Some(table) = source.listing_id_table() else {
      return Ok(None);
    };

    let seen: Option<(String, String)> = self
      .conn
      .query_row(
        &format!("SELECT first_seen, last_seen FROM {table} WHERE listing_id = ?1"),
        params![listing_id],
        |r| Ok((r.get(0)?, r.get(1)?)),
      )
      .optional()
      .classified()?;

    let Some((first_seen, last_seen)) = seen else {
      let now = encode_dt(now);
      self
        .conn
        .execute(
          &format!(
            "INSERT INTO {table} (listing_id, vin, first_seen, last_seen)
             VALUES (?1, ?2, ?3, ?3)"
          ),
          params![listing_id, vin.as_str(), now],
        )
        .classified()?;
      return Ok(None);
    };

    let last_seen = decode_dt(&last_seen)?.max(now);
    self
      .conn
      .execute(
        &format!("UPDATE {table} SET vin = ?2, last_seen = ?3 WHERE listing_id = ?1"),
        params![listing_id, vin.as_str(), encode_dt(last_seen)],
      )
      .classified()?;
    Ok(Some(decode_dt(&first_seen)?))
  }
}
