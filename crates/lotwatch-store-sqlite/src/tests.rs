//! Integration tests for `SqliteStore` against an in-memory database.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use lotwatch_core::{
  StoreError,
  attrs::{AttrFields, AttrsRef, Drivetrain, FuelType, YmmsKey},
  dealer::{DealerFields, DealerKey, DealerRef, GeoPoint, GeoPrecision},
  history::HistoryFlags,
  listing::{Color, Price, Rgb, Source, StoredListing, Vin},
  store::ListingStore,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn at(hour: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
}

fn civic() -> YmmsKey {
  YmmsKey {
    year:  2020,
    make:  "Honda".into(),
    model: "Civic".into(),
    style: "LX".into(),
  }
}

fn lot() -> DealerKey {
  DealerKey { address: "123 Main Street".into(), zip: "62701".into() }
}

fn vin() -> Vin { Vin::parse("1HGCM82633A004352").unwrap() }

fn listing(dealer: DealerRef, attrs: AttrsRef, now: DateTime<Utc>) -> StoredListing {
  StoredListing {
    source: Source::Truecar,
    vin: vin(),
    dealer,
    attrs,
    mileage: 30_000,
    price: Price::from_dollars(15_000.0).unwrap(),
    exterior_color: Color { name: Some("black".into()), rgb: Some(Rgb::new(0, 0, 0)) },
    interior_color: Color::default(),
    history_flags: Some(HistoryFlags::ACCIDENT.with_owners(2)),
    first_seen: now,
    last_seen: now,
    revision: 0,
  }
}

/// Insert one attrs row and one dealer row; return their refs.
async fn parents(s: &SqliteStore) -> (DealerRef, AttrsRef) {
  s.transact(|tx| {
    let dealer = tx.insert_dealer(&lot(), &DealerFields::default())?;
    let attrs = tx.insert_attrs(&civic(), &AttrFields::default())?;
    Ok::<_, StoreError>((dealer, attrs))
  })
  .await
  .unwrap()
}

// ─── YMMS attributes ─────────────────────────────────────────────────────────

#[tokio::test]
async fn attrs_insert_find_update() {
  let s = store().await;
  let fields = AttrFields {
    mpg_city: Some(30.0),
    fuel_type: Some(FuelType::Gas),
    source: Some(Source::Edmunds),
    ..AttrFields::default()
  };

  let id = s
    .transact(move |tx| tx.insert_attrs(&civic(), &fields))
    .await
    .unwrap();

  let mut row = s.get_attrs(civic()).await.unwrap().unwrap();
  assert_eq!(row.id, id);
  assert_eq!(row.fields.mpg_city, Some(30.0));
  assert_eq!(row.fields.fuel_type, Some(FuelType::Gas));
  assert_eq!(row.fields.source, Some(Source::Edmunds));

  row.fields.drivetrain = Some(Drivetrain::FourWd);
  let update = row.clone();
  s.transact(move |tx| tx.update_attrs(&update)).await.unwrap();

  let reread = s.get_attrs(civic()).await.unwrap().unwrap();
  assert_eq!(reread, row);
}

#[tokio::test]
async fn duplicate_attrs_key_is_unique_violation() {
  let s = store().await;
  s.transact(|tx| tx.insert_attrs(&civic(), &AttrFields::default()))
    .await
    .unwrap();

  let err = s
    .transact(|tx| tx.insert_attrs(&civic(), &AttrFields::default()))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::UniqueViolation(_)), "{err:?}");
}

// ─── Dealerships ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn dealer_round_trip() {
  let s = store().await;
  let fields = DealerFields {
    name: Some("Springfield Honda".into()),
    location: Some(GeoPoint { lat: 39.78, lon: -89.65 }),
    precision: GeoPrecision::Exact,
    phone: Some("2175550100".into()),
    ..DealerFields::default()
  };
  let expected = fields.clone();
  let id = s
    .transact(move |tx| tx.insert_dealer(&lot(), &fields))
    .await
    .unwrap();

  let dealer = s.get_dealer(lot()).await.unwrap().unwrap();
  assert_eq!(dealer.id, id);
  assert_eq!(dealer.key, lot());
  assert_eq!(dealer.fields, expected);

  let err = s
    .transact(|tx| tx.insert_dealer(&lot(), &DealerFields::default()))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::UniqueViolation(_)));
}

// ─── Listings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn listing_insert_and_find() {
  let s = store().await;
  let (dealer, attrs) = parents(&s).await;
  let row = listing(dealer, attrs, at(1));
  let insert = row.clone();
  s.transact(move |tx| tx.insert_listing(&insert)).await.unwrap();

  let found = s.get_listing(Source::Truecar, vin()).await.unwrap().unwrap();
  assert_eq!(found, row);
  assert!(s.get_listing(Source::Edmunds, vin()).await.unwrap().is_none());
}

#[tokio::test]
async fn listing_with_missing_parents_is_foreign_key_violation() {
  let s = store().await;
  let row = listing(DealerRef(41), AttrsRef(42), at(1));
  let err = s
    .transact(move |tx| tx.insert_listing(&row))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::ForeignKeyViolation(_)), "{err:?}");
}

#[tokio::test]
async fn duplicate_listing_is_unique_violation() {
  let s = store().await;
  let (dealer, attrs) = parents(&s).await;
  let row = listing(dealer, attrs, at(1));
  let again = row.clone();
  s.transact(move |tx| tx.insert_listing(&row)).await.unwrap();
  let err = s
    .transact(move |tx| tx.insert_listing(&again))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::UniqueViolation(_)));
}

#[tokio::test]
async fn update_listing_bumps_revision_and_keeps_first_seen() {
  let s = store().await;
  let (dealer, attrs) = parents(&s).await;
  let row = listing(dealer, attrs, at(1));
  let insert = row.clone();
  s.transact(move |tx| tx.insert_listing(&insert)).await.unwrap();

  let mut changed = row.clone();
  changed.price = Price::from_dollars(14_000.0).unwrap();
  changed.last_seen = at(5);
  // An attempt to move first_seen through an update is ignored.
  changed.first_seen = at(3);
  let revision = s
    .transact(move |tx| tx.update_listing(&changed))
    .await
    .unwrap();
  assert_eq!(revision, 1);

  let found = s.get_listing(Source::Truecar, vin()).await.unwrap().unwrap();
  assert_eq!(found.price.cents(), 1_400_000);
  assert_eq!(found.first_seen, at(1));
  assert_eq!(found.last_seen, at(5));
  assert_eq!(found.revision, 1);
}

#[tokio::test]
async fn update_with_stale_revision_is_rejected() {
  let s = store().await;
  let (dealer, attrs) = parents(&s).await;
  let row = listing(dealer, attrs, at(1));
  let insert = row.clone();
  s.transact(move |tx| tx.insert_listing(&insert)).await.unwrap();

  let first = row.clone();
  s.transact(move |tx| tx.update_listing(&first)).await.unwrap();

  // Still carries revision 0.
  let err = s
    .transact(move |tx| tx.update_listing(&row))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::StaleWrite(_)));
}

#[tokio::test]
async fn listings_for_vin_spans_sources() {
  let s = store().await;
  let (dealer, attrs) = parents(&s).await;
  let truecar = listing(dealer, attrs, at(1));
  let mut edmunds = truecar.clone();
  edmunds.source = Source::Edmunds;
  s.transact(move |tx| {
    tx.insert_listing(&truecar)?;
    tx.insert_listing(&edmunds)
  })
  .await
  .unwrap();

  let rows = s.listings_for_vin(vin()).await.unwrap();
  let sources: Vec<Source> = rows.iter().map(|r| r.source).collect();
  assert_eq!(sources, vec![Source::Edmunds, Source::Truecar]);
}

// ─── Transactions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_work_rolls_back() {
  let s = store().await;
  let err = s
    .transact(|tx| {
      tx.insert_attrs(&civic(), &AttrFields::default())?;
      Err::<(), _>(StoreError::Busy("injected".into()))
    })
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::Busy(_)));
  assert!(s.get_attrs(civic()).await.unwrap().is_none());
}

#[tokio::test]
async fn constraint_failure_rolls_back_earlier_writes() {
  let s = store().await;
  let row = listing(DealerRef(99), AttrsRef(99), at(1));
  let result = s
    .transact(move |tx| {
      tx.insert_dealer(&lot(), &DealerFields::default())?;
      tx.insert_listing(&row)
    })
    .await;
  assert!(result.is_err());
  assert!(s.get_dealer(lot()).await.unwrap().is_none());
}

// ─── Raw listing ids ─────────────────────────────────────────────────────────

#[tokio::test]
async fn raw_listing_ids_insert_then_touch() {
  let s = store().await;
  let first = s
    .transact(|tx| tx.record_raw_listing(Source::Autotrader, "601", &vin(), at(2)))
    .await
    .unwrap();
  assert_eq!(first, None);

  let again = s
    .transact(|tx| tx.record_raw_listing(Source::Autotrader, "601", &vin(), at(4)))
    .await
    .unwrap();
  assert_eq!(again, Some(at(2)));

  // An older sighting does not move first_seen.
  let older = s
    .transact(|tx| tx.record_raw_listing(Source::Autotrader, "601", &vin(), at(1)))
    .await
    .unwrap();
  assert_eq!(older, Some(at(2)));
}

#[tokio::test]
async fn truecar_has_no_raw_listing_table() {
  let s = store().await;
  for _ in 0..2 {
    let seen = s
      .transact(|tx| tx.record_raw_listing(Source::Truecar, "x", &vin(), at(1)))
      .await
      .unwrap();
    assert_eq!(seen, None);
  }
}

// ─── On-disk ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn file_store_persists_across_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("lotwatch.db");

  {
    let s = SqliteStore::open(&path, Duration::from_secs(1)).await.unwrap();
    s.transact(|tx| tx.insert_attrs(&civic(), &AttrFields::default()))
      .await
      .unwrap();
  }

  let s = SqliteStore::open(&path, Duration::from_secs(1)).await.unwrap();
  assert!(s.get_attrs(civic()).await.unwrap().is_some());
}
