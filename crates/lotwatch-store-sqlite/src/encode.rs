//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with microsecond precision.
//! Vocabulary enums are stored as their display text; colors as a name plus
//! an `RRGGBB` hex string.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use lotwatch_core::{
  attrs::{AttrFields, AttrsRef, YmmsAttrs, YmmsKey},
  dealer::{DealerFields, DealerKey, DealerRef, Dealership, GeoPoint},
  history::HistoryFlags,
  listing::{Color, Price, Rgb, StoredListing, Vin},
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums & colors ──────────────────────────────────────────────────────────

pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode { column, value: s.to_string() })
}

fn decode_opt_enum<T: FromStr>(
  column: &'static str,
  s: Option<String>,
) -> Result<Option<T>> {
  s.as_deref().map(|s| decode_enum(column, s)).transpose()
}

pub fn encode_rgb(color: &Color) -> Option<String> {
  color.rgb.map(Rgb::to_hex)
}

fn decode_color(
  column: &'static str,
  name: Option<String>,
  rgb: Option<String>,
) -> Result<Color> {
  let rgb = rgb
    .map(|hex| {
      Rgb::from_hex(&hex).ok_or(Error::Decode { column, value: hex })
    })
    .transpose()?;
  Ok(Color { name, rgb })
}

fn decode_int<T: TryFrom<i64>>(column: &'static str, n: i64) -> Result<T> {
  T::try_from(n).map_err(|_| Error::Decode { column, value: n.to_string() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const LISTING_COLUMNS: &str = "source, vin, dealer_id, ymms_id, mileage, \
   price_cents, ext_color_name, ext_color_rgb, int_color_name, int_color_rgb, \
   history_flags, first_seen, last_seen, revision";

/// Raw values read directly from a `listings` row.
pub struct RawListing {
  pub source:         String,
  pub vin:            String,
  pub dealer_id:      i64,
  pub ymms_id:        i64,
  pub mileage:        i64,
  pub price_cents:    i64,
  pub ext_color_name: Option<String>,
  pub ext_color_rgb:  Option<String>,
  pub int_color_name: Option<String>,
  pub int_color_rgb:  Option<String>,
  pub history_flags:  Option<i64>,
  pub first_seen:     String,
  pub last_seen:      String,
  pub revision:       i64,
}

impl RawListing {
  /// Read a row selected with [`LISTING_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      source:         row.get(0)?,
      vin:            row.get(1)?,
      dealer_id:      row.get(2)?,
      ymms_id:        row.get(3)?,
      mileage:        row.get(4)?,
      price_cents:    row.get(5)?,
      ext_color_name: row.get(6)?,
      ext_color_rgb:  row.get(7)?,
      int_color_name: row.get(8)?,
      int_color_rgb:  row.get(9)?,
      history_flags:  row.get(10)?,
      first_seen:     row.get(11)?,
      last_seen:      row.get(12)?,
      revision:       row.get(13)?,
    })
  }

  pub fn into_listing(self) -> Result<StoredListing> {
    let history_flags = self
      .history_flags
      .map(|bits| decode_int::<u16>("history_flags", bits))
      .transpose()?
      .map(HistoryFlags::from_bits);

    Ok(StoredListing {
      source: decode_enum("source", &self.source)?,
      vin: Vin::parse(&self.vin)?,
      dealer: DealerRef(self.dealer_id),
      attrs: AttrsRef(self.ymms_id),
      mileage: decode_int("mileage", self.mileage)?,
      price: Price::from_cents(self.price_cents)?,
      exterior_color: decode_color(
        "ext_color_rgb",
        self.ext_color_name,
        self.ext_color_rgb,
      )?,
      interior_color: decode_color(
        "int_color_rgb",
        self.int_color_name,
        self.int_color_rgb,
      )?,
      history_flags,
      first_seen: decode_dt(&self.first_seen)?,
      last_seen: decode_dt(&self.last_seen)?,
      revision: self.revision,
    })
  }
}

pub const ATTRS_COLUMNS: &str = "id, year, make, model, style, trim_slug, \
   mpg_city, mpg_highway, fuel_type, transmission, drivetrain, body, engine, \
   source";

/// Raw values read directly from a `ymms_attrs` row.
pub struct RawAttrs {
  pub id:           i64,
  pub year:         i64,
  pub make:         String,
  pub model:        String,
  pub style:        String,
  pub trim_slug:    Option<String>,
  pub mpg_city:     Option<f64>,
  pub mpg_highway:  Option<f64>,
  pub fuel_type:    Option<String>,
  pub transmission: Option<String>,
  pub drivetrain:   Option<String>,
  pub body:         Option<String>,
  pub engine:       Option<String>,
  pub source:       Option<String>,
}

impl RawAttrs {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      year:         row.get(1)?,
      make:         row.get(2)?,
      model:        row.get(3)?,
      style:        row.get(4)?,
      trim_slug:    row.get(5)?,
      mpg_city:     row.get(6)?,
      mpg_highway:  row.get(7)?,
      fuel_type:    row.get(8)?,
      transmission: row.get(9)?,
      drivetrain:   row.get(10)?,
      body:         row.get(11)?,
      engine:       row.get(12)?,
      source:       row.get(13)?,
    })
  }

  pub fn into_attrs(self) -> Result<YmmsAttrs> {
    Ok(YmmsAttrs {
      id:     AttrsRef(self.id),
      key:    YmmsKey {
        year:  decode_int("year", self.year)?,
        make:  self.make,
        model: self.model,
        style: self.style,
      },
      fields: AttrFields {
        trim_slug:    self.trim_slug,
        mpg_city:     self.mpg_city,
        mpg_highway:  self.mpg_highway,
        fuel_type:    decode_opt_enum("fuel_type", self.fuel_type)?,
        transmission: decode_opt_enum("transmission", self.transmission)?,
        drivetrain:   decode_opt_enum("drivetrain", self.drivetrain)?,
        body:         decode_opt_enum("body", self.body)?,
        engine:       self.engine,
        source:       decode_opt_enum("source", self.source)?,
      },
    })
  }
}

pub const DEALER_COLUMNS: &str =
  "id, address, zip, name, city, state, lat, lon, precision, phone, website";

/// Raw values read directly from a `dealerships` row.
pub struct RawDealer {
  pub id:        i64,
  pub address:   String,
  pub zip:       String,
  pub name:      Option<String>,
  pub city:      Option<String>,
  pub state:     Option<String>,
  pub lat:       Option<f64>,
  pub lon:       Option<f64>,
  pub precision: String,
  pub phone:     Option<String>,
  pub website:   Option<String>,
}

impl RawDealer {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      address:   row.get(1)?,
      zip:       row.get(2)?,
      name:      row.get(3)?,
      city:      row.get(4)?,
      state:     row.get(5)?,
      lat:       row.get(6)?,
      lon:       row.get(7)?,
      precision: row.get(8)?,
      phone:     row.get(9)?,
      website:   row.get(10)?,
    })
  }

  pub fn into_dealer(self) -> Result<Dealership> {
    let location = match (self.lat, self.lon) {
      (Some(lat), Some(lon)) => Some(GeoPoint { lat, lon }),
      _ => None,
    };
    Ok(Dealership {
      id:     DealerRef(self.id),
      key:    DealerKey { address: self.address, zip: self.zip },
      fields: DealerFields {
        name: self.name,
        city: self.city,
        state: self.state,
        location,
        precision: decode_enum("precision", &self.precision)?,
        phone: self.phone,
        website: self.website,
      },
    })
  }
}
