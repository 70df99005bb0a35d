//! Listing types: the canonical per-scrape record and the persisted row.
//!
//! A [`ListingRecord`] is what a single scrape says about one vehicle. A
//! [`StoredListing`] is the reconciled row: the latest observed values plus
//! the window `[first_seen, last_seen]` over which the vehicle was listed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  attrs::{AttrsRef, YmmsKey},
  dealer::{DealerKey, DealerRef},
  history::HistoryFlags,
};

// ─── Source ──────────────────────────────────────────────────────────────────

/// The site a listing was scraped from.
///
/// Listings from different sources are never merged, even when they share a
/// VIN.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Source {
  Truecar,
  Autotrader,
  Edmunds,
}

impl Source {
  pub const ALL: [Source; 3] = [Self::Truecar, Self::Autotrader, Self::Edmunds];

  /// The side table that tracks this source's own listing ids, if the source
  /// exposes stable ids worth tracking.
  pub fn listing_id_table(self) -> Option<&'static str> {
    match self {
      Self::Truecar => None,
      Self::Autotrader => Some("autotrader_listings"),
      Self::Edmunds => Some("edmunds_listings"),
    }
  }
}

// ─── Vin ─────────────────────────────────────────────────────────────────────

/// A validated 17-character vehicle identification number.
///
/// Stored upper-case. The letters `I`, `O` and `Q` never appear in a VIN.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Vin(String);

impl Vin {
  pub const LEN: usize = 17;

  /// Validate `raw` (surrounding whitespace and case are ignored).
  pub fn parse(raw: &str) -> Result<Self> {
    let vin = raw.trim().to_ascii_uppercase();
    let valid = vin.len() == Self::LEN
      && vin
        .chars()
        .all(|c| c.is_ascii_alphanumeric() && !matches!(c, 'I' | 'O' | 'Q'));
    if valid {
      Ok(Self(vin))
    } else {
      Err(Error::InvalidVin(raw.to_string()))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for Vin {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::parse(&value) }
}

impl From<Vin> for String {
  fn from(vin: Vin) -> Self { vin.0 }
}

impl fmt::Display for Vin {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Price ───────────────────────────────────────────────────────────────────

/// A strictly positive asking price, held in whole cents.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
  pub fn from_cents(cents: i64) -> Result<Self> {
    if cents > 0 {
      Ok(Self(cents))
    } else {
      Err(Error::InvalidPrice(cents.to_string()))
    }
  }

  /// Round a decimal dollar amount to the nearest cent.
  pub fn from_dollars(dollars: f64) -> Result<Self> {
    let cents = (dollars * 100.0).round();
    if !cents.is_finite() || cents < 1.0 || cents >= i64::MAX as f64 {
      return Err(Error::InvalidPrice(dollars.to_string()));
    }
    Ok(Self(cents as i64))
  }

  pub fn cents(self) -> i64 { self.0 }

  pub fn dollars(self) -> f64 { self.0 as f64 / 100.0 }
}

// ─── Color ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

impl Rgb {
  pub const fn new(r: u8, g: u8, b: u8) -> Self { Self { r, g, b } }

  /// Upper-case `RRGGBB`, without a leading `#`.
  pub fn to_hex(self) -> String {
    format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
  }

  /// Parse `RRGGBB` or `#RRGGBB` (either case).
  pub fn from_hex(s: &str) -> Option<Self> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
      return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
  }
}

/// A color as resolved from a listing's free-text descriptor.
///
/// `name` is a canonical lower-case color name; `rgb` is present whenever the
/// source supplied one or the name could be resolved. A descriptor that could
/// not be resolved at all leaves both empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
  pub name: Option<String>,
  pub rgb:  Option<Rgb>,
}

impl Color {
  pub fn is_unknown(&self) -> bool { self.name.is_none() && self.rgb.is_none() }
}

// ─── ListingRecord ───────────────────────────────────────────────────────────

/// One normalized observation of a listing, as produced from a single raw
/// scrape payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
  pub source:         Source,
  pub vin:            Vin,
  pub dealer_key:     DealerKey,
  pub ymms_key:       YmmsKey,
  pub mileage:        u32,
  pub price:          Price,
  pub exterior_color: Color,
  pub interior_color: Color,
  /// `None` when the source reported neither a history nor a certification.
  pub history_flags:  Option<HistoryFlags>,
  pub observed_at:    DateTime<Utc>,
}

// ─── ListingFields ───────────────────────────────────────────────────────────

/// The fields of a stored listing that may legitimately change between
/// observations of the same vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFields {
  pub dealer:         DealerRef,
  pub attrs:          AttrsRef,
  pub mileage:        u32,
  pub price:          Price,
  pub exterior_color: Color,
  pub interior_color: Color,
  pub history_flags:  Option<HistoryFlags>,
}

impl ListingFields {
  pub fn from_record(
    record: &ListingRecord,
    dealer: DealerRef,
    attrs: AttrsRef,
  ) -> Self {
    Self {
      dealer,
      attrs,
      mileage: record.mileage,
      price: record.price,
      exterior_color: record.exterior_color.clone(),
      interior_color: record.interior_color.clone(),
      history_flags: record.history_flags,
    }
  }
}

// ─── StoredListing ───────────────────────────────────────────────────────────

/// A persisted listing row, keyed by `(source, vin)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredListing {
  pub source:         Source,
  pub vin:            Vin,
  pub dealer:         DealerRef,
  pub attrs:          AttrsRef,
  pub mileage:        u32,
  pub price:          Price,
  pub exterior_color: Color,
  pub interior_color: Color,
  pub history_flags:  Option<HistoryFlags>,
  /// Set once when the row is created; never changes afterwards.
  pub first_seen:     DateTime<Utc>,
  /// Most recent observation; never moves backwards.
  pub last_seen:      DateTime<Utc>,
  /// Bumped by the store on every update; used to detect concurrent writers.
  pub revision:       i64,
}

impl StoredListing {
  /// The row for a vehicle seen for the first time at `now`.
  pub fn first_observation(
    record: &ListingRecord,
    dealer: DealerRef,
    attrs: AttrsRef,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      source: record.source,
      vin: record.vin.clone(),
      dealer,
      attrs,
      mileage: record.mileage,
      price: record.price,
      exterior_color: record.exterior_color.clone(),
      interior_color: record.interior_color.clone(),
      history_flags: record.history_flags,
      first_seen: now,
      last_seen: now,
      revision: 0,
    }
  }

  pub fn fields(&self) -> ListingFields {
    ListingFields {
      dealer:         self.dealer,
      attrs:          self.attrs,
      mileage:        self.mileage,
      price:          self.price,
      exterior_color: self.exterior_color.clone(),
      interior_color: self.interior_color.clone(),
      history_flags:  self.history_flags,
    }
  }

  /// Overwrite every mutable field with `fields`.
  pub fn apply(&mut self, fields: ListingFields) {
    self.dealer = fields.dealer;
    self.attrs = fields.attrs;
    self.mileage = fields.mileage;
    self.price = fields.price;
    self.exterior_color = fields.exterior_color;
    self.interior_color = fields.interior_color;
    self.history_flags = fields.history_flags;
  }

  /// How long the vehicle has been listed, as far as we have observed.
  pub fn tenure(&self) -> chrono::Duration { self.last_seen - self.first_seen }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn vin_accepts_valid_and_normalizes_case() {
    let vin = Vin::parse(" 1hgcm82633a004352 ").unwrap();
    assert_eq!(vin.as_str(), "1HGCM82633A004352");
  }

  #[test]
  fn vin_rejects_wrong_length() {
    assert!(matches!(Vin::parse("BADVIN"), Err(Error::InvalidVin(_))));
    assert!(Vin::parse("1HGCM82633A0043521").is_err());
  }

  #[test]
  fn vin_rejects_excluded_letters() {
    assert!(Vin::parse("1HGCM82633A00435I").is_err());
    assert!(Vin::parse("1HGCM82633A00435O").is_err());
    assert!(Vin::parse("1HGCM82633A00435Q").is_err());
    assert!(Vin::parse("1HGCM82633A00435-").is_err());
  }

  #[test]
  fn vin_deserialize_validates() {
    let ok: Vin = serde_json::from_str("\"JTEHD20V650050824\"").unwrap();
    assert_eq!(ok.as_str(), "JTEHD20V650050824");
    assert!(serde_json::from_str::<Vin>("\"nope\"").is_err());
  }

  #[test]
  fn price_rounds_to_cents_and_rejects_non_positive() {
    assert_eq!(Price::from_dollars(15000.0).unwrap().cents(), 1_500_000);
    assert_eq!(Price::from_dollars(19.99).unwrap().cents(), 1999);
    assert_eq!(Price::from_dollars(0.004).ok(), None);
    assert!(Price::from_dollars(0.0).is_err());
    assert!(Price::from_dollars(-5.0).is_err());
    assert!(Price::from_dollars(f64::NAN).is_err());
    assert!(Price::from_cents(0).is_err());
  }

  #[test]
  fn rgb_hex_round_trip() {
    let rgb = Rgb::from_hex("#1a2B3c").unwrap();
    assert_eq!(rgb, Rgb::new(0x1A, 0x2B, 0x3C));
    assert_eq!(rgb.to_hex(), "1A2B3C");
    assert!(Rgb::from_hex("12345").is_none());
    assert!(Rgb::from_hex("GGGGGG").is_none());
  }

  #[test]
  fn source_text_round_trip() {
    for source in Source::ALL {
      let text = source.to_string();
      assert_eq!(text.parse::<Source>().unwrap(), source);
    }
    assert_eq!(Source::Autotrader.as_ref(), "autotrader");
    assert!("cargurus".parse::<Source>().is_err());
  }
}
