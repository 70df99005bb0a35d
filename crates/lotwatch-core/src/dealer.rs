//! Dealerships, keyed by normalized street address and ZIP.

use serde::{Deserialize, Serialize};

/// Natural key of a [`Dealership`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DealerKey {
  /// Normalized street address (suffixes expanded, whitespace collapsed).
  pub address: String,
  /// Five-digit ZIP code.
  pub zip:     String,
}

impl std::fmt::Display for DealerKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} {}", self.address, self.zip)
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DealerRef(pub i64);

/// How trustworthy a dealership's coordinates are. Ordered: a higher variant
/// is strictly better.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
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
pub enum GeoPrecision {
  #[default]
  Unknown,
  Approximate,
  Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
  pub lat: f64,
  pub lon: f64,
}

/// Mutable descriptive fields of a dealership.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DealerFields {
  pub name:      Option<String>,
  pub city:      Option<String>,
  pub state:     Option<String>,
  pub location:  Option<GeoPoint>,
  pub precision: GeoPrecision,
  pub phone:     Option<String>,
  pub website:   Option<String>,
}

/// A persisted dealership row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dealership {
  pub id:     DealerRef,
  pub key:    DealerKey,
  pub fields: DealerFields,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn precision_orders_unknown_below_exact() {
    assert!(GeoPrecision::Unknown < GeoPrecision::Approximate);
    assert!(GeoPrecision::Approximate < GeoPrecision::Exact);
    assert_eq!(GeoPrecision::default(), GeoPrecision::Unknown);
    assert_eq!("exact".parse::<GeoPrecision>().unwrap(), GeoPrecision::Exact);
  }
}
