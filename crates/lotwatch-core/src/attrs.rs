//! Shared year/make/model/style attributes.

use serde::{Deserialize, Serialize};

use crate::listing::Source;

/// Natural key of a [`YmmsAttrs`] row.
///
/// `make`, `model` and `style` are compared exactly; normalization is
/// responsible for producing consistent text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YmmsKey {
  pub year:  u16,
  pub make:  String,
  pub model: String,
  pub style: String,
}

impl std::fmt::Display for YmmsKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} {} {} {}", self.year, self.make, self.model, self.style)
  }
}

/// Store-assigned surrogate key of a [`YmmsAttrs`] row.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AttrsRef(pub i64);

// ─── Vocabularies ────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FuelType {
  Gas,
  Diesel,
  Hybrid,
  Electric,
  Flex,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
pub enum Drivetrain {
  #[serde(rename = "FWD")]
  #[strum(serialize = "FWD")]
  Fwd,
  #[serde(rename = "RWD")]
  #[strum(serialize = "RWD")]
  Rwd,
  #[serde(rename = "AWD")]
  #[strum(serialize = "AWD")]
  Awd,
  #[serde(rename = "4WD")]
  #[strum(serialize = "4WD")]
  FourWd,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
pub enum BodyStyle {
  #[serde(rename = "Sedan")]
  #[strum(serialize = "Sedan")]
  Sedan,
  #[serde(rename = "Coupe")]
  #[strum(serialize = "Coupe")]
  Coupe,
  #[serde(rename = "Convertible")]
  #[strum(serialize = "Convertible")]
  Convertible,
  #[serde(rename = "Hatchback")]
  #[strum(serialize = "Hatchback")]
  Hatchback,
  #[serde(rename = "Wagon")]
  #[strum(serialize = "Wagon")]
  Wagon,
  #[serde(rename = "SUV")]
  #[strum(serialize = "SUV")]
  Suv,
  #[serde(rename = "Chassis Cab Truck")]
  #[strum(serialize = "Chassis Cab Truck")]
  ChassisCabTruck,
  #[serde(rename = "Pickup Truck")]
  #[strum(serialize = "Pickup Truck")]
  PickupTruck,
  #[serde(rename = "Minivan")]
  #[strum(serialize = "Minivan")]
  Minivan,
  #[serde(rename = "Passenger Van")]
  #[strum(serialize = "Passenger Van")]
  PassengerVan,
  #[serde(rename = "Cargo Van")]
  #[strum(serialize = "Cargo Van")]
  CargoVan,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Transmission {
  Automatic,
  Manual,
}

// ─── Attribute rows ──────────────────────────────────────────────────────────

/// Descriptive attributes shared by every listing of the same YMMS.
///
/// Every field is optional: sources report different subsets, and a later
/// observation may fill in what an earlier one left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrFields {
  pub trim_slug:    Option<String>,
  pub mpg_city:     Option<f64>,
  pub mpg_highway:  Option<f64>,
  pub fuel_type:    Option<FuelType>,
  pub transmission: Option<Transmission>,
  pub drivetrain:   Option<Drivetrain>,
  pub body:         Option<BodyStyle>,
  pub engine:       Option<String>,
  /// The source that first populated the row.
  pub source:       Option<Source>,
}

/// A persisted YMMS attribute row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YmmsAttrs {
  pub id:     AttrsRef,
  pub key:    YmmsKey,
  pub fields: AttrFields,
}
