//! One module per source site. Each exposes a [`crate::Strategy`]-shaped
//! `normalize` function over a typed view of that site's JSON.

pub mod autotrader;
pub mod edmunds;
pub mod truecar;

use lotwatch_core::dealer::{GeoPoint, GeoPrecision};
use serde::Deserialize;

use crate::error::Result;

/// Deserialize a borrowed payload into a source's typed shape.
pub(crate) fn payload<'a, T: Deserialize<'a>>(
  raw: &'a serde_json::Value,
) -> Result<T> {
  Ok(T::deserialize(raw)?)
}

/// Coordinates are only usable as a pair, and only when in range.
pub(crate) fn geo(
  lat: Option<f64>,
  lon: Option<f64>,
  precision: GeoPrecision,
) -> (Option<GeoPoint>, GeoPrecision) {
  match (lat, lon) {
    (Some(lat), Some(lon))
      if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) =>
    {
      (Some(GeoPoint { lat, lon }), precision)
    }
    _ => (None, GeoPrecision::Unknown),
  }
}
