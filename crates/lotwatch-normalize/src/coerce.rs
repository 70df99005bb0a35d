//! Numeric and text coercion shared by every source.
//!
//! Sites are inconsistent about whether numbers arrive as JSON numbers or as
//! display strings (`"12,345"`, `"$15,000"`). [`RawNumber`] accepts both.

use lotwatch_core::listing::Price;
use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
  Int(i64),
  Float(f64),
  Text(String),
}

impl RawNumber {
  /// Parse to a finite, non-negative `f64`, blaming `field` on failure.
  pub fn non_negative(&self, field: &'static str) -> Result<f64> {
    let value = match self {
      Self::Int(n) => *n as f64,
      Self::Float(f) => *f,
      Self::Text(s) => {
        let cleaned: String = s
          .trim()
          .chars()
          .filter(|c| !matches!(c, ',' | '$' | ' '))
          .collect();
        cleaned.parse::<f64>().map_err(|_| Error::field(field, s))?
      }
    };
    if !value.is_finite() || value < 0.0 {
      return Err(Error::field(field, self));
    }
    Ok(value)
  }
}

impl std::fmt::Display for RawNumber {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Int(n) => write!(f, "{n}"),
      Self::Float(x) => write!(f, "{x}"),
      Self::Text(s) => f.write_str(s),
    }
  }
}

pub fn mileage(raw: &RawNumber) -> Result<u32> {
  let miles = raw.non_negative("mileage")?.round();
  if miles > u32::MAX as f64 {
    return Err(Error::field("mileage", raw));
  }
  Ok(miles as u32)
}

pub fn price(raw: &RawNumber) -> Result<Price> {
  let dollars = raw.non_negative("price")?;
  Price::from_dollars(dollars).map_err(|_| Error::field("price", raw))
}

pub fn year(raw: &RawNumber) -> Result<u16> {
  let year = raw.non_negative("year")?;
  if year.fract() != 0.0 || !(1886.0..=9999.0).contains(&year) {
    return Err(Error::field("year", raw));
  }
  Ok(year as u16)
}

/// MPG figures are descriptive; anything unparseable becomes `None`.
pub fn mpg(raw: Option<&RawNumber>) -> Option<f64> {
  raw
    .and_then(|r| r.non_negative("mpg").ok())
    .filter(|v| *v > 0.0)
}

/// Trim, and drop empty strings.
pub fn text(raw: Option<&str>) -> Option<String> {
  raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// A required text field: trimmed and non-empty.
pub fn required(field: &'static str, raw: &str) -> Result<String> {
  text(Some(raw)).ok_or_else(|| Error::field(field, raw))
}

/// Keep only the digits of a phone number; fewer than ten digits is noise.
pub fn phone(raw: &str) -> Option<String> {
  let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
  (digits.len() >= 10).then_some(digits)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mileage_accepts_display_strings() {
    assert_eq!(mileage(&RawNumber::Text("12,345".into())).unwrap(), 12_345);
    assert_eq!(mileage(&RawNumber::Int(30_000)).unwrap(), 30_000);
    assert_eq!(mileage(&RawNumber::Float(10.6)).unwrap(), 11);
  }

  #[test]
  fn mileage_rejects_negative_and_garbage() {
    assert!(matches!(
      mileage(&RawNumber::Int(-1)),
      Err(Error::MalformedField { field: "mileage", .. })
    ));
    assert!(matches!(
      mileage(&RawNumber::Text("lots".into())),
      Err(Error::MalformedField { field: "mileage", .. })
    ));
  }

  #[test]
  fn price_strips_currency_and_rejects_zero() {
    assert_eq!(
      price(&RawNumber::Text("$15,000".into())).unwrap().cents(),
      1_500_000
    );
    assert!(matches!(
      price(&RawNumber::Int(0)),
      Err(Error::MalformedField { field: "price", .. })
    ));
    assert!(price(&RawNumber::Float(-10.0)).is_err());
  }

  #[test]
  fn year_must_be_whole() {
    assert_eq!(year(&RawNumber::Text("2020".into())).unwrap(), 2020);
    assert!(year(&RawNumber::Float(2020.5)).is_err());
    assert!(year(&RawNumber::Int(20)).is_err());
  }

  #[test]
  fn phone_keeps_digits() {
    assert_eq!(phone("(555) 123-4567").as_deref(), Some("5551234567"));
    assert_eq!(phone("call us"), None);
  }
}
