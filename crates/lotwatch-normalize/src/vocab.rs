//! Controlled vocabularies for descriptive attributes, plus dealer address
//! normalization.
//!
//! Each site spells the same thing differently ("Gasoline", "Gas", "gas";
//! "All Wheel Drive", "AWD"). Descriptors we do not recognise map to `None`:
//! they are descriptive, never part of an identity key.

use lotwatch_core::attrs::{BodyStyle, Drivetrain, FuelType, Transmission};
use serde::Deserialize;

use crate::error::{Error, Result};

pub fn fuel(raw: &str) -> Option<FuelType> {
  let fuel = raw.trim().to_lowercase();
  if fuel.contains("flex") {
    return Some(FuelType::Flex);
  }
  if fuel.contains("hybrid") {
    return Some(FuelType::Hybrid);
  }
  match fuel.as_str() {
    "gas" | "gasoline" | "premium unleaded" | "regular unleaded" => {
      Some(FuelType::Gas)
    }
    "diesel" => Some(FuelType::Diesel),
    "electric" | "ev" => Some(FuelType::Electric),
    _ => None,
  }
}

pub fn drivetrain(raw: &str) -> Option<Drivetrain> {
  match raw.trim().to_lowercase().as_str() {
    "awd" | "all wheel drive" | "all-wheel drive" => Some(Drivetrain::Awd),
    "fwd" | "front wheel drive" | "front-wheel drive" | "2 wheel drive - front" => {
      Some(Drivetrain::Fwd)
    }
    "rwd" | "rear wheel drive" | "rear-wheel drive" | "2 wheel drive - rear" => {
      Some(Drivetrain::Rwd)
    }
    "4wd"
    | "4x4"
    | "four wheel drive"
    | "4 wheel drive"
    | "4 wheel drive - rear wheel default"
    | "4 wheel drive - front wheel default" => Some(Drivetrain::FourWd),
    _ => None,
  }
}

pub fn body(raw: &str) -> Option<BodyStyle> {
  let titled = title_case(raw.trim());
  let canonical = match titled.as_str() {
    "Suv" | "Sport Utility" => "SUV",
    "Convert" => "Convertible",
    "Hatch" => "Hatchback",
    "Pickup" | "Truck" | "Trucks" => "Pickup Truck",
    "Station Wagon" => "Wagon",
    "Van" | "Vans" => "Passenger Van",
    other => other,
  };
  canonical.parse().ok()
}

pub fn transmission(raw: &str) -> Option<Transmission> {
  let lower = raw.trim().to_lowercase();
  if lower.starts_with("auto") || lower == "cvt" {
    Some(Transmission::Automatic)
  } else if lower.starts_with("manual") {
    Some(Transmission::Manual)
  } else {
    None
  }
}

// ─── Addresses ───────────────────────────────────────────────────────────────

const STREET_SUFFIXES: &[(&str, &str)] = &[
  ("Ave", "Avenue"),
  ("Blvd", "Boulevard"),
  ("Dr", "Drive"),
  ("Hwy", "Highway"),
  ("Ln", "Lane"),
  ("Rd", "Road"),
  ("St", "Street"),
  ("Tpke", "Turnpike"),
];

/// Capitalise the first letter of each whitespace-separated word and lower
/// the rest. Runs of whitespace collapse to one space.
pub fn title_case(s: &str) -> String {
  s.split_whitespace()
    .map(|word| {
      let mut chars = word.chars();
      match chars.next() {
        Some(first) => {
          first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
        }
        None => String::new(),
      }
    })
    .collect::<Vec<String>>()
    .join(" ")
}

/// Join `address1` and `address2`, title-case, strip trailing periods, and
/// expand a street-suffix abbreviation in either of the last two words.
pub fn street_address(address1: &str, address2: Option<&str>) -> Result<String> {
  let joined = match address2.map(str::trim).filter(|s| !s.is_empty()) {
    Some(extra) => format!("{address1} {extra}"),
    None => address1.to_string(),
  };
  let titled = title_case(&joined);
  let mut words: Vec<String> = titled
    .trim_end_matches('.')
    .split(' ')
    .filter(|w| !w.is_empty())
    .map(str::to_string)
    .collect();
  if words.is_empty() {
    return Err(Error::field("address", address1));
  }

  let len = words.len();
  for word in words.iter_mut().skip(len.saturating_sub(2)) {
    let bare = word.trim_end_matches('.');
    if let Some((_, long)) = STREET_SUFFIXES.iter().find(|(abbr, _)| *abbr == bare)
    {
      *word = (*long).to_string();
    }
  }
  Ok(words.join(" "))
}

/// A ZIP code as it appears in a payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawZip {
  Number(u32),
  Text(String),
}

/// Reduce a ZIP or ZIP+4 to its five-digit form.
///
/// Numeric ZIPs that lost their leading zeros are padded back.
pub fn zip(raw: &RawZip) -> Result<String> {
  match raw {
    RawZip::Number(n) if *n <= 99_999 => Ok(format!("{n:05}")),
    RawZip::Number(n) => Err(Error::field("zip", n)),
    RawZip::Text(s) => {
      let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
      if digits.len() >= 5 {
        Ok(digits[..5].to_string())
      } else {
        Err(Error::field("zip", s))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fuel_spellings() {
    assert_eq!(fuel("Gasoline"), Some(FuelType::Gas));
    assert_eq!(fuel("Flex Fuel Vehicle"), Some(FuelType::Flex));
    assert_eq!(fuel("Gas/Electric Hybrid"), Some(FuelType::Hybrid));
    assert_eq!(fuel("Diesel"), Some(FuelType::Diesel));
    assert_eq!(fuel("hydrogen"), None);
  }

  #[test]
  fn drivetrain_long_forms() {
    assert_eq!(drivetrain("All Wheel Drive"), Some(Drivetrain::Awd));
    assert_eq!(drivetrain("2 wheel drive - front"), Some(Drivetrain::Fwd));
    assert_eq!(
      drivetrain("4 wheel drive - rear wheel default"),
      Some(Drivetrain::FourWd)
    );
    assert_eq!(drivetrain("RWD"), Some(Drivetrain::Rwd));
    assert_eq!(drivetrain("sideways"), None);
  }

  #[test]
  fn body_abbreviations() {
    assert_eq!(body("suv"), Some(BodyStyle::Suv));
    assert_eq!(body("Sport Utility"), Some(BodyStyle::Suv));
    assert_eq!(body("CONVERT"), Some(BodyStyle::Convertible));
    assert_eq!(body("Hatch"), Some(BodyStyle::Hatchback));
    assert_eq!(body("station wagon"), Some(BodyStyle::Wagon));
    assert_eq!(body("Van"), Some(BodyStyle::PassengerVan));
    assert_eq!(body("Truck"), Some(BodyStyle::PickupTruck));
    assert_eq!(body("chassis cab truck"), Some(BodyStyle::ChassisCabTruck));
    assert_eq!(body("Limousine"), None);
  }

  #[test]
  fn transmission_prefixes() {
    assert_eq!(transmission("Automatic"), Some(Transmission::Automatic));
    assert_eq!(transmission("automated manual"), Some(Transmission::Automatic));
    assert_eq!(transmission("Manual 6-speed"), Some(Transmission::Manual));
    assert_eq!(transmission(""), None);
  }

  #[test]
  fn street_suffixes_expand_in_last_two_words() {
    assert_eq!(
      street_address("123 main st.", None).unwrap(),
      "123 Main Street"
    );
    assert_eq!(
      street_address("500  OCEAN BLVD", Some("Suite")).unwrap(),
      "500 Ocean Boulevard Suite"
    );
    assert_eq!(street_address("1 St Marks Pl", None).unwrap(), "1 St Marks Pl");
    assert!(street_address("   ", None).is_err());
  }

  #[test]
  fn zip_forms() {
    assert_eq!(zip(&RawZip::Text("02134-1234".into())).unwrap(), "02134");
    assert_eq!(zip(&RawZip::Number(2134)).unwrap(), "02134");
    assert!(zip(&RawZip::Text("ABCDE".into())).is_err());
    assert!(zip(&RawZip::Number(123_456)).is_err());
  }
}
