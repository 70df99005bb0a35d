//! Truecar listing payloads.
//!
//! Shape: `{ vehicle, dealership, pricing }`, snake_case except for the
//! `condition_history` sub-object, which is camelCase.

use chrono::{DateTime, Utc};
use lotwatch_core::{
  attrs::{AttrFields, YmmsKey},
  dealer::{DealerFields, DealerKey, GeoPrecision},
  history::HistoryFlags,
  listing::{ListingRecord, Rgb, Source, Vin},
};
use serde::Deserialize;

use crate::{
  NormalizedListing,
  coerce::{self, RawNumber},
  color,
  error::Result,
  vocab::{self, RawZip},
};

// ─── Payload shape ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Payload {
  vehicle:    Vehicle,
  dealership: Dealership,
  pricing:    Pricing,
}

#[derive(Debug, Deserialize)]
struct Vehicle {
  vin:                    String,
  year:                   RawNumber,
  make:                   String,
  model:                  String,
  style:                  String,
  trim_slug:              Option<String>,
  mileage:                RawNumber,
  mpg_city:               Option<RawNumber>,
  mpg_highway:            Option<RawNumber>,
  fuel_type:              Option<String>,
  body_style:             Option<String>,
  drive_train:            Option<String>,
  transmission:           Option<String>,
  engine:                 Option<String>,
  exterior_color_rgb:     Option<String>,
  exterior_color:         Option<String>,
  exterior_color_generic: Option<String>,
  interior_color_rgb:     Option<String>,
  interior_color:         Option<String>,
  interior_color_generic: Option<String>,
  condition_history:      Option<ConditionHistory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConditionHistory {
  accident_count: Option<u32>,
  owner_count:    Option<u32>,
  is_rental_car:  Option<bool>,
  is_fleet_car:   Option<bool>,
  title_info:     Option<TitleInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TitleInfo {
  is_frame_damaged:   Option<bool>,
  is_salvage:         Option<bool>,
  is_lemon:           Option<bool>,
  is_theft_recovered: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct Dealership {
  name:     Option<String>,
  location: Location,
  links:    Option<Links>,
}

#[derive(Debug, Deserialize)]
struct Location {
  address1:    String,
  address2:    Option<String>,
  postal_code: RawZip,
  city:        Option<String>,
  state:       Option<String>,
  lat:         Option<f64>,
  lng:         Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Links {
  website_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Pricing {
  total_price: RawNumber,
}

// ─── Mapping ─────────────────────────────────────────────────────────────────

fn history(ch: &ConditionHistory) -> HistoryFlags {
  let title = ch.title_info.as_ref();
  let title_flag = |get: fn(&TitleInfo) -> Option<bool>| {
    title.and_then(get).unwrap_or(false)
  };

  let mut flags = HistoryFlags::empty();
  flags.set(HistoryFlags::ACCIDENT, ch.accident_count.unwrap_or(0) > 0);
  flags.set(HistoryFlags::FRAME_DAMAGE, title_flag(|t| t.is_frame_damaged));
  flags.set(HistoryFlags::SALVAGE, title_flag(|t| t.is_salvage));
  flags.set(HistoryFlags::LEMON, title_flag(|t| t.is_lemon));
  flags.set(HistoryFlags::THEFT, title_flag(|t| t.is_theft_recovered));
  flags.set(HistoryFlags::FLEET, ch.is_fleet_car.unwrap_or(false));
  flags.set(HistoryFlags::RENTAL, ch.is_rental_car.unwrap_or(false));
  flags.with_owners(ch.owner_count.unwrap_or(0))
}

pub fn normalize(
  raw: &serde_json::Value,
  observed_at: DateTime<Utc>,
) -> Result<NormalizedListing> {
  let Payload { vehicle: v, dealership: d, pricing } = super::payload(raw)?;

  let vin = Vin::parse(&v.vin)?;
  let mileage = coerce::mileage(&v.mileage)?;
  let price = coerce::price(&pricing.total_price)?;

  let ymms_key = YmmsKey {
    year:  coerce::year(&v.year)?,
    make:  coerce::required("make", &v.make)?,
    model: coerce::required("model", &v.model)?,
    style: coerce::required("style", &v.style)?,
  };

  let loc = &d.location;
  let dealer_key = DealerKey {
    address: vocab::street_address(&loc.address1, loc.address2.as_deref())?,
    zip:     vocab::zip(&loc.postal_code)?,
  };
  let (location, precision) = super::geo(loc.lat, loc.lng, GeoPrecision::Exact);
  let dealer = DealerFields {
    name: coerce::text(d.name.as_deref()),
    city: coerce::text(loc.city.as_deref()).map(|c| vocab::title_case(&c)),
    state: coerce::text(loc.state.as_deref()).map(|s| s.to_uppercase()),
    location,
    precision,
    phone: None,
    website: d.links.and_then(|l| coerce::text(l.website_link.as_deref())),
  };

  let attrs = AttrFields {
    trim_slug:    coerce::text(v.trim_slug.as_deref()).map(|t| t.to_lowercase()),
    mpg_city:     coerce::mpg(v.mpg_city.as_ref()),
    mpg_highway:  coerce::mpg(v.mpg_highway.as_ref()),
    fuel_type:    v.fuel_type.as_deref().and_then(vocab::fuel),
    transmission: v.transmission.as_deref().and_then(vocab::transmission),
    drivetrain:   v.drive_train.as_deref().and_then(vocab::drivetrain),
    body:         v.body_style.as_deref().and_then(vocab::body),
    engine:       coerce::text(v.engine.as_deref()),
    source:       Some(Source::Truecar),
  };

  let exterior_color = color::resolve_any(
    &[v.exterior_color.as_deref(), v.exterior_color_generic.as_deref()],
    v.exterior_color_rgb.as_deref().and_then(Rgb::from_hex),
  );
  let interior_color = color::resolve_any(
    &[v.interior_color.as_deref(), v.interior_color_generic.as_deref()],
    v.interior_color_rgb.as_deref().and_then(Rgb::from_hex),
  );

  let record = ListingRecord {
    source: Source::Truecar,
    vin,
    dealer_key,
    ymms_key,
    mileage,
    price,
    exterior_color,
    interior_color,
    history_flags: v.condition_history.as_ref().map(history),
    observed_at,
  };

  Ok(NormalizedListing { record, dealer, attrs, raw_listing_id: None })
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use lotwatch_core::attrs::{Drivetrain, FuelType};
  use serde_json::json;

  use super::*;
  use crate::Error;

  fn sample() -> serde_json::Value {
    json!({
      "listed_at": "2022-03-01T12:00:00",
      "pricing": { "total_price": 15000 },
      "vehicle": {
        "vin": "1HGCM82633A004352",
        "year": 2020,
        "make": "Honda",
        "model": "Civic",
        "style": "LX",
        "trim_slug": "LX",
        "mileage": 30000,
        "mpg_city": 30,
        "mpg_highway": 38,
        "fuel_type": "Gas",
        "body_style": "Sedan",
        "drive_train": "FWD",
        "transmission": "Automatic",
        "exterior_color": "Crystal Black Pearl",
        "exterior_color_rgb": "#0A0A0A",
        "interior_color": "Gray",
        "condition_history": {
          "accidentCount": 1,
          "ownerCount": 2,
          "isRentalCar": false,
          "isFleetCar": true,
          "titleInfo": { "isFrameDamaged": false, "isSalvage": false,
                         "isLemon": false, "isTheftRecovered": false }
        }
      },
      "dealership": {
        "name": "Springfield Honda",
        "location": {
          "address1": "123 main st.",
          "address2": null,
          "postal_code": "62701-1234",
          "city": "springfield",
          "state": "il",
          "lat": 39.78,
          "lng": -89.65
        },
        "links": { "website_link": "https://springfieldhonda.example" }
      }
    })
  }

  fn at() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() }

  #[test]
  fn full_payload() {
    let n = normalize(&sample(), at()).unwrap();
    let r = &n.record;
    assert_eq!(r.source, Source::Truecar);
    assert_eq!(r.vin.as_str(), "1HGCM82633A004352");
    assert_eq!(r.mileage, 30_000);
    assert_eq!(r.price.cents(), 1_500_000);
    assert_eq!(r.dealer_key.address, "123 Main Street");
    assert_eq!(r.dealer_key.zip, "62701");
    assert_eq!(r.ymms_key.style, "LX");
    assert_eq!(r.observed_at, at());

    assert_eq!(r.exterior_color.name.as_deref(), Some("black"));
    assert_eq!(r.exterior_color.rgb, Some(Rgb::new(10, 10, 10)));
    assert_eq!(r.interior_color.name.as_deref(), Some("gray"));

    let flags = r.history_flags.unwrap();
    assert!(flags.contains(HistoryFlags::ACCIDENT));
    assert!(flags.contains(HistoryFlags::FLEET));
    assert!(!flags.contains(HistoryFlags::RENTAL));
    assert_eq!(flags.owners(), 2);

    assert_eq!(n.attrs.mpg_city, Some(30.0));
    assert_eq!(n.attrs.fuel_type, Some(FuelType::Gas));
    assert_eq!(n.attrs.drivetrain, Some(Drivetrain::Fwd));
    assert_eq!(n.attrs.trim_slug.as_deref(), Some("lx"));
    assert_eq!(n.attrs.source, Some(Source::Truecar));

    assert_eq!(n.dealer.city.as_deref(), Some("Springfield"));
    assert_eq!(n.dealer.state.as_deref(), Some("IL"));
    assert_eq!(n.dealer.precision, GeoPrecision::Exact);
    assert!(n.raw_listing_id.is_none());
  }

  #[test]
  fn zero_accidents_is_not_an_accident() {
    let mut raw = sample();
    raw["vehicle"]["condition_history"]["accidentCount"] = json!(0);
    let n = normalize(&raw, at()).unwrap();
    assert!(!n.record.history_flags.unwrap().contains(HistoryFlags::ACCIDENT));
  }

  #[test]
  fn missing_history_is_null() {
    let mut raw = sample();
    raw["vehicle"]["condition_history"] = serde_json::Value::Null;
    let n = normalize(&raw, at()).unwrap();
    assert_eq!(n.record.history_flags, None);
  }

  #[test]
  fn missing_coordinates_are_unknown_precision() {
    let mut raw = sample();
    raw["dealership"]["location"]["lat"] = serde_json::Value::Null;
    let n = normalize(&raw, at()).unwrap();
    assert_eq!(n.dealer.location, None);
    assert_eq!(n.dealer.precision, GeoPrecision::Unknown);
  }

  #[test]
  fn bad_vin_and_bad_price() {
    let mut raw = sample();
    raw["vehicle"]["vin"] = json!("BADVIN");
    assert!(matches!(normalize(&raw, at()), Err(Error::InvalidVin(_))));

    let mut raw = sample();
    raw["pricing"]["total_price"] = json!("call for price");
    assert!(matches!(
      normalize(&raw, at()),
      Err(Error::MalformedField { field: "price", .. })
    ));
  }

  #[test]
  fn wrong_shape_is_malformed_payload() {
    let raw = json!({ "vehicle": "nope" });
    assert!(matches!(normalize(&raw, at()), Err(Error::MalformedPayload(_))));
  }

  #[test]
  fn deterministic() {
    let raw = sample();
    assert_eq!(normalize(&raw, at()).unwrap(), normalize(&raw, at()).unwrap());
  }
}
