//! Autotrader listing payloads.
//!
//! The search endpoint returns owners and body-style labels in side tables;
//! the fetch layer inlines them, so each payload here carries its `owner`
//! object and human-readable `bodyStyleCodes`. Numbers under
//! `specifications` are display strings (`"12,345"`, `"30 City / 38 Hwy"`).

use chrono::{DateTime, Utc};
use lotwatch_core::{
  attrs::{AttrFields, YmmsKey},
  dealer::{DealerFields, DealerKey, GeoPrecision},
  history::HistoryFlags,
  listing::{ListingRecord, Source, Vin},
};
use serde::Deserialize;

use crate::{
  NormalizedListing,
  coerce::{self, RawNumber},
  color,
  error::{Error, Result},
  vocab::{self, RawZip},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Payload {
  id:               RawNumber,
  vin:              String,
  year:             RawNumber,
  make:             String,
  model:            String,
  trim:             Option<String>,
  #[serde(default)]
  style:            Vec<String>,
  fuel_type:        Option<String>,
  #[serde(default)]
  body_style_codes: Vec<String>,
  listing_type:     Option<String>,
  pricing_detail:   PricingDetail,
  specifications:   Specifications,
  owner:            Owner,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PricingDetail {
  sale_price: RawNumber,
}

/// Autotrader wraps every specification as `{ "label": …, "value": … }`.
#[derive(Debug, Deserialize)]
struct Spec {
  value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Specifications {
  mileage:        Spec,
  transmission:   Option<Spec>,
  drive_type:     Option<Spec>,
  mpg:            Option<Spec>,
  engine:         Option<Spec>,
  color:          Option<Spec>,
  interior_color: Option<Spec>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Owner {
  name:           Option<String>,
  private_seller: Option<bool>,
  phone:          Option<Spec>,
  website:        Option<String>,
  location:       OwnerLocation,
}

#[derive(Debug, Deserialize)]
struct OwnerLocation {
  address: Address,
}

#[derive(Debug, Deserialize)]
struct Address {
  address1: String,
  address2: Option<String>,
  city:     Option<String>,
  state:    Option<String>,
  zip:      RawZip,
}

/// The first two integers of an mpg string such as `"30 City / 38 Hwy"`.
fn split_mpg(raw: &str) -> (Option<f64>, Option<f64>) {
  let mut numbers = raw
    .split(|c: char| !c.is_ascii_digit())
    .filter(|s| !s.is_empty())
    .filter_map(|s| s.parse::<f64>().ok());
  match (numbers.next(), numbers.next()) {
    (Some(city), Some(hwy)) => (Some(city), Some(hwy)),
    _ => (None, None),
  }
}

pub fn normalize(
  raw: &serde_json::Value,
  observed_at: DateTime<Utc>,
) -> Result<NormalizedListing> {
  let p: Payload = super::payload(raw)?;

  if p.owner.private_seller.unwrap_or(false) {
    return Err(Error::Skipped("private seller"));
  }

  let vin = Vin::parse(&p.vin)?;
  let spec = &p.specifications;
  let mileage = coerce::mileage(&RawNumber::Text(spec.mileage.value.clone()))?;
  let price = coerce::price(&p.pricing_detail.sale_price)?;

  let first_style = p.style.first().and_then(|s| coerce::text(Some(s.as_str())));
  let style = coerce::text(p.trim.as_deref())
    .or_else(|| first_style.clone())
    .ok_or_else(|| Error::field("style", ""))?;

  let ymms_key = YmmsKey {
    year: coerce::year(&p.year)?,
    make: coerce::required("make", &p.make)?,
    model: coerce::required("model", &p.model)?,
    style,
  };

  let addr = &p.owner.location.address;
  let dealer_key = DealerKey {
    address: vocab::street_address(&addr.address1, addr.address2.as_deref())?,
    zip:     vocab::zip(&addr.zip)?,
  };
  let dealer = DealerFields {
    name:      coerce::text(p.owner.name.as_deref()),
    city:      coerce::text(addr.city.as_deref()).map(|c| vocab::title_case(&c)),
    state:     coerce::text(addr.state.as_deref()).map(|s| s.to_uppercase()),
    location:  None,
    precision: GeoPrecision::Unknown,
    phone:     p.owner.phone.as_ref().and_then(|ph| coerce::phone(&ph.value)),
    website:   coerce::text(p.owner.website.as_deref()),
  };

  let (mpg_city, mpg_highway) = spec
    .mpg
    .as_ref()
    .map(|m| split_mpg(&m.value))
    .unwrap_or((None, None));
  let attrs = AttrFields {
    trim_slug: first_style.map(|s| s.to_lowercase()),
    mpg_city,
    mpg_highway,
    fuel_type: p.fuel_type.as_deref().and_then(vocab::fuel),
    transmission: spec
      .transmission
      .as_ref()
      .and_then(|t| vocab::transmission(&t.value)),
    drivetrain: spec.drive_type.as_ref().and_then(|d| vocab::drivetrain(&d.value)),
    body: p.body_style_codes.first().and_then(|b| vocab::body(b)),
    engine: spec.engine.as_ref().and_then(|e| coerce::text(Some(e.value.as_str()))),
    source: Some(Source::Autotrader),
  };

  // No history report; only the certification tag.
  let certified = p
    .listing_type
    .as_deref()
    .is_some_and(|t| t.eq_ignore_ascii_case("certified"));

  let record = ListingRecord {
    source: Source::Autotrader,
    vin,
    dealer_key,
    ymms_key,
    mileage,
    price,
    exterior_color: color::resolve(
      spec.color.as_ref().map(|c| c.value.as_str()),
      None,
    ),
    interior_color: color::resolve(
      spec.interior_color.as_ref().map(|c| c.value.as_str()),
      None,
    ),
    history_flags: certified.then_some(HistoryFlags::CERTIFIED),
    observed_at,
  };

  Ok(NormalizedListing {
    record,
    dealer,
    attrs,
    raw_listing_id: Some(p.id.to_string()),
  })
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use lotwatch_core::attrs::{BodyStyle, Drivetrain, Transmission};
  use serde_json::json;

  use super::*;

  fn sample() -> serde_json::Value {
    json!({
      "id": 601234567,
      "vin": "2T1BURHE0JC012345",
      "year": 2018,
      "make": "Toyota",
      "model": "Corolla",
      "trim": "SE",
      "style": ["SE CVT"],
      "fuelType": "Gasoline",
      "bodyStyleCodes": ["SEDAN"],
      "listingType": "CERTIFIED",
      "pricingDetail": { "salePrice": 17495 },
      "specifications": {
        "mileage": { "label": "Mileage", "value": "41,220" },
        "transmission": { "value": "Automatic" },
        "driveType": { "value": "2 wheel drive - front" },
        "mpg": { "value": "28 City / 36 Highway" },
        "color": { "value": "Midnight Black Metallic" },
        "interiorColor": { "value": "Ash" }
      },
      "owner": {
        "name": "Lakeside Toyota",
        "privateSeller": false,
        "phone": { "value": "(504) 555-0100" },
        "location": {
          "address": {
            "address1": "3801 VETERANS MEMORIAL BLVD",
            "city": "METAIRIE",
            "state": "LA",
            "zip": "70002"
          }
        }
      }
    })
  }

  fn at() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() }

  #[test]
  fn full_payload() {
    let n = normalize(&sample(), at()).unwrap();
    assert_eq!(n.record.mileage, 41_220);
    assert_eq!(n.record.price.cents(), 1_749_500);
    assert_eq!(n.record.ymms_key.style, "SE");
    assert_eq!(n.record.dealer_key.address, "3801 Veterans Memorial Boulevard");
    assert_eq!(n.record.exterior_color.name.as_deref(), Some("black"));
    assert!(n.record.interior_color.is_unknown());
    assert_eq!(n.record.history_flags, Some(HistoryFlags::CERTIFIED));
    assert_eq!(n.raw_listing_id.as_deref(), Some("601234567"));

    assert_eq!(n.attrs.mpg_city, Some(28.0));
    assert_eq!(n.attrs.mpg_highway, Some(36.0));
    assert_eq!(n.attrs.drivetrain, Some(Drivetrain::Fwd));
    assert_eq!(n.attrs.transmission, Some(Transmission::Automatic));
    assert_eq!(n.attrs.body, Some(BodyStyle::Sedan));
    assert_eq!(n.attrs.trim_slug.as_deref(), Some("se cvt"));

    assert_eq!(n.dealer.phone.as_deref(), Some("5045550100"));
    assert_eq!(n.dealer.city.as_deref(), Some("Metairie"));
    assert_eq!(n.dealer.precision, GeoPrecision::Unknown);
  }

  #[test]
  fn private_sellers_are_skipped() {
    let mut raw = sample();
    raw["owner"]["privateSeller"] = json!(true);
    assert!(matches!(normalize(&raw, at()), Err(Error::Skipped(_))));
  }

  #[test]
  fn style_falls_back_to_first_style_entry() {
    let mut raw = sample();
    raw["trim"] = serde_json::Value::Null;
    let n = normalize(&raw, at()).unwrap();
    assert_eq!(n.record.ymms_key.style, "SE CVT");
  }

  #[test]
  fn uncertified_listing_has_no_history() {
    let mut raw = sample();
    raw["listingType"] = json!("USED");
    assert_eq!(normalize(&raw, at()).unwrap().record.history_flags, None);
  }

  #[test]
  fn negative_mileage_is_malformed() {
    let mut raw = sample();
    raw["specifications"]["mileage"]["value"] = json!("-5");
    assert!(matches!(
      normalize(&raw, at()),
      Err(Error::MalformedField { field: "mileage", .. })
    ));
  }

  #[test]
  fn mpg_needs_two_numbers() {
    assert_eq!(split_mpg("28 City / 36 Highway"), (Some(28.0), Some(36.0)));
    assert_eq!(split_mpg("N/A"), (None, None));
  }
}
