//! Edmunds inventory payloads (one entry of `inventories.results`).

use chrono::{DateTime, Utc};
use lotwatch_core::{
  attrs::{AttrFields, YmmsKey},
  dealer::{DealerFields, DealerKey, GeoPrecision},
  history::HistoryFlags,
  listing::{Color, ListingRecord, Rgb, Source, Vin},
};
use serde::Deserialize;

use crate::{
  NormalizedListing,
  coerce::{self, RawNumber},
  color,
  error::Result,
  vocab::{self, RawZip},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Payload {
  id:             Option<RawNumber>,
  vin:            String,
  #[serde(rename = "type")]
  inventory_type: Option<String>,
  prices:         Prices,
  dealer_info:    DealerInfo,
  vehicle_info:   VehicleInfo,
  history_info:   Option<HistoryInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prices {
  display_price: RawNumber,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DealerInfo {
  name:          Option<String>,
  website:       Option<String>,
  phone_numbers: Option<PhoneNumbers>,
  address:       DealerAddress,
}

#[derive(Debug, Deserialize)]
struct PhoneNumbers {
  basic:     Option<PhoneParts>,
  trackable: Option<PhoneParts>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhoneParts {
  area_code: String,
  prefix:    String,
  postfix:   String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DealerAddress {
  street:     String,
  city:       Option<String>,
  state_code: Option<String>,
  zip:        RawZip,
  latitude:   Option<f64>,
  longitude:  Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VehicleInfo {
  mileage:        RawNumber,
  style_info:     StyleInfo,
  parts_info:     Option<PartsInfo>,
  vehicle_colors: Option<VehicleColors>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StyleInfo {
  year:      RawNumber,
  make:      String,
  model:     String,
  style:     String,
  trim:      Option<String>,
  body_type: Option<String>,
  fuel:      Option<Fuel>,
}

#[derive(Debug, Deserialize)]
struct Fuel {
  #[serde(rename = "epaCityMPG")]
  epa_city_mpg:    Option<RawNumber>,
  #[serde(rename = "epaHighwayMPG")]
  epa_highway_mpg: Option<RawNumber>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartsInfo {
  engine_type:  Option<String>,
  drive_train:  Option<String>,
  transmission: Option<String>,
  engine:       Option<String>,
}

#[derive(Debug, Deserialize)]
struct VehicleColors {
  interior: Option<EdmundsColor>,
  exterior: Option<EdmundsColor>,
}

/// Edmunds gives channel values directly, sometimes with a marketing name.
#[derive(Debug, Deserialize)]
struct EdmundsColor {
  name: Option<String>,
  r:    Option<u8>,
  g:    Option<u8>,
  b:    Option<u8>,
}

impl EdmundsColor {
  fn resolve(&self) -> Color {
    let rgb = match (self.r, self.g, self.b) {
      (Some(r), Some(g), Some(b)) => Some(Rgb::new(r, g, b)),
      _ => None,
    };
    color::resolve(self.name.as_deref(), rgb)
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryInfo {
  no_accidents:    Option<bool>,
  frame_damage:    Option<bool>,
  salvage_history: Option<bool>,
  lemon_history:   Option<bool>,
  theft_history:   Option<bool>,
  owner_text:      Option<String>,
  usage_type:      Option<String>,
}

fn history(hi: &HistoryInfo) -> HistoryFlags {
  let owners = hi
    .owner_text
    .as_deref()
    .map(|t| t.trim().chars().take_while(char::is_ascii_digit).collect::<String>())
    .and_then(|digits| digits.parse::<u32>().ok())
    .unwrap_or(0);
  let usage = hi.usage_type.as_deref().map(str::trim);

  let mut flags = HistoryFlags::empty();
  flags.set(HistoryFlags::ACCIDENT, hi.no_accidents == Some(false));
  flags.set(HistoryFlags::FRAME_DAMAGE, hi.frame_damage.unwrap_or(false));
  flags.set(HistoryFlags::SALVAGE, hi.salvage_history.unwrap_or(false));
  flags.set(HistoryFlags::LEMON, hi.lemon_history.unwrap_or(false));
  flags.set(HistoryFlags::THEFT, hi.theft_history.unwrap_or(false));
  flags.set(
    HistoryFlags::FLEET,
    usage.is_some_and(|u| !u.eq_ignore_ascii_case("personal use")),
  );
  flags.set(
    HistoryFlags::RENTAL,
    usage.is_some_and(|u| {
      ["taxi", "lease", "rental"].iter().any(|r| u.eq_ignore_ascii_case(r))
    }),
  );
  flags.with_owners(owners)
}

pub fn normalize(
  raw: &serde_json::Value,
  observed_at: DateTime<Utc>,
) -> Result<NormalizedListing> {
  let p: Payload = super::payload(raw)?;
  let veh = &p.vehicle_info;
  let si = &veh.style_info;

  let vin = Vin::parse(&p.vin)?;
  let mileage = coerce::mileage(&veh.mileage)?;
  let price = coerce::price(&p.prices.display_price)?;

  // "LX 4dr Sedan (2.0L 4cyl CVT)" keys as "LX 4dr Sedan".
  let style = si.style.split('(').next().unwrap_or_default();
  let ymms_key = YmmsKey {
    year:  coerce::year(&si.year)?,
    make:  coerce::required("make", &si.make)?,
    model: coerce::required("model", &si.model)?,
    style: coerce::required("style", style)?,
  };

  let da = &p.dealer_info.address;
  let dealer_key = DealerKey {
    address: vocab::street_address(&da.street, None)?,
    zip:     vocab::zip(&da.zip)?,
  };
  let phone = p
    .dealer_info
    .phone_numbers
    .as_ref()
    .and_then(|pn| pn.basic.as_ref().or(pn.trackable.as_ref()))
    .and_then(|pp| coerce::phone(&format!("{}{}{}", pp.area_code, pp.prefix, pp.postfix)));
  let (location, precision) =
    super::geo(da.latitude, da.longitude, GeoPrecision::Approximate);
  let dealer = DealerFields {
    name: coerce::text(p.dealer_info.name.as_deref()),
    city: coerce::text(da.city.as_deref()).map(|c| vocab::title_case(&c)),
    state: coerce::text(da.state_code.as_deref()).map(|s| s.to_uppercase()),
    location,
    precision,
    phone,
    website: coerce::text(p.dealer_info.website.as_deref()),
  };

  let parts = veh.parts_info.as_ref();
  let fuel = si.fuel.as_ref();
  let attrs = AttrFields {
    trim_slug:    coerce::text(si.trim.as_deref()).map(|t| t.to_lowercase()),
    mpg_city:     coerce::mpg(fuel.and_then(|f| f.epa_city_mpg.as_ref())),
    mpg_highway:  coerce::mpg(fuel.and_then(|f| f.epa_highway_mpg.as_ref())),
    fuel_type:    parts.and_then(|p| p.engine_type.as_deref()).and_then(vocab::fuel),
    transmission: parts
      .and_then(|p| p.transmission.as_deref())
      .and_then(vocab::transmission),
    drivetrain:   parts.and_then(|p| p.drive_train.as_deref()).and_then(vocab::drivetrain),
    body:         si.body_type.as_deref().and_then(vocab::body),
    engine:       coerce::text(parts.and_then(|p| p.engine.as_deref())),
    source:       Some(Source::Edmunds),
  };

  let colors = veh.vehicle_colors.as_ref();
  let exterior_color = colors
    .and_then(|c| c.exterior.as_ref())
    .map(EdmundsColor::resolve)
    .unwrap_or_default();
  let interior_color = colors
    .and_then(|c| c.interior.as_ref())
    .map(EdmundsColor::resolve)
    .unwrap_or_default();

  let certified = p
    .inventory_type
    .as_deref()
    .is_some_and(|t| t.eq_ignore_ascii_case("cpo"));
  let history_flags = match (p.history_info.as_ref().map(history), certified) {
    (None, false) => None,
    (flags, certified) => {
      let mut flags = flags.unwrap_or_default();
      flags.set(HistoryFlags::CERTIFIED, certified);
      Some(flags)
    }
  };

  let record = ListingRecord {
    source: Source::Edmunds,
    vin,
    dealer_key,
    ymms_key,
    mileage,
    price,
    exterior_color,
    interior_color,
    history_flags,
    observed_at,
  };

  Ok(NormalizedListing {
    record,
    dealer,
    attrs,
    raw_listing_id: p.id.as_ref().map(ToString::to_string),
  })
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use lotwatch_core::attrs::{BodyStyle, Drivetrain, FuelType};
  use serde_json::json;

  use super::*;

  fn sample() -> serde_json::Value {
    json!({
      "id": "edm-88812",
      "vin": "5YJ3E1EA7KF317000",
      "type": "CPO",
      "prices": { "displayPrice": 38990 },
      "dealerInfo": {
        "name": "Bay Motors",
        "phoneNumbers": {
          "trackable": { "areaCode": "415", "prefix": "555", "postfix": "0199" }
        },
        "address": {
          "street": "88 Harbor Dr",
          "city": "San Francisco",
          "stateCode": "CA",
          "zip": "94105",
          "latitude": 37.79,
          "longitude": -122.39
        }
      },
      "vehicleInfo": {
        "mileage": 12500,
        "styleInfo": {
          "year": 2019,
          "make": "Tesla",
          "model": "Model 3",
          "style": "Long Range 4dr Sedan AWD (electric DD)",
          "trim": "Long Range",
          "bodyType": "Sedan",
          "fuel": { "epaCityMPG": 124, "epaHighwayMPG": 116 }
        },
        "partsInfo": {
          "engineType": "electric",
          "driveTrain": "all wheel drive",
          "transmission": "Automatic"
        },
        "vehicleColors": {
          "exterior": { "name": "Pearl White", "r": 250, "g": 250, "b": 250 },
          "interior": { "name": "Black" }
        }
      },
      "historyInfo": {
        "noAccidents": true,
        "frameDamage": false,
        "salvageHistory": false,
        "lemonHistory": false,
        "theftHistory": false,
        "ownerText": "1",
        "usageType": "Personal Use"
      }
    })
  }

  fn at() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() }

  #[test]
  fn full_payload() {
    let n = normalize(&sample(), at()).unwrap();
    let r = &n.record;
    assert_eq!(r.ymms_key.style, "Long Range 4dr Sedan AWD");
    assert_eq!(r.dealer_key.address, "88 Harbor Drive");
    assert_eq!(r.price.cents(), 3_899_000);
    assert_eq!(r.exterior_color.name.as_deref(), Some("white"));
    assert_eq!(r.exterior_color.rgb, Some(Rgb::new(250, 250, 250)));
    assert_eq!(r.interior_color.rgb, Some(Rgb::new(0, 0, 0)));

    let flags = r.history_flags.unwrap();
    assert!(flags.contains(HistoryFlags::CERTIFIED));
    assert!(!flags.contains(HistoryFlags::ACCIDENT));
    assert!(!flags.contains(HistoryFlags::FLEET));
    assert_eq!(flags.owners(), 1);

    assert_eq!(n.dealer.phone.as_deref(), Some("4155550199"));
    assert_eq!(n.dealer.precision, GeoPrecision::Approximate);
    assert_eq!(n.attrs.fuel_type, Some(FuelType::Electric));
    assert_eq!(n.attrs.drivetrain, Some(Drivetrain::Awd));
    assert_eq!(n.attrs.body, Some(BodyStyle::Sedan));
    assert_eq!(n.attrs.mpg_city, Some(124.0));
    assert_eq!(n.raw_listing_id.as_deref(), Some("edm-88812"));
  }

  #[test]
  fn rental_usage_sets_fleet_and_rental() {
    let mut raw = sample();
    raw["historyInfo"]["usageType"] = json!("Lease");
    raw["historyInfo"]["noAccidents"] = json!(false);
    let flags = normalize(&raw, at()).unwrap().record.history_flags.unwrap();
    assert!(flags.contains(HistoryFlags::RENTAL | HistoryFlags::FLEET));
    assert!(flags.contains(HistoryFlags::ACCIDENT));
  }

  #[test]
  fn usage_type_matches_regardless_of_case() {
    let mut raw = sample();
    raw["historyInfo"]["usageType"] = json!(" rental ");
    let flags = normalize(&raw, at()).unwrap().record.history_flags.unwrap();
    assert!(flags.contains(HistoryFlags::RENTAL | HistoryFlags::FLEET));

    raw["historyInfo"]["usageType"] = json!("PERSONAL USE");
    let flags = normalize(&raw, at()).unwrap().record.history_flags.unwrap();
    assert!(!flags.contains(HistoryFlags::RENTAL));
    assert!(!flags.contains(HistoryFlags::FLEET));
  }

  #[test]
  fn no_history_and_not_certified_is_null() {
    let mut raw = sample();
    raw["type"] = json!("USED");
    raw["historyInfo"] = serde_json::Value::Null;
    assert_eq!(normalize(&raw, at()).unwrap().record.history_flags, None);
  }

  #[test]
  fn basic_phone_preferred_over_trackable() {
    let mut raw = sample();
    raw["dealerInfo"]["phoneNumbers"]["basic"] =
      json!({ "areaCode": "415", "prefix": "555", "postfix": "0100" });
    let n = normalize(&raw, at()).unwrap();
    assert_eq!(n.dealer.phone.as_deref(), Some("4155550100"));
  }
}
