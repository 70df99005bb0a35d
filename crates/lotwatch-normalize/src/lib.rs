//! Record normalizer for lotwatch.
//!
//! Converts one source-specific raw listing payload into the canonical
//! [`ListingRecord`] plus the dealership and YMMS attribute data the ingest
//! pipeline needs to resolve its foreign keys. Pure synchronous; no store or
//! network access.
//!
//! # Quick start
//!
//! ```no_run
//! use chrono::Utc;
//! use lotwatch_core::listing::Source;
//! use lotwatch_normalize::normalize;
//!
//! let raw: serde_json::Value = serde_json::from_str("{}").unwrap();
//! match normalize(&raw, Source::Truecar, Utc::now()) {
//!   Ok(n) => println!("{} at {}", n.record.vin, n.record.dealer_key),
//!   Err(e) => eprintln!("rejected: {e}"),
//! }
//! ```

pub mod coerce;
pub mod color;
pub mod error;
pub mod sources;
pub mod vocab;

use chrono::{DateTime, Utc};
pub use error::{Error, Result};
use lotwatch_core::{
  attrs::AttrFields,
  dealer::DealerFields,
  listing::{ListingRecord, Source},
};

// ─── Public types ────────────────────────────────────────────────────────────

/// Everything one payload says, split the way the store is split.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedListing {
  /// The canonical listing; carries the dealer and YMMS natural keys.
  pub record:         ListingRecord,
  /// Descriptive dealership fields for `record.dealer_key`.
  pub dealer:         DealerFields,
  /// Descriptive attributes for `record.ymms_key`.
  pub attrs:          AttrFields,
  /// The site's own id for this listing, when it has a stable one.
  pub raw_listing_id: Option<String>,
}

/// A per-source normalization function.
pub type Strategy =
  fn(&serde_json::Value, DateTime<Utc>) -> Result<NormalizedListing>;

// ─── Public API ──────────────────────────────────────────────────────────────

/// The normalization strategy for `source`.
pub fn strategy(source: Source) -> Strategy {
  match source {
    Source::Truecar => sources::truecar::normalize,
    Source::Autotrader => sources::autotrader::normalize,
    Source::Edmunds => sources::edmunds::normalize,
  }
}

/// Normalize one raw payload scraped from `source` at `observed_at`.
///
/// Deterministic: the same payload and timestamp always produce the same
/// result.
pub fn normalize(
  raw: &serde_json::Value,
  source: Source,
  observed_at: DateTime<Utc>,
) -> Result<NormalizedListing> {
  strategy(source)(raw, observed_at)
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn non_object_payload_is_malformed_for_every_source() {
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let raw = serde_json::Value::String("<html>rate limited</html>".into());
    for source in Source::ALL {
      assert!(matches!(
        normalize(&raw, source, at),
        Err(Error::MalformedPayload(_))
      ));
    }
  }
}
