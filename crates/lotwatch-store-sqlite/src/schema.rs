//! SQL schema for the lotwatch SQLite store.
//!
//! Executed once at connection startup. Timestamps are fixed-width RFC 3339
//! UTC text, so they sort lexically.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per year/make/model/style. Descriptive columns are only ever
-- filled in, never overwritten.
CREATE TABLE IF NOT EXISTS ymms_attrs (
    id           INTEGER PRIMARY KEY,
    year         INTEGER NOT NULL,
    make         TEXT    NOT NULL,
    model        TEXT    NOT NULL,
    style        TEXT    NOT NULL,
    trim_slug    TEXT,
    mpg_city     REAL,
    mpg_highway  REAL,
    fuel_type    TEXT,    -- 'gas' | 'diesel' | 'hybrid' | 'electric' | 'flex'
    transmission TEXT,    -- 'automatic' | 'manual'
    drivetrain   TEXT,    -- 'FWD' | 'RWD' | 'AWD' | '4WD'
    body         TEXT,
    engine       TEXT,
    source       TEXT,    -- first source to supply the row
    UNIQUE (year, make, model, style)
);

CREATE TABLE IF NOT EXISTS dealerships (
    id        INTEGER PRIMARY KEY,
    address   TEXT NOT NULL,
    zip       TEXT NOT NULL,
    name      TEXT,
    city      TEXT,
    state     TEXT,
    lat       REAL,
    lon       REAL,
    precision TEXT NOT NULL DEFAULT 'unknown',  -- 'unknown' | 'approximate' | 'exact'
    phone     TEXT,
    website   TEXT,
    UNIQUE (address, zip)
);

-- Written only by the reconciliation engine. Rows are never deleted here.
CREATE TABLE IF NOT EXISTS listings (
    source         TEXT    NOT NULL,
    vin            TEXT    NOT NULL,
    dealer_id      INTEGER NOT NULL REFERENCES dealerships(id),
    ymms_id        INTEGER NOT NULL REFERENCES ymms_attrs(id),
    mileage        INTEGER NOT NULL CHECK (mileage >= 0),
    price_cents    INTEGER NOT NULL CHECK (price_cents > 0),
    ext_color_name TEXT,
    ext_color_rgb  TEXT,    -- 'RRGGBB'
    int_color_name TEXT,
    int_color_rgb  TEXT,
    history_flags  INTEGER,
    first_seen     TEXT    NOT NULL,
    last_seen      TEXT    NOT NULL,
    revision       INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (source, vin),
    CHECK (first_seen <= last_seen)
);

CREATE INDEX IF NOT EXISTS listings_vin_idx     ON listings(vin);
CREATE INDEX IF NOT EXISTS listings_ymms_idx    ON listings(ymms_id);
CREATE INDEX IF NOT EXISTS listings_dealer_idx  ON listings(dealer_id);
CREATE INDEX IF NOT EXISTS listings_mileage_idx ON listings(mileage);
CREATE INDEX IF NOT EXISTS listings_price_idx   ON listings(price_cents);

-- Per-source raw listing ids, tracking when each id was first published.
CREATE TABLE IF NOT EXISTS autotrader_listings (
    listing_id TEXT PRIMARY KEY,
    vin        TEXT NOT NULL,
    first_seen TEXT NOT NULL,
    last_seen  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS edmunds_listings (
    listing_id TEXT PRIMARY KEY,
    vin        TEXT NOT NULL,
    first_seen TEXT NOT NULL,
    last_seen  TEXT NOT NULL
);

PRAGMA user_version = 1;
";
