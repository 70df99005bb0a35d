//! Ingest configuration.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use serde::Deserialize;

use crate::batch::BatchOptions;

/// Settings for an ingest run.
///
/// Loaded from an optional TOML file, overridden by `LOTWATCH_*`
/// environment variables. Every key has a default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
  /// SQLite database file. A leading `~` is expanded by the binary.
  pub store_path:        PathBuf,
  /// Attempts after the first for a record hitting a write conflict.
  pub max_stale_retries: u32,
  /// Backoff unit between retries; attempt `n` waits `n` units.
  pub retry_backoff_ms:  u64,
  pub busy_timeout_ms:   u64,
}

impl Default for IngestConfig {
  fn default() -> Self {
    Self {
      store_path:        PathBuf::from("lotwatch.db"),
      max_stale_retries: 3,
      retry_backoff_ms:  25,
      busy_timeout_ms:   5000,
    }
  }
}

impl IngestConfig {
  /// Layer `path` (if it exists) under the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("LOTWATCH").try_parsing(true))
      .build()?
      .try_deserialize()
  }

  pub fn busy_timeout(&self) -> Duration { Duration::from_millis(self.busy_timeout_ms) }

  pub fn batch_options(&self) -> BatchOptions {
    BatchOptions {
      max_stale_retries: self.max_stale_retries,
      retry_backoff:     Duration::from_millis(self.retry_backoff_ms),
    }
  }
}
