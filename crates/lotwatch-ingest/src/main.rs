//! lotwatch-ingest binary.
//!
//! Reads a JSON-lines feed of raw listings scraped from one source and
//! ingests it into the SQLite store named in `lotwatch.toml` (or the path
//! given with `--config`). Prints the batch summary as JSON on stdout.
//!
//! ```text
//! lotwatch-ingest --source edmunds --input edmunds-2024-06-01.jsonl
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use lotwatch_core::listing::Source;
use lotwatch_ingest::{BatchCoordinator, BatchReport, IngestConfig, feed};
use lotwatch_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Ingest scraped used-car listings")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "lotwatch.toml")]
  config: PathBuf,

  /// Site the feed was scraped from: truecar, autotrader or edmunds.
  #[arg(short, long)]
  source: Source,

  /// JSON-lines feed, one raw payload per line. `-` reads stdin.
  #[arg(short, long, default_value = "-")]
  input: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let config = IngestConfig::load(&cli.config)
    .with_context(|| format!("failed to load config from {:?}", cli.config))?;

  let store_path = expand_tilde(&config.store_path);
  let store = SqliteStore::open(&store_path, config.busy_timeout())
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let feed = feed::open(&cli.input)
    .await
    .with_context(|| format!("failed to open feed {}", cli.input))?;

  let coordinator = BatchCoordinator::new(Arc::new(store), config.batch_options());
  match coordinator.run_batch(cli.source, feed).await {
    Ok(report) => print_summary(&report),
    Err(aborted) => {
      print_summary(&aborted.report)?;
      Err(anyhow::Error::new(aborted.error).context("batch aborted"))
    }
  }
}

fn print_summary(report: &BatchReport) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(&report.summary())
    .context("failed to serialise batch summary")?;
  println!("{json}");
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
