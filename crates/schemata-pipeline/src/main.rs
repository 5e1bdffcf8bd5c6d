//! schemata-sync binary.
//!
//! Reads `schemata.toml` (or the file named by `SCHEMATA_CONFIG`), runs every
//! configured extractor against the filesystem store, and prints what
//! changed. Any setting can be overridden with a `SCHEMATA_*` variable, e.g.
//! `SCHEMATA_CATALOG=staging`.

use std::path::PathBuf;

use anyhow::Context as _;
use schemata_pipeline::{Pipeline, SyncConfig};
use schemata_store_fs::FsStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "schemata.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let config_path = std::env::var_os("SCHEMATA_CONFIG")
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

  let cfg = SyncConfig::load(&config_path)
    .with_context(|| format!("failed to read config {config_path:?}"))?;
  if cfg.extractors.is_empty() {
    anyhow::bail!("no extractors configured (looked in {config_path:?})");
  }

  let store_root = cfg.store_root();
  let pipeline = Pipeline::new(FsStore::new(&store_root));

  let report = pipeline
    .run(&cfg.catalog, &cfg.extractors)
    .await
    .with_context(|| format!("failed to sync catalog {:?}", cfg.catalog))?;

  for entry in &report.stale {
    tracing::warn!(%entry, "not found in any source; kept in catalog");
  }

  println!(
    "{}: {} added, {} refreshed, {} preserved, {} stale ({})",
    cfg.catalog,
    report.added.len(),
    report.refreshed.len(),
    report.preserved.len(),
    report.stale.len(),
    store_root.display(),
  );
  Ok(())
}
