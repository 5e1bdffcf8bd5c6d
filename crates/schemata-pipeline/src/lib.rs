//! Extraction-merge-persist pipeline for schemata.
//!
//! [`Pipeline::run`] reads each configured source, extracts its tables,
//! merges them into the stored catalog without touching human-curated
//! descriptions, and saves the result as one document. Works against any
//! [`CatalogStore`].

pub mod config;
pub mod error;
pub mod merge;

pub use config::SyncConfig;
pub use error::{Error, Result};
pub use merge::{Entry, MergeReport};

use chrono::Utc;
use schemata_core::{
  CatalogName,
  fingerprint::combine,
  model::{ExtractorConfig, ExtractorResult, SchemaMetadata},
  store::CatalogStore,
};
use tracing::{debug, info};

fn store_error<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Store(Box::new(e))
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

pub struct Pipeline<S> {
  store: S,
}

impl<S: CatalogStore> Pipeline<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  /// Sync `catalog` from `extractors`, in order.
  ///
  /// The catalog name and every extractor kind are checked before any file
  /// is read. All sources are read and parsed before the store is touched,
  /// so an unreadable source leaves the stored catalog as it was.
  pub async fn run(
    &self,
    catalog: &str,
    extractors: &[ExtractorConfig],
  ) -> Result<MergeReport> {
    let catalog = CatalogName::parse(catalog)?;
    for extractor in extractors {
      extractor.validate()?;
    }

    let mut results: Vec<ExtractorResult> = Vec::with_capacity(extractors.len());
    for extractor in extractors {
      results.push(extract_one(extractor).await?);
    }

    let mut document = self
      .store
      .load(catalog.as_str())
      .await
      .map_err(store_error)?
      .unwrap_or_else(|| SchemaMetadata::empty(catalog.as_str()));

    if !results.is_empty() {
      document.version = combine(results.iter().map(|r| r.version.as_str()));
    }
    let report = merge::merge_all(&mut document, results.into_iter().map(|r| r.tables));
    document.last_updated = Utc::now();

    self
      .store
      .save(catalog.as_str(), &document)
      .await
      .map_err(store_error)?;

    info!(
      catalog = catalog.as_str(),
      version = %document.version,
      tables = document.tables.len(),
      added = report.added.len(),
      refreshed = report.refreshed.len(),
      preserved = report.preserved.len(),
      stale = report.stale.len(),
      "catalog synced"
    );
    Ok(report)
  }
}

async fn extract_one(extractor: &ExtractorConfig) -> Result<ExtractorResult> {
  let source = tokio::fs::read_to_string(&extractor.path)
    .await
    .map_err(|source| Error::Source { path: extractor.path.clone(), source })?;
  let result = schemata_extract::extract(extractor.kind, &source)?;
  debug!(
    kind = %extractor.kind,
    path = %extractor.path.display(),
    tables = result.tables.len(),
    "extracted source"
  );
  Ok(result)
}
