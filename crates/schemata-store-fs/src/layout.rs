//! On-disk layout of a store root.
//!
//! ```text
//! <root>/
//!   <catalog>/
//!     catalog.yaml
//!     catalog.yaml.<uuid>.tmp   (only while a save is in flight)
//! ```
//!
//! Paths are only ever built from a validated [`CatalogName`].

use std::path::{Path, PathBuf};

use schemata_core::CatalogName;
use uuid::Uuid;

pub const DOCUMENT_FILE: &str = "catalog.yaml";

#[derive(Debug, Clone)]
pub struct Layout {
  root: PathBuf,
}

impl Layout {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  pub fn root(&self) -> &Path { &self.root }

  pub fn catalog_dir(&self, catalog: &CatalogName) -> PathBuf {
    self.root.join(catalog.as_str())
  }

  pub fn document(&self, catalog: &CatalogName) -> PathBuf {
    self.catalog_dir(catalog).join(DOCUMENT_FILE)
  }

  /// A fresh sibling of the document for an atomic write.
  pub fn temp_document(&self, catalog: &CatalogName) -> PathBuf {
    self
      .catalog_dir(catalog)
      .join(format!("{DOCUMENT_FILE}.{}.tmp", Uuid::new_v4().simple()))
  }
}
