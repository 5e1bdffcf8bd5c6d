//! Error type for `schemata-store-fs`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Invalid catalog name; raised before any path is built.
  #[error(transparent)]
  Core(#[from] schemata_core::Error),

  #[error("catalog not found: {0}")]
  CatalogNotFound(String),

  #[error("table {table:?} not found in catalog {catalog:?}")]
  TableNotFound { catalog: String, table: String },

  /// A rename would collide with another table.
  #[error("table {table:?} already exists in catalog {catalog:?}")]
  DuplicateTable { catalog: String, table: String },

  #[error("confidence must be between 0 and 1, got {0}")]
  InvalidConfidence(f64),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("yaml error: {0}")]
  Yaml(#[from] serde_yaml::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
