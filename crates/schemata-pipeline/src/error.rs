//! Error type for `schemata-pipeline`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Invalid catalog name or unsupported extractor kind. Always raised
  /// before any source is read or the store is touched.
  #[error(transparent)]
  Config(#[from] schemata_core::Error),

  #[error("extraction error: {0}")]
  Extract(#[from] schemata_extract::Error),

  #[error("failed to read source {}: {source}", .path.display())]
  Source {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
