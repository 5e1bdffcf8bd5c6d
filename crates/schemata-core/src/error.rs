//! Error types for `schemata-core`.

use thiserror::Error;

use crate::model::SourceKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error(
    "Invalid catalog name: \"{0}\". Only alphanumeric characters, hyphens, \
     and underscores are allowed."
  )]
  InvalidCatalogName(String),

  #[error("unsupported extractor type: {0}")]
  UnsupportedSource(SourceKind),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
