//! Error types for the schemata-extract adapters.

use schemata_core::model::SourceKind;
use thiserror::Error;

/// Adapters are lenient: unrecognised text is skipped, never an error. The
/// only failure is being asked for a source kind with no adapter.
#[derive(Debug, Error)]
pub enum Error {
  #[error("unsupported extractor type: {0}")]
  Unsupported(SourceKind),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
