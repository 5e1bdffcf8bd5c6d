//! Schema extraction adapters for schemata.
//!
//! Converts schema source text into [`schemata_core`] table records with
//! generated descriptions. Pure and synchronous: callers read the source and
//! hand over its text.
//!
//! # Quick start
//!
//! ```
//! use schemata_core::model::SourceKind;
//!
//! let ddl = "CREATE TABLE users (id SERIAL PRIMARY KEY, email TEXT NOT NULL);";
//! let result = schemata_extract::extract(SourceKind::Ddl, ddl).unwrap();
//! assert_eq!(result.tables[0].name, "users");
//! ```
//!
//! Input the adapters cannot make sense of is skipped, never an error: a
//! source without recognisable tables yields an empty table list.

pub mod ddl;
pub mod error;
mod lexer;
pub mod prisma;

pub use error::{Error, Result};
use schemata_core::model::{ExtractorResult, SourceKind};

/// Run the adapter for `kind` over `source`.
///
/// Fails only for source kinds without an adapter.
pub fn extract(kind: SourceKind, source: &str) -> Result<ExtractorResult> {
  match kind {
    SourceKind::Ddl => Ok(ddl::extract(source)),
    SourceKind::Prisma => Ok(prisma::extract(source)),
    other => Err(Error::Unsupported(other)),
  }
}
