//! Core types and trait definitions for the Schemata catalog.
//!
//! This crate is deliberately free of filesystem and parsing dependencies.
//! All other crates depend on it; it performs no I/O of its own.

pub mod catalog;
pub mod describe;
pub mod error;
pub mod fingerprint;
pub mod model;
pub mod provenance;
pub mod store;

pub use catalog::CatalogName;
pub use error::{Error, Result};
pub use provenance::Provenance;
