//! Filesystem backend for the schemata catalog store.
//!
//! Each catalog is one YAML document at `<root>/<catalog>/catalog.yaml`.
//! Descriptions are HTML-escaped on disk; see [`escape`].

mod layout;
mod store;

pub mod error;
pub mod escape;

pub use error::{Error, Result};
pub use store::FsStore;
