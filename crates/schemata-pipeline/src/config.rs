//! Sync configuration, read from an optional TOML file plus `SCHEMATA_*`
//! environment variables.
//!
//! ```toml
//! catalog    = "shop"
//! store_root = "~/.schema_catalog"
//!
//! [[extractors]]
//! type = "ddl"
//! path = "db/schema.sql"
//!
//! [[extractors]]
//! type = "prisma"
//! path = "prisma/schema.prisma"
//! ```

use std::path::{Path, PathBuf};

use schemata_core::model::ExtractorConfig;
use serde::Deserialize;

pub const DEFAULT_CATALOG: &str = "default";
pub const DEFAULT_STORE_ROOT: &str = "./.schema_catalog";
pub const ENV_PREFIX: &str = "SCHEMATA";

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
  pub catalog:    String,
  pub store_root: PathBuf,
  #[serde(default)]
  pub extractors: Vec<ExtractorConfig>,
}

impl SyncConfig {
  /// Layer defaults, the file at `path` (skipped if absent) and the
  /// environment, in that order.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("catalog", DEFAULT_CATALOG)?
      .set_default("store_root", DEFAULT_STORE_ROOT)?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()?
      .try_deserialize()
  }

  /// The store root with a leading `~/` expanded.
  pub fn store_root(&self) -> PathBuf { expand_tilde(&self.store_root) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
