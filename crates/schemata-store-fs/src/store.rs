//! Filesystem implementation of [`CatalogStore`].

use std::{
  io,
  path::{Path, PathBuf},
};

use schemata_core::{
  CatalogName, Provenance,
  model::{ColumnMetadata, SchemaMetadata, TableMetadata, TablePatch},
  store::CatalogStore,
};
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  escape::{canonicalize, decode},
  layout::{DOCUMENT_FILE, Layout},
};

/// Confidence recorded for text a human wrote.
const HUMAN_CONFIDENCE: f64 = 1.0;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A catalog store rooted at one directory. Every operation takes the
/// catalog explicitly; the store itself holds no catalog state.
#[derive(Debug, Clone)]
pub struct FsStore {
  layout: Layout,
}

impl FsStore {
  /// A store rooted at `root`. Nothing is created until the first save.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { layout: Layout::new(root) }
  }

  pub fn root(&self) -> &Path { self.layout.root() }

  async fn read_document(&self, catalog: &CatalogName) -> Result<Option<SchemaMetadata>> {
    let path = self.layout.document(catalog);
    let text = match tokio::fs::read_to_string(&path).await {
      Ok(text) => text,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(e.into()),
    };
    debug!(path = %path.display(), "loaded catalog document");
    Ok(Some(serde_yaml::from_str(&text)?))
  }

  /// Serialise in memory, write a temporary sibling, then rename it over the
  /// document. A failure at any step leaves the previous document intact.
  async fn write_document(
    &self,
    catalog: &CatalogName,
    document: &SchemaMetadata,
  ) -> Result<()> {
    let mut persisted = document.clone();
    persisted.map_descriptions(canonicalize);
    let text = serde_yaml::to_string(&persisted)?;

    tokio::fs::create_dir_all(self.layout.catalog_dir(catalog)).await?;
    let temp = self.layout.temp_document(catalog);
    let target = self.layout.document(catalog);

    replace_file(&temp, &target, text).await?;

    debug!(
      path = %target.display(),
      tables = persisted.tables.len(),
      "saved catalog document"
    );
    Ok(())
  }
}

/// Write `text` to `temp`, then rename it over `target`. If either step
/// fails the temporary file is removed, partial or not.
pub(crate) async fn replace_file(temp: &Path, target: &Path, text: String) -> io::Result<()> {
  let result = match tokio::fs::write(temp, text).await {
    Ok(()) => tokio::fs::rename(temp, target).await,
    Err(e) => Err(e),
  };
  if result.is_err()
    && let Err(e) = tokio::fs::remove_file(temp).await
    && e.kind() != io::ErrorKind::NotFound
  {
    warn!(path = %temp.display(), error = %e, "could not remove temporary file");
  }
  result
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for FsStore {
  type Error = Error;

  async fn save(&self, catalog: &str, document: &SchemaMetadata) -> Result<()> {
    let catalog = CatalogName::parse(catalog)?;
    self.write_document(&catalog, document).await
  }

  async fn load(&self, catalog: &str) -> Result<Option<SchemaMetadata>> {
    let catalog = CatalogName::parse(catalog)?;
    self.read_document(&catalog).await
  }

  async fn list_catalogs(&self) -> Result<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(self.root()).await {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(e.into()),
    };

    let mut catalogs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
      if !entry.file_type().await?.is_dir() {
        continue;
      }
      let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
        continue;
      };
      let Ok(catalog) = CatalogName::parse(&name) else {
        continue;
      };
      match self.read_document(&catalog).await {
        Ok(Some(_)) => catalogs.push(name),
        Ok(None) => {}
        Err(e) => {
          warn!(
            path = %entry.path().join(DOCUMENT_FILE).display(),
            error = %e,
            "skipping unreadable catalog document"
          );
        }
      }
    }

    catalogs.sort();
    Ok(catalogs)
  }

  async fn update_table_metadata(
    &self,
    catalog: &str,
    table: &str,
    patch: TablePatch,
  ) -> Result<()> {
    let name = CatalogName::parse(catalog)?;
    let mut document = self
      .read_document(&name)
      .await?
      .ok_or_else(|| Error::CatalogNotFound(catalog.to_owned()))?;

    let index = document
      .tables
      .iter()
      .position(|t| t.name == table)
      .ok_or_else(|| Error::TableNotFound {
        catalog: catalog.to_owned(),
        table:   table.to_owned(),
      })?;

    if let Some(new_name) = &patch.name
      && new_name != table
      && document.table(new_name).is_some()
    {
      return Err(Error::DuplicateTable {
        catalog: catalog.to_owned(),
        table:   new_name.clone(),
      });
    }

    let target = &mut document.tables[index];
    decode_table(target);
    apply_patch(target, patch)?;

    info!(catalog, table, renamed_to = %target.name, "table metadata overridden");
    self.write_document(&name, &document).await
  }

  async fn search_tables(&self, catalog: &str, query: &str) -> Result<Vec<TableMetadata>> {
    let catalog = CatalogName::parse(catalog)?;
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
      return Ok(Vec::new());
    }
    let Some(document) = self.read_document(&catalog).await? else {
      return Ok(Vec::new());
    };

    let mut hits: Vec<(Relevance, TableMetadata)> = document
      .tables
      .into_iter()
      .filter_map(|table| relevance(&table, &needle).map(|rank| (rank, table)))
      .collect();
    hits.sort_by_key(|(rank, _)| *rank);

    debug!(catalog = catalog.as_str(), query, hits = hits.len(), "searched tables");
    Ok(hits.into_iter().map(|(_, table)| table).collect())
  }
}

// ─── Updates ─────────────────────────────────────────────────────────────────

fn decode_table(table: &mut TableMetadata) {
  table.description = decode(&table.description);
  for column in &mut table.columns {
    column.description = decode(&column.description);
  }
}

fn check_confidence(confidence: f64) -> Result<f64> {
  if (0.0..=1.0).contains(&confidence) {
    Ok(confidence)
  } else {
    Err(Error::InvalidConfidence(confidence))
  }
}

/// Apply a human edit to a decoded table. The table always ends up
/// `overridden`; a changed description without an explicit confidence is
/// taken at full confidence.
fn apply_patch(table: &mut TableMetadata, patch: TablePatch) -> Result<()> {
  let confidence = patch.confidence.map(check_confidence).transpose()?;

  if let Some(name) = patch.name {
    table.name = name;
  }
  if let Some(schema) = patch.schema {
    table.schema = schema;
  }
  if let Some(indexes) = patch.indexes {
    table.indexes = Some(indexes);
  }

  match patch.description {
    Some(description) if description != table.description => {
      table.description = description;
      table.confidence = confidence.unwrap_or(HUMAN_CONFIDENCE);
    }
    _ => {
      if let Some(confidence) = confidence {
        table.confidence = confidence;
      }
    }
  }
  table.source = Provenance::Overridden;

  if let Some(columns) = patch.columns {
    table.columns = columns
      .into_iter()
      .map(|incoming| merge_patched_column(table.column(&incoming.name), incoming))
      .collect::<Result<_>>()?;
  }
  Ok(())
}

/// A supplied column keeps its stored provenance if its description is
/// unchanged; otherwise it becomes a human override.
fn merge_patched_column(
  existing: Option<&ColumnMetadata>,
  mut incoming: ColumnMetadata,
) -> Result<ColumnMetadata> {
  check_confidence(incoming.confidence)?;
  match existing {
    Some(existing) if existing.description == incoming.description => {
      incoming.source = existing.source;
      incoming.confidence = existing.confidence;
    }
    _ => {
      incoming.source = Provenance::Overridden;
      incoming.confidence = HUMAN_CONFIDENCE;
    }
  }
  Ok(incoming)
}

// ─── Search ──────────────────────────────────────────────────────────────────

/// Lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Relevance {
  ExactName,
  Name,
  Description,
  ColumnName,
  ColumnDescription,
}

/// How well `table` matches the lower-cased `needle`, comparing against
/// decoded descriptions.
fn relevance(table: &TableMetadata, needle: &str) -> Option<Relevance> {
  let name = table.name.to_lowercase();
  let matches = |text: &str| decode(text).to_lowercase().contains(needle);

  if name == needle {
    Some(Relevance::ExactName)
  } else if name.contains(needle) {
    Some(Relevance::Name)
  } else if matches(&table.description) {
    Some(Relevance::Description)
  } else if table.columns.iter().any(|c| c.name.to_lowercase().contains(needle)) {
    Some(Relevance::ColumnName)
  } else if table.columns.iter().any(|c| matches(&c.description)) {
    Some(Relevance::ColumnDescription)
  } else {
    None
  }
}
