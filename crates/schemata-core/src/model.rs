//! Catalog data model.
//!
//! A catalog is persisted as a single [`SchemaMetadata`] document. Table
//! names are unique within a document and column names are unique within a
//! table; both serve as merge keys.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provenance::{Annotated, Provenance};

// ─── Structural sub-types ────────────────────────────────────────────────────

/// A by-name reference to another table's column. Not validated against the
/// catalog; dangling references are legal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
  pub table:  String,
  pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
  pub name:    String,
  pub columns: Vec<String>,
  pub unique:  bool,
}

// ─── Column ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
  pub name:        String,
  /// Declared source type, e.g. `VARCHAR(255)`.
  #[serde(rename = "type")]
  pub data_type:   String,
  pub nullable:    bool,
  pub primary_key: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub foreign_key: Option<ForeignKey>,
  pub description: String,
  pub source:      Provenance,
  pub confidence:  f64,
}

impl ColumnMetadata {
  /// A structural column with no description yet.
  pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
    Self {
      name:        name.into(),
      data_type:   data_type.into(),
      nullable:    true,
      primary_key: false,
      foreign_key: None,
      description: String::new(),
      source:      Provenance::Inferred,
      confidence:  0.0,
    }
  }

  /// Overwrite the structural fields (type, nullability, keys) from `other`.
  /// Semantic fields are left alone.
  pub fn refresh_structure(&mut self, other: &ColumnMetadata) {
    self.data_type = other.data_type.clone();
    self.nullable = other.nullable;
    self.primary_key = other.primary_key;
    self.foreign_key = other.foreign_key.clone();
  }
}

impl Annotated for ColumnMetadata {
  fn provenance(&self) -> Provenance { self.source }

  fn set_semantics(
    &mut self,
    description: String,
    source: Provenance,
    confidence: f64,
  ) {
    self.description = description;
    self.source = source;
    self.confidence = confidence;
  }

  fn description(&self) -> &str { &self.description }

  fn confidence(&self) -> f64 { self.confidence }
}

// ─── Table ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
  pub name:        String,
  pub schema:      String,
  pub description: String,
  pub source:      Provenance,
  pub confidence:  f64,
  pub columns:     Vec<ColumnMetadata>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub indexes:     Option<Vec<IndexMetadata>>,
}

impl TableMetadata {
  /// A structural table in the `public` schema with no description yet.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name:        name.into(),
      schema:      DEFAULT_SCHEMA.to_owned(),
      description: String::new(),
      source:      Provenance::Inferred,
      confidence:  0.0,
      columns:     Vec::new(),
      indexes:     None,
    }
  }

  pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
    self.columns.iter().find(|c| c.name == name)
  }

  pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnMetadata> {
    self.columns.iter_mut().find(|c| c.name == name)
  }

  /// Number of columns carrying a foreign key.
  pub fn foreign_key_count(&self) -> usize {
    self.columns.iter().filter(|c| c.foreign_key.is_some()).count()
  }
}

impl Annotated for TableMetadata {
  fn provenance(&self) -> Provenance { self.source }

  fn set_semantics(
    &mut self,
    description: String,
    source: Provenance,
    confidence: f64,
  ) {
    self.description = description;
    self.source = source;
    self.confidence = confidence;
  }

  fn description(&self) -> &str { &self.description }

  fn confidence(&self) -> f64 { self.confidence }
}

/// Schema assigned to tables whose source does not qualify them.
pub const DEFAULT_SCHEMA: &str = "public";

// ─── Document ────────────────────────────────────────────────────────────────

/// One persisted catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaMetadata {
  pub catalog:      String,
  /// Source-derived fingerprint; changes whenever the source text changes.
  pub version:      String,
  pub last_updated: DateTime<Utc>,
  pub tables:       Vec<TableMetadata>,
}

impl SchemaMetadata {
  /// An empty shell for a catalog that has never been extracted.
  pub fn empty(catalog: impl Into<String>) -> Self {
    Self {
      catalog:      catalog.into(),
      version:      String::new(),
      last_updated: Utc::now(),
      tables:       Vec::new(),
    }
  }

  pub fn table(&self, name: &str) -> Option<&TableMetadata> {
    self.tables.iter().find(|t| t.name == name)
  }

  pub fn table_mut(&mut self, name: &str) -> Option<&mut TableMetadata> {
    self.tables.iter_mut().find(|t| t.name == name)
  }

  /// Apply `f` to every table and column description in place.
  pub fn map_descriptions(&mut self, mut f: impl FnMut(&str) -> String) {
    for table in &mut self.tables {
      table.description = f(&table.description);
      for column in &mut table.columns {
        column.description = f(&column.description);
      }
    }
  }
}

// ─── Partial update ──────────────────────────────────────────────────────────

/// A human edit to one table. Every field is optional; `None` leaves the
/// stored value as it is. Text is raw application text, never pre-escaped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePatch {
  pub name:        Option<String>,
  pub schema:      Option<String>,
  pub description: Option<String>,
  pub confidence:  Option<f64>,
  pub columns:     Option<Vec<ColumnMetadata>>,
  pub indexes:     Option<Vec<IndexMetadata>>,
}

impl TablePatch {
  /// A patch that changes only the description.
  pub fn description(text: impl Into<String>) -> Self {
    Self { description: Some(text.into()), ..Self::default() }
  }
}

// ─── Extraction contract ─────────────────────────────────────────────────────

/// The kinds of schema source the system knows about. Only some are
/// implemented; see [`SourceKind::is_supported`].
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SourceKind {
  Ddl,
  Prisma,
  Sqlalchemy,
  Activerecord,
  Alembic,
  Flyway,
  Liquibase,
}

impl SourceKind {
  pub fn is_supported(self) -> bool { matches!(self, Self::Ddl | Self::Prisma) }
}

/// Which adapter to run and where its source text lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
  #[serde(rename = "type")]
  pub kind: SourceKind,
  pub path: PathBuf,
}

impl ExtractorConfig {
  pub fn new(kind: SourceKind, path: impl Into<PathBuf>) -> Self {
    Self { kind, path: path.into() }
  }

  /// Reject unsupported kinds before any I/O happens.
  pub fn validate(&self) -> crate::Result<()> {
    if self.kind.is_supported() {
      Ok(())
    } else {
      Err(crate::Error::UnsupportedSource(self.kind))
    }
  }
}

/// What an adapter produces for one source.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorResult {
  pub tables:  Vec<TableMetadata>,
  pub version: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> SchemaMetadata {
    let mut id = ColumnMetadata::new("id", "uuid");
    id.nullable = false;
    id.primary_key = true;
    let mut owner = ColumnMetadata::new("owner_id", "uuid");
    owner.foreign_key = Some(ForeignKey {
      table:  "users".into(),
      column: "id".into(),
    });
    let mut table = TableMetadata::new("projects");
    table.columns = vec![id, owner];
    SchemaMetadata {
      catalog:      "test".into(),
      version:      "abc".into(),
      last_updated: Utc::now(),
      tables:       vec![table],
    }
  }

  #[test]
  fn persisted_keys_are_camel_case() {
    let yaml = serde_yaml::to_string(&sample()).unwrap();
    assert!(yaml.contains("lastUpdated:"));
    assert!(yaml.contains("primaryKey: true"));
    assert!(yaml.contains("foreignKey:"));
    assert!(yaml.contains("type: uuid"));
    assert!(!yaml.contains("indexes"));
  }

  #[test]
  fn document_round_trips_through_yaml() {
    let doc = sample();
    let yaml = serde_yaml::to_string(&doc).unwrap();
    let back: SchemaMetadata = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back, doc);
  }

  #[test]
  fn source_kind_parses_from_config_strings() {
    assert_eq!("ddl".parse::<SourceKind>().unwrap(), SourceKind::Ddl);
    assert_eq!(SourceKind::Activerecord.to_string(), "activerecord");
    assert!(SourceKind::Prisma.is_supported());
    assert!(!SourceKind::Flyway.is_supported());
  }

  #[test]
  fn unsupported_kind_is_a_configuration_error() {
    let cfg = ExtractorConfig::new(SourceKind::Liquibase, "changelog.xml");
    let err = cfg.validate().unwrap_err();
    assert_eq!(err.to_string(), "unsupported extractor type: liquibase");
  }

  #[test]
  fn map_descriptions_touches_tables_and_columns() {
    let mut doc = sample();
    doc.map_descriptions(|d| format!("{d}!"));
    assert_eq!(doc.tables[0].description, "!");
    assert!(doc.tables[0].columns.iter().all(|c| c.description == "!"));
  }
}
