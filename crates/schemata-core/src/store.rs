//! The `CatalogStore` trait and read-only query helpers.
//!
//! The trait is implemented by storage backends (e.g. `schemata-store-fs`).
//! The merge pipeline and any query front end depend on this abstraction,
//! not on a concrete backend.
//!
//! Every read surface returns descriptions in their persisted, HTML-escaped
//! form. Only matching (in `search_tables`) and mutation (in
//! `update_table_metadata`) work on decoded text.

use std::future::Future;

use crate::model::{SchemaMetadata, TableMetadata, TablePatch};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a catalog persistence backend.
///
/// Implementations validate the catalog name before touching storage and
/// replace documents as a whole. They are not internally synchronised:
/// concurrent load-modify-save sequences on one catalog can lose updates.
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `document` as the full contents of `catalog`, escaping every
  /// description exactly once.
  fn save<'a>(
    &'a self,
    catalog: &'a str,
    document: &'a SchemaMetadata,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Load a catalog. Returns `None` if it has never been saved.
  fn load<'a>(
    &'a self,
    catalog: &'a str,
  ) -> impl Future<Output = Result<Option<SchemaMetadata>, Self::Error>> + Send + 'a;

  /// Names of all catalogs holding a readable document, sorted.
  fn list_catalogs(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Apply a human edit to one table. The table always ends up
  /// `overridden`. Errors if the catalog or the table does not exist.
  fn update_table_metadata<'a>(
    &'a self,
    catalog: &'a str,
    table: &'a str,
    patch: TablePatch,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Case-insensitive substring search over table names, table
  /// descriptions, column names and column descriptions. A blank query
  /// matches nothing; an unknown catalog yields no results.
  fn search_tables<'a>(
    &'a self,
    catalog: &'a str,
    query: &'a str,
  ) -> impl Future<Output = Result<Vec<TableMetadata>, Self::Error>> + Send + 'a;
}

// ─── Query helpers ───────────────────────────────────────────────────────────

/// Distinct schema names in `catalog`, in first-seen order.
pub async fn list_schemas<S: CatalogStore>(
  store: &S,
  catalog: &str,
) -> Result<Vec<String>, S::Error> {
  let Some(document) = store.load(catalog).await? else {
    return Ok(Vec::new());
  };
  let mut schemas: Vec<String> = Vec::new();
  for table in document.tables {
    if !schemas.contains(&table.schema) {
      schemas.push(table.schema);
    }
  }
  Ok(schemas)
}

/// All tables of `catalog` that live in `schema`.
pub async fn list_tables<S: CatalogStore>(
  store: &S,
  catalog: &str,
  schema: &str,
) -> Result<Vec<TableMetadata>, S::Error> {
  let Some(document) = store.load(catalog).await? else {
    return Ok(Vec::new());
  };
  Ok(
    document
      .tables
      .into_iter()
      .filter(|t| t.schema == schema)
      .collect(),
  )
}

/// One table's full metadata, or `None` if the catalog or table is unknown.
pub async fn get_table<S: CatalogStore>(
  store: &S,
  catalog: &str,
  schema: &str,
  table: &str,
) -> Result<Option<TableMetadata>, S::Error> {
  let Some(document) = store.load(catalog).await? else {
    return Ok(None);
  };
  Ok(
    document
      .tables
      .into_iter()
      .find(|t| t.schema == schema && t.name == table),
  )
}
