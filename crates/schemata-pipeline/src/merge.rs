//! Provenance-aware merge: fresh extraction → existing catalog document.
//!
//! Tables are matched by name, columns by name within a table. Matching
//! entries always take the extracted structure; their description, provenance
//! and confidence are only replaced when [`refresh_semantics`] allows it.
//! Unmatched incoming entries are appended. Nothing is ever removed: entries
//! the extraction no longer mentions are reported as stale and kept.

use std::{
  collections::{HashMap, HashSet},
  fmt,
};

use schemata_core::{
  model::{SchemaMetadata, TableMetadata},
  provenance::{Annotated, refresh_semantics},
};

// ─── Report ──────────────────────────────────────────────────────────────────

/// A table, or a column within a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
  pub table:  String,
  pub column: Option<String>,
}

impl Entry {
  pub fn table(table: impl Into<String>) -> Self {
    Self { table: table.into(), column: None }
  }

  pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
    Self { table: table.into(), column: Some(column.into()) }
  }
}

impl fmt::Display for Entry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.column {
      Some(column) => write!(f, "{}.{column}", self.table),
      None => f.write_str(&self.table),
    }
  }
}

/// What one sync did to the catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
  /// Tables appended to the catalog, and columns appended to existing tables.
  pub added:     Vec<Entry>,
  /// Existing inferred entries whose description was regenerated.
  pub refreshed: Vec<Entry>,
  /// Existing `human` / `overridden` entries left as they were.
  pub preserved: Vec<Entry>,
  /// Entries in the catalog that no extraction mentioned.
  pub stale:     Vec<Entry>,
}

impl MergeReport {
  pub fn added_tables(&self) -> impl Iterator<Item = &Entry> {
    self.added.iter().filter(|e| e.column.is_none())
  }

  pub fn added_columns(&self) -> impl Iterator<Item = &Entry> {
    self.added.iter().filter(|e| e.column.is_some())
  }
}

// ─── Merge ───────────────────────────────────────────────────────────────────

/// Merge several extractions into `document`, in order.
///
/// Staleness is judged against all of them together, so an entry produced
/// by any one source is not stale.
pub fn merge_all(
  document: &mut SchemaMetadata,
  extractions: impl IntoIterator<Item = Vec<TableMetadata>>,
) -> MergeReport {
  let mut report = MergeReport::default();
  let mut seen: HashMap<String, HashSet<String>> = HashMap::new();

  for tables in extractions {
    for table in tables {
      let columns = seen.entry(table.name.clone()).or_default();
      columns.extend(table.columns.iter().map(|c| c.name.clone()));
      merge_table_into(document, table, &mut report);
    }
  }

  for table in &document.tables {
    match seen.get(&table.name) {
      None => report.stale.push(Entry::table(&table.name)),
      Some(columns) => report.stale.extend(
        table
          .columns
          .iter()
          .filter(|c| !columns.contains(&c.name))
          .map(|c| Entry::column(&table.name, &c.name)),
      ),
    }
  }

  report
}

/// Merge one extraction into `document`.
pub fn merge(document: &mut SchemaMetadata, tables: Vec<TableMetadata>) -> MergeReport {
  merge_all(document, [tables])
}

fn merge_table_into(
  document: &mut SchemaMetadata,
  incoming: TableMetadata,
  report: &mut MergeReport,
) {
  let Some(existing) = document.table_mut(&incoming.name) else {
    report.added.push(Entry::table(&incoming.name));
    document.tables.push(incoming);
    return;
  };

  existing.schema = incoming.schema.clone();
  if incoming.indexes.is_some() {
    existing.indexes = incoming.indexes.clone();
  }
  let refreshed = refresh_semantics(existing, &incoming);
  note(report, refreshed, &*existing, || Entry::table(&incoming.name));

  for column in incoming.columns {
    match existing.column_mut(&column.name) {
      Some(current) => {
        current.refresh_structure(&column);
        let refreshed = refresh_semantics(current, &column);
        note(report, refreshed, &*current, || {
          Entry::column(&incoming.name, &column.name)
        });
      }
      None => {
        report.added.push(Entry::column(&incoming.name, &column.name));
        existing.columns.push(column);
      }
    }
  }
}

fn note(
  report: &mut MergeReport,
  refreshed: bool,
  entry: &impl Annotated,
  name: impl FnOnce() -> Entry,
) {
  if refreshed {
    report.refreshed.push(name());
  } else if entry.provenance().is_terminal() {
    report.preserved.push(name());
  }
}

#[cfg(test)]
mod tests {
  use schemata_core::{
    Provenance,
    model::{ColumnMetadata, ForeignKey, IndexMetadata},
  };

  use super::*;

  fn column(name: &str, ty: &str, description: &str) -> ColumnMetadata {
    let mut c = ColumnMetadata::new(name, ty);
    c.description = description.into();
    c.confidence = 0.5;
    c
  }

  fn table(name: &str, description: &str, columns: Vec<ColumnMetadata>) -> TableMetadata {
    let mut t = TableMetadata::new(name);
    t.description = description.into();
    t.confidence = 0.5;
    t.columns = columns;
    t
  }

  fn catalog(tables: Vec<TableMetadata>) -> SchemaMetadata {
    let mut doc = SchemaMetadata::empty("test");
    doc.tables = tables;
    doc
  }

  #[test]
  fn new_tables_are_appended() {
    let mut doc = catalog(vec![table("users", "old", vec![])]);
    let report = merge(&mut doc, vec![table("orders", "fresh", vec![])]);

    let names: Vec<&str> = doc.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["users", "orders"]);
    assert_eq!(report.added_tables().collect::<Vec<_>>(), vec![&Entry::table("orders")]);
  }

  #[test]
  fn inferred_semantics_are_replaced() {
    let mut doc = catalog(vec![table("users", "old", vec![column("id", "INT", "old id")])]);
    let mut fresh = table("users", "new", vec![column("id", "INT", "new id")]);
    fresh.confidence = 0.9;

    let report = merge(&mut doc, vec![fresh]);

    let users = doc.table("users").unwrap();
    assert_eq!(users.description, "new");
    assert_eq!(users.confidence, 0.9);
    assert_eq!(users.column("id").unwrap().description, "new id");
    assert_eq!(report.refreshed, vec![Entry::table("users"), Entry::column("users", "id")]);
  }

  #[test]
  fn terminal_provenance_is_never_overwritten() {
    for provenance in [Provenance::Human, Provenance::Overridden] {
      let mut users = table("users", "Curated", vec![column("email", "TEXT", "Curated email")]);
      users.source = provenance;
      users.confidence = 1.0;
      users.columns[0].source = provenance;
      users.columns[0].confidence = 1.0;
      let mut doc = catalog(vec![users]);

      let report = merge(&mut doc, vec![table(
        "users",
        "Generated",
        vec![column("email", "TEXT", "Generated email")],
      )]);

      let users = doc.table("users").unwrap();
      assert_eq!(users.description, "Curated");
      assert_eq!(users.source, provenance);
      assert_eq!(users.confidence, 1.0);
      let email = users.column("email").unwrap();
      assert_eq!(email.description, "Curated email");
      assert_eq!(email.source, provenance);
      assert_eq!(email.confidence, 1.0);
      assert_eq!(report.preserved.len(), 2);
      assert!(report.refreshed.is_empty());
    }
  }

  #[test]
  fn structure_is_refreshed_under_terminal_provenance() {
    let mut existing = column("owner_id", "INT", "Curated");
    existing.source = Provenance::Overridden;
    let mut users = table("users", "Curated", vec![existing]);
    users.source = Provenance::Human;
    let mut doc = catalog(vec![users]);

    let mut fresh_col = column("owner_id", "BIGINT", "Generated");
    fresh_col.nullable = false;
    fresh_col.foreign_key = Some(ForeignKey { table: "owners".into(), column: "id".into() });
    let mut fresh = table("users", "Generated", vec![fresh_col]);
    fresh.schema = "auth".into();
    fresh.indexes = Some(vec![IndexMetadata {
      name:    "users_owner_id_key".into(),
      columns: vec!["owner_id".into()],
      unique:  true,
    }]);

    merge(&mut doc, vec![fresh]);

    let users = doc.table("users").unwrap();
    assert_eq!(users.schema, "auth");
    assert!(users.indexes.is_some());
    let owner = users.column("owner_id").unwrap();
    assert_eq!(owner.data_type, "BIGINT");
    assert!(!owner.nullable);
    assert!(owner.foreign_key.is_some());
    assert_eq!(owner.description, "Curated");
  }

  #[test]
  fn new_columns_append_and_missing_ones_stay() {
    let mut doc = catalog(vec![
      table("users", "u", vec![column("id", "INT", "i"), column("legacy", "TEXT", "l")]),
      table("archive", "a", vec![]),
    ]);

    let report = merge(&mut doc, vec![table("users", "u", vec![
      column("id", "INT", "i"),
      column("email", "TEXT", "e"),
    ])]);

    let users = doc.table("users").unwrap();
    let names: Vec<&str> = users.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "legacy", "email"]);
    assert!(doc.table("archive").is_some());

    assert_eq!(report.added_columns().collect::<Vec<_>>(), vec![&Entry::column(
      "users", "email"
    )]);
    assert_eq!(report.stale, vec![Entry::column("users", "legacy"), Entry::table("archive")]);
  }

  #[test]
  fn staleness_spans_all_extractions() {
    let mut doc = catalog(vec![table("a", "", vec![]), table("b", "", vec![])]);
    let report = merge_all(&mut doc, vec![vec![table("a", "", vec![])], vec![table(
      "b",
      "",
      vec![],
    )]]);
    assert!(report.stale.is_empty());
  }

  #[test]
  fn later_extraction_refreshes_earlier_one() {
    let mut doc = SchemaMetadata::empty("test");
    merge_all(&mut doc, vec![vec![table("a", "first", vec![])], vec![table(
      "a",
      "second",
      vec![],
    )]]);
    assert_eq!(doc.tables.len(), 1);
    assert_eq!(doc.tables[0].description, "second");
  }

  #[test]
  fn entry_display() {
    assert_eq!(Entry::table("users").to_string(), "users");
    assert_eq!(Entry::column("users", "id").to_string(), "users.id");
  }
}
