//! Heuristic description generator.
//!
//! Maps structural facts about a table or column to a human-readable
//! description, a confidence score and a list of assumptions. Both mappings
//! are first-match cascades over lowercase name substrings: the order of the
//! rules below is significant. Column names are snake-cased first, so
//! `createdAt` and `created_at` describe alike.

use inflector::Inflector;

use crate::{
  model::{ColumnMetadata, TableMetadata},
  provenance::{Annotated, Provenance},
};

/// Output of the generator. `source` is always [`Provenance::Inferred`].
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
  pub description: String,
  pub confidence:  f64,
  pub assumptions: Vec<String>,
  pub source:      Provenance,
}

impl Inference {
  fn new(description: impl Into<String>, confidence: f64) -> Self {
    Self {
      description: description.into(),
      confidence,
      assumptions: Vec::new(),
      source: Provenance::Inferred,
    }
  }

  fn assume(mut self, assumption: &str) -> Self {
    self.assumptions.push(assumption.to_owned());
    self
  }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
  needles.iter().any(|n| haystack.contains(n))
}

/// `order_items` → `order items`.
fn humanize(name: &str) -> String { name.replace('_', " ") }

// ─── Tables ──────────────────────────────────────────────────────────────────

struct TableRule {
  needles:     &'static [&'static str],
  description: &'static str,
  confidence:  f64,
  assumption:  Option<&'static str>,
}

const TABLE_RULES: &[TableRule] = &[
  TableRule {
    needles:     &["join", "mapping", "link"],
    description: "Junction table for many-to-many relationships",
    confidence:  0.7,
    assumption:  Some(
      "Assumed to be a junction table based on naming pattern",
    ),
  },
  TableRule {
    needles:     &["user"],
    description: "Stores user account information and authentication data",
    confidence:  0.9,
    assumption:  None,
  },
  TableRule {
    needles:     &["order"],
    description:
      "Contains order data, purchase details, and transaction information",
    confidence:  0.9,
    assumption:  None,
  },
  TableRule {
    needles:     &["product"],
    description:
      "Product catalog with pricing, inventory, and categorization data",
    confidence:  0.9,
    assumption:  None,
  },
  TableRule {
    needles:     &["category"],
    description: "Product categories and hierarchical classification system",
    confidence:  0.8,
    assumption:  None,
  },
  TableRule {
    needles:     &["payment"],
    description: "Payment transaction records and financial processing data",
    confidence:  0.8,
    assumption:  None,
  },
  TableRule {
    needles:     &["session"],
    description: "User session management and authentication state data",
    confidence:  0.8,
    assumption:  None,
  },
  TableRule {
    needles:     &["log", "audit"],
    description: "System logs, audit trail, and activity tracking records",
    confidence:  0.8,
    assumption:  None,
  },
  TableRule {
    needles:     &["setting", "config"],
    description: "System configuration, settings, and preference data",
    confidence:  0.8,
    assumption:  None,
  },
  TableRule {
    needles:     &["role", "permission"],
    description: "User roles, permissions, and access control definitions",
    confidence:  0.8,
    assumption:  None,
  },
];

const TIMESTAMP_COLUMNS: &[&str] = &["created_at", "updated_at"];
const SOFT_DELETE_COLUMNS: &[&str] =
  &["deleted_at", "is_deleted", "archived_at", "is_archived"];

/// Describe a table from its name and the structure of its columns.
pub fn describe_table(table: &TableMetadata) -> Inference {
  let name = table.name.to_lowercase();

  let mut inference = TABLE_RULES
    .iter()
    .find(|rule| contains_any(&name, rule.needles))
    .map(|rule| {
      let inference = Inference::new(rule.description, rule.confidence);
      match rule.assumption {
        Some(a) => inference.assume(a),
        None => inference,
      }
    })
    .unwrap_or_else(|| {
      Inference::new(format!("Table for {} data", humanize(&name)), 0.5)
        .assume("Generic description based on table name only")
    });

  let column_names: Vec<String> =
    table.columns.iter().map(|c| c.name.to_lowercase()).collect();

  if column_names.iter().any(|c| contains_any(c, TIMESTAMP_COLUMNS)) {
    inference.description.push_str(" with automatic timestamp tracking");
  }

  if column_names.iter().any(|c| contains_any(c, SOFT_DELETE_COLUMNS)) {
    inference
      .description
      .push_str(" supporting soft delete functionality");
    inference
      .assumptions
      .push("Soft delete support inferred from column patterns".to_owned());
  }

  let fk_count = table.foreign_key_count();
  if fk_count > 0 {
    let plural = if fk_count > 1 { "s" } else { "" };
    inference
      .description
      .push_str(&format!(" with {fk_count} foreign key relationship{plural}"));
  }

  inference
}

// ─── Columns ─────────────────────────────────────────────────────────────────

/// `true` for snake-cased names with an `id`, `uuid` or `guid` segment (`id`,
/// `user_id`, `external_uuid`), but not for words that merely contain the
/// letters (`paid`, `width`). `userId` and `UserID` qualify once snake-cased.
fn is_identifier_name(name: &str) -> bool {
  name
    .split('_')
    .any(|part| matches!(part, "id" | "uuid" | "guid"))
    || name.ends_with("_id")
}

/// Describe a column from its name, declared type and key constraints.
/// `table_name` is used in identifier descriptions.
pub fn describe_column(column: &ColumnMetadata, table_name: &str) -> Inference {
  let name = column.name.to_snake_case();
  let ty = column.data_type.to_lowercase();
  let table = humanize(&table_name.to_lowercase());

  let mut inference = describe_column_name(&name, &ty, &table, column);

  if contains_any(&ty, &["timestamp", "datetime"]) {
    inference.description.push_str(" (timestamp)");
  } else if ty.contains("bool") {
    inference.description.push_str(" (boolean flag)");
  } else if ty.contains("json") {
    inference.description.push_str(" (structured JSON data)");
  }

  if column.nullable {
    inference
      .assumptions
      .push("Field is nullable - may contain null values".to_owned());
  }

  inference
}

fn describe_column_name(
  name: &str,
  ty: &str,
  table: &str,
  column: &ColumnMetadata,
) -> Inference {
  // Timestamps
  if contains_any(name, &["created_at", "created_on"]) {
    return Inference::new("Timestamp when record was initially created", 0.9);
  }
  if contains_any(name, &["updated_at", "updated_on", "modified_at"]) {
    return Inference::new("Timestamp when record was last updated", 0.9);
  }
  if contains_any(name, &["deleted_at", "archived_at"]) {
    return Inference::new("Timestamp for soft delete or archival", 0.8);
  }

  // Contact details
  if name.contains("email") {
    return Inference::new(
      "Email address used for user contact and communication",
      0.9,
    );
  }
  if contains_any(name, &["phone", "mobile"]) {
    return Inference::new("Phone number for user contact", 0.8);
  }

  // Personal names
  if name.contains("first_name") {
    return Inference::new("First name of user or entity", 0.9);
  }
  if contains_any(name, &["last_name", "surname"]) {
    return Inference::new("Last name or surname of user or entity", 0.9);
  }
  if contains_any(name, &["name", "title"]) {
    return Inference::new("Display name of the entity", 0.8);
  }

  // Status and flags
  if name.contains("status") {
    let mut inference =
      Inference::new("Current status or state of record", 0.8);
    if contains_any(ty, &["varchar", "enum"]) {
      inference
        .description
        .push_str(" (e.g., active, inactive, pending)");
    }
    return inference;
  }
  if contains_any(name, &["active", "enabled"]) {
    return Inference::new(
      "Flag indicating whether record is active or enabled",
      0.8,
    );
  }
  if let Some(flag) = name
    .strip_prefix("is_")
    .or_else(|| name.strip_prefix("has_"))
  {
    return Inference::new(format!("Boolean flag for {}", humanize(flag)), 0.7);
  }

  // Content
  if contains_any(name, &["content", "body", "text"]) {
    return Inference::new("Main content or body text of the entity", 0.8);
  }
  if contains_any(name, &["description", "desc"]) {
    return Inference::new("Detailed description or explanatory text", 0.8);
  }
  if name.contains("summary") {
    return Inference::new("Brief summary or overview", 0.7);
  }

  // Classification
  if contains_any(name, &["type", "category"]) {
    return Inference::new(
      format!("Classification or {name} of the entity"),
      0.7,
    );
  }
  if name.contains("priority") {
    return Inference::new("Priority level or importance ranking", 0.7);
  }
  if contains_any(name, &["sort", "order"]) {
    return Inference::new("Sorting order or sequence number", 0.7);
  }

  // Money
  if contains_any(name, &["price", "cost", "amount"]) {
    let mut inference =
      Inference::new(format!("Monetary {name} in the base currency"), 0.8);
    if contains_any(ty, &["decimal", "numeric"]) {
      inference.description.push_str(" with precise decimal precision");
    }
    return inference;
  }
  if name.contains("currency") {
    return Inference::new("Currency code or identifier", 0.8);
  }

  // References and media
  if contains_any(name, &["url", "link"]) {
    return Inference::new("URL or web link reference", 0.8);
  }
  if contains_any(name, &["image", "photo", "avatar"]) {
    return Inference::new("Image file path or URL", 0.7);
  }
  if contains_any(name, &["file", "document"]) {
    return Inference::new("File path or document reference", 0.7);
  }

  // Identifiers
  if is_identifier_name(name) {
    if column.primary_key {
      return Inference::new(
        format!("Primary key uniquely identifying {table}"),
        0.9,
      );
    }
    if let Some(fk) = &column.foreign_key {
      return Inference::new(
        format!("Foreign key referencing {}", humanize(&fk.table)),
        0.9,
      );
    }
    return Inference::new(format!("Identifier field for the {table}"), 0.7);
  }

  Inference::new(format!("Field for {}", humanize(name)), 0.5)
    .assume("Generic description based on column name only")
}

// ─── Enrichment ──────────────────────────────────────────────────────────────

fn apply<T: Annotated>(target: &mut T, inference: Inference) {
  target.set_semantics(
    inference.description,
    inference.source,
    inference.confidence,
  );
}

/// Fill in generated descriptions for a table and all of its columns.
///
/// Entries already tagged `human` or `overridden` are left untouched. Column
/// descriptions are generated first; the table description only depends on
/// column structure.
pub fn annotate_table(mut table: TableMetadata) -> TableMetadata {
  let table_name = table.name.clone();
  for column in &mut table.columns {
    if column.source.automation_may_overwrite() {
      let inference = describe_column(column, &table_name);
      apply(column, inference);
    }
  }
  if table.source.automation_may_overwrite() {
    let inference = describe_table(&table);
    apply(&mut table, inference);
  }
  table
}
