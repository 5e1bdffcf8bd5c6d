//! Prisma schema adapter.
//!
//! Prisma's grammar is line oriented: a block header (`model User {`) sits on
//! one line, each field on its own line, and the block closes with a lone
//! `}`. Parsing runs in two passes so that relations can resolve the
//! referenced model's table and column names, whichever order the models are
//! declared in.

use std::collections::HashSet;

use inflector::Inflector;
use schemata_core::{
  describe::annotate_table,
  fingerprint::fingerprint,
  model::{ColumnMetadata, ExtractorResult, ForeignKey, IndexMetadata, TableMetadata},
};

/// Scalar type → SQL type.
const SCALARS: &[(&str, &str)] = &[
  ("String", "VARCHAR(255)"),
  ("Int", "INTEGER"),
  ("BigInt", "BIGINT"),
  ("Float", "DOUBLE PRECISION"),
  ("Decimal", "DECIMAL(65,30)"),
  ("Boolean", "BOOLEAN"),
  ("DateTime", "TIMESTAMP"),
  ("Json", "JSONB"),
  ("Bytes", "BYTEA"),
];

/// Referenced column when a relation omits `references:`.
const DEFAULT_REFERENCED_COLUMN: &str = "id";

/// Extract every `model` block in `src`.
pub fn extract(src: &str) -> ExtractorResult {
  ExtractorResult { tables: parse(src), version: fingerprint(src) }
}

/// Parse tables without fingerprinting.
pub fn parse(src: &str) -> Vec<TableMetadata> {
  let document = read_blocks(src);

  let mut tables: Vec<TableMetadata> = Vec::new();
  for model in &document.models {
    let table = build_table(model, &document);
    if tables.iter().all(|t| t.name != table.name) {
      tables.push(annotate_table(table));
    }
  }
  tables
}

// ─── Pass 1: blocks ──────────────────────────────────────────────────────────

struct Document<'a> {
  models: Vec<Model<'a>>,
  enums:  HashSet<&'a str>,
}

impl Document<'_> {
  fn model(&self, name: &str) -> Option<&Model<'_>> {
    self.models.iter().find(|m| m.name == name)
  }
}

struct Model<'a> {
  name:       &'a str,
  /// `@@map` value or the snake-cased model name.
  table:      String,
  fields:     Vec<Field<'a>>,
  attributes: Vec<Attribute<'a>>,
}

impl Model<'_> {
  fn column_for(&self, field: &str) -> String {
    self
      .fields
      .iter()
      .find(|f| f.name == field)
      .map(|f| f.column.clone())
      .unwrap_or_else(|| field.to_snake_case())
  }
}

struct Field<'a> {
  name:       &'a str,
  /// `@map` value or the snake-cased field name.
  column:     String,
  /// Base type with `?` and `[]` removed.
  ty:         &'a str,
  optional:   bool,
  list:       bool,
  attributes: Vec<Attribute<'a>>,
}

impl Field<'_> {
  fn attribute(&self, name: &str) -> Option<&Attribute<'_>> {
    self.attributes.iter().find(|a| a.name == name)
  }
}

fn read_blocks(src: &str) -> Document<'_> {
  let mut models = Vec::new();
  let mut enums = HashSet::new();
  let mut lines = src.lines().map(strip_comment);

  while let Some(line) = lines.next() {
    let mut words = line.split_whitespace();
    let (Some(keyword), Some(name)) = (words.next(), words.next()) else {
      continue;
    };
    let name = name.trim_end_matches('{');
    if !line.contains('{') || name.is_empty() {
      continue;
    }
    let body: Vec<&str> = lines
      .by_ref()
      .take_while(|l| !l.trim_start().starts_with('}'))
      .collect();

    match keyword {
      "enum" => {
        enums.insert(name);
      }
      "model" => models.push(read_model(name, &body)),
      // datasource, generator, view, type: nothing to extract.
      _ => {}
    }
  }

  Document { models, enums }
}

fn read_model<'a>(name: &'a str, body: &[&'a str]) -> Model<'a> {
  let mut fields = Vec::new();
  let mut attributes = Vec::new();

  for &line in body {
    let line = line.trim();
    if line.starts_with("@@") {
      attributes.extend(parse_attributes(line));
    } else if let Some(field) = read_field(line) {
      fields.push(field);
    }
  }

  let table = attributes
    .iter()
    .find(|a| a.name == "@map")
    .and_then(|a| a.first_string())
    .unwrap_or_else(|| name.to_snake_case());

  Model { name, table, fields, attributes }
}

/// `<name> <Type>[?|[]] @attr...`
fn read_field(line: &str) -> Option<Field<'_>> {
  let line = line.trim();
  let name_end = line.find(char::is_whitespace)?;
  let name = &line[..name_end];
  if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
    return None;
  }
  let rest = line[name_end..].trim_start();
  let type_end = type_token_end(rest);
  let raw_type = &rest[..type_end];
  if raw_type.is_empty() {
    return None;
  }

  let optional = raw_type.ends_with('?');
  let base = raw_type.trim_end_matches('?');
  let list = base.ends_with("[]");
  let ty = base.trim_end_matches("[]");

  let attributes = parse_attributes(&rest[type_end..]);
  let column = attributes
    .iter()
    .find(|a| a.name == "map")
    .and_then(|a| a.first_string())
    .unwrap_or_else(|| name.to_snake_case());

  Some(Field { name, column, ty, optional, list, attributes })
}

/// The type token runs to the first whitespace outside parentheses, so
/// `Unsupported("circle")` stays whole.
fn type_token_end(s: &str) -> usize {
  let mut depth = 0usize;
  let mut in_string = false;
  for (i, c) in s.char_indices() {
    match c {
      '"' => in_string = !in_string,
      '(' if !in_string => depth += 1,
      ')' if !in_string => depth = depth.saturating_sub(1),
      c if c.is_whitespace() && depth == 0 && !in_string => return i,
      _ => {}
    }
  }
  s.len()
}

/// Drop a `//` comment, ignoring `//` inside string literals (URLs in
/// `@default` values, for instance).
fn strip_comment(line: &str) -> &str {
  let mut in_string = false;
  let mut prev = '\0';
  for (i, c) in line.char_indices() {
    match c {
      '"' if prev != '\\' => in_string = !in_string,
      '/' if prev == '/' && !in_string => return &line[..i - 1],
      _ => {}
    }
    prev = c;
  }
  line
}

// ─── Attributes ──────────────────────────────────────────────────────────────

/// One `@name(args)` or `@@name(args)` occurrence. Block attributes keep
/// one leading `@` in their name (`@id`, `@index`), field attributes have
/// none (`id`, `db.VarChar`).
#[derive(Debug, Clone, PartialEq)]
struct Attribute<'a> {
  name: &'a str,
  args: Vec<Arg<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
struct Arg<'a> {
  key:   Option<&'a str>,
  value: &'a str,
}

impl<'a> Attribute<'a> {
  fn arg(&self, key: &str) -> Option<&'a str> {
    self.args.iter().find(|a| a.key == Some(key)).map(|a| a.value)
  }

  fn positional(&self) -> Option<&'a str> {
    self.args.iter().find(|a| a.key.is_none()).map(|a| a.value)
  }

  /// First positional string argument, unquoted (`@map("x")`).
  fn first_string(&self) -> Option<String> {
    self
      .positional()
      .or_else(|| self.arg("name"))
      .map(|v| unquote(v).to_owned())
  }

  /// Field list from `[a, b]`, positional or under `fields:`.
  fn fields(&self) -> Vec<&'a str> {
    self
      .arg("fields")
      .or_else(|| self.positional())
      .map(list_items)
      .unwrap_or_default()
  }

  /// Explicit index name: `name:` or `map:`.
  fn index_name(&self) -> Option<String> {
    self
      .arg("name")
      .or_else(|| self.arg("map"))
      .map(|v| unquote(v).to_owned())
  }
}

fn parse_attributes(s: &str) -> Vec<Attribute<'_>> {
  let bytes = s.as_bytes();
  let mut attributes = Vec::new();
  let mut i = 0;

  while i < bytes.len() {
    if bytes[i] == b'"' {
      i = skip_string(s, i);
      continue;
    }
    if bytes[i] != b'@' {
      i += 1;
      continue;
    }
    let name_start = i + 1;
    let mut end = name_start;
    if bytes.get(end) == Some(&b'@') {
      end += 1;
    }
    while end < bytes.len()
      && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_' || bytes[end] == b'.')
    {
      end += 1;
    }
    let name = &s[name_start..end];

    let mut args = Vec::new();
    i = end;
    if bytes.get(i) == Some(&b'(') {
      let close = closing_paren(s, i).unwrap_or(s.len());
      args = parse_args(&s[i + 1..close.min(s.len())]);
      i = close + 1;
    }
    attributes.push(Attribute { name, args });
  }

  attributes
}

/// Index one past the closing quote of the string starting at `open`.
fn skip_string(s: &str, open: usize) -> usize {
  let mut escaped = false;
  for (i, c) in s[open + 1..].char_indices() {
    match c {
      '\\' if !escaped => escaped = true,
      '"' if !escaped => return open + 1 + i + 1,
      _ => escaped = false,
    }
  }
  s.len()
}

fn closing_paren(s: &str, open: usize) -> Option<usize> {
  let bytes = s.as_bytes();
  let mut depth = 0usize;
  let mut i = open;
  while i < bytes.len() {
    match bytes[i] {
      b'"' => {
        i = skip_string(s, i);
        continue;
      }
      b'(' | b'[' => depth += 1,
      b')' | b']' => {
        depth = depth.checked_sub(1)?;
        if depth == 0 {
          return Some(i);
        }
      }
      _ => {}
    }
    i += 1;
  }
  None
}

/// Split on commas outside brackets, parentheses and strings.
fn split_args(s: &str) -> Vec<&str> {
  let bytes = s.as_bytes();
  let mut parts = Vec::new();
  let mut depth = 0usize;
  let mut start = 0;
  let mut i = 0;
  while i < bytes.len() {
    match bytes[i] {
      b'"' => {
        i = skip_string(s, i);
        continue;
      }
      b'(' | b'[' => depth += 1,
      b')' | b']' => depth = depth.saturating_sub(1),
      b',' if depth == 0 => {
        parts.push(s[start..i].trim());
        start = i + 1;
      }
      _ => {}
    }
    i += 1;
  }
  parts.push(s[start..].trim());
  parts.retain(|p| !p.is_empty());
  parts
}

fn parse_args(s: &str) -> Vec<Arg<'_>> {
  split_args(s)
    .into_iter()
    .map(|part| match part.split_once(':') {
      Some((key, value))
        if key.trim().chars().all(|c| c.is_alphanumeric() || c == '_') =>
      {
        Arg { key: Some(key.trim()), value: value.trim() }
      }
      _ => Arg { key: None, value: part },
    })
    .collect()
}

/// `[a, b(sort: Desc), "c"]` → `["a", "b", "c"]`.
fn list_items(s: &str) -> Vec<&str> {
  let inner = s.trim().trim_start_matches('[').trim_end_matches(']');
  split_args(inner)
    .into_iter()
    .map(|item| unquote(item.split('(').next().unwrap_or(item).trim()))
    .collect()
}

fn unquote(s: &str) -> &str {
  s.trim()
    .strip_prefix('"')
    .and_then(|s| s.strip_suffix('"'))
    .unwrap_or(s.trim())
}

// ─── Pass 2: tables ──────────────────────────────────────────────────────────

fn build_table(model: &Model<'_>, document: &Document<'_>) -> TableMetadata {
  let mut table = TableMetadata::new(model.table.clone());
  if let Some(schema) = model
    .attributes
    .iter()
    .find(|a| a.name == "@schema")
    .and_then(Attribute::first_string)
  {
    table.schema = schema;
  }

  let mut foreign: Vec<(String, ForeignKey)> = Vec::new();
  let mut indexes: Vec<IndexMetadata> = Vec::new();

  for field in &model.fields {
    match column_type(field, document) {
      Some(data_type) => {
        if table.column(&field.column).is_some() {
          continue;
        }
        let mut column = ColumnMetadata::new(field.column.clone(), data_type);
        column.nullable = field.optional;
        column.primary_key = field.attribute("id").is_some();
        if let Some(unique) = field.attribute("unique") {
          indexes.push(IndexMetadata {
            name:    unique
              .index_name()
              .unwrap_or_else(|| format!("{}_{}_key", model.table, field.column)),
            columns: vec![field.column.clone()],
            unique:  true,
          });
        }
        table.columns.push(column);
      }
      // A relation; only the side holding `fields:` maps to columns.
      None if !field.list => {
        if let Some(relation) = field.attribute("relation") {
          foreign.extend(resolve_relation(model, field, relation, document));
        }
      }
      None => {}
    }
  }

  for (column, fk) in foreign {
    if let Some(column) = table.column_mut(&column) {
      column.foreign_key = Some(fk);
    }
  }

  for attribute in &model.attributes {
    let columns = || -> Vec<String> {
      attribute.fields().into_iter().map(|f| model.column_for(f)).collect()
    };
    match attribute.name {
      "@id" => {
        for name in columns() {
          if let Some(column) = table.column_mut(&name) {
            column.primary_key = true;
          }
        }
      }
      "@index" | "@unique" => {
        let columns = columns();
        if columns.is_empty() {
          continue;
        }
        indexes.push(IndexMetadata {
          name: attribute
            .index_name()
            .unwrap_or_else(|| format!("idx_{}_{}", model.table, columns.join("_"))),
          columns,
          unique: attribute.name == "@unique",
        });
      }
      _ => {}
    }
  }

  if !indexes.is_empty() {
    table.indexes = Some(indexes);
  }
  table
}

/// SQL type for a scalar or enum field; `None` for a relation.
fn column_type(field: &Field<'_>, document: &Document<'_>) -> Option<String> {
  let base = if let Some(native) = field
    .attributes
    .iter()
    .find(|a| a.name.starts_with("db."))
  {
    native_type(native)
  } else if let Some((_, sql)) = SCALARS.iter().find(|(name, _)| *name == field.ty) {
    (*sql).to_owned()
  } else if document.enums.contains(field.ty) {
    format!("ENUM({})", field.ty)
  } else if let Some(inner) = field
    .ty
    .strip_prefix("Unsupported(")
    .and_then(|s| s.strip_suffix(')'))
  {
    unquote(inner).to_owned()
  } else {
    return None;
  };

  Some(if field.list { format!("{base}[]") } else { base })
}

/// `@db.VarChar(100)` → `VARCHAR(100)`.
fn native_type(attribute: &Attribute<'_>) -> String {
  let name = attribute.name.trim_start_matches("db.").to_uppercase();
  if attribute.args.is_empty() {
    return name;
  }
  let args: Vec<&str> = attribute.args.iter().map(|a| a.value).collect();
  format!("{name}({})", args.join(","))
}

/// Pair `fields: [...]` with `references: [...]` on the target model.
fn resolve_relation(
  model: &Model<'_>,
  field: &Field<'_>,
  relation: &Attribute<'_>,
  document: &Document<'_>,
) -> Vec<(String, ForeignKey)> {
  let locals = relation.arg("fields").map(list_items).unwrap_or_default();
  let references = relation.arg("references").map(list_items).unwrap_or_default();
  let target = document.model(field.ty);
  let target_table = target
    .map(|m| m.table.clone())
    .unwrap_or_else(|| field.ty.to_snake_case());

  locals
    .into_iter()
    .enumerate()
    .map(|(i, local)| {
      let column = match (references.get(i), target) {
        (Some(r), Some(target)) => target.column_for(r),
        (Some(r), None) => r.to_snake_case(),
        (None, _) => DEFAULT_REFERENCED_COLUMN.to_owned(),
      };
      (model.column_for(local), ForeignKey { table: target_table.clone(), column })
    })
    .collect()
}
