//! SQL DDL adapter.
//!
//! Pipeline:
//!   raw &str
//!     └─ lexer::lex()              → Vec<Token>
//!          └─ find CREATE TABLE    → qualified name + body tokens
//!               └─ split_top_level → column / constraint items
//!                    └─ annotate_table() → TableMetadata
//!
//! Anything the parser does not recognise is skipped.

use schemata_core::{
  describe::annotate_table,
  fingerprint::fingerprint,
  model::{
    ColumnMetadata, DEFAULT_SCHEMA, ExtractorResult, ForeignKey, IndexMetadata,
    TableMetadata,
  },
};

use crate::lexer::{Kind, Token, ident_list, lex, matching_paren, split_top_level};

/// Words that end a column's type and start its constraints.
const TYPE_TERMINATORS: &[&str] = &[
  "NOT",
  "NULL",
  "PRIMARY",
  "REFERENCES",
  "DEFAULT",
  "UNIQUE",
  "CHECK",
  "CONSTRAINT",
  "COLLATE",
  "GENERATED",
  "AUTO_INCREMENT",
  "AUTOINCREMENT",
  "IDENTITY",
  "ON",
  "COMMENT",
  "AS",
  "KEY",
  "CHARSET",
];

/// Extract every `CREATE TABLE` statement in `src`.
pub fn extract(src: &str) -> ExtractorResult {
  ExtractorResult { tables: parse(src), version: fingerprint(src) }
}

/// Parse tables without fingerprinting.
pub fn parse(src: &str) -> Vec<TableMetadata> {
  let tokens = lex(src);
  let mut tables: Vec<TableMetadata> = Vec::new();
  let mut i = 0;

  while i < tokens.len() {
    let Some(stmt) = create_table_at(&tokens, i) else {
      i += 1;
      continue;
    };
    i = stmt.close + 1;

    let body = &tokens[stmt.open + 1..stmt.close];
    let table = build_table(src, stmt.schema, stmt.name, body);
    // `CREATE TABLE IF NOT EXISTS` semantics: the first definition wins.
    if tables.iter().all(|t| t.name != table.name) {
      tables.push(annotate_table(table));
    }
  }

  tables
}

// ─── Statement header ────────────────────────────────────────────────────────

struct CreateTable<'a> {
  schema: Option<&'a str>,
  name:   &'a str,
  /// Index of the body's opening paren.
  open:   usize,
  /// Index of the body's closing paren.
  close:  usize,
}

/// Recognise `CREATE [TEMP|TEMPORARY|...] TABLE [IF NOT EXISTS] name (` at
/// `i`, returning the header and the balanced body span.
fn create_table_at<'a>(tokens: &[Token<'a>], i: usize) -> Option<CreateTable<'a>> {
  if !tokens.get(i)?.is_kw("CREATE") {
    return None;
  }
  let mut j = i + 1;
  while tokens.get(j).is_some_and(|t| {
    ["TEMP", "TEMPORARY", "UNLOGGED", "GLOBAL", "LOCAL", "OR", "REPLACE"]
      .iter()
      .any(|kw| t.is_kw(kw))
  }) {
    j += 1;
  }
  if !tokens.get(j)?.is_kw("TABLE") {
    return None;
  }
  j += 1;
  if tokens.get(j).is_some_and(|t| t.is_kw("IF"))
    && tokens.get(j + 1).is_some_and(|t| t.is_kw("NOT"))
    && tokens.get(j + 2).is_some_and(|t| t.is_kw("EXISTS"))
  {
    j += 3;
  }

  let mut parts = vec![tokens.get(j)?.ident()?];
  j += 1;
  while tokens.get(j).is_some_and(|t| t.kind == Kind::Dot) {
    parts.push(tokens.get(j + 1)?.ident()?);
    j += 2;
  }

  if tokens.get(j)?.kind != Kind::LParen {
    return None;
  }
  let close = matching_paren(tokens, j)?;

  let name = parts.pop()?;
  Some(CreateTable { schema: parts.pop(), name, open: j, close })
}

// ─── Body ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Constraints {
  primary_key: Vec<String>,
  foreign:     Vec<(String, ForeignKey)>,
  indexes:     Vec<IndexMetadata>,
}

fn build_table(
  src: &str,
  schema: Option<&str>,
  name: &str,
  body: &[Token<'_>],
) -> TableMetadata {
  let mut table = TableMetadata::new(name);
  table.schema = schema.unwrap_or(DEFAULT_SCHEMA).to_owned();

  let mut constraints = Constraints::default();

  for item in split_top_level(body) {
    if is_constraint(item) {
      parse_constraint(name, item, &mut constraints);
    } else if let Some(column) = parse_column(src, name, item, &mut constraints)
      && table.column(&column.name).is_none()
    {
      table.columns.push(column);
    }
  }

  for column in &mut table.columns {
    if constraints
      .primary_key
      .iter()
      .any(|pk| pk.eq_ignore_ascii_case(&column.name))
    {
      column.primary_key = true;
    }
    if let Some((_, fk)) = constraints
      .foreign
      .iter()
      .find(|(col, _)| col.eq_ignore_ascii_case(&column.name))
    {
      column.foreign_key = Some(fk.clone());
    }
  }

  if !constraints.indexes.is_empty() {
    table.indexes = Some(constraints.indexes);
  }
  table
}

/// `true` if `item` has the shape of a table-level constraint. Words like
/// `key` or `index` are also ordinary column names, so the keyword alone is
/// not enough.
fn is_constraint(item: &[Token<'_>]) -> bool {
  let Some(first) = item.first() else {
    return false;
  };
  let next_is = |i: usize, kw: &str| item.get(i).is_some_and(|t| t.is_kw(kw));
  let paren_at = |i: usize| item.get(i).is_some_and(|t| t.kind == Kind::LParen);

  if first.is_kw("CONSTRAINT") {
    return item.get(1).and_then(Token::ident).is_some() && is_constraint(&item[2..]);
  }
  if first.is_kw("PRIMARY") || first.is_kw("FOREIGN") {
    return next_is(1, "KEY");
  }
  if first.is_kw("CHECK") {
    return paren_at(1);
  }
  if first.is_kw("EXCLUDE") {
    return paren_at(1) || next_is(1, "USING");
  }
  if first.is_kw("PERIOD") {
    return next_is(1, "FOR");
  }
  if first.is_kw("LIKE") {
    // `LIKE other [INCLUDING ...]`; `like` is reserved, so a column of
    // that name would be quoted.
    return item.get(1).and_then(Token::ident).is_some()
      && item.get(2).is_none_or(|t| t.is_kw("INCLUDING") || t.is_kw("EXCLUDING"));
  }
  if ["UNIQUE", "KEY", "INDEX", "FULLTEXT", "SPATIAL"]
    .iter()
    .any(|kw| first.is_kw(kw))
  {
    let mut i = 1;
    if !first.is_kw("KEY")
      && !first.is_kw("INDEX")
      && (next_is(i, "KEY") || next_is(i, "INDEX"))
    {
      i += 1;
    }
    return opens_column_list(item, i);
  }
  false
}

/// `(cols)` or `name (cols)` starting at `i`. A list that starts with a
/// number or a string is a type parameter (`key VARCHAR(20)`,
/// `kind ENUM('a')`), not a column list.
fn opens_column_list(item: &[Token<'_>], i: usize) -> bool {
  let paren_at = |i: usize| item.get(i).is_some_and(|t| t.kind == Kind::LParen);
  let open = if paren_at(i) {
    i
  } else if item.get(i).and_then(Token::ident).is_some() && paren_at(i + 1) {
    i + 1
  } else {
    return false;
  };
  item.get(open + 1).is_some_and(|t| match t.kind {
    Kind::Word => !t.text.starts_with(|c: char| c.is_ascii_digit()),
    Kind::Quoted => true,
    _ => false,
  })
}

/// Table-level constraint: `[CONSTRAINT name] PRIMARY KEY (...)`,
/// `FOREIGN KEY (...) REFERENCES t (...)`, `UNIQUE [KEY] [name] (...)`,
/// `KEY|INDEX name (...)`.
fn parse_constraint(table: &str, item: &[Token<'_>], out: &mut Constraints) {
  let mut item = item;
  let mut constraint_name = None;
  if item.first().is_some_and(|t| t.is_kw("CONSTRAINT")) {
    constraint_name = item.get(1).and_then(Token::ident);
    item = item.get(2..).unwrap_or_default();
  }
  let Some(head) = item.first() else {
    return;
  };

  if head.is_kw("PRIMARY") {
    if let Some(open) = position(item, Kind::LParen)
      && let Some((cols, _)) = ident_list(item, open)
    {
      out.primary_key.extend(cols.into_iter().map(str::to_owned));
    }
  } else if head.is_kw("FOREIGN") {
    parse_foreign_key(item, out);
  } else if head.is_kw("UNIQUE") || head.is_kw("KEY") || head.is_kw("INDEX") {
    let unique = head.is_kw("UNIQUE");
    let Some(open) = position(item, Kind::LParen) else {
      return;
    };
    let Some((cols, _)) = ident_list(item, open) else {
      return;
    };
    // A bare word right before the column list names the index.
    let inline_name = item[1..open]
      .iter()
      .rev()
      .find(|t| !t.is_kw("KEY") && !t.is_kw("INDEX"))
      .and_then(Token::ident);
    let name = constraint_name
      .or(inline_name)
      .map(str::to_owned)
      .unwrap_or_else(|| default_index_name(table, &cols, unique));
    out.indexes.push(IndexMetadata {
      name,
      columns: cols.into_iter().map(str::to_owned).collect(),
      unique,
    });
  }
}

/// `FOREIGN KEY (a, b) REFERENCES t (x, y)`; columns pair up by position.
fn parse_foreign_key(item: &[Token<'_>], out: &mut Constraints) {
  let Some(open) = position(item, Kind::LParen) else {
    return;
  };
  let Some((locals, close)) = ident_list(item, open) else {
    return;
  };
  let Some(target) = references_at(item, close + 1) else {
    return;
  };
  for (i, local) in locals.into_iter().enumerate() {
    let column = target
      .columns
      .get(i)
      .copied()
      .unwrap_or(DEFAULT_REFERENCED_COLUMN);
    out.foreign.push((local.to_owned(), ForeignKey {
      table:  target.table.to_owned(),
      column: column.to_owned(),
    }));
  }
}

/// Referenced column when a `REFERENCES` clause names only a table.
const DEFAULT_REFERENCED_COLUMN: &str = "id";

struct Reference<'a> {
  table:   &'a str,
  columns: Vec<&'a str>,
}

/// Parse `REFERENCES [schema.]table [(cols)]` starting at `i`.
fn references_at<'a>(item: &[Token<'a>], i: usize) -> Option<Reference<'a>> {
  if !item.get(i)?.is_kw("REFERENCES") {
    return None;
  }
  let mut j = i + 1;
  let mut table = item.get(j)?.ident()?;
  j += 1;
  while item.get(j).is_some_and(|t| t.kind == Kind::Dot) {
    table = item.get(j + 1)?.ident()?;
    j += 2;
  }
  let columns = ident_list(item, j).map(|(cols, _)| cols).unwrap_or_default();
  Some(Reference { table, columns })
}

/// `<name> <type>[(<params>)] [constraints...]`. Inline `PRIMARY KEY`,
/// `UNIQUE` and `REFERENCES` are honoured; absence of `NOT NULL` means
/// nullable.
fn parse_column(
  src: &str,
  table: &str,
  item: &[Token<'_>],
  out: &mut Constraints,
) -> Option<ColumnMetadata> {
  let name = item.first()?.ident()?;

  let type_end = type_span_end(item);
  if type_end <= 1 {
    return None;
  }
  let data_type = collapse_whitespace(&src[item[1].start..item[type_end - 1].end]);

  let mut column = ColumnMetadata::new(name, data_type);
  let rest = &item[type_end..];

  let mut i = 0;
  while i < rest.len() {
    let tok = &rest[i];
    match tok.kind {
      // Skip parenthesised expressions (DEFAULT (...), CHECK (...)).
      Kind::LParen => {
        i = matching_paren(rest, i).unwrap_or(rest.len());
      }
      _ if tok.is_kw("NOT") && rest.get(i + 1).is_some_and(|t| t.is_kw("NULL")) => {
        column.nullable = false;
        i += 1;
      }
      _ if tok.is_kw("PRIMARY") && rest.get(i + 1).is_some_and(|t| t.is_kw("KEY")) => {
        column.primary_key = true;
        i += 1;
      }
      _ if tok.is_kw("UNIQUE") => {
        out.indexes.push(IndexMetadata {
          name:    default_index_name(table, &[name], true),
          columns: vec![name.to_owned()],
          unique:  true,
        });
      }
      _ if tok.is_kw("REFERENCES") => {
        if let Some(target) = references_at(rest, i) {
          column.foreign_key = Some(ForeignKey {
            table:  target.table.to_owned(),
            column: target
              .columns
              .first()
              .copied()
              .unwrap_or(DEFAULT_REFERENCED_COLUMN)
              .to_owned(),
          });
        }
      }
      _ => {}
    }
    i += 1;
  }

  Some(column)
}

/// One past the last token of the column type: words (plus a parameter
/// list directly after a word, plus `[]` suffixes) up to the first
/// constraint keyword.
fn type_span_end(item: &[Token<'_>]) -> usize {
  let mut i = 1;
  while let Some(tok) = item.get(i) {
    match tok.kind {
      Kind::Word if !TYPE_TERMINATORS.iter().any(|kw| tok.is_kw(kw)) => i += 1,
      Kind::LParen if i > 1 => match matching_paren(item, i) {
        Some(close) => i = close + 1,
        None => break,
      },
      Kind::Other if tok.text == "[" && item.get(i + 1).is_some_and(|t| t.text == "]") => {
        i += 2
      }
      _ => break,
    }
  }
  i
}

fn position(item: &[Token<'_>], kind: Kind) -> Option<usize> {
  item.iter().position(|t| t.kind == kind)
}

fn default_index_name(table: &str, columns: &[&str], unique: bool) -> String {
  let suffix = if unique { "key" } else { "idx" };
  format!("{table}_{}_{suffix}", columns.join("_"))
}

fn collapse_whitespace(s: &str) -> String {
  s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
  use schemata_core::provenance::Provenance;

  use super::*;

  fn one(src: &str) -> TableMetadata {
    let mut tables = parse(src);
    assert_eq!(tables.len(), 1, "expected exactly one table");
    tables.remove(0)
  }

  // ── Basic shape ─────────────────────────────────────────────────────────

  #[test]
  fn orders_with_foreign_key_clause() {
    let t = one(
      "CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER, \
       FOREIGN KEY (user_id) REFERENCES users(id));",
    );
    assert_eq!(t.name, "orders");
    assert_eq!(t.columns.len(), 2);
    assert!(t.columns[0].primary_key);
    assert_eq!(
      t.columns[1].foreign_key,
      Some(ForeignKey { table: "users".into(), column: "id".into() })
    );
  }

  #[test]
  fn every_entry_starts_inferred_and_described() {
    let t = one("CREATE TABLE users (id SERIAL PRIMARY KEY, email TEXT NOT NULL);");
    assert_eq!(t.source, Provenance::Inferred);
    assert!(!t.description.is_empty());
    assert!(t.confidence > 0.0);
    for c in &t.columns {
      assert_eq!(c.source, Provenance::Inferred);
      assert!(!c.description.is_empty());
      assert!(c.confidence > 0.0);
    }
  }

  #[test]
  fn not_null_controls_nullability() {
    let t = one("CREATE TABLE t (a TEXT NOT NULL, b TEXT, c TEXT NULL);");
    let nullable: Vec<bool> = t.columns.iter().map(|c| c.nullable).collect();
    assert_eq!(nullable, vec![false, true, true]);
  }

  #[test]
  fn header_variants_and_quoting() {
    let src = r#"
      create table if not exists "Accounts" (`id` int);
      CREATE TEMPORARY TABLE [scratch] (x int);
      CREATE TABLE 'legacy' (y int);
    "#;
    let names: Vec<String> = parse(src).into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["Accounts", "scratch", "legacy"]);
  }

  #[test]
  fn schema_qualified_name() {
    let t = one("CREATE TABLE billing.invoices (id INT);");
    assert_eq!(t.schema, "billing");
    assert_eq!(t.name, "invoices");
    let t = one("CREATE TABLE invoices (id INT);");
    assert_eq!(t.schema, "public");
  }

  // ── Types ───────────────────────────────────────────────────────────────

  #[test]
  fn type_parameters_with_commas_stay_in_one_column() {
    let t = one("CREATE TABLE p (price NUMERIC(10, 2) NOT NULL, name VARCHAR(255));");
    assert_eq!(t.columns.len(), 2);
    assert_eq!(t.columns[0].data_type, "NUMERIC(10, 2)");
    assert_eq!(t.columns[1].data_type, "VARCHAR(255)");
  }

  #[test]
  fn multi_word_and_array_types() {
    let t = one(
      "CREATE TABLE m (a DOUBLE PRECISION, b TIMESTAMP WITH TIME ZONE NOT NULL, \
       c TEXT[] DEFAULT '{}', d INT UNSIGNED);",
    );
    let types: Vec<&str> = t.columns.iter().map(|c| c.data_type.as_str()).collect();
    assert_eq!(
      types,
      vec!["DOUBLE PRECISION", "TIMESTAMP WITH TIME ZONE", "TEXT[]", "INT UNSIGNED"]
    );
    assert!(!t.columns[1].nullable);
  }

  // ── Constraints ─────────────────────────────────────────────────────────

  #[test]
  fn table_level_composite_primary_key() {
    let t = one(
      "CREATE TABLE user_roles (user_id INT, role_id INT, granted_at TIMESTAMP, \
       PRIMARY KEY (user_id, role_id));",
    );
    let pks: Vec<bool> = t.columns.iter().map(|c| c.primary_key).collect();
    assert_eq!(pks, vec![true, true, false]);
  }

  #[test]
  fn named_constraints_are_not_columns() {
    let t = one(
      "CREATE TABLE posts (id INT, author_id INT, \
       CONSTRAINT posts_pk PRIMARY KEY (id), \
       CONSTRAINT posts_author_fk FOREIGN KEY (author_id) REFERENCES public.users (id) \
       ON DELETE CASCADE, \
       CHECK (id > 0));",
    );
    assert_eq!(t.columns.len(), 2);
    assert!(t.columns[0].primary_key);
    assert_eq!(
      t.columns[1].foreign_key,
      Some(ForeignKey { table: "users".into(), column: "id".into() })
    );
  }

  #[test]
  fn inline_references() {
    let t = one(
      "CREATE TABLE comments (post_id INT NOT NULL REFERENCES posts(id), \
       owner INT REFERENCES people);",
    );
    assert_eq!(
      t.columns[0].foreign_key,
      Some(ForeignKey { table: "posts".into(), column: "id".into() })
    );
    assert_eq!(
      t.columns[1].foreign_key,
      Some(ForeignKey { table: "people".into(), column: "id".into() })
    );
  }

  #[test]
  fn camel_case_key_columns_are_described_as_keys() {
    let t = one(
      "CREATE TABLE Orders (orderId INT PRIMARY KEY, customerId INT, \
       FOREIGN KEY (customerId) REFERENCES customers(id));",
    );
    assert_eq!(t.columns[0].description, "Primary key uniquely identifying orders");
    assert_eq!(t.columns[1].description, "Foreign key referencing customers");
    assert_eq!(t.columns[1].confidence, 0.9);
  }

  #[test]
  fn composite_foreign_key_pairs_by_position() {
    let t = one(
      "CREATE TABLE line_refs (o INT, l INT, \
       FOREIGN KEY (o, l) REFERENCES order_lines (order_id, line_no));",
    );
    assert_eq!(t.columns[0].foreign_key.as_ref().unwrap().column, "order_id");
    assert_eq!(t.columns[1].foreign_key.as_ref().unwrap().column, "line_no");
  }

  #[test]
  fn unique_constraints_become_indexes() {
    let t = one(
      "CREATE TABLE accounts (id INT, email TEXT UNIQUE, org INT, slug TEXT, \
       CONSTRAINT accounts_org_slug UNIQUE (org, slug), \
       KEY accounts_org_idx (org));",
    );
    let indexes = t.indexes.unwrap();
    assert_eq!(indexes.len(), 3);
    assert_eq!(indexes[0], IndexMetadata {
      name:    "accounts_email_key".into(),
      columns: vec!["email".into()],
      unique:  true,
    });
    assert_eq!(indexes[1].name, "accounts_org_slug");
    assert_eq!(indexes[1].columns, vec!["org".to_owned(), "slug".to_owned()]);
    assert_eq!(indexes[2].name, "accounts_org_idx");
    assert!(!indexes[2].unique);
  }

  #[test]
  fn keyword_named_columns_are_columns() {
    let t = one(
      "CREATE TABLE settings (key TEXT PRIMARY KEY, value TEXT, index INT, \
       unique BOOLEAN, primary VARCHAR(8), check INT, \
       KEY settings_value_idx (value));",
    );
    let names: Vec<&str> = t.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["key", "value", "index", "unique", "primary", "check"]);
    assert!(t.columns[0].primary_key);
    assert_eq!(t.columns[0].data_type, "TEXT");
    assert_eq!(t.indexes.unwrap()[0].name, "settings_value_idx");
  }

  #[test]
  fn key_column_with_type_parameters() {
    let t = one(
      "CREATE TABLE kv (key VARCHAR(20) NOT NULL, unique ENUM('a', 'b'), INDEX (key));",
    );
    assert_eq!(t.columns.len(), 2);
    assert_eq!(t.columns[0].data_type, "VARCHAR(20)");
    assert!(!t.columns[0].nullable);
    assert_eq!(t.columns[1].data_type, "ENUM('a', 'b')");
    assert_eq!(t.indexes.unwrap()[0].columns, vec!["key".to_owned()]);
  }

  #[test]
  fn keywords_inside_strings_are_ignored() {
    let t = one("CREATE TABLE notes (body TEXT DEFAULT 'NOT NULL, PRIMARY KEY');");
    assert_eq!(t.columns.len(), 1);
    assert!(t.columns[0].nullable);
    assert!(!t.columns[0].primary_key);
  }

  // ── Leniency ────────────────────────────────────────────────────────────

  #[test]
  fn no_tables_is_not_an_error() {
    assert!(parse("-- nothing here\nSELECT 1;").is_empty());
    assert!(parse("").is_empty());
  }

  #[test]
  fn unterminated_body_is_skipped() {
    let tables = parse("CREATE TABLE a (id INT; CREATE TABLE b (id INT);");
    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["b"]);
  }

  #[test]
  fn duplicate_definitions_keep_the_first() {
    let tables = parse(
      "CREATE TABLE a (id INT, id TEXT); CREATE TABLE a (other INT);",
    );
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].columns.len(), 1);
    assert_eq!(tables[0].columns[0].data_type, "INT");
  }

  #[test]
  fn version_is_a_deterministic_digest() {
    let src = "CREATE TABLE a (id INT);";
    assert_eq!(extract(src).version, extract(src).version);
    assert_ne!(extract(src).version, extract("CREATE TABLE b (id INT);").version);
  }
}
