//! Catalog identifiers.
//!
//! A catalog name becomes a path segment in every store backend, so it is
//! validated once, up front, and carried around as a [`CatalogName`] from
//! then on.

use std::{fmt, str::FromStr};

use crate::{Error, Result};

/// A validated catalog identifier: one or more of `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogName(String);

impl CatalogName {
  /// Validate `name`, rejecting anything that could escape a namespace
  /// directory (`/`, `\`, `.`, whitespace, the empty string, ...).
  pub fn parse(name: &str) -> Result<Self> {
    if is_valid(name) {
      Ok(Self(name.to_owned()))
    } else {
      Err(Error::InvalidCatalogName(name.to_owned()))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

/// `true` if `name` is a legal catalog identifier.
pub fn is_valid(name: &str) -> bool {
  !name.is_empty()
    && name
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl FromStr for CatalogName {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl AsRef<str> for CatalogName {
  fn as_ref(&self) -> &str { &self.0 }
}

impl fmt::Display for CatalogName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_letters_digits_hyphen_underscore() {
    for name in ["valid-catalog", "valid_catalog", "valid123", "A-b_C9"] {
      assert_eq!(CatalogName::parse(name).unwrap().as_str(), name);
    }
  }

  #[test]
  fn rejects_traversal_and_separators() {
    for name in [
      "../",
      "..",
      "./",
      "/",
      "\\",
      "invalid/catalog",
      "invalid\\catalog",
      "../../etc/passwd",
      "a b",
      "café",
      "",
    ] {
      let err = CatalogName::parse(name).unwrap_err();
      assert!(matches!(err, Error::InvalidCatalogName(ref n) if n == name));
    }
  }

  #[test]
  fn error_message_names_the_value() {
    let err = CatalogName::parse("a/b").unwrap_err();
    assert_eq!(
      err.to_string(),
      "Invalid catalog name: \"a/b\". Only alphanumeric characters, hyphens, \
       and underscores are allowed."
    );
  }
}
