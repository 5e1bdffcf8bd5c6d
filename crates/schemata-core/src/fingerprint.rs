//! Source fingerprints.
//!
//! A fingerprint is the lowercase hex SHA-256 of the source text. It is used
//! to notice that a source changed, not as a semantic version.

use sha2::{Digest, Sha256};

/// Fingerprint one source text.
pub fn fingerprint(content: &str) -> String {
  hex::encode(Sha256::digest(content.as_bytes()))
}

/// Fingerprint an ordered sequence of fingerprints.
///
/// A single part is returned unchanged so that a one-source catalog carries
/// its source's own fingerprint.
pub fn combine<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
  let parts: Vec<&str> = parts.into_iter().collect();
  if let [only] = parts.as_slice() {
    return (*only).to_owned();
  }
  let mut hasher = Sha256::new();
  for part in &parts {
    hasher.update(part.as_bytes());
    hasher.update(b"\n");
  }
  hex::encode(hasher.finalize())
}
