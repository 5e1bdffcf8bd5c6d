//! Provenance of semantic metadata.
//!
//! Every table and column carries a [`Provenance`] tag describing where its
//! description came from. The tags form a small lattice:
//!
//! ```text
//!   human     overridden
//!       \     /
//!       inferred
//! ```
//!
//! `human` and `overridden` are both terminal: automated re-extraction may
//! refresh structural fields beneath them, but never the description, the
//! provenance tag, or the confidence.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

// ─── Provenance ──────────────────────────────────────────────────────────────

/// Where a description came from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
  /// Produced by the heuristic description generator.
  #[default]
  Inferred,
  /// Authored by a person in the source of truth.
  Human,
  /// A person replaced a previously inferred description.
  Overridden,
}

impl Provenance {
  /// `true` for provenance levels that automation must never overwrite.
  pub fn is_terminal(self) -> bool { !matches!(self, Self::Inferred) }

  /// The single decision point for every merge site: may an automated
  /// pipeline replace the description, provenance and confidence of an
  /// entry currently tagged `self`?
  pub fn automation_may_overwrite(self) -> bool { !self.is_terminal() }
}

/// `inferred` sits below both terminal levels; `human` and `overridden` are
/// incomparable with each other.
impl PartialOrd for Provenance {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    use Provenance::*;
    match (self, other) {
      (a, b) if a == b => Some(Ordering::Equal),
      (Inferred, _) => Some(Ordering::Less),
      (_, Inferred) => Some(Ordering::Greater),
      _ => None,
    }
  }
}

// ─── Annotated ───────────────────────────────────────────────────────────────

/// An entry with a description, a provenance tag and a confidence score.
/// Implemented by tables and columns.
pub trait Annotated {
  fn provenance(&self) -> Provenance;

  /// Replace all three semantic fields together so the confidence can never
  /// go stale relative to the description.
  fn set_semantics(
    &mut self,
    description: String,
    source: Provenance,
    confidence: f64,
  );

  fn description(&self) -> &str;

  fn confidence(&self) -> f64;
}

/// Copy the semantic fields of `incoming` onto `existing` if provenance
/// allows it. Returns `true` if anything was written.
pub fn refresh_semantics<T: Annotated>(existing: &mut T, incoming: &T) -> bool {
  if !existing.provenance().automation_may_overwrite() {
    return false;
  }
  existing.set_semantics(
    incoming.description().to_owned(),
    incoming.provenance(),
    incoming.confidence(),
  );
  true
}
