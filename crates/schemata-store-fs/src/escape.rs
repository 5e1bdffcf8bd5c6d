//! HTML escaping for persisted descriptions.
//!
//! In memory a description is raw text. On disk it is escaped exactly once.
//! Text handed to `save` may be either form (a caller can save what `load`
//! returned), so the write path always goes through [`canonicalize`]:
//! decode to raw, then encode once.
//!
//! [`decode`] is a single left-to-right scan, which makes it an exact inverse
//! of [`encode`]. Replacing entities one kind at a time would turn the
//! encoded form of a literal `&lt;` back into `<`.

const ENTITIES: &[(&str, char)] = &[
  ("&amp;", '&'),
  ("&lt;", '<'),
  ("&gt;", '>'),
  ("&quot;", '"'),
  ("&#039;", '\''),
  // Alternative spellings of the apostrophe produced by other escapers.
  ("&#39;", '\''),
  ("&#x27;", '\''),
  ("&apos;", '\''),
];

/// Escape `& < > " '`.
pub fn encode(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for c in raw.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#039;"),
      c => out.push(c),
    }
  }
  out
}

/// Undo [`encode`]. Unknown or malformed entities are kept as literal text.
pub fn decode(escaped: &str) -> String {
  let mut out = String::with_capacity(escaped.len());
  let mut rest = escaped;
  while let Some(at) = rest.find('&') {
    out.push_str(&rest[..at]);
    rest = &rest[at..];
    match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
      Some((entity, c)) => {
        out.push(*c);
        rest = &rest[entity.len()..];
      }
      None => {
        out.push('&');
        rest = &rest[1..];
      }
    }
  }
  out.push_str(rest);
  out
}

/// The single persisted form of `text`, whether or not it was escaped
/// already.
pub fn canonicalize(text: &str) -> String { encode(&decode(text)) }
