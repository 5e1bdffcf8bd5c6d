//! SQL lexer for the DDL adapter.
//!
//! Produces a flat token stream with byte spans into the source. Comments
//! and whitespace are dropped; quoted identifiers and string literals are
//! single tokens, so commas and parentheses inside them never affect
//! nesting.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
  /// Bare word: keyword, identifier or number.
  Word,
  /// `"x"`, `` `x` `` or `[x]`.
  Quoted,
  /// `'x'`.
  Str,
  LParen,
  RParen,
  Comma,
  Semicolon,
  Dot,
  /// Any other single character.
  Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token<'a> {
  pub kind:  Kind,
  /// Raw source text, quotes included.
  pub text:  &'a str,
  pub start: usize,
  pub end:   usize,
}

impl<'a> Token<'a> {
  /// `true` if this is a bare word equal to `kw`, ignoring case.
  pub fn is_kw(&self, kw: &str) -> bool {
    self.kind == Kind::Word && self.text.eq_ignore_ascii_case(kw)
  }

  /// The identifier this token names, with any quoting removed.
  pub fn ident(&self) -> Option<&'a str> {
    match self.kind {
      Kind::Word => Some(self.text),
      Kind::Quoted | Kind::Str => {
        let inner = &self.text[1..];
        Some(inner.strip_suffix(closing_quote(self.text)).unwrap_or(inner))
      }
      _ => None,
    }
  }
}

fn closing_quote(text: &str) -> char {
  match text.chars().next() {
    Some('[') => ']',
    Some(c) => c,
    None => '"',
  }
}

fn is_word_char(c: char) -> bool { c.is_alphanumeric() || c == '_' || c == '$' }

/// Tokenise `src`. Never fails: unterminated quotes and comments run to the
/// end of input.
pub(crate) fn lex(src: &str) -> Vec<Token<'_>> {
  let mut tokens = Vec::new();
  let mut chars = src.char_indices().peekable();

  while let Some((start, c)) = chars.next() {
    let kind = match c {
      c if c.is_whitespace() => continue,
      '-' if matches!(chars.peek(), Some((_, '-'))) => {
        for (_, c) in chars.by_ref() {
          if c == '\n' {
            break;
          }
        }
        continue;
      }
      '/' if matches!(chars.peek(), Some((_, '*'))) => {
        chars.next();
        let mut prev = '\0';
        for (_, c) in chars.by_ref() {
          if prev == '*' && c == '/' {
            break;
          }
          prev = c;
        }
        continue;
      }
      '"' | '`' | '\'' => {
        for (_, next) in chars.by_ref() {
          if next == c {
            break;
          }
        }
        if c == '\'' { Kind::Str } else { Kind::Quoted }
      }
      // `[]` is an array suffix, not an empty bracket-quoted identifier.
      '[' if !matches!(chars.peek(), Some((_, ']'))) => {
        for (_, next) in chars.by_ref() {
          if next == ']' {
            break;
          }
        }
        Kind::Quoted
      }
      c if is_word_char(c) => {
        while chars.next_if(|&(_, c)| is_word_char(c)).is_some() {}
        Kind::Word
      }
      '(' => Kind::LParen,
      ')' => Kind::RParen,
      ',' => Kind::Comma,
      ';' => Kind::Semicolon,
      '.' => Kind::Dot,
      _ => Kind::Other,
    };
    let end = chars.peek().map_or(src.len(), |&(i, _)| i);
    tokens.push(Token { kind, text: &src[start..end], start, end });
  }

  tokens
}

/// Index of the `RParen` closing the `LParen` at `open`, if balanced.
pub(crate) fn matching_paren(tokens: &[Token<'_>], open: usize) -> Option<usize> {
  let mut depth = 0usize;
  for (i, tok) in tokens.iter().enumerate().skip(open) {
    match tok.kind {
      Kind::LParen => depth += 1,
      Kind::RParen => {
        depth = depth.checked_sub(1)?;
        if depth == 0 {
          return Some(i);
        }
      }
      _ => {}
    }
  }
  None
}

/// Split on commas that sit at nesting depth zero relative to `tokens`.
/// Empty segments are dropped.
pub(crate) fn split_top_level<'t, 'a>(
  tokens: &'t [Token<'a>],
) -> Vec<&'t [Token<'a>]> {
  let mut items = Vec::new();
  let mut depth = 0usize;
  let mut start = 0usize;
  for (i, tok) in tokens.iter().enumerate() {
    match tok.kind {
      Kind::LParen => depth += 1,
      Kind::RParen => depth = depth.saturating_sub(1),
      Kind::Comma if depth == 0 => {
        if i > start {
          items.push(&tokens[start..i]);
        }
        start = i + 1;
      }
      _ => {}
    }
  }
  if start < tokens.len() {
    items.push(&tokens[start..]);
  }
  items
}

/// Identifiers inside a parenthesised list starting at `open`, e.g.
/// `(a, "b", c)`. Returns the names and the index of the closing paren.
pub(crate) fn ident_list<'a>(
  tokens: &[Token<'a>],
  open: usize,
) -> Option<(Vec<&'a str>, usize)> {
  if tokens.get(open)?.kind != Kind::LParen {
    return None;
  }
  let close = matching_paren(tokens, open)?;
  let names = split_top_level(&tokens[open + 1..close])
    .into_iter()
    .filter_map(|item| item.first().and_then(Token::ident))
    .collect();
  Some((names, close))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(src: &str) -> Vec<Kind> { lex(src).into_iter().map(|t| t.kind).collect() }

  #[test]
  fn words_punctuation_and_spans() {
    let src = "CREATE TABLE a.b (id INT);";
    let toks = lex(src);
    assert_eq!(toks[0].text, "CREATE");
    assert_eq!(toks[2].text, "a");
    assert_eq!(toks[3].kind, Kind::Dot);
    assert_eq!(toks[5].kind, Kind::LParen);
    assert_eq!(&src[toks[6].start..toks[7].end], "id INT");
    assert_eq!(toks.last().unwrap().kind, Kind::Semicolon);
  }

  #[test]
  fn comments_are_dropped() {
    let toks = lex("a -- b, c\n/* d, (e */ f");
    let texts: Vec<&str> = toks.iter().map(|t| t.text).collect();
    assert_eq!(texts, vec!["a", "f"]);
  }

  #[test]
  fn quoted_identifiers_unquote() {
    let toks = lex(r#""user table" `x` [y] 'z'"#);
    let idents: Vec<&str> = toks.iter().filter_map(Token::ident).collect();
    assert_eq!(idents, vec!["user table", "x", "y", "z"]);
    assert_eq!(toks[3].kind, Kind::Str);
  }

  #[test]
  fn commas_inside_strings_do_not_split() {
    let toks = lex("a DEFAULT 'x, y', b INT");
    let items = split_top_level(&toks);
    assert_eq!(items.len(), 2);
  }

  #[test]
  fn nested_commas_do_not_split() {
    let toks = lex("price NUMERIC(10, 2), CHECK (price IN (1, 2)), note TEXT");
    let items = split_top_level(&toks);
    assert_eq!(items.len(), 3);
    assert_eq!(items[2][0].text, "note");
  }

  #[test]
  fn array_suffix_is_not_a_quoted_identifier() {
    assert_eq!(
      kinds("tags TEXT[]"),
      vec![Kind::Word, Kind::Word, Kind::Other, Kind::Other]
    );
  }

  #[test]
  fn matching_paren_handles_nesting_and_imbalance() {
    let toks = lex("( a ( b ) c ) d");
    assert_eq!(matching_paren(&toks, 0), Some(6));
    let toks = lex("( a ( b )");
    assert_eq!(matching_paren(&toks, 0), None);
  }

  #[test]
  fn ident_list_reads_names() {
    let toks = lex(r#"("a", b , c)"#);
    let (names, close) = ident_list(&toks, 0).unwrap();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(close, toks.len() - 1);
  }
}
