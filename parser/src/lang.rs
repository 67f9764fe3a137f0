use crate::tokenizer::{Keyword, Language, Punctuation, RegexToken};

/*
 * The whole language fits on one line:
 * ```
 * SELECT id, name FROM users WHERE id = 23, name ^ greg
 * ```
 *
 * Keywords are case insensitive, everything else keeps the case it was
 * written in.
 */
#[derive(Debug)]
pub struct Ql;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
  Illegal,
  EndOfInput,
  Whitespace,

  /// a letter followed by letters, digits or underscores
  Identifier,
  /// a run of decimal digits
  Digit,

  Asterisk,
  Comma,
  /// one of `!= <> <= >= = < > ^`
  Comparator,

  Select,
  From,
  Where,
  And,
}

impl Language for Ql {
  type Kind = Kind;
  const ILLEGAL: Kind = Kind::Illegal;
  const END_OF_INPUT: Kind = Kind::EndOfInput;
  const WHITESPACE: Kind = Kind::Whitespace;

  fn keywords() -> Vec<Keyword<Kind>> {
    vec![
      ("select", Kind::Select),
      ("from", Kind::From),
      ("where", Kind::Where),
      ("and", Kind::And),
    ]
    .into_iter()
    .map(|(text, kind)| Keyword::create(text, kind).set_case_sensitive(false))
    .collect()
  }
  fn punctuation() -> Vec<Punctuation<Kind>> {
    vec![
      ("!=", Kind::Comparator),
      ("<>", Kind::Comparator),
      ("<=", Kind::Comparator),
      (">=", Kind::Comparator),
      ("=", Kind::Comparator),
      ("<", Kind::Comparator),
      (">", Kind::Comparator),
      ("^", Kind::Comparator),
      (",", Kind::Comma),
      ("*", Kind::Asterisk),
    ]
    .into_iter()
    .map(|(text, kind)| Punctuation::create(text, kind))
    .collect()
  }
  fn regexes() -> Vec<RegexToken<Kind>> {
    vec![
      RegexToken::create("[a-zA-Z][a-zA-Z_0-9]*", Kind::Identifier),
      RegexToken::create("[0-9]+", Kind::Digit),
    ]
  }
}
