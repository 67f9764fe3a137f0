use log::trace;
use std::fmt;
use std::fmt::Debug;
use std::io::{self, BufRead};
use std::marker::PhantomData;

/// Original position of element in source code
#[derive(PartialOrd, Ord, PartialEq, Eq, Clone, Copy, Default)]
pub struct Pos {
  /// One-based line number
  pub line: usize,
  /// One-based column number
  pub column: usize,
}

impl fmt::Debug for Pos {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "Pos({}:{})", self.line, self.column)
  }
}

impl fmt::Display for Pos {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.column)
  }
}

/// A token in the grammar.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token<K> {
  pub kind: K,
  /// The exact text consumed for this token
  pub value: String,
  /// Where the first character of `value` sits in the input
  pub pos: Pos,
}

/// The lexical tables for a language.
///
/// The scanner itself knows nothing about a particular language: it tries
/// the punctuation table first, then the regexes, promoting regex matches
/// that spell out a keyword. Whatever is left over becomes `ILLEGAL`.
pub trait Language {
  type Kind: PartialEq + Debug + Clone + Copy;

  /// Kind for a character none of the tables recognize
  const ILLEGAL: Self::Kind;
  /// Kind returned once the input is exhausted
  const END_OF_INPUT: Self::Kind;
  /// Kind for a run of whitespace
  const WHITESPACE: Self::Kind;

  fn keywords() -> Vec<Keyword<Self::Kind>> {
    vec![]
  }
  /// Checked in order, so longer symbols must come before their prefixes.
  fn punctuation() -> Vec<Punctuation<Self::Kind>> {
    vec![]
  }
  fn regexes() -> Vec<RegexToken<Self::Kind>> {
    vec![]
  }
}

#[derive(Debug, Clone)]
pub struct Keyword<T> {
  pub is_case_sensitive: bool,
  pub text: &'static str,
  pub token: T,
}

impl<T> Keyword<T> {
  pub fn create(text: &'static str, token: T) -> Keyword<T> {
    Keyword {
      text,
      token,
      is_case_sensitive: true,
    }
  }
  pub fn set_case_sensitive(mut self, is_sensitive: bool) -> Keyword<T> {
    self.is_case_sensitive = is_sensitive;
    self
  }

  fn matches(&self, text: &str) -> bool {
    if self.is_case_sensitive {
      self.text == text
    } else {
      self.text.eq_ignore_ascii_case(text)
    }
  }
}

#[derive(Debug, Clone)]
pub struct Punctuation<T> {
  pub text: &'static str,
  pub token: T,
}

impl<T> Punctuation<T> {
  pub fn create(text: &'static str, token: T) -> Self {
    Self { text, token }
  }
}

#[derive(Debug, Clone)]
pub struct RegexToken<T> {
  pub regex: regex::Regex,
  pub token: T,
}

impl<T> RegexToken<T> {
  /// Panics if `regex` does not compile; the patterns are fixed at build time.
  pub fn create(regex: &'static str, token: T) -> Self {
    Self {
      regex: regex::Regex::new(&format!("^(?:{})", regex)).expect("invalid token regex"),
      token,
    }
  }
}

/// Lazily turns a reader into tokens, one per call to [`Scanner::scan`].
///
/// Input is pulled a line at a time, so a scanner over a file or a socket
/// never holds more than the current line. Every character of the input
/// ends up in exactly one token, whitespace included.
pub struct Scanner<L: Language, R> {
  keywords: Vec<Keyword<L::Kind>>,
  punctuation: Vec<Punctuation<L::Kind>>,
  regexes: Vec<RegexToken<L::Kind>>,
  reader: R,
  buf: String,
  line: Vec<u8>,
  off: usize,
  position: Pos,
  exhausted: bool,
  finished: bool,
  language: PhantomData<L>,
}

impl<L: Language, R: BufRead> Scanner<L, R> {
  pub fn new(reader: R) -> Scanner<L, R> {
    Scanner {
      keywords: L::keywords(),
      punctuation: L::punctuation(),
      regexes: L::regexes(),
      reader,
      buf: String::new(),
      line: Vec::new(),
      off: 0,
      position: Pos { line: 1, column: 1 },
      exhausted: false,
      finished: false,
      language: PhantomData,
    }
  }

  /// Position of the next character to be scanned
  pub fn position(&self) -> Pos {
    self.position
  }

  /// Consumes and classifies the next lexeme.
  ///
  /// Never fails on what the input says, only on failing to read it: text
  /// no table recognizes comes back as an `ILLEGAL` token. Once the input
  /// runs out every call returns an `END_OF_INPUT` token with an empty value.
  pub fn scan(&mut self) -> io::Result<Token<L::Kind>> {
    let token = self.next_token()?;
    trace!("scanned {}", token);
    Ok(token)
  }

  fn next_token(&mut self) -> io::Result<Token<L::Kind>> {
    let pos = self.position;
    let cur_char = match self.peek_char()? {
      Some(c) => c,
      None => {
        return Ok(Token {
          kind: L::END_OF_INPUT,
          value: String::new(),
          pos,
        })
      }
    };

    if cur_char.is_whitespace() {
      return self.scan_whitespace(pos);
    }

    if let Some(punc) = self.peek_punctuation() {
      let value = self.swallow(punc.text.len());
      return Ok(Token {
        kind: punc.token,
        value,
        pos,
      });
    }

    if let Some((kind, len)) = self.peek_regexes() {
      let value = self.swallow(len);
      let kind = self.keyword_kind(&value).unwrap_or(kind);
      return Ok(Token { kind, value, pos });
    }

    let value = self.swallow(cur_char.len_utf8());
    Ok(Token {
      kind: L::ILLEGAL,
      value,
      pos,
    })
  }

  /// Makes sure there is unread text in the buffer, pulling the next
  /// line from the reader when needed. Returns false at end of input.
  /// A line break byte never sits inside a UTF-8 sequence, so splitting
  /// on it keeps every valid character whole.
  fn fill(&mut self) -> io::Result<bool> {
    if self.off < self.buf.len() {
      return Ok(true);
    }
    if self.exhausted {
      return Ok(false);
    }
    self.off = 0;
    self.line.clear();
    if self.reader.read_until(b'\n', &mut self.line)? == 0 {
      self.buf.clear();
      self.exhausted = true;
      return Ok(false);
    }
    // Bad byte sequences become U+FFFD, which no table matches, so they
    // scan as ILLEGAL like any other unknown character.
    self.buf = String::from_utf8_lossy(&self.line).into_owned();
    Ok(true)
  }

  fn peek_char(&mut self) -> io::Result<Option<char>> {
    if !self.fill()? {
      return Ok(None);
    }
    Ok(self.get_str().chars().next())
  }

  /// The unread part of the current line
  fn get_str(&self) -> &str {
    &self.buf[self.off..]
  }

  /// Consumes `len` bytes of the current line, keeping the position in step.
  fn swallow(&mut self, len: usize) -> String {
    let value = self.buf[self.off..self.off + len].to_string();
    for c in value.chars() {
      if c == '\n' {
        self.position.line += 1;
        self.position.column = 1;
      } else {
        self.position.column += 1;
      }
    }
    self.off += len;
    value
  }

  /// A whitespace run may cross line breaks, so keep pulling lines until
  /// something else shows up.
  fn scan_whitespace(&mut self, pos: Pos) -> io::Result<Token<L::Kind>> {
    let mut value = String::new();
    while self.fill()? {
      let rest = self.get_str();
      let len = rest
        .find(|c: char| !c.is_whitespace())
        .unwrap_or_else(|| rest.len());
      if len == 0 {
        break;
      }
      value.push_str(&self.swallow(len));
    }
    Ok(Token {
      kind: L::WHITESPACE,
      value,
      pos,
    })
  }

  fn peek_punctuation(&self) -> Option<Punctuation<L::Kind>> {
    let iter = self.get_str();
    self
      .punctuation
      .iter()
      .find(|punc| iter.starts_with(punc.text))
      .cloned()
  }

  /// First regex with a non-empty match wins; returns its kind and match length.
  fn peek_regexes(&self) -> Option<(L::Kind, usize)> {
    let text = self.get_str();
    for regextoken in self.regexes.iter() {
      if let Some(reg_match) = regextoken.regex.find(text) {
        debug_assert!(reg_match.start() == 0);
        if !reg_match.as_str().is_empty() {
          return Some((regextoken.token, reg_match.end()));
        }
      }
    }
    None
  }

  fn keyword_kind(&self, text: &str) -> Option<L::Kind> {
    self
      .keywords
      .iter()
      .find(|key| key.matches(text))
      .map(|key| key.token)
  }
}

/// Yields every token up to and including the end of input one.
impl<L: Language, R: BufRead> Iterator for Scanner<L, R> {
  type Item = io::Result<Token<L::Kind>>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.finished {
      return None;
    }
    let result = Scanner::scan(self);
    match &result {
      Ok(token) if token.kind == L::END_OF_INPUT => self.finished = true,
      Err(_) => self.finished = true,
      Ok(_) => {}
    }
    Some(result)
  }
}

impl<K: PartialEq + Debug> fmt::Display for Token<K> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}[{:?}]@{}", self.value, self.kind, self.pos)
  }
}
