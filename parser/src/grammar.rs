use crate::ast::*;
use crate::config::ParserConfig;
use crate::lang::{Kind, Ql};
use crate::tokenizer::{self, Token};

use log::debug;
use std::error;
use std::fmt;
use std::io::{self, BufRead};

type Scanner<R> = tokenizer::Scanner<Ql, R>;

const FIELD: &[Kind] = &[Kind::Identifier, Kind::Asterisk];
const OPERAND: &[Kind] = &[Kind::Identifier, Kind::Digit, Kind::Asterisk];

/// The part of the statement being parsed when an error was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
  Select,
  Fields,
  From,
  Store,
  Where,
  /// Past the statement, strict mode only
  End,
}

impl fmt::Display for Clause {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(match self {
      Clause::Select => "SELECT",
      Clause::Fields => "FIELDS",
      Clause::From => "FROM",
      Clause::Store => "STORE",
      Clause::Where => "WHERE",
      Clause::End => "END",
    })
  }
}

#[derive(Debug)]
pub enum ParseError {
  /// The token at some grammar position was not one of the kinds allowed
  /// there. Illegal characters end up here too.
  UnexpectedToken {
    clause: Clause,
    expected: &'static str,
    found: Token<Kind>,
  },
  /// The underlying reader failed
  Io(io::Error),
}

impl From<io::Error> for ParseError {
  fn from(err: io::Error) -> ParseError {
    ParseError::Io(err)
  }
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      ParseError::UnexpectedToken {
        clause,
        expected,
        found,
      } => {
        write!(f, "{}: found ", clause)?;
        if found.kind == Kind::EndOfInput {
          f.write_str("end of input")?;
        } else {
          write!(f, "{:?}", found.value)?;
        }
        write!(f, " at {}, expected {}", found.pos, expected)
      }
      ParseError::Io(err) => write!(f, "failed to read query: {}", err),
    }
  }
}

impl error::Error for ParseError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      ParseError::Io(err) => Some(err),
      ParseError::UnexpectedToken { .. } => None,
    }
  }
}

/// Recursive descent over the token stream, with one token of pushback.
///
/// Build one per input; the parser owns the scanner and with it the
/// reader's cursor.
pub struct Parser<R> {
  scanner: Scanner<R>,
  config: ParserConfig,
  /// The last token read, what `unscan` pushes back
  last: Option<Token<Kind>>,
  /// A pushed back token, handed out by the next read
  pending: Option<Token<Kind>>,
}

impl<R: BufRead> Parser<R> {
  pub fn new(reader: R) -> Parser<R> {
    Parser::with_config(reader, ParserConfig::default())
  }

  pub fn with_config(reader: R, config: ParserConfig) -> Parser<R> {
    Parser {
      scanner: Scanner::new(reader),
      config,
      last: None,
      pending: None,
    }
  }

  /// Parses a single statement, stopping at the first syntax error.
  pub fn parse(&mut self) -> Result<Statement, ParseError> {
    let result = self.statement();
    match &result {
      Ok(stmt) => debug!("parsed statement: {}", stmt),
      Err(err) => debug!("rejected statement: {}", err),
    }
    result
  }

  fn statement(&mut self) -> Result<Statement, ParseError> {
    let mut stmt = Statement::default();

    self.expect(Clause::Select, "SELECT", &[Kind::Select])?;

    loop {
      let field = self.expect(Clause::Fields, "field", FIELD)?;
      stmt.fields.push(field.value);
      if !self.accept(&[Kind::Comma])? {
        break;
      }
    }

    self.expect(Clause::From, "FROM", &[Kind::From])?;
    stmt.store = self
      .expect(Clause::Store, "store name", &[Kind::Identifier])?
      .value;

    if self.accept(&[Kind::Where])? {
      self.comparisons(&mut stmt.comparisons)?;
    }

    if !self.config.allow_trailing {
      self.expect(Clause::End, "end of input", &[Kind::EndOfInput])?;
    }

    Ok(stmt)
  }

  fn comparisons(&mut self, comparisons: &mut Vec<Comparison>) -> Result<(), ParseError> {
    loop {
      let left = self.expect(Clause::Where, "left operand", OPERAND)?;

      let comparator = self.scan_ignore_whitespace()?;
      if comparator.kind != Kind::Comparator {
        if !self.config.lenient_where {
          return Err(unexpected(Clause::Where, "comparator", comparator));
        }
        debug!("operand {:?} has no comparator, ending WHERE", left.value);
        self.unscan();
        break;
      }

      let right = self.expect(Clause::Where, "right operand", OPERAND)?;
      comparisons.push(Comparison {
        left: left.value,
        comparator: comparator.value,
        right: right.value,
      });

      if !self.accept(&[Kind::Comma, Kind::And])? {
        break;
      }
    }
    Ok(())
  }

  /// Reads the next non-whitespace token, failing unless it is one of `kinds`.
  fn expect(
    &mut self,
    clause: Clause,
    expected: &'static str,
    kinds: &[Kind],
  ) -> Result<Token<Kind>, ParseError> {
    let tok = self.scan_ignore_whitespace()?;
    if kinds.contains(&tok.kind) {
      Ok(tok)
    } else {
      Err(unexpected(clause, expected, tok))
    }
  }

  /// Consumes the next non-whitespace token if it is one of `kinds`,
  /// otherwise pushes it back.
  fn accept(&mut self, kinds: &[Kind]) -> Result<bool, ParseError> {
    let tok = self.scan_ignore_whitespace()?;
    if kinds.contains(&tok.kind) {
      Ok(true)
    } else {
      self.unscan();
      Ok(false)
    }
  }

  fn scan(&mut self) -> Result<Token<Kind>, ParseError> {
    if let Some(tok) = self.pending.take() {
      return Ok(tok);
    }
    // Iterator::scan would shadow the inherent method on a by-value place.
    let tok = Scanner::scan(&mut self.scanner)?;
    self.last = Some(tok.clone());
    Ok(tok)
  }

  fn scan_ignore_whitespace(&mut self) -> Result<Token<Kind>, ParseError> {
    loop {
      let tok = self.scan()?;
      if tok.kind != Kind::Whitespace {
        return Ok(tok);
      }
    }
  }

  /// Pushes the last read token back so the next read returns it again.
  fn unscan(&mut self) {
    assert!(
      self.pending.is_none(),
      "only one token can be pushed back at a time"
    );
    self.pending = self.last.clone();
  }
}

fn unexpected(clause: Clause, expected: &'static str, found: Token<Kind>) -> ParseError {
  ParseError::UnexpectedToken {
    clause,
    expected,
    found,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{parse, parse_str};
  use std::io::BufReader;

  fn assert_statement(input: &str, fields: &[&str], store: &str, comparisons: &[(&str, &str, &str)]) {
    let stmt = parse_str(input).unwrap();
    assert_eq!(stmt.fields, fields);
    assert_eq!(stmt.store, store);
    let tuples: Vec<_> = stmt.comparisons.iter().map(Comparison::as_tuple).collect();
    assert_eq!(tuples, comparisons);
  }

  fn assert_error(
    input: &str,
    config: ParserConfig,
    clause: Clause,
    expected: &str,
    found: &str,
  ) -> Token<Kind> {
    match parse(input, config) {
      Err(ParseError::UnexpectedToken {
        clause: c,
        expected: e,
        found: f,
      }) => {
        assert_eq!(c, clause, "clause for {:?}", input);
        assert_eq!(e, expected, "expected for {:?}", input);
        assert_eq!(f.value, found, "found for {:?}", input);
        f
      }
      other => panic!("expected a syntax error for {:?}, got {:?}", input, other),
    }
  }

  fn lenient() -> ParserConfig {
    ParserConfig::default()
  }

  #[test]
  fn test_select_star() {
    assert_statement("SELECT * FROM users", &["*"], "users", &[]);
  }

  #[test]
  fn test_select_with_where() {
    assert_statement(
      "SELECT id, name FROM users WHERE id = 23, name ^ greg",
      &["id", "name"],
      "users",
      &[("id", "=", "23"), ("name", "^", "greg")],
    );
  }

  #[test]
  fn test_field_list() {
    assert_statement(
      "SELECT a, b, *, c_2 FROM t",
      &["a", "b", "*", "c_2"],
      "t",
      &[],
    );
  }

  #[test]
  fn test_where_joined_with_and() {
    assert_statement(
      "select a from t where a != 1 and 2 <= b, c <> *",
      &["a"],
      "t",
      &[("a", "!=", "1"), ("2", "<=", "b"), ("c", "<>", "*")],
    );
  }

  #[test]
  fn test_case_is_kept_for_names() {
    assert_statement(
      "sElEcT UserId FROM Users WHERE Name = Greg",
      &["UserId"],
      "Users",
      &[("Name", "=", "Greg")],
    );
  }

  #[test]
  fn test_whitespace_does_not_matter() {
    let compact = parse_str("SELECT a,b FROM t WHERE x=1 AND y>=z").unwrap();
    let spaced =
      parse_str("\n  SELECT\ta ,\n b   FROM t\r\n WHERE x = 1\n\n AND   y >= z \n").unwrap();
    assert_eq!(compact, spaced);
  }

  #[test]
  fn test_round_trip() {
    let inputs = [
      "SELECT * FROM users",
      "select id,name from users where id=23,name^greg",
      "SELECT a, *, b FROM t WHERE * > 0 AND a < b, 7 != c",
    ];
    for input in inputs.iter() {
      let stmt = parse_str(input).unwrap();
      assert_eq!(parse_str(&stmt.to_string()).unwrap(), stmt, "{}", input);
    }

    let built = Statement {
      fields: vec!["x".into(), "y".into()],
      store: "points".into(),
      comparisons: vec![Comparison::new("x", ">=", "10")],
    };
    assert_eq!(parse_str(&built.to_string()).unwrap(), built);
  }

  #[test]
  fn test_missing_select() {
    assert_error("id FROM users", lenient(), Clause::Select, "SELECT", "id");
  }

  #[test]
  fn test_empty_input() {
    let found = assert_error("", lenient(), Clause::Select, "SELECT", "");
    assert_eq!(found.kind, Kind::EndOfInput);
    let err = parse_str("   ").unwrap_err();
    assert_eq!(
      err.to_string(),
      "SELECT: found end of input at 1:4, expected SELECT"
    );
  }

  #[test]
  fn test_missing_from() {
    assert_error("SELECT id users", lenient(), Clause::From, "FROM", "users");
  }

  #[test]
  fn test_trailing_comma_in_fields() {
    assert_error("SELECT id, FROM users", lenient(), Clause::Fields, "field", "FROM");
  }

  #[test]
  fn test_bad_store() {
    assert_error("SELECT * FROM", lenient(), Clause::Store, "store name", "");
    assert_error("SELECT * FROM 42", lenient(), Clause::Store, "store name", "42");
    assert_error("SELECT * FROM *", lenient(), Clause::Store, "store name", "*");
  }

  #[test]
  fn test_illegal_character_is_unexpected() {
    let found = assert_error("SELECT $ FROM t", lenient(), Clause::Fields, "field", "$");
    assert_eq!(found.kind, Kind::Illegal);
  }

  #[test]
  fn test_digits_are_not_fields() {
    assert_error("SELECT 1 FROM t", lenient(), Clause::Fields, "field", "1");
  }

  #[test]
  fn test_bad_where_operands() {
    assert_error("SELECT * FROM t WHERE = 1", lenient(), Clause::Where, "left operand", "=");
    assert_error("SELECT * FROM t WHERE a =", lenient(), Clause::Where, "right operand", "");
    assert_error(
      "SELECT * FROM t WHERE a = 1 AND",
      lenient(),
      Clause::Where,
      "left operand",
      "",
    );
    assert_error("SELECT * FROM t WHERE", lenient(), Clause::Where, "left operand", "");
  }

  #[test]
  fn test_lone_where_operand_ends_clause() {
    assert_statement("SELECT * FROM t WHERE id", &["*"], "t", &[]);
    assert_statement("SELECT * FROM t WHERE a = 1, b", &["*"], "t", &[("a", "=", "1")]);
  }

  #[test]
  fn test_trailing_input_is_left_alone() {
    assert_statement("SELECT * FROM t extra stuff", &["*"], "t", &[]);
    assert_statement("SELECT * FROM t WHERE a = b c", &["*"], "t", &[("a", "=", "b")]);
  }

  #[test]
  fn test_strict_mode() {
    let strict = ParserConfig::strict();
    assert_error("SELECT * FROM t WHERE id", strict, Clause::Where, "comparator", "");
    assert_error("SELECT * FROM t WHERE a = 1, b c", strict, Clause::Where, "comparator", "c");
    assert_error("SELECT * FROM t extra", strict, Clause::End, "end of input", "extra");
    assert_error("SELECT * FROM t WHERE a = b c", strict, Clause::End, "end of input", "c");

    let stmt = parse("  SELECT * FROM t WHERE a = b \n", strict).unwrap();
    assert_eq!(stmt.comparisons, vec![Comparison::new("a", "=", "b")]);
  }

  #[test]
  fn test_error_position() {
    let found = assert_error("SELECT id,\n  FROM users", lenient(), Clause::Fields, "field", "FROM");
    assert_eq!((found.pos.line, found.pos.column), (2, 3));

    let err = parse_str("SELECT id users").unwrap_err();
    assert_eq!(err.to_string(), "FROM: found \"users\" at 1:11, expected FROM");
  }

  #[test]
  fn test_reader_input() {
    let text = "SELECT id,\n name\nFROM users\nWHERE id = 23,\n name ^ greg\n";
    let reader = BufReader::with_capacity(4, text.as_bytes());
    let stmt = Parser::new(reader).parse().unwrap();
    assert_eq!(stmt, parse_str(&text.replace('\n', " ")).unwrap());
  }

  #[test]
  fn test_invalid_utf8_is_illegal() {
    let invalid_utf8: &[u8] = b"SELECT \xff FROM t";
    match Parser::new(invalid_utf8).parse() {
      Err(ParseError::UnexpectedToken {
        clause: Clause::Fields,
        found,
        ..
      }) => {
        assert_eq!(found.kind, Kind::Illegal);
        assert_eq!(found.value, "\u{fffd}");
        assert_eq!((found.pos.line, found.pos.column), (1, 8));
      }
      other => panic!("expected an illegal field, got {:?}", other),
    }

    let trailing: &[u8] = b"SELECT * FROM users \xff";
    assert_eq!(Parser::new(trailing).parse().unwrap().store, "users");
    let next_line: &[u8] = b"SELECT * FROM users\n\xff";
    assert_eq!(Parser::new(next_line).parse().unwrap().store, "users");
  }

  struct BrokenReader;

  impl io::Read for BrokenReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
      Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
    }
  }

  #[test]
  fn test_io_errors_are_reported() {
    match Parser::new(BufReader::new(BrokenReader)).parse() {
      Err(ParseError::Io(err)) => assert_eq!(err.kind(), io::ErrorKind::ConnectionReset),
      other => panic!("expected an io error, got {:?}", other),
    }
  }

  #[test]
  fn test_pushback_reads_the_same_token_again() {
    let mut parser = Parser::new("a b".as_bytes());
    let first = parser.scan_ignore_whitespace().unwrap();
    parser.unscan();
    assert_eq!(parser.scan_ignore_whitespace().unwrap(), first);
    assert_eq!(parser.scan_ignore_whitespace().unwrap().value, "b");
  }

  #[test]
  #[should_panic(expected = "only one token can be pushed back")]
  fn test_double_pushback_panics() {
    let mut parser = Parser::new("a b".as_bytes());
    parser.scan().unwrap();
    parser.unscan();
    parser.unscan();
  }
}
