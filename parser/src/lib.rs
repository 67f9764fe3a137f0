mod ast;
mod config;
mod grammar;
mod lang;
mod tokenizer;

pub use self::ast::*;
pub use self::config::ParserConfig;
pub use self::grammar::{Clause, ParseError, Parser};
pub use self::lang::{Kind, Ql};
pub use self::tokenizer::{Keyword, Language, Pos, Punctuation, RegexToken, Scanner, Token};

use std::io::BufRead;

/// Parses `text` as a single statement.
pub fn parse(text: &str, config: ParserConfig) -> Result<Statement, ParseError> {
  Parser::with_config(text.as_bytes(), config).parse()
}

/// Parses `text` with the default, lenient, configuration.
pub fn parse_str(text: &str) -> Result<Statement, ParseError> {
  parse(text, ParserConfig::default())
}

pub fn parse_reader<R: BufRead>(reader: R) -> Result<Statement, ParseError> {
  Parser::new(reader).parse()
}
