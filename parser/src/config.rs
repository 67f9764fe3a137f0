/// Knobs for how forgiving the parser is.
///
/// The default is forgiving in two places. `strict()`
/// turns both leniencies into syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
  /// A WHERE operand with no comparator after it ends the clause quietly
  /// instead of failing: `WHERE id` parses with no comparisons.
  pub lenient_where: bool,
  /// Anything after a complete statement is left unread.
  pub allow_trailing: bool,
}

impl ParserConfig {
  pub fn strict() -> Self {
    ParserConfig {
      lenient_where: false,
      allow_trailing: false,
    }
  }
}

impl Default for ParserConfig {
  fn default() -> Self {
    ParserConfig {
      lenient_where: true,
      allow_trailing: true,
    }
  }
}
