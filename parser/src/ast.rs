use std::fmt;

/// A parsed `SELECT <fields> FROM <store> [WHERE <comparisons>]` query.
///
/// Displays in a canonical form that parses back to an equal statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Statement {
  /// Selected fields in source order. `*` appears as a plain field.
  pub fields: Vec<String>,
  /// The data source named after FROM
  pub store: String,
  /// Empty when there was no WHERE clause
  pub comparisons: Vec<Comparison>,
}

/// `left comparator right`, e.g. `id = 23`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
  pub left: String,
  pub comparator: String,
  pub right: String,
}

impl Comparison {
  pub fn new(
    left: impl Into<String>,
    comparator: impl Into<String>,
    right: impl Into<String>,
  ) -> Self {
    Comparison {
      left: left.into(),
      comparator: comparator.into(),
      right: right.into(),
    }
  }

  pub fn as_tuple(&self) -> (&str, &str, &str) {
    (&self.left, &self.comparator, &self.right)
  }
}

impl fmt::Display for Comparison {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{} {} {}", self.left, self.comparator, self.right)
  }
}

impl fmt::Display for Statement {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "SELECT {} FROM {}", self.fields.join(", "), self.store)?;
    for (i, comparison) in self.comparisons.iter().enumerate() {
      let glue = if i == 0 { "WHERE" } else { "AND" };
      write!(f, " {} {}", glue, comparison)?;
    }
    Ok(())
  }
}
