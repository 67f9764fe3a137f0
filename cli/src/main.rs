use std::io::{self, BufRead};
use std::{env, process};

use log::{debug, error};
use prettytable::{Cell, Row, Table};
use ql_parser::{ParseError, Parser, ParserConfig, Ql, Scanner, Statement};

const USAGE: &str = "Usage: ql [--strict] [--tokens] [QUERY...]
Parses QUERY, or stdin when no query is given.
  --strict  reject WHERE operands without a comparator and trailing input
  --tokens  print the token stream instead of the statement";

struct Options {
  config: ParserConfig,
  tokens: bool,
  query: Option<String>,
}

fn parse_args() -> Result<Options, String> {
  let mut options = Options {
    config: ParserConfig::default(),
    tokens: false,
    query: None,
  };
  let mut words = vec![];
  for arg in env::args().skip(1) {
    match arg.as_str() {
      "--strict" => options.config = ParserConfig::strict(),
      "--tokens" => options.tokens = true,
      "-h" | "--help" => return Err(String::new()),
      flag if flag.starts_with("--") => return Err(format!("unknown option {}", flag)),
      _ => words.push(arg),
    }
  }
  if !words.is_empty() {
    options.query = Some(words.join(" "));
  }
  Ok(options)
}

fn main() {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

  let options = match parse_args() {
    Ok(options) => options,
    Err(msg) => {
      if !msg.is_empty() {
        eprintln!("{}", msg);
      }
      eprintln!("{}", USAGE);
      process::exit(2);
    }
  };

  let result = match &options.query {
    Some(query) => run(query.as_bytes(), &options),
    None => {
      let stdin = io::stdin();
      let lock = stdin.lock();
      run(lock, &options)
    }
  };
  if let Err(err) = result {
    error!("{}", err);
    process::exit(1);
  }
}

fn run<R: BufRead>(reader: R, options: &Options) -> Result<(), ParseError> {
  if options.tokens {
    for token in Scanner::<Ql, _>::new(reader) {
      let token = token?;
      println!("{}\t{:?}\t{:?}", token.pos, token.kind, token.value);
    }
    return Ok(());
  }

  let statement = Parser::with_config(reader, options.config).parse()?;
  debug!("{:?}", statement);
  print_statement(&statement);
  Ok(())
}

fn print_statement(statement: &Statement) {
  println!("{}", statement);

  let mut table = Table::new();
  table.set_titles(Row::new(vec![Cell::new("clause"), Cell::new("value")]));
  table.add_row(Row::new(vec![
    Cell::new("fields"),
    Cell::new(&statement.fields.join(", ")),
  ]));
  table.add_row(Row::new(vec![Cell::new("store"), Cell::new(&statement.store)]));
  for comparison in &statement.comparisons {
    table.add_row(Row::new(vec![
      Cell::new("where"),
      Cell::new(&comparison.to_string()),
    ]));
  }
  table.printstd();
}
