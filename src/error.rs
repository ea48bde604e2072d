//! Shared error types for the compiler core and its driver.
//!
//! The core never terminates the process: every failure is a `CompileError`
//! returned up to the driver, which renders it chibicc-style by pointing a
//! caret at the offending byte of the source line.

use snafu::Snafu;
use std::fmt;
use std::io;
use std::path::PathBuf;

pub type CompileResult<T> = Result<T, CompileError>;

/// Where in the source a token (and therefore a diagnostic) starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
  /// Byte offset into the source text.
  pub offset: usize,
  /// 1-based line number.
  pub line: usize,
}

impl Location {
  pub fn new(offset: usize, line: usize) -> Self {
    Self { offset, line }
  }
}

/// Coarse classification used when reporting a failure to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
  Syntax,
  Semantic,
  Usage,
  Io,
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Category::Syntax => "syntax",
      Category::Semantic => "semantic",
      Category::Usage => "usage",
      Category::Io => "I/O",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum CompileError {
  #[snafu(display("line {}: lexical error: {message}", loc.line))]
  Lex { loc: Location, message: String },

  #[snafu(display("line {}: syntax error: {message}", loc.line))]
  Syntax { loc: Location, message: String },

  #[snafu(display("line {}: semantic error: {message}", loc.line))]
  Semantic { loc: Location, message: String },
}

impl CompileError {
  pub fn lex(loc: Location, message: impl Into<String>) -> Self {
    LexSnafu { loc, message }.build()
  }

  pub fn syntax(loc: Location, message: impl Into<String>) -> Self {
    SyntaxSnafu { loc, message }.build()
  }

  pub fn semantic(loc: Location, message: impl Into<String>) -> Self {
    SemanticSnafu { loc, message }.build()
  }

  pub fn location(&self) -> Location {
    match self {
      Self::Lex { loc, .. } | Self::Syntax { loc, .. } | Self::Semantic { loc, .. } => *loc,
    }
  }

  pub fn message(&self) -> &str {
    match self {
      Self::Lex { message, .. } | Self::Syntax { message, .. } | Self::Semantic { message, .. } => {
        message
      }
    }
  }

  /// Lexical failures are grammar failures as far as the user is concerned.
  pub fn category(&self) -> Category {
    match self {
      Self::Lex { .. } | Self::Syntax { .. } => Category::Syntax,
      Self::Semantic { .. } => Category::Semantic,
    }
  }

  /// Format the error followed by the offending source line and a caret
  /// under the byte the error is anchored at.
  pub fn render(&self, source: &str) -> String {
    let mut offset = self.location().offset.min(source.len());
    while !source.is_char_boundary(offset) {
      offset -= 1;
    }
    let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[offset..]
      .find('\n')
      .map_or(source.len(), |i| offset + i);
    let line_text = source[line_start..line_end].trim_end_matches('\r');
    let column = source[line_start..offset].chars().count();
    let marker = format!("{}^", " ".repeat(column));
    format!("{self}\n{line_text}\n{marker}")
  }
}

/// Everything that can stop the command-line driver.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DriverError {
  #[snafu(display(
    "output path {} is the source file itself; pass --output",
    path.display()
  ))]
  SameOutputPath { path: PathBuf },

  #[snafu(display("cannot read {}: {source}", path.display()))]
  ReadSource { path: PathBuf, source: io::Error },

  #[snafu(display("cannot write {}: {source}", path.display()))]
  WriteOutput { path: PathBuf, source: io::Error },

  #[snafu(display("{diagnostic}"))]
  Compile {
    source: CompileError,
    diagnostic: String,
    partial: String,
  },
}

impl DriverError {
  pub fn category(&self) -> Category {
    match self {
      Self::SameOutputPath { .. } => Category::Usage,
      Self::ReadSource { .. } | Self::WriteOutput { .. } => Category::Io,
      Self::Compile { source, .. } => source.category(),
    }
  }

  /// Usage errors exit with 2 like clap's own argument errors; everything
  /// else exits with 1.
  pub fn exit_code(&self) -> i32 {
    match self {
      Self::SameOutputPath { .. } => 2,
      _ => 1,
    }
  }

  /// Body text emitted before a compile error stopped the run.
  pub fn partial_output(&self) -> Option<&str> {
    match self {
      Self::Compile { partial, .. } => Some(partial),
      _ => None,
    }
  }
}
