//! Command-line driver: read one source file, compile it, write the C file.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::info;
use snafu::{ResultExt, ensure};

use crate::compile_into;
use crate::emitter::CodeBuffer;
use crate::error::{
  CompileSnafu, DriverError, ReadSourceSnafu, SameOutputPathSnafu, WriteOutputSnafu,
};

/// Compile a Teeny Tiny program into C.
#[derive(Debug, Parser)]
#[command(name = "teenytiny", version, about)]
pub struct Cli {
  /// Source program to compile
  pub source: PathBuf,

  /// Where to write the generated C [default: SOURCE with a .c extension]
  #[arg(short, long, value_name = "FILE")]
  pub output: Option<PathBuf>,

  /// Log every recognised statement
  #[arg(short, long)]
  pub verbose: bool,
}

impl Cli {
  pub fn output_path(&self) -> PathBuf {
    self
      .output
      .clone()
      .unwrap_or_else(|| self.source.with_extension("c"))
  }
}

/// Compile `cli.source` and return the path of the written artifact.
///
/// Nothing is written unless the whole program compiles.
pub fn run(cli: &Cli) -> Result<PathBuf, DriverError> {
  info!("teenytiny {}", env!("CARGO_PKG_VERSION"));

  let output = cli.output_path();
  ensure!(output != cli.source, SameOutputPathSnafu { path: &output });

  let source = fs::read_to_string(&cli.source).context(ReadSourceSnafu { path: &cli.source })?;
  info!("compiling {}", cli.source.display());

  let mut buffer = CodeBuffer::new();
  if let Err(err) = compile_into(&source, &mut buffer) {
    let diagnostic = err.render(&source);
    return Err(err).context(CompileSnafu {
      diagnostic,
      partial: buffer.body(),
    });
  }

  buffer
    .write_to(&output)
    .context(WriteOutputSnafu { path: &output })?;
  info!("wrote {}", output.display());
  Ok(output)
}
