//! Crate root: wires together the compilation pipeline.
//!
//! Compilation is a single forward pass:
//! - `tokenizer` hands out classified tokens on demand.
//! - `parser` recognises the grammar, tracks variables and labels, and emits
//!   C through an `Emit` sink as it goes. There is no syntax tree.
//! - `emitter` holds the header and body buffers that become the C file.
//! - `error` carries the typed diagnostics shared by the other modules.
//! - `driver` is the command-line front end used by the binary.

pub mod driver;
pub mod emitter;
pub mod error;
pub mod parser;
pub mod tokenizer;

pub use emitter::{CodeBuffer, Emit};
pub use error::{Category, CompileError, CompileResult, DriverError, Location};
pub use parser::Parser;
pub use tokenizer::{Lexer, Token, TokenKind, TokenSource};

/// Compile `source`, writing every generated fragment into `emitter`.
///
/// On failure the emitter keeps whatever was generated up to the error.
pub fn compile_into<E: Emit>(source: &str, emitter: &mut E) -> CompileResult<()> {
  let mut parser = Parser::new(Lexer::new(source), emitter)?;
  parser.program()
}

/// Compile a source string into C.
pub fn generate_c(source: &str) -> CompileResult<String> {
  let mut buffer = CodeBuffer::new();
  compile_into(source, &mut buffer)?;
  Ok(buffer.finish())
}
