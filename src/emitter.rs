//! Code emission: two append-only text buffers that become one C file.
//!
//! The parser writes through the `Emit` trait while it recognises each
//! construct. Declarations go to the header buffer so they are hoisted above
//! every statement; everything else goes to the body. The buffers are plain
//! text sinks and never validate what they are given.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Sink for generated code fragments.
pub trait Emit {
  /// Append to the body without a line break.
  fn emit(&mut self, code: &str);
  /// Append to the body and end the line.
  fn emit_line(&mut self, code: &str);
  /// Append to the header without a line break.
  fn header(&mut self, code: &str);
  /// Append to the header and end the line.
  fn header_line(&mut self, code: &str);
}

/// In-memory header and body buffers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBuffer {
  header: String,
  body: String,
}

impl CodeBuffer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn header_text(&self) -> &str {
    &self.header
  }

  /// Body emitted so far. After a failed compilation this is the partial
  /// output shown to the user.
  pub fn body(&self) -> &str {
    &self.body
  }

  /// The finished artifact: header first, then body.
  pub fn finish(&self) -> String {
    let mut code = String::with_capacity(self.header.len() + self.body.len());
    code.push_str(&self.header);
    code.push_str(&self.body);
    code
  }

  /// Create `path` and write the artifact to it in one go.
  pub fn write_to(&self, path: &Path) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(self.header.as_bytes())?;
    out.write_all(self.body.as_bytes())?;
    out.flush()
  }
}

impl Emit for CodeBuffer {
  fn emit(&mut self, code: &str) {
    self.body.push_str(code);
  }

  fn emit_line(&mut self, code: &str) {
    self.body.push_str(code);
    self.body.push('\n');
  }

  fn header(&mut self, code: &str) {
    self.header.push_str(code);
  }

  fn header_line(&mut self, code: &str) {
    self.header.push_str(code);
    self.header.push('\n');
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn header_precedes_body_regardless_of_call_order() {
    let mut buffer = CodeBuffer::new();
    buffer.emit("x = ");
    buffer.header_line("float x;");
    buffer.emit_line("1;");
    buffer.header("/* end of declarations */");
    buffer.header_line("");

    assert_eq!(buffer.header_text(), "float x;\n/* end of declarations */\n");
    assert_eq!(buffer.body(), "x = 1;\n");
    assert_eq!(
      buffer.finish(),
      "float x;\n/* end of declarations */\nx = 1;\n"
    );
  }

  #[test]
  fn empty_buffer_finishes_empty() {
    assert_eq!(CodeBuffer::new().finish(), "");
  }

  #[test]
  fn write_to_persists_finished_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.c");
    let mut buffer = CodeBuffer::new();
    buffer.header_line("int main(void){");
    buffer.emit_line("return 0;");
    buffer.emit_line("}");

    buffer.write_to(&path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), buffer.finish());
  }
}
