//! Recursive-descent recognizer that emits C while it parses.
//!
//! There is no syntax tree. Each grammar rule checks the current token,
//! writes its fragment of C through the `Emit` sink, and moves on, so the
//! order of `emit` calls is the order of the generated code. The only check
//! that cannot happen in that single pass is whether every `GOTO` target
//! exists; targets are collected and compared against the declared labels
//! once the whole program has been read.
//!
//! ```text
//! program      ::= nl* {statement}
//! statement    ::= "PRINT" (expression | string) nl
//!                | "IF" boolean_expr "THEN" nl {statement} "ENDIF" nl
//!                | "WHILE" boolean_expr "REPEAT" nl {statement} "ENDWHILE" nl
//!                | "LABEL" ident nl
//!                | "GOTO" ident nl
//!                | "LET" ident "=" expression nl
//!                | "INPUT" ident nl
//! boolean_expr ::= comparison {("AND" | "OR") comparison}
//! comparison   ::= expression ("==" | "!=" | ">" | ">=" | "<" | "<=") expression
//! expression   ::= term {("+" | "-") term}
//! term         ::= unary {("*" | "/") unary}
//! unary        ::= ["+" | "-"] primary
//! primary      ::= number | ident | "(" expression ")"
//! nl           ::= NEWLINE+
//! ```

use std::collections::HashSet;
use std::mem;

use log::{debug, trace};

use crate::emitter::Emit;
use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Token, TokenKind, TokenSource, describe_token};

// C keywords (C89 through C23) plus the identifiers the artifact itself
// declares or calls.
const C_RESERVED: &[&str] = &[
  "alignas", "alignof", "auto", "bool", "break", "case", "char", "const", "constexpr",
  "continue", "default", "do", "double", "else", "enum", "extern", "false", "float", "for",
  "goto", "if", "inline", "int", "long", "nullptr", "register", "restrict", "return", "short",
  "signed", "sizeof", "static", "static_assert", "struct", "switch", "thread_local", "true",
  "typedef", "typeof", "typeof_unqual", "union", "unsigned", "void", "volatile", "while",
  "main", "printf", "scanf",
];

/// One compilation run: token cursor, semantic state and the emit sink.
pub struct Parser<'e, S, E> {
  tokens: S,
  emitter: &'e mut E,
  symbols: HashSet<String>,
  labels_declared: HashSet<String>,
  // First GOTO naming each target, in source order.
  labels_gotoed: Vec<Token>,
  current: Token,
  peek: Token,
}

impl<'e, S: TokenSource, E: Emit> Parser<'e, S, E> {
  /// Prime the cursor with the first token and its lookahead.
  pub fn new(mut tokens: S, emitter: &'e mut E) -> CompileResult<Self> {
    let current = tokens.next_token()?;
    let peek = tokens.next_token()?;
    Ok(Self {
      tokens,
      emitter,
      symbols: HashSet::new(),
      labels_declared: HashSet::new(),
      labels_gotoed: Vec::new(),
      current,
      peek,
    })
  }

  /// Recognise a whole program, leaving the complete artifact in the sink.
  pub fn program(&mut self) -> CompileResult<()> {
    self.emitter.header_line("#include <stdio.h>");
    self.emitter.header_line("int main(void){");

    while self.check(TokenKind::Newline) {
      self.advance()?;
    }

    while !self.check(TokenKind::Eof) {
      self.statement()?;
    }

    self.emitter.emit_line("return 0;");
    self.emitter.emit_line("}");

    self.check_goto_targets()
  }

  fn check(&self, kind: TokenKind) -> bool {
    self.current.kind == kind
  }

  /// Consume the current token and return it.
  fn advance(&mut self) -> CompileResult<Token> {
    let next = self.tokens.next_token()?;
    let lookahead = mem::replace(&mut self.peek, next);
    Ok(mem::replace(&mut self.current, lookahead))
  }

  /// Consume the current token if it has the given kind.
  fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
    if self.check(kind) {
      return self.advance();
    }
    Err(self.unexpected(&format!("\"{kind}\"")))
  }

  fn expect_ident(&mut self) -> CompileResult<Token> {
    if self.check(TokenKind::Ident) {
      return self.advance();
    }
    Err(self.unexpected("an identifier"))
  }

  /// An identifier that can stand for itself in the generated C: not a C
  /// keyword and not a name the artifact already uses.
  fn expect_name(&mut self) -> CompileResult<Token> {
    let name = self.expect_ident()?;
    if C_RESERVED.contains(&name.text.as_str()) {
      return Err(CompileError::semantic(
        name.loc,
        format!("\"{}\" is reserved in the generated C", name.text),
      ));
    }
    Ok(name)
  }

  fn unexpected(&self, wanted: &str) -> CompileError {
    let got = describe_token(&self.current);
    CompileError::syntax(
      self.current.loc,
      format!("expected {wanted}, but got \"{got}\""),
    )
  }

  fn not_supported(&self) -> CompileError {
    CompileError::syntax(self.current.loc, "NOT is not supported")
  }

  fn statement(&mut self) -> CompileResult<()> {
    debug!(
      "line {}: {} statement",
      self.current.loc.line, self.current.kind
    );

    match self.current.kind {
      TokenKind::Print => self.print()?,
      TokenKind::If => self.block_statement("if(", TokenKind::Then, TokenKind::Endif)?,
      TokenKind::While => {
        self.block_statement("while(", TokenKind::Repeat, TokenKind::Endwhile)?
      }
      TokenKind::Label => self.label()?,
      TokenKind::Goto => self.goto()?,
      TokenKind::Let => self.let_statement()?,
      TokenKind::Input => self.input()?,
      TokenKind::Not => return Err(self.not_supported()),
      _ => {
        let got = describe_token(&self.current);
        return Err(CompileError::syntax(
          self.current.loc,
          format!("invalid statement at \"{got}\""),
        ));
      }
    }

    self.nl()
  }

  // "PRINT" (expression | string)
  fn print(&mut self) -> CompileResult<()> {
    self.advance()?;

    if self.check(TokenKind::Str) {
      let text = self.advance()?.text;
      self.emitter.emit_line(&format!("printf(\"{text}\\n\");"));
      return Ok(());
    }

    self.emitter.emit("printf(\"%.2f\\n\", (float)(");
    self.expression()?;
    self.emitter.emit_line("));");
    Ok(())
  }

  // "IF" boolean_expr "THEN" nl {statement} "ENDIF"
  // "WHILE" boolean_expr "REPEAT" nl {statement} "ENDWHILE"
  fn block_statement(
    &mut self,
    opening: &str,
    body_keyword: TokenKind,
    closing: TokenKind,
  ) -> CompileResult<()> {
    self.advance()?;
    self.emitter.emit(opening);
    self.boolean_expr()?;

    self.expect(body_keyword)?;
    self.nl()?;
    self.emitter.emit_line("){");

    while !self.check(closing) {
      if self.check(TokenKind::Eof) {
        return Err(self.unexpected(&format!("\"{closing}\"")));
      }
      self.statement()?;
    }

    self.expect(closing)?;
    self.emitter.emit_line("}");
    Ok(())
  }

  // "LABEL" ident
  fn label(&mut self) -> CompileResult<()> {
    self.advance()?;
    let name = self.expect_name()?;

    if !self.labels_declared.insert(name.text.clone()) {
      return Err(CompileError::semantic(
        name.loc,
        format!("label already exists: {}", name.text),
      ));
    }

    // A bare `name:` before `}` is not a statement in C before C23.
    self.emitter.emit_line(&format!("{}:;", name.text));
    Ok(())
  }

  // "GOTO" ident
  fn goto(&mut self) -> CompileResult<()> {
    self.advance()?;
    let name = self.expect_name()?;

    self.emitter.emit_line(&format!("goto {};", name.text));
    if !self
      .labels_gotoed
      .iter()
      .any(|target| target.text == name.text)
    {
      self.labels_gotoed.push(name);
    }
    Ok(())
  }

  // "LET" ident "=" expression
  fn let_statement(&mut self) -> CompileResult<()> {
    self.advance()?;
    let name = self.expect_name()?;

    self.emitter.emit(&format!("{} = ", name.text));
    self.expect(TokenKind::Eq)?;
    self.expression()?;
    // The target only exists once the right-hand side has been read.
    self.declare(&name.text);
    self.emitter.emit_line(";");
    Ok(())
  }

  // "INPUT" ident
  fn input(&mut self) -> CompileResult<()> {
    self.advance()?;
    let name = self.expect_name()?;
    self.declare(&name.text);

    // On a failed read, zero the variable and drop the rest of the line so
    // the next INPUT starts on fresh input.
    let var = &name.text;
    self
      .emitter
      .emit_line(&format!("if(0 == scanf(\"%f\", &{var})) {{"));
    self.emitter.emit_line(&format!("{var} = 0;"));
    self.emitter.emit_line("scanf(\"%*[^\\n]\");");
    self.emitter.emit_line("}");
    Ok(())
  }

  /// Declarations are hoisted into the header the first time a name is
  /// assigned.
  fn declare(&mut self, name: &str) {
    if self.symbols.insert(name.to_string()) {
      self.emitter.header_line(&format!("float {name};"));
    }
  }

  // nl ::= NEWLINE+
  fn nl(&mut self) -> CompileResult<()> {
    self.expect(TokenKind::Newline)?;
    while self.check(TokenKind::Newline) {
      self.advance()?;
    }
    Ok(())
  }

  // boolean_expr ::= comparison {("AND" | "OR") comparison}
  fn boolean_expr(&mut self) -> CompileResult<()> {
    self.comparison()?;

    loop {
      let op = match self.current.kind {
        TokenKind::And => " && ",
        TokenKind::Or => " || ",
        TokenKind::Not => return Err(self.not_supported()),
        _ => break,
      };
      self.emitter.emit(op);
      self.advance()?;
      self.comparison()?;
    }

    Ok(())
  }

  // comparison ::= expression op expression, with exactly one operator
  fn comparison(&mut self) -> CompileResult<()> {
    self.expression()?;

    if !self.current.kind.is_comparison() {
      return Err(self.unexpected("a comparison operator"));
    }
    let op = self.advance()?;
    trace!("line {}: comparison {}", op.loc.line, op.text);
    self.emitter.emit(&op.text);
    self.expression()?;

    if self.current.kind.is_comparison() {
      return Err(CompileError::syntax(
        self.current.loc,
        format!(
          "comparisons cannot be chained; combine them with AND or OR instead of \"{}\"",
          self.current.text
        ),
      ));
    }
    Ok(())
  }

  // expression ::= term {("+" | "-") term}
  fn expression(&mut self) -> CompileResult<()> {
    self.term()?;
    while matches!(self.current.kind, TokenKind::Plus | TokenKind::Minus) {
      let op = self.advance()?;
      self.emitter.emit(&op.text);
      self.term()?;
    }
    Ok(())
  }

  // term ::= unary {("*" | "/") unary}
  fn term(&mut self) -> CompileResult<()> {
    self.unary()?;
    while matches!(self.current.kind, TokenKind::Star | TokenKind::Slash) {
      let op = self.advance()?;
      self.emitter.emit(&op.text);
      self.unary()?;
    }
    Ok(())
  }

  // unary ::= ["+" | "-"] primary
  fn unary(&mut self) -> CompileResult<()> {
    if matches!(self.current.kind, TokenKind::Plus | TokenKind::Minus) {
      let sign = self.advance()?;
      self.emitter.emit(&sign.text);
    }
    self.primary()
  }

  // primary ::= number | ident | "(" expression ")"
  fn primary(&mut self) -> CompileResult<()> {
    match self.current.kind {
      TokenKind::Number => {
        let number = self.advance()?;
        self.emitter.emit(&number.text);
      }
      TokenKind::Ident => {
        if !self.symbols.contains(&self.current.text) {
          return Err(CompileError::semantic(
            self.current.loc,
            format!(
              "referencing variable before assignment: {}",
              self.current.text
            ),
          ));
        }
        let ident = self.advance()?;
        self.emitter.emit(&ident.text);
      }
      TokenKind::LParen => {
        self.advance()?;
        self.emitter.emit("(");
        self.expression()?;
        self.expect(TokenKind::RParen)?;
        self.emitter.emit(")");
      }
      TokenKind::Not => return Err(self.not_supported()),
      _ => return Err(self.unexpected("an expression")),
    }
    Ok(())
  }

  // Every GOTO target must name a LABEL somewhere in the program.
  fn check_goto_targets(&self) -> CompileResult<()> {
    match self
      .labels_gotoed
      .iter()
      .find(|target| !self.labels_declared.contains(&target.text))
    {
      Some(target) => Err(CompileError::semantic(
        target.loc,
        format!("attempting to GOTO to undeclared label: {}", target.text),
      )),
      None => Ok(()),
    }
  }
}
