//! Lexical analysis: a pull-based scanner handing out one token at a time.
//!
//! The scanner knows nothing about grammar. It classifies keywords,
//! operators and literals, reports newlines as tokens (statements are
//! line-terminated), and ends every stream with `Eof`. Multi-character
//! operators are matched before single-character ones to avoid ambiguity.

use std::fmt;

use crate::error::{CompileError, CompileResult, Location};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
  Eof,
  Newline,
  Number,
  Ident,
  Str,
  // Keywords.
  Label,
  Goto,
  Print,
  Input,
  Let,
  If,
  Then,
  Endif,
  While,
  Repeat,
  Endwhile,
  And,
  Or,
  Not,
  // Operators.
  Eq,
  Plus,
  Minus,
  Star,
  Slash,
  EqEq,
  NotEq,
  Lt,
  LtEq,
  Gt,
  GtEq,
  LParen,
  RParen,
}

const KEYWORDS: [(&str, TokenKind); 14] = [
  ("LABEL", TokenKind::Label),
  ("GOTO", TokenKind::Goto),
  ("PRINT", TokenKind::Print),
  ("INPUT", TokenKind::Input),
  ("LET", TokenKind::Let),
  ("IF", TokenKind::If),
  ("THEN", TokenKind::Then),
  ("ENDIF", TokenKind::Endif),
  ("WHILE", TokenKind::While),
  ("REPEAT", TokenKind::Repeat),
  ("ENDWHILE", TokenKind::Endwhile),
  ("AND", TokenKind::And),
  ("OR", TokenKind::Or),
  ("NOT", TokenKind::Not),
];

// Two-byte operators first so `<=` never lexes as `<` `=`.
const OPERATORS: [(&str, TokenKind); 13] = [
  ("==", TokenKind::EqEq),
  ("!=", TokenKind::NotEq),
  ("<=", TokenKind::LtEq),
  (">=", TokenKind::GtEq),
  ("=", TokenKind::Eq),
  ("<", TokenKind::Lt),
  (">", TokenKind::Gt),
  ("+", TokenKind::Plus),
  ("-", TokenKind::Minus),
  ("*", TokenKind::Star),
  ("/", TokenKind::Slash),
  ("(", TokenKind::LParen),
  (")", TokenKind::RParen),
];

// Characters that would corrupt the emitted `printf` format string.
const ILLEGAL_IN_STRING: [u8; 5] = [b'\r', b'\n', b'\t', b'\\', b'%'];

impl TokenKind {
  /// Keyword for an exact, upper-case spelling.
  pub fn keyword(word: &str) -> Option<TokenKind> {
    KEYWORDS
      .iter()
      .find(|(spelling, _)| *spelling == word)
      .map(|(_, kind)| *kind)
  }

  pub fn is_comparison(self) -> bool {
    matches!(
      self,
      TokenKind::EqEq
        | TokenKind::NotEq
        | TokenKind::Lt
        | TokenKind::LtEq
        | TokenKind::Gt
        | TokenKind::GtEq
    )
  }
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let keyword = KEYWORDS.iter().find(|(_, kind)| kind == self);
    let operator = OPERATORS.iter().find(|(_, kind)| kind == self);
    match (keyword, operator, self) {
      (Some((spelling, _)), _, _) | (_, Some((spelling, _)), _) => f.write_str(spelling),
      (_, _, TokenKind::Eof) => f.write_str("EOF"),
      (_, _, TokenKind::Newline) => f.write_str("newline"),
      (_, _, TokenKind::Number) => f.write_str("a number"),
      (_, _, TokenKind::Ident) => f.write_str("an identifier"),
      (_, _, TokenKind::Str) => f.write_str("a string"),
      _ => write!(f, "{self:?}"),
    }
  }
}

/// A classified lexeme. `text` holds identifier names, number digits and
/// string contents (without the quotes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub text: String,
  pub loc: Location,
}

impl Token {
  pub fn new(kind: TokenKind, text: impl Into<String>, loc: Location) -> Self {
    Self {
      kind,
      text: text.into(),
      loc,
    }
  }
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: &Token) -> String {
  match token.kind {
    TokenKind::Eof => "EOF".to_string(),
    TokenKind::Newline => "newline".to_string(),
    TokenKind::Str => format!("\"{}\"", token.text),
    _ => token.text.clone(),
  }
}

/// Anything the parser can pull tokens from. Once `Eof` has been returned,
/// every later call returns `Eof` again.
pub trait TokenSource {
  fn next_token(&mut self) -> CompileResult<Token>;
}

/// Byte-oriented scanner over a complete source text.
pub struct Lexer<'a> {
  source: &'a str,
  pos: usize,
  line: usize,
  // Set after any token on the current line; a source that does not end in
  // a newline still gets one before `Eof`.
  line_open: bool,
}

impl<'a> Lexer<'a> {
  pub fn new(source: &'a str) -> Self {
    Self {
      source,
      pos: 0,
      line: 1,
      line_open: false,
    }
  }

  fn loc(&self, offset: usize) -> Location {
    Location::new(offset, self.line)
  }

  fn skip_blanks_and_comments(&mut self) {
    let bytes = self.source.as_bytes();
    while let Some(&c) = bytes.get(self.pos) {
      match c {
        b' ' | b'\t' | b'\r' => self.pos += 1,
        b'#' => {
          while bytes.get(self.pos).is_some_and(|&c| c != b'\n') {
            self.pos += 1;
          }
        }
        _ => break,
      }
    }
  }

  fn string(&mut self, start: usize) -> CompileResult<Token> {
    let bytes = self.source.as_bytes();
    let mut i = start + 1;
    loop {
      match bytes.get(i) {
        Some(b'"') => break,
        None | Some(b'\n') => {
          return Err(CompileError::lex(self.loc(start), "unterminated string"));
        }
        Some(c) if ILLEGAL_IN_STRING.contains(c) => {
          let shown = (*c as char).escape_default();
          return Err(CompileError::lex(
            self.loc(i),
            format!("illegal character in string: '{shown}'"),
          ));
        }
        Some(_) => i += 1,
      }
    }
    self.pos = i + 1;
    let text = &self.source[start + 1..i];
    Ok(Token::new(TokenKind::Str, text, self.loc(start)))
  }

  fn number(&mut self, start: usize) -> CompileResult<Token> {
    let bytes = self.source.as_bytes();
    let mut i = start + 1;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
      i += 1;
    }
    if bytes.get(i) == Some(&b'.') {
      i += 1;
      if !bytes.get(i).is_some_and(u8::is_ascii_digit) {
        return Err(CompileError::lex(
          self.loc(i),
          "expected a digit after the decimal point",
        ));
      }
      while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
      }
    }
    self.pos = i;
    Ok(Token::new(
      TokenKind::Number,
      &self.source[start..i],
      self.loc(start),
    ))
  }

  fn word(&mut self, start: usize) -> Token {
    let bytes = self.source.as_bytes();
    let mut i = start + 1;
    while bytes
      .get(i)
      .is_some_and(|c| c.is_ascii_alphanumeric() || *c == b'_')
    {
      i += 1;
    }
    self.pos = i;
    let text = &self.source[start..i];
    let kind = TokenKind::keyword(text).unwrap_or(TokenKind::Ident);
    Token::new(kind, text, self.loc(start))
  }
}

impl TokenSource for Lexer<'_> {
  fn next_token(&mut self) -> CompileResult<Token> {
    self.skip_blanks_and_comments();
    let start = self.pos;

    let Some(&c) = self.source.as_bytes().get(start) else {
      if self.line_open {
        self.line_open = false;
        return Ok(Token::new(TokenKind::Newline, "\n", self.loc(start)));
      }
      return Ok(Token::new(TokenKind::Eof, "", self.loc(start)));
    };

    if c == b'\n' {
      let token = Token::new(TokenKind::Newline, "\n", self.loc(start));
      self.pos += 1;
      self.line += 1;
      self.line_open = false;
      return Ok(token);
    }

    self.line_open = true;

    if c == b'"' {
      return self.string(start);
    }

    if c.is_ascii_digit() {
      return self.number(start);
    }

    if c.is_ascii_alphabetic() {
      return Ok(self.word(start));
    }

    if let Some((op, kind)) = OPERATORS
      .iter()
      .find(|(op, _)| self.source[start..].starts_with(op))
    {
      self.pos += op.len();
      return Ok(Token::new(*kind, *op, self.loc(start)));
    }

    let message = if c == b'!' {
      "expected \"!=\", but got \"!\"".to_string()
    } else {
      let invalid_char = self.source[start..].chars().next().unwrap_or('\0');
      format!("invalid token: '{invalid_char}'")
    };
    Err(CompileError::lex(self.loc(start), message))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rstest::rstest;

  /// Lex a whole source into a vector of tokens ending with `Eof`.
  fn tokenize(source: &str) -> CompileResult<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
      let token = lexer.next_token()?;
      let done = token.kind == TokenKind::Eof;
      tokens.push(token);
      if done {
        return Ok(tokens);
      }
    }
  }

  fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
      .expect("source should lex")
      .into_iter()
      .map(|token| token.kind)
      .collect()
  }

  #[test]
  fn lexes_a_let_statement() {
    let tokens = tokenize("LET foo = 3.25 * bar\n").unwrap();
    let summary: Vec<_> = tokens
      .iter()
      .map(|token| (token.kind, token.text.as_str()))
      .collect();
    assert_eq!(
      summary,
      vec![
        (TokenKind::Let, "LET"),
        (TokenKind::Ident, "foo"),
        (TokenKind::Eq, "="),
        (TokenKind::Number, "3.25"),
        (TokenKind::Star, "*"),
        (TokenKind::Ident, "bar"),
        (TokenKind::Newline, "\n"),
        (TokenKind::Eof, ""),
      ]
    );
  }

  #[rstest]
  #[case("==", TokenKind::EqEq)]
  #[case("!=", TokenKind::NotEq)]
  #[case("<=", TokenKind::LtEq)]
  #[case(">=", TokenKind::GtEq)]
  #[case("<", TokenKind::Lt)]
  #[case(">", TokenKind::Gt)]
  #[case("=", TokenKind::Eq)]
  #[case("(", TokenKind::LParen)]
  #[case(")", TokenKind::RParen)]
  fn operators_prefer_longest_match(#[case] source: &str, #[case] expected: TokenKind) {
    assert_eq!(
      kinds(source),
      vec![expected, TokenKind::Newline, TokenKind::Eof]
    );
  }

  #[rstest]
  #[case("WHILE", TokenKind::While)]
  #[case("ENDWHILE", TokenKind::Endwhile)]
  #[case("NOT", TokenKind::Not)]
  #[case("while", TokenKind::Ident)]
  #[case("PRINTX", TokenKind::Ident)]
  #[case("x_1", TokenKind::Ident)]
  fn keywords_are_exact_upper_case(#[case] source: &str, #[case] expected: TokenKind) {
    assert_eq!(kinds(source)[0], expected);
  }

  #[test]
  fn string_contents_exclude_quotes() {
    let tokens = tokenize("PRINT \"hello, world\"\n").unwrap();
    assert_eq!(tokens[1].kind, TokenKind::Str);
    assert_eq!(tokens[1].text, "hello, world");
  }

  #[test]
  fn comments_run_to_end_of_line() {
    assert_eq!(
      kinds("# header\nPRINT 1 # trailing\n"),
      vec![
        TokenKind::Newline,
        TokenKind::Print,
        TokenKind::Number,
        TokenKind::Newline,
        TokenKind::Eof,
      ]
    );
  }

  #[test]
  fn missing_final_newline_is_supplied() {
    assert_eq!(
      kinds("GOTO top"),
      vec![
        TokenKind::Goto,
        TokenKind::Ident,
        TokenKind::Newline,
        TokenKind::Eof
      ]
    );
    assert_eq!(kinds(""), vec![TokenKind::Eof]);
  }

  #[test]
  fn eof_repeats_once_exhausted() {
    let mut lexer = Lexer::new("\n");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Newline);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
  }

  #[test]
  fn tracks_lines_and_offsets() {
    let tokens = tokenize("PRINT 1\n\nLET x = 2\n").unwrap();
    let let_token = tokens
      .iter()
      .find(|token| token.kind == TokenKind::Let)
      .unwrap();
    assert_eq!(let_token.loc, Location::new(9, 3));
  }

  #[rstest]
  #[case("PRINT \"50%\"\n", "illegal character in string: '%'")]
  #[case("PRINT \"tab\there\"\n", "illegal character in string: '\\t'")]
  #[case("PRINT \"open\n", "unterminated string")]
  #[case("LET a = 1.\n", "expected a digit after the decimal point")]
  #[case("IF a ! b\n", "expected \"!=\", but got \"!\"")]
  #[case("LET a = $\n", "invalid token: '$'")]
  fn rejects_malformed_input(#[case] source: &str, #[case] message: &str) {
    let err = tokenize(source).unwrap_err();
    assert!(matches!(err, CompileError::Lex { .. }));
    assert_eq!(err.message(), message);
  }

  #[test]
  fn describes_tokens_for_diagnostics() {
    let loc = Location::default();
    assert_eq!(describe_token(&Token::new(TokenKind::Eof, "", loc)), "EOF");
    assert_eq!(
      describe_token(&Token::new(TokenKind::Str, "hi", loc)),
      "\"hi\""
    );
    assert_eq!(TokenKind::Endif.to_string(), "ENDIF");
    assert_eq!(TokenKind::GtEq.to_string(), ">=");
    assert_eq!(TokenKind::Ident.to_string(), "an identifier");
  }
}
