use core::tokens::{keyword_kind, is_reserved_lexeme, operator_precedence, LexErrorKind, OperatorTok, SrcLoc, Token, TokenKind, OPERATOR_CHARS};

mod lex_numbers;
mod lex_operators;
mod lex_strings;

/// Returns true for characters that can start an identifier or keyword.
fn char_is_ident_start(c: char) -> bool {
  c.is_alphabetic() || c == '_'
}

fn char_is_ident_cont(c: char) -> bool {
  c.is_alphanumeric() || c == '_'
}

/// Scans a single compilation unit into a flat token stream.
///
/// Tracks character position, `(line, col)`, and bracket-nesting depth,
/// the last of which decides whether a raw `\n` becomes a `Newline`
/// token: inside `()`/`[]` a newline is just whitespace, matching the
/// language's line-sensitive statement grammar.
pub struct Lexer<'a> {
  source: &'a [char],
  byte_offsets: &'a [usize],
  tokens: Vec<Token>,
  current: usize,
  line: u32,
  col: u32,
  token_start: usize,
  token_start_loc: SrcLoc,
  bracket_depth: i32,
}

impl<'a> Lexer<'a> {
  /// Scans `source`'s chars (paired with each char's byte offset into the
  /// original source string, for span slicing) into a token stream.
  pub fn lex(source: &'a [char], byte_offsets: &'a [usize]) -> Vec<Token> {
    let mut lexer = Lexer {
      source,
      byte_offsets,
      tokens: Vec::new(),
      current: 0,
      line: 1,
      col: 1,
      token_start: 0,
      token_start_loc: SrcLoc { line: 1, col: 1 },
      bracket_depth: 0,
    };

    lexer.run();
    lexer.tokens
  }

  fn run(&mut self) {
    loop {
      self.skip_whitespace_and_comments();

      if self.is_at_end() {
        self.emit_eof();
        break;
      }

      self.token_start = self.current;
      self.token_start_loc = SrcLoc { line: self.line, col: self.col };

      let c = self.advance();
      let tok = self.scan_from(c);
      self.tokens.push(tok);
    }
  }

  fn scan_from(&mut self, c: char) -> Token {
    match c {
      '(' => {
        self.bracket_depth += 1;
        self.make_token(TokenKind::LParen)
      }
      ')' => {
        self.bracket_depth -= 1;
        self.make_token(TokenKind::RParen)
      }
      '[' => {
        self.bracket_depth += 1;
        self.make_token(TokenKind::LBracket)
      }
      ']' => {
        self.bracket_depth -= 1;
        self.make_token(TokenKind::RBracket)
      }
      '{' => self.make_token(TokenKind::LBrace),
      '}' => self.make_token(TokenKind::RBrace),
      ',' => self.make_token(TokenKind::Comma),
      ';' => self.make_token(TokenKind::Semicolon),
      '"' => self.make_string_token(),
      c if c.is_ascii_digit() => self.make_number_token(),
      c if char_is_ident_start(c) => self.make_identifier_token(),
      c if OPERATOR_CHARS.contains(c) => self.make_operator_token(),
      c => self.make_error_token(LexErrorKind::InvalidChar(c)),
    }
  }

  fn is_at_end(&self) -> bool {
    self.current >= self.source.len()
  }

  fn get_current(&self) -> char {
    if self.is_at_end() {
      '\0'
    } else {
      self.source[self.current]
    }
  }

  fn get_next(&self) -> char {
    if self.current + 1 >= self.source.len() {
      '\0'
    } else {
      self.source[self.current + 1]
    }
  }

  fn get_previous(&self) -> char {
    self.source[self.current - 1]
  }

  fn advance(&mut self) -> char {
    let c = self.source[self.current];
    self.current += 1;

    if c == '\n' {
      self.line += 1;
      self.col = 1;
    } else {
      self.col += 1;
    }

    c
  }

  fn matches(&mut self, expected: char) -> bool {
    if self.get_current() != expected {
      return false;
    }
    self.advance();
    true
  }

  fn skip_whitespace_and_comments(&mut self) {
    loop {
      match self.get_current() {
        ' ' | '\r' | '\t' => {
          self.advance();
        }
        '/' if self.get_next() == '/' => self.skip_line_comment(),
        '/' if self.get_next() == '*' => self.skip_block_comment(),
        '\n' => self.consume_newline_run(),
        _ => break,
      }
    }
  }

  fn skip_line_comment(&mut self) {
    while !self.is_at_end() && self.get_current() != '\n' {
      self.advance();
    }
  }

  fn skip_block_comment(&mut self) {
    self.advance();
    self.advance();
    let mut depth = 1;

    while !self.is_at_end() && depth > 0 {
      if self.get_current() == '/' && self.get_next() == '*' {
        self.advance();
        self.advance();
        depth += 1;
      } else if self.get_current() == '*' && self.get_next() == '/' {
        self.advance();
        self.advance();
        depth -= 1;
      } else {
        self.advance();
      }
    }
  }

  /// Collapses an entire run of newlines (and the whitespace between
  /// them) into at most one `Newline` token, and only when not nested
  /// inside `()`/`[]`.
  fn consume_newline_run(&mut self) {
    let start_loc = SrcLoc { line: self.line, col: self.col };
    let mut saw_newline = false;

    loop {
      match self.get_current() {
        '\n' => {
          self.advance();
          saw_newline = true;
        }
        ' ' | '\r' | '\t' => {
          self.advance();
        }
        '/' if self.get_next() == '/' => self.skip_line_comment(),
        '/' if self.get_next() == '*' => self.skip_block_comment(),
        _ => break,
      }
    }

    if saw_newline && self.bracket_depth <= 0 {
      if !matches!(self.tokens.last().map(|t| &t.kind), None | Some(TokenKind::Newline)) {
        self.tokens.push(Token::new(TokenKind::Newline, start_loc, (self.byte_offset(self.current), self.byte_offset(self.current))));
      }
    }
  }

  fn byte_offset(&self, char_idx: usize) -> usize {
    self.byte_offsets[char_idx.min(self.byte_offsets.len() - 1)]
  }

  fn span(&self) -> (usize, usize) {
    (self.byte_offset(self.token_start), self.byte_offset(self.current))
  }

  fn make_token(&self, kind: TokenKind) -> Token {
    Token::new(kind, self.token_start_loc, self.span())
  }

  fn make_error_token(&self, err: LexErrorKind) -> Token {
    Token::new(TokenKind::Error(err), self.token_start_loc, self.span())
  }

  fn emit_eof(&mut self) {
    let loc = SrcLoc { line: self.line, col: self.col };
    let end = self.byte_offsets[self.byte_offsets.len() - 1];
    self.tokens.push(Token::new(TokenKind::Eof, loc, (end, end)));
  }

  fn make_identifier_token(&mut self) -> Token {
    while !self.is_at_end() && char_is_ident_cont(self.get_current()) {
      self.advance();
    }

    let lexeme: String = self.source[self.token_start..self.current].iter().collect();
    match keyword_kind(&lexeme) {
      Some(kind) => self.make_token(kind),
      None => self.make_token(TokenKind::Ident(lexeme)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn lex_str(src: &str) -> Vec<Token> {
    let chars: Vec<char> = src.chars().collect();
    let mut offsets: Vec<usize> = src.char_indices().map(|(i, _)| i).collect();
    offsets.push(src.len());
    Lexer::lex(&chars, &offsets)
  }

  #[test]
  fn lexes_keywords_and_idents() {
    let toks = lex_str("var x = 1");
    assert!(matches!(toks[0].kind, TokenKind::Var));
    assert!(matches!(toks[1].kind, TokenKind::Ident(ref s) if s == "x"));
    assert!(matches!(toks[2].kind, TokenKind::Equals));
    assert!(matches!(toks[3].kind, TokenKind::Number(n) if n == 1.0));
    assert!(matches!(toks[4].kind, TokenKind::Eof));
  }

  #[test]
  fn collapses_blank_lines_into_one_newline() {
    let toks = lex_str("let x = 1\n\n\nlet y = 2");
    let newline_count = toks.iter().filter(|t| matches!(t.kind, TokenKind::Newline)).count();
    assert_eq!(newline_count, 1);
  }

  #[test]
  fn suppresses_newlines_inside_parens() {
    let toks = lex_str("f(\n  1,\n  2\n)");
    assert!(!toks.iter().any(|t| matches!(t.kind, TokenKind::Newline)));
  }

  #[test]
  fn reserved_lexemes_are_not_operators() {
    assert!(is_reserved_lexeme("."));
    assert!(is_reserved_lexeme("="));
    assert!(is_reserved_lexeme(":"));
    assert!(is_reserved_lexeme("::"));
  }

  #[test]
  fn operator_precedence_table_smoke_test() {
    assert_eq!(operator_precedence("+"), (8, true));
    assert_eq!(operator_precedence("^"), (10, false));
    let op = OperatorTok { lexeme: "+".into(), precedence: 8, left_assoc: true };
    assert_eq!(op.precedence, 8);
  }
}
