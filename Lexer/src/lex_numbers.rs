use core::tokens::{LexErrorKind, Token, TokenKind};
use core::utils::parse_number_lexeme;

use crate::Lexer;

impl<'a> Lexer<'a> {
  /// Lexes a numeric literal:
  /// `DIGIT+ ("." DIGIT+)? (("e"|"E") "-"? DIGIT+)?`, with `_` allowed
  /// anywhere as a digit-group separator.
  pub(super) fn make_number_token(&mut self) -> Token {
    while !self.is_at_end() && (self.get_current().is_ascii_digit() || self.get_current() == '_') {
      self.advance();
    }

    if self.get_current() == '.' && self.get_next().is_ascii_digit() {
      self.advance();
      while !self.is_at_end() && (self.get_current().is_ascii_digit() || self.get_current() == '_') {
        self.advance();
      }
    }

    if matches!(self.get_current(), 'e' | 'E') {
      let lookahead_digit = self.get_next().is_ascii_digit() || (self.get_next() == '-' && self.source.get(self.current + 2).map_or(false, |c| c.is_ascii_digit()));
      if lookahead_digit {
        self.advance();
        if self.get_current() == '-' {
          self.advance();
        }
        while !self.is_at_end() && self.get_current().is_ascii_digit() {
          self.advance();
        }
      }
    }

    let lexeme: String = self.source[self.token_start..self.current].iter().collect();
    match parse_number_lexeme(&lexeme) {
      Ok(n) => self.make_token(TokenKind::Number(n)),
      Err(_) => self.make_error_token(LexErrorKind::MalformedNumber),
    }
  }
}
