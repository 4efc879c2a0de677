use core::tokens::{LexErrorKind, Token, TokenKind};

use crate::Lexer;

impl<'a> Lexer<'a> {
  /// Lexes a double-quoted string literal, honoring `\"` and `\\`
  /// escapes. Unescaping happens here; the token carries the literal
  /// (already-unescaped) string value.
  pub(super) fn make_string_token(&mut self) -> Token {
    let mut value = String::new();

    loop {
      if self.is_at_end() {
        return self.make_error_token(LexErrorKind::UnterminatedString);
      }

      match self.get_current() {
        '"' => {
          self.advance();
          break;
        }
        '\\' => {
          self.advance();
          if self.is_at_end() {
            return self.make_error_token(LexErrorKind::UnterminatedString);
          }
          let escaped = self.advance();
          value.push(match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '"' => '"',
            '\\' => '\\',
            other => other,
          });
        }
        _ => value.push(self.advance()),
      }
    }

    self.make_token(TokenKind::Str(value))
  }
}
