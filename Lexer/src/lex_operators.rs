use core::tokens::{is_reserved_lexeme, operator_precedence, OperatorTok, Token, TokenKind, OPERATOR_CHARS};

use crate::Lexer;

impl<'a> Lexer<'a> {
  /// Greedily consumes a run of [`OPERATOR_CHARS`] and classifies it: the
  /// four reserved lexemes (`.`, `=`, `:`, `::`) become their own fixed
  /// token kind, everything else becomes a user-definable `Operator`
  /// token whose precedence is resolved from its lexeme.
  pub(super) fn make_operator_token(&mut self) -> Token {
    while !self.is_at_end() && OPERATOR_CHARS.contains(self.get_current()) {
      self.advance();
    }

    let lexeme: String = self.source[self.token_start..self.current].iter().collect();

    if is_reserved_lexeme(&lexeme) {
      let kind = match lexeme.as_str() {
        "." => TokenKind::Dot,
        "=" => TokenKind::Equals,
        ":" => TokenKind::Colon,
        "::" => TokenKind::ColonColon,
        _ => unreachable!("is_reserved_lexeme covers exactly these four lexemes"),
      };
      return self.make_token(kind);
    }

    let (precedence, left_assoc) = operator_precedence(&lexeme);
    self.make_token(TokenKind::Operator(OperatorTok { lexeme, precedence, left_assoc }))
  }
}
