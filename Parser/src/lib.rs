use std::rc::Rc;

use core::ast::AstArena;
use core::errors::{CompileError, Diagnostic, ErrorKind};
use core::tokens::{SrcLoc, TokenIdx, TokenKind, TokenList};

mod parse_declarations;
mod parse_expressions;
mod parse_statements;
#[cfg(test)]
mod tests;

/// If the current token matches any of the given `TokenKind` patterns,
/// consume it and evaluate to `true`.
#[macro_export]
macro_rules! match_tok {
  ($s:expr, $($pat:pat)|+) => {{
    if matches!($s.kind(), $($pat)|+) {
      $s.advance();
      true
    } else {
      false
    }
  }};
}

/// True if the current token matches any of the given `TokenKind` patterns.
#[macro_export]
macro_rules! check_tok {
  ($s:expr, $($pat:pat)|+) => {
    matches!($s.kind(), $($pat)|+)
  };
}

/// Fails fast the way the front-end's error model requires: the first
/// syntax or semantic error aborts compilation outright, so the parser
/// never accumulates an error list or tries to resynchronize.
pub type NodeResult<T> = Result<T, CompileError>;

/// Converts source text (already scanned into a [`TokenList`]) into an
/// [`AstArena`]. On the first malformed construct, parsing stops and
/// returns a `CompileError::Syntax`.
pub struct Parser<'a> {
  tokens: &'a TokenList<'a>,
  pos: TokenIdx,
  pub ast: AstArena,
  file: Rc<str>,
}

impl<'a> Parser<'a> {
  pub fn parse(tokens: &'a TokenList<'a>) -> NodeResult<(AstArena, core::ast::NodeIdx)> {
    let mut parser = Parser {
      tokens,
      pos: 0,
      ast: AstArena::default(),
      file: Rc::from(tokens.filename()),
    };

    let root = parser.parse_module()?;
    Ok((parser.ast, root))
  }

  fn parse_module(&mut self) -> NodeResult<core::ast::NodeIdx> {
    self.skip_separators();

    let loc = self.loc();
    let mut stmts = Vec::new();

    while !self.check(&TokenKind::Eof) {
      stmts.push(self.parse_stmt()?);
      if !self.check(&TokenKind::Eof) {
        self.at_least_one_separator()?;
      }
    }

    self.emit(core::ast::NodeKind::Script(stmts), loc)
  }

  /// Consumes any run of `Newline`/`Semicolon` separators.
  fn skip_separators(&mut self) {
    while check_tok!(self, TokenKind::Newline | TokenKind::Semicolon) {
      self.advance();
    }
  }

  fn at_least_one_separator(&mut self) -> NodeResult<()> {
    if !check_tok!(self, TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof | TokenKind::RBrace) {
      return Err(self.error_at_current("Expected a newline or ';' after statement."));
    }
    self.skip_separators();
    Ok(())
  }

  fn tok(&self, idx: TokenIdx) -> &core::tokens::Token {
    &self.tokens[idx]
  }

  fn current(&self) -> &core::tokens::Token {
    self.tok(self.pos)
  }

  fn kind(&self) -> &TokenKind {
    &self.current().kind
  }

  fn loc(&self) -> SrcLoc {
    self.current().loc
  }

  fn lexeme(&self) -> &str {
    self.tokens.lexeme(self.pos)
  }

  fn check(&self, tk: &TokenKind) -> bool {
    self.kind().type_match(tk)
  }

  fn advance(&mut self) -> TokenIdx {
    let idx = self.pos;
    if !self.kind().is_eof() {
      self.pos += 1;
    }
    idx
  }

  fn consume(&mut self, tk: &TokenKind, message: &str) -> NodeResult<TokenIdx> {
    if self.check(tk) {
      Ok(self.advance())
    } else {
      Err(self.error_at_current(message))
    }
  }

  fn consume_ident(&mut self, message: &str) -> NodeResult<String> {
    match self.kind().clone() {
      TokenKind::Ident(name) => {
        self.advance();
        Ok(name)
      }
      _ => Err(self.error_at_current(message)),
    }
  }

  pub(crate) fn emit(&mut self, node: core::ast::NodeKind, loc: SrcLoc) -> NodeResult<core::ast::NodeIdx> {
    Ok(self.ast.push(node, self.file.clone(), loc))
  }

  fn error_at_current(&self, message: &str) -> CompileError {
    self.error_at(self.pos, message)
  }

  fn error_at(&self, idx: TokenIdx, message: &str) -> CompileError {
    let tok = self.tok(idx);
    CompileError::Syntax(Diagnostic::new(self.file.to_string(), tok.loc, ErrorKind::SyntaxError, message))
  }
}
