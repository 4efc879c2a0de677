use core::ast::{ForNode, IfNode, NodeIdx, NodeKind, WhileNode};
use core::tokens::TokenKind;

use crate::{NodeResult, Parser};

impl<'a> Parser<'a> {
  /// Parses one statement.
  ///
  /// ```bnf
  /// stmt = block | var | proc | iterator | object | while | for
  ///      | "break" | "continue" | return | yield | expr
  /// ```
  pub(crate) fn parse_stmt(&mut self) -> NodeResult<NodeIdx> {
    match self.kind().clone() {
      TokenKind::LBrace => {
        self.advance();
        self.parse_block()
      }
      TokenKind::Var | TokenKind::Let => self.parse_var_decl(),
      TokenKind::Proc => self.parse_proc_decl(),
      TokenKind::IteratorKw => self.parse_iterator_decl(),
      TokenKind::ObjectKw => self.parse_object_decl(),
      TokenKind::While => self.parse_while_stmt(),
      TokenKind::For => self.parse_for_stmt(),
      TokenKind::Break => {
        let loc = self.loc();
        self.advance();
        self.emit(NodeKind::BreakStmt, loc)
      }
      TokenKind::Continue => {
        let loc = self.loc();
        self.advance();
        self.emit(NodeKind::ContinueStmt, loc)
      }
      TokenKind::Return => self.parse_return_stmt(),
      TokenKind::Yield => self.parse_yield_stmt(),
      _ => self.parse_expr_stmt(),
    }
  }

  /// A statement that's just an expression evaluated for its side
  /// effects (or an assignment -- assignment is itself an expression
  /// form, see [`Parser::parse_assignment_or_expr`]).
  fn parse_expr_stmt(&mut self) -> NodeResult<NodeIdx> {
    let loc = self.loc();
    let expr = self.parse_assignment_or_expr()?;
    self.emit(NodeKind::ExprStmt(expr), loc)
  }

  /// ```bnf
  /// block = "{" { stmt linefeed } [ stmt ] "}"
  /// ```
  pub(crate) fn parse_block(&mut self) -> NodeResult<NodeIdx> {
    let loc = self.loc();
    self.skip_separators();

    let mut stmts = Vec::new();
    while !check_tok!(self, TokenKind::RBrace) {
      stmts.push(self.parse_stmt()?);
      if !check_tok!(self, TokenKind::RBrace) {
        self.at_least_one_separator()?;
      }
    }

    self.consume(&TokenKind::RBrace, "Expected '}' to close block.")?;
    self.emit(NodeKind::Block(stmts), loc)
  }

  /// ```bnf
  /// if = "if" expr block {"elif" expr block} ["else" block]
  /// ```
  pub(crate) fn parse_if(&mut self) -> NodeResult<NodeIdx> {
    let loc = self.loc();
    self.advance(); // 'if'

    let cond = self.parse_assignment_or_expr()?;
    self.consume(&TokenKind::LBrace, "Expected '{' after 'if' condition.")?;
    let then_branch = self.parse_block()?;

    let mut elifs = Vec::new();
    while check_tok!(self, TokenKind::Elif) {
      self.advance();
      let elif_cond = self.parse_assignment_or_expr()?;
      self.consume(&TokenKind::LBrace, "Expected '{' after 'elif' condition.")?;
      let elif_body = self.parse_block()?;
      elifs.push((elif_cond, elif_body));
    }

    let else_branch = if check_tok!(self, TokenKind::Else) {
      self.advance();
      self.consume(&TokenKind::LBrace, "Expected '{' after 'else'.")?;
      Some(self.parse_block()?)
    } else {
      None
    };

    self.emit(
      NodeKind::IfExpr(IfNode {
        cond,
        then_branch,
        elifs,
        else_branch,
      }),
      loc,
    )
  }

  /// ```bnf
  /// while = "while" expr block
  /// ```
  fn parse_while_stmt(&mut self) -> NodeResult<NodeIdx> {
    let loc = self.loc();
    self.advance(); // 'while'

    let cond = self.parse_assignment_or_expr()?;
    self.consume(&TokenKind::LBrace, "Expected '{' after 'while' condition.")?;
    let body = self.parse_block()?;

    self.emit(NodeKind::WhileStmt(WhileNode { cond, body }), loc)
  }

  /// ```bnf
  /// for = "for" ident "in" expr block
  /// ```
  fn parse_for_stmt(&mut self) -> NodeResult<NodeIdx> {
    let loc = self.loc();
    self.advance(); // 'for'

    let loop_var = self.consume_ident("Expected loop variable name after 'for'.")?;
    self.consume(&TokenKind::In, "Expected 'in' after 'for' loop variable.")?;
    let iter_call = self.parse_expr(core::tokens::PREC_CALL)?;
    self.consume(&TokenKind::LBrace, "Expected '{' after 'for' iterator expression.")?;
    let body = self.parse_block()?;

    self.emit(NodeKind::ForStmt(ForNode { loop_var, iter_call, body }), loc)
  }

  /// ```bnf
  /// return = "return" [ expr ]
  /// ```
  fn parse_return_stmt(&mut self) -> NodeResult<NodeIdx> {
    let loc = self.loc();
    self.advance(); // 'return'

    let value = if self.stmt_is_terminated() {
      None
    } else {
      Some(self.parse_assignment_or_expr()?)
    };

    self.emit(NodeKind::ReturnStmt(value), loc)
  }

  /// ```bnf
  /// yield = "yield" expr
  /// ```
  fn parse_yield_stmt(&mut self) -> NodeResult<NodeIdx> {
    let loc = self.loc();
    self.advance(); // 'yield'
    let value = self.parse_assignment_or_expr()?;
    self.emit(NodeKind::YieldStmt(value), loc)
  }

  /// True if the current token could terminate a statement (used to
  /// tell `return` with a value apart from a bare `return`).
  fn stmt_is_terminated(&self) -> bool {
    check_tok!(self, TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof | TokenKind::RBrace)
  }
}
