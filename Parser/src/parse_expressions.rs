use core::ast::{AssignNode, CallNode, ColonExprNode, DotNode, IndexNode, InfixNode, NodeIdx, NodeKind, PrefixNode, ProcTypeNode};
use core::tokens::{OperatorTok, TokenKind, PREC_ASSIGNMENT, PREC_COLON_EXPR};

use crate::{NodeResult, Parser};

/// Binding power used for the prefix `-`/`!` family. Sits above every
/// user-definable binary operator, below postfix call/index/dot.
const PREC_UNARY: i32 = 9;

impl<'a> Parser<'a> {
  /// Parses a full expression, optionally followed by `= value` for an
  /// assignment. Assignment binds weaker than anything else and is
  /// right-associative, so it's handled as a thin wrapper rather than a
  /// Pratt-table entry.
  pub(crate) fn parse_assignment_or_expr(&mut self) -> NodeResult<NodeIdx> {
    let loc = self.loc();
    let target = self.parse_expr(PREC_ASSIGNMENT + 1)?;

    if check_tok!(self, TokenKind::Equals) {
      self.advance();
      let value = self.parse_assignment_or_expr()?;
      return self.emit(NodeKind::Assign(AssignNode { target, value }), loc);
    }

    Ok(target)
  }

  /// Pratt-parses an expression: a prefix production followed by zero or
  /// more infix productions whose precedence is at least `min_prec`.
  pub(crate) fn parse_expr(&mut self, min_prec: i32) -> NodeResult<NodeIdx> {
    let mut left = self.parse_prefix()?;

    loop {
      let Some((prec, left_assoc, lexeme)) = self.peek_infix_op() else { break };
      if prec < min_prec {
        break;
      }

      let loc = self.loc();
      self.advance();
      let next_min = if left_assoc { prec + 1 } else { prec };
      let right = self.parse_expr(next_min)?;

      left = match lexeme.as_str() {
        "&&" => self.emit(NodeKind::LogicAnd(InfixNode { op: lexeme, left, right }), loc)?,
        "||" => self.emit(NodeKind::LogicOr(InfixNode { op: lexeme, left, right }), loc)?,
        _ => self.emit(NodeKind::Infix(InfixNode { op: lexeme, left, right }), loc)?,
      };
    }

    Ok(left)
  }

  fn peek_infix_op(&self) -> Option<(i32, bool, String)> {
    match self.kind() {
      TokenKind::Operator(OperatorTok { lexeme, precedence, left_assoc }) => Some((*precedence, *left_assoc, lexeme.clone())),
      _ => None,
    }
  }

  fn parse_prefix(&mut self) -> NodeResult<NodeIdx> {
    let loc = self.loc();

    if let TokenKind::Operator(op) = self.kind().clone() {
      if op.lexeme == "-" || op.lexeme == "!" {
        self.advance();
        let operand = self.parse_expr(PREC_UNARY)?;
        return self.emit(NodeKind::Prefix(PrefixNode { op: op.lexeme, operand }), loc);
      }
    }

    if check_tok!(self, TokenKind::If) {
      let node = self.parse_if()?;
      return self.parse_postfix(node);
    }

    let primary = self.parse_primary()?;
    self.parse_postfix(primary)
  }

  /// Consumes the left-extension productions (call, generic-index,
  /// field access) that bind tighter than every user-definable operator.
  fn parse_postfix(&mut self, mut node: NodeIdx) -> NodeResult<NodeIdx> {
    loop {
      let loc = self.loc();
      node = match self.kind() {
        TokenKind::LParen => {
          self.advance();
          let args = self.parse_call_args()?;
          self.consume(&TokenKind::RParen, "Expected ')' after arguments.")?;
          self.emit(NodeKind::Call(CallNode { callee: node, args }), loc)?
        }
        TokenKind::LBracket => {
          self.advance();
          let args = self.parse_type_arg_list()?;
          self.consume(&TokenKind::RBracket, "Expected ']' after generic arguments.")?;
          self.emit(NodeKind::Index(IndexNode { target: node, args }), loc)?
        }
        TokenKind::Dot => {
          self.advance();
          let field = self.consume_ident("Expected a field name after '.'.")?;
          self.emit(NodeKind::Dot(DotNode { target: node, field }), loc)?
        }
        _ => break,
      };
    }
    Ok(node)
  }

  fn parse_call_args(&mut self) -> NodeResult<Vec<NodeIdx>> {
    let mut args = Vec::new();
    if check_tok!(self, TokenKind::RParen) {
      return Ok(args);
    }

    loop {
      args.push(self.parse_call_arg()?);
      if !match_tok!(self, TokenKind::Comma) {
        break;
      }
    }
    Ok(args)
  }

  /// One call argument: either a plain expression, or `name: value` -- a
  /// field initializer when this call turns out to be an object
  /// constructor.
  fn parse_call_arg(&mut self) -> NodeResult<NodeIdx> {
    let loc = self.loc();
    let candidate = self.parse_expr(PREC_COLON_EXPR + 1)?;

    if check_tok!(self, TokenKind::Colon) {
      self.advance();
      let value = self.parse_expr(PREC_ASSIGNMENT + 1)?;
      return self.emit(NodeKind::ColonExpr(ColonExprNode { name: candidate, value }), loc);
    }

    Ok(candidate)
  }

  fn parse_type_arg_list(&mut self) -> NodeResult<Vec<NodeIdx>> {
    let mut args = Vec::new();
    if check_tok!(self, TokenKind::RBracket) {
      return Ok(args);
    }

    loop {
      args.push(self.parse_type_expr()?);
      if !match_tok!(self, TokenKind::Comma) {
        break;
      }
    }
    Ok(args)
  }

  /// Types are parsed with the same grammar as expressions: a plain
  /// identifier, a generic instantiation (`list[number]`), or an
  /// anonymous procedure type (`proc(number) -> bool`).
  pub(crate) fn parse_type_expr(&mut self) -> NodeResult<NodeIdx> {
    let loc = self.loc();

    if check_tok!(self, TokenKind::Proc) {
      self.advance();
      self.consume(&TokenKind::LParen, "Expected '(' after 'proc' in a procedure type.")?;
      let mut param_tys = Vec::new();
      if !check_tok!(self, TokenKind::RParen) {
        loop {
          param_tys.push(self.parse_type_expr()?);
          if !match_tok!(self, TokenKind::Comma) {
            break;
          }
        }
      }
      self.consume(&TokenKind::RParen, "Expected ')' after procedure type's parameters.")?;

      let ret_ty = if let TokenKind::Operator(op) = self.kind().clone() {
        if op.lexeme == "->" {
          self.advance();
          Some(self.parse_type_expr()?)
        } else {
          None
        }
      } else {
        None
      };

      return self.emit(NodeKind::ProcType(ProcTypeNode { param_tys, ret_ty }), loc);
    }

    let primary = self.parse_primary()?;
    self.parse_postfix(primary)
  }

  fn parse_primary(&mut self) -> NodeResult<NodeIdx> {
    let loc = self.loc();

    let node = match self.kind().clone() {
      TokenKind::Number(n) => {
        self.advance();
        self.emit(NodeKind::NumberLit(n), loc)?
      }
      TokenKind::Str(s) => {
        self.advance();
        self.emit(NodeKind::StringLit(s), loc)?
      }
      TokenKind::True => {
        self.advance();
        self.emit(NodeKind::BoolLit(true), loc)?
      }
      TokenKind::False => {
        self.advance();
        self.emit(NodeKind::BoolLit(false), loc)?
      }
      TokenKind::Null => {
        self.advance();
        self.emit(NodeKind::NullLit, loc)?
      }
      TokenKind::Ident(name) => {
        self.advance();
        self.emit(NodeKind::Ident(name), loc)?
      }
      TokenKind::LParen => {
        self.advance();
        let inner = self.parse_assignment_or_expr()?;
        self.consume(&TokenKind::RParen, "Expected ')' after expression.")?;
        inner
      }
      TokenKind::Error(e) => return Err(self.error_at_current(&e.to_str())),
      _ => return Err(self.error_at_current("Expected an expression.")),
    };

    Ok(node)
  }
}
