use core::ast::{GenericParamDecl, IteratorDeclNode, NodeIdx, NodeKind, ObjectDeclNode, Param, ProcDeclNode, VarDeclNode};
use core::tokens::TokenKind;

use crate::{NodeResult, Parser};

impl<'a> Parser<'a> {
  /// ```bnf
  /// var         = ("var"|"let") identDefs
  /// identDefs   = Ident {"," Ident} [ ":" type ] [ "=" expr ]
  /// ```
  pub(crate) fn parse_var_decl(&mut self) -> NodeResult<NodeIdx> {
    let loc = self.loc();
    let is_let = check_tok!(self, TokenKind::Let);
    self.advance(); // 'var' | 'let'

    let mut names = vec![self.consume_ident("Expected a variable name.")?];
    while match_tok!(self, TokenKind::Comma) {
      names.push(self.consume_ident("Expected a variable name.")?);
    }

    let ty = if match_tok!(self, TokenKind::Colon) {
      Some(self.parse_type_expr()?)
    } else {
      None
    };

    // An initializer-less declaration is syntactically well-formed;
    // `VarMustHaveValue` is a semantic check the generator raises when
    // `value` turns out to be `None`.
    let value = if match_tok!(self, TokenKind::Equals) {
      Some(self.parse_assignment_or_expr()?)
    } else {
      None
    };

    self.emit(
      NodeKind::VarDecl(VarDeclNode {
        is_let,
        names,
        ty,
        value,
      }),
      loc,
    )
  }

  /// ```bnf
  /// genericParams = "[" Ident [":" type] {"," Ident [":" type]} "]"
  /// ```
  fn parse_generic_params(&mut self) -> NodeResult<Vec<GenericParamDecl>> {
    if !match_tok!(self, TokenKind::LBracket) {
      return Ok(Vec::new());
    }

    let mut generics = Vec::new();
    loop {
      let name = self.consume_ident("Expected a generic parameter name.")?;
      let constraint = if match_tok!(self, TokenKind::Colon) {
        Some(self.parse_type_expr()?)
      } else {
        None
      };
      generics.push(GenericParamDecl { name, constraint });

      if !match_tok!(self, TokenKind::Comma) {
        break;
      }
    }

    self.consume(&TokenKind::RBracket, "Expected ']' after generic parameters.")?;
    Ok(generics)
  }

  /// ```bnf
  /// params = "(" [ Ident ":" type {"," Ident ":" type} ] ")"
  /// ```
  fn parse_params(&mut self) -> NodeResult<Vec<Param>> {
    self.consume(&TokenKind::LParen, "Expected '(' to start a parameter list.")?;

    let mut params = Vec::new();
    if !check_tok!(self, TokenKind::RParen) {
      loop {
        let name = self.consume_ident("Expected a parameter name.")?;
        self.consume(&TokenKind::Colon, "Expected ':' and a type after a parameter name.")?;
        let ty = self.parse_type_expr()?;
        params.push(Param { name, ty });

        if !match_tok!(self, TokenKind::Comma) {
          break;
        }
      }
    }

    self.consume(&TokenKind::RParen, "Expected ')' after parameter list.")?;
    Ok(params)
  }

  /// ```bnf
  /// proc = "proc" Ident genericParams? params [ "->" type ] block
  /// ```
  pub(crate) fn parse_proc_decl(&mut self) -> NodeResult<NodeIdx> {
    let loc = self.loc();
    self.advance(); // 'proc'

    let name = self.consume_ident("Expected a procedure name after 'proc'.")?;
    let generics = self.parse_generic_params()?;
    let params = self.parse_params()?;

    let ret_ty = if self.match_arrow() {
      Some(self.parse_type_expr()?)
    } else {
      None
    };

    self.consume(&TokenKind::LBrace, "Expected '{' to start a procedure body.")?;
    let body = self.parse_block()?;

    self.emit(
      NodeKind::ProcDecl(ProcDeclNode {
        name,
        generics,
        params,
        ret_ty,
        body,
      }),
      loc,
    )
  }

  /// ```bnf
  /// iterator = "iterator" Ident genericParams? params "->" type block
  /// ```
  pub(crate) fn parse_iterator_decl(&mut self) -> NodeResult<NodeIdx> {
    let loc = self.loc();
    self.advance(); // 'iterator'

    let name = self.consume_ident("Expected an iterator name after 'iterator'.")?;
    let generics = self.parse_generic_params()?;
    let params = self.parse_params()?;

    if !self.match_arrow() {
      return Err(self.error_at_current("Iterators must declare the type they yield with '-> type'."));
    }
    let yield_ty = self.parse_type_expr()?;

    self.consume(&TokenKind::LBrace, "Expected '{' to start an iterator body.")?;
    let body = self.parse_block()?;

    self.emit(
      NodeKind::IteratorDecl(IteratorDeclNode {
        name,
        generics,
        params,
        yield_ty,
        body,
      }),
      loc,
    )
  }

  /// ```bnf
  /// object     = "object" Ident genericParams? "{" { fieldGroup linefeed } [ fieldGroup ] "}"
  /// fieldGroup = Ident {"," Ident} ":" type
  /// ```
  ///
  /// A field group's names share one trailing type, exactly like a `var`
  /// declaration's `identDefs` (so `a, b: number` declares two fields of
  /// type `number`); groups themselves are separated the same way
  /// statements are, by linefeed.
  pub(crate) fn parse_object_decl(&mut self) -> NodeResult<NodeIdx> {
    let loc = self.loc();
    self.advance(); // 'object'

    let name = self.consume_ident("Expected an object type name after 'object'.")?;
    let generics = self.parse_generic_params()?;

    self.consume(&TokenKind::LBrace, "Expected '{' to start an object's field list.")?;
    self.skip_separators();

    let mut fields = Vec::new();
    while !check_tok!(self, TokenKind::RBrace) {
      let mut names = vec![self.consume_ident("Expected a field name.")?];
      while match_tok!(self, TokenKind::Comma) {
        names.push(self.consume_ident("Expected a field name.")?);
      }

      self.consume(&TokenKind::Colon, "Expected ':' and a type after a field name.")?;
      let ty = self.parse_type_expr()?;
      for name in names {
        fields.push(Param { name, ty });
      }

      if !check_tok!(self, TokenKind::RBrace) {
        self.at_least_one_separator()?;
      }
    }

    self.consume(&TokenKind::RBrace, "Expected '}' after object fields.")?;

    self.emit(NodeKind::ObjectDecl(ObjectDeclNode { name, generics, fields }), loc)
  }

  /// Consumes a `->` arrow, which lexes as a user-definable operator
  /// rather than a fixed token kind (see the precedence table).
  fn match_arrow(&mut self) -> bool {
    if let TokenKind::Operator(op) = self.kind().clone() {
      if op.lexeme == "->" {
        self.advance();
        return true;
      }
    }
    false
  }
}
