use core::ast::NodeKind;
use core::tokens::TokenList;
use lexer::Lexer;

use crate::Parser;

/// Lexes `src` and hands it to the parser, panicking with the resulting
/// syntax error (if any) so assertion failures are easy to read.
fn parse_ok(src: &str) -> (core::ast::AstArena, core::ast::NodeIdx) {
  let path = std::path::PathBuf::from("<test>");
  let chars: Vec<char> = src.chars().collect();
  let mut offsets: Vec<usize> = src.char_indices().map(|(i, _)| i).collect();
  offsets.push(src.len());
  let tokens = Lexer::lex(&chars, &offsets);
  let list = TokenList::new(&path, src, &tokens);

  Parser::parse(&list).unwrap_or_else(|e| panic!("unexpected syntax error: {}", e.diagnostic().render()))
}

fn parse_err(src: &str) {
  let path = std::path::PathBuf::from("<test>");
  let chars: Vec<char> = src.chars().collect();
  let mut offsets: Vec<usize> = src.char_indices().map(|(i, _)| i).collect();
  offsets.push(src.len());
  let tokens = Lexer::lex(&chars, &offsets);
  let list = TokenList::new(&path, src, &tokens);

  assert!(Parser::parse(&list).is_err(), "expected a syntax error for {:?}", src);
}

fn script_stmts(ast: &core::ast::AstArena, root: core::ast::NodeIdx) -> Vec<core::ast::NodeIdx> {
  match ast.get(root) {
    NodeKind::Script(stmts) => stmts.clone(),
    _ => panic!("root is not a Script node"),
  }
}

/// S1 -- arithmetic with precedence.
#[test]
fn arithmetic_precedence() {
  let (ast, root) = parse_ok("let x = 2 + 3 * 4");
  let stmts = script_stmts(&ast, root);
  assert_eq!(stmts.len(), 1);

  let value = match ast.get(stmts[0]) {
    NodeKind::VarDecl(d) => d.value.expect("has initializer"),
    other => panic!("expected VarDecl, got {:?}", other),
  };

  match ast.get(value) {
    NodeKind::Infix(n) => {
      assert_eq!(n.op, "+");
      match ast.get(n.right) {
        NodeKind::Infix(rhs) => assert_eq!(rhs.op, "*"),
        other => panic!("expected '*' on the right of '+', got {:?}", other),
      }
    }
    other => panic!("expected top-level Infix, got {:?}", other),
  }
}

/// S2 -- reassignment parses as two statements; the generator, not the
/// parser, is what rejects reassigning a `let`.
#[test]
fn reassignment_parses_as_two_statements() {
  let (ast, root) = parse_ok("let x = 1\nx = 2");
  let stmts = script_stmts(&ast, root);
  assert_eq!(stmts.len(), 2);
  assert!(matches!(ast.get(stmts[0]), NodeKind::VarDecl(_)));

  match ast.get(stmts[1]) {
    NodeKind::ExprStmt(e) => assert!(matches!(ast.get(*e), NodeKind::Assign(_))),
    other => panic!("expected ExprStmt(Assign), got {:?}", other),
  }
}

/// S3 -- if as expression.
#[test]
fn if_as_expression() {
  let (ast, root) = parse_ok("let x = if true { 2 } else { 4 }");
  let stmts = script_stmts(&ast, root);

  let value = match ast.get(stmts[0]) {
    NodeKind::VarDecl(d) => d.value.unwrap(),
    other => panic!("expected VarDecl, got {:?}", other),
  };

  match ast.get(value) {
    NodeKind::IfExpr(n) => assert!(n.else_branch.is_some()),
    other => panic!("expected IfExpr, got {:?}", other),
  }
}

/// S4 -- object constructor with reordered field initializers.
#[test]
fn object_constructor_with_colon_exprs() {
  let (ast, root) = parse_ok("object P { a, b: number }\nlet p = P(b: 20, a: 10)");
  let stmts = script_stmts(&ast, root);
  assert_eq!(stmts.len(), 2);
  assert!(matches!(ast.get(stmts[0]), NodeKind::ObjectDecl(_)));

  let value = match ast.get(stmts[1]) {
    NodeKind::VarDecl(d) => d.value.unwrap(),
    other => panic!("expected VarDecl, got {:?}", other),
  };

  match ast.get(value) {
    NodeKind::Call(call) => {
      assert_eq!(call.args.len(), 2);
      for arg in &call.args {
        assert!(matches!(ast.get(*arg), NodeKind::ColonExpr(_)));
      }
    }
    other => panic!("expected Call, got {:?}", other),
  }
}

/// S5 -- generic instantiation syntax (`id[number](1)`).
#[test]
fn generic_instantiation_call() {
  let (ast, root) = parse_ok("proc id[T](x: T) -> T {\n  return x\n}\nlet a = id[number](1)");
  let stmts = script_stmts(&ast, root);
  assert!(matches!(ast.get(stmts[0]), NodeKind::ProcDecl(_)));

  let value = match ast.get(stmts[1]) {
    NodeKind::VarDecl(d) => d.value.unwrap(),
    other => panic!("expected VarDecl, got {:?}", other),
  };

  match ast.get(value) {
    NodeKind::Call(call) => match ast.get(call.callee) {
      NodeKind::Index(idx) => assert_eq!(idx.args.len(), 1),
      other => panic!("expected Index callee, got {:?}", other),
    },
    other => panic!("expected Call, got {:?}", other),
  }
}

/// S6 -- for-loop over an iterator call, with a `break` guarded by `if`.
#[test]
fn for_loop_with_break() {
  let src = "iterator count(n: number) -> number {\n  var i = 0\n  while i < n { yield i\n    i = i + 1 }\n}\nfor v in count(3) {\n  if v == 1 { break }\n}";
  let (ast, root) = parse_ok(src);
  let stmts = script_stmts(&ast, root);
  assert!(matches!(ast.get(stmts[0]), NodeKind::IteratorDecl(_)));
  assert!(matches!(ast.get(stmts[1]), NodeKind::ForStmt(_)));
}

#[test]
fn missing_statement_separator_is_a_syntax_error() {
  parse_err("let x = 1 let y = 2");
}

#[test]
fn unterminated_block_is_a_syntax_error() {
  parse_err("proc f() {\n  return 1\n");
}

#[test]
fn right_associative_caret() {
  let (ast, root) = parse_ok("let x = 2 ^ 3 ^ 4");
  let stmts = script_stmts(&ast, root);
  let value = match ast.get(stmts[0]) {
    NodeKind::VarDecl(d) => d.value.unwrap(),
    other => panic!("expected VarDecl, got {:?}", other),
  };

  match ast.get(value) {
    NodeKind::Infix(n) => {
      assert_eq!(n.op, "^");
      assert!(matches!(ast.get(n.right), NodeKind::Infix(_)), "'^' should be right-associative");
    }
    other => panic!("expected Infix, got {:?}", other),
  }
}
