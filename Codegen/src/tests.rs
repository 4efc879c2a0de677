use core::bytecode::OpCode;
use core::errors::ErrorKind;
use lexer::Lexer;

use crate::Generator;

fn compile_ok(src: &str) -> (core::script::Script, symbols::SymArena) {
  let path = std::path::PathBuf::from("<test>");
  let chars: Vec<char> = src.chars().collect();
  let mut offsets: Vec<usize> = src.char_indices().map(|(i, _)| i).collect();
  offsets.push(src.len());
  let tokens = Lexer::lex(&chars, &offsets);
  let list = core::tokens::TokenList::new(&path, src, &tokens);
  let (ast, root) = parser::Parser::parse(&list).unwrap_or_else(|e| panic!("unexpected syntax error: {}", e.diagnostic().render()));
  Generator::compile(&ast, root).unwrap_or_else(|e| panic!("unexpected compile error: {}", e.diagnostic().render()))
}

fn compile_err(src: &str) -> core::errors::CompileError {
  let path = std::path::PathBuf::from("<test>");
  let chars: Vec<char> = src.chars().collect();
  let mut offsets: Vec<usize> = src.char_indices().map(|(i, _)| i).collect();
  offsets.push(src.len());
  let tokens = Lexer::lex(&chars, &offsets);
  let list = core::tokens::TokenList::new(&path, src, &tokens);
  let (ast, root) = parser::Parser::parse(&list).unwrap_or_else(|e| panic!("unexpected syntax error: {}", e.diagnostic().render()));
  Generator::compile(&ast, root).expect_err("expected a compile error")
}

/// Counts how many times `op` appears as an opcode byte in `code`,
/// skipping over each instruction's operand bytes so an operand that
/// happens to equal the opcode's byte value isn't double-counted.
fn count_op(code: &[u8], op: OpCode) -> usize {
  use num_traits::FromPrimitive;
  let mut i = 0;
  let mut n = 0;
  while i < code.len() {
    let this = OpCode::from_u8(code[i]).expect("well-formed chunk");
    if this == op {
      n += 1;
    }
    i += 1 + this.operand_len();
  }
  n
}

fn ops(code: &[u8]) -> Vec<OpCode> {
  use num_traits::FromPrimitive;
  let mut i = 0;
  let mut out = Vec::new();
  while i < code.len() {
    let op = OpCode::from_u8(code[i]).expect("well-formed chunk");
    out.push(op);
    i += 1 + op.operand_len();
  }
  out
}

/// S1 -- arithmetic with precedence.
#[test]
fn arithmetic_precedence_emits_expected_ops() {
  let (script, _) = compile_ok("let x = 2 + 3 * 4");
  let code = script.main.code();
  assert_eq!(count_op(code, OpCode::PushN), 3);
  assert_eq!(count_op(code, OpCode::MultN), 1);
  assert_eq!(count_op(code, OpCode::AddN), 1);
  assert_eq!(count_op(code, OpCode::PopG), 1);
  assert_eq!(ops(code).last(), Some(&OpCode::Halt));
}

/// S2 -- let reassignment is rejected.
#[test]
fn let_reassignment_is_an_error() {
  let err = compile_err("let x = 1\nx = 2");
  assert_eq!(err.diagnostic().kind, ErrorKind::LetReassignment);
  assert_eq!(err.diagnostic().loc.line, 2);
}

/// S3 -- if as an expression; both branches compile, each pushing its
/// own literal exactly once regardless of which one runs.
#[test]
fn if_expression_compiles_both_branches() {
  let (script, _) = compile_ok("let x = if true { 2 } else { 4 }");
  let code = script.main.code();
  assert_eq!(count_op(code, OpCode::PushN), 2);
  assert_eq!(count_op(code, OpCode::JumpFwd), 1);
  assert_eq!(count_op(code, OpCode::JumpFwdF), 1);
}

/// S4 -- object constructor with reordered fields: argument
/// expressions run in declaration order, not source order.
#[test]
fn object_ctor_evaluates_fields_in_declaration_order() {
  let (script, _) = compile_ok("object P { a, b: number }\nlet p = P(b: 20, a: 10)");
  let code = script.main.code();
  let pushes: Vec<f64> = {
    let mut i = 0;
    let mut out = Vec::new();
    use num_traits::FromPrimitive;
    while i < code.len() {
      let op = OpCode::from_u8(code[i]).unwrap();
      if op == OpCode::PushN {
        out.push(script.main.get_f64(i + 1));
      }
      i += 1 + op.operand_len();
    }
    out
  };
  assert_eq!(pushes, vec![10.0, 20.0], "field 'a' must be evaluated before field 'b'");
  assert_eq!(count_op(code, OpCode::ConstrObj), 1);
}

/// S5 -- instantiating the same generic proc with the same argument
/// symbol twice appends exactly one extra entry to `script.procs`.
#[test]
fn generic_proc_instantiation_is_cached() {
  let (script, _) = compile_ok(
    "proc id[T](x: T) -> T { return x }\n\
     let a = id[number](1)\n\
     let b = id[number](2)",
  );
  // One proc for the uninstantiated template's own body is never
  // compiled (it has no concrete types to emit against), so the only
  // native proc appended is the single `id[number]` instantiation.
  assert_eq!(script.procs.len(), 1);
  assert_eq!(script.procs[0].name, "id");

  let code = script.main.code();
  let call_targets: Vec<u16> = {
    let mut i = 0;
    let mut out = Vec::new();
    use num_traits::FromPrimitive;
    while i < code.len() {
      let op = OpCode::from_u8(code[i]).unwrap();
      if op == OpCode::CallD {
        out.push(script.main.get_u16(i + 1));
      }
      i += 1 + op.operand_len();
    }
    out
  };
  assert_eq!(call_targets, vec![0, 0], "both calls must target the same cached instantiation");
}

/// S6 -- `break` inside a `for` loop's body exits the `for`, not the
/// iterator's own internal `while`.
#[test]
fn for_loop_break_exits_outer_loop_not_inner_while() {
  let (script, _) = compile_ok(
    "iterator count(n: number) -> number {\n\
       var i = 0\n\
       while i < n { yield i; i = i + 1 }\n\
     }\n\
     for v in count(3) { if v == 1 { break } }",
  );
  let code = script.main.code();
  // The splice leaves the iterator's own `while` (JumpBack) intact,
  // plus a forward jump for `break` out of the `for`.
  assert!(count_op(code, OpCode::JumpBack) >= 1);
  assert!(count_op(code, OpCode::JumpFwd) >= 1);
}

/// Every compiled chunk ends in exactly one `halt`.
#[test]
fn chunk_always_ends_in_single_halt() {
  let (script, _) = compile_ok("let x = 1");
  let code = script.main.code();
  assert_eq!(ops(code).iter().filter(|o| **o == OpCode::Halt).count(), 1);
  assert_eq!(*ops(code).last().unwrap(), OpCode::Halt);
}

/// Proc ids are dense and start at 0.
#[test]
fn proc_ids_are_dense_from_zero() {
  let (script, _) = compile_ok(
    "proc a() { }\n\
     proc b() { }\n\
     proc c() { }",
  );
  assert_eq!(script.procs.len(), 3);
  assert_eq!(script.procs[0].name, "a");
  assert_eq!(script.procs[1].name, "b");
  assert_eq!(script.procs[2].name, "c");
}

/// `break` outside any loop is rejected.
#[test]
fn break_outside_loop_is_an_error() {
  let err = compile_err("break");
  assert_eq!(err.diagnostic().kind, ErrorKind::OnlyUsableInABlock);
  assert!(compile_err("continue").diagnostic().kind == ErrorKind::OnlyUsableInALoop);
}

/// `yield` outside an iterator is rejected.
#[test]
fn yield_outside_iterator_is_an_error() {
  let err = compile_err("yield 1");
  assert_eq!(err.diagnostic().kind, ErrorKind::OnlyUsableInAnIterator);
}

/// A generic proc with a mismatched argument count is rejected before
/// any instantiation is attempted.
#[test]
fn generic_arg_length_mismatch_is_an_error() {
  let err = compile_err("proc id[T, U](x: T) -> T { return x }\nlet a = id[number](1)");
  assert_eq!(err.diagnostic().kind, ErrorKind::GenericArgLenMismatch);
}

/// Calling a non-generic name with explicit type arguments, or a
/// generic one without any, both fail -- distinct error kinds so a
/// caller can tell "not generic" apart from "needs inference help".
#[test]
fn non_generic_proc_cannot_be_instantiated() {
  let err = compile_err("proc add(a: number, b: number) -> number { return a + b }\nlet x = add[number](1, 2)");
  assert_eq!(err.diagnostic().kind, ErrorKind::NotGeneric);
}

/// Two nested `for` loops, each with its own `break`, both exit their
/// own loop rather than unwinding past it -- the context stamped on
/// each `LoopOuter` block must distinguish the two.
#[test]
fn nested_for_loops_each_break_independently() {
  let (script, _) = compile_ok(
    "iterator upto(n: number) -> number {\n\
       var i = 0\n\
       while i < n { yield i; i = i + 1 }\n\
     }\n\
     for a in upto(2) {\n\
       for b in upto(2) {\n\
         if b == 1 { break }\n\
       }\n\
       if a == 1 { break }\n\
     }",
  );
  let code = script.main.code();
  assert!(count_op(code, OpCode::JumpFwd) >= 2);
}
