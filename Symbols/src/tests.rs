use core::ast::NodeIdx;

use crate::arena::SymArena;
use crate::builtins::make_system_module;
use crate::overload::{resolve, OverloadError};
use crate::scope::{insert, lookup, ContextAllocator, RedeclKind, Scope};
use crate::sym::{Sym, SymKind};

fn proc_sym(name: &str, params: Vec<(&str, crate::SymRef)>, return_ty: crate::SymRef) -> Sym {
  Sym::new(
    name,
    SymKind::Proc {
      proc_id: 0,
      params: params.into_iter().map(|(n, t)| (n.to_string(), t)).collect(),
      return_ty,
      body: NodeIdx(0),
      sig_ast: None,
    },
  )
}

#[test]
fn first_declaration_is_direct() {
  let mut arena = SymArena::default();
  let (_, prims) = make_system_module(&mut arena);
  let mut scope = Scope::new(ContextAllocator::ROOT);

  let r = insert(&mut arena, &mut scope, "f", proc_sym("f", vec![("x", prims.number)], prims.void)).unwrap();
  assert!(matches!(arena.get(r).kind, SymKind::Proc { .. }));
}

#[test]
fn second_declaration_with_distinct_signature_forms_a_choice() {
  let mut arena = SymArena::default();
  let (_, prims) = make_system_module(&mut arena);
  let mut scope = Scope::new(ContextAllocator::ROOT);

  insert(&mut arena, &mut scope, "f", proc_sym("f", vec![("x", prims.number)], prims.void)).unwrap();
  insert(&mut arena, &mut scope, "f", proc_sym("f", vec![("x", prims.string)], prims.void)).unwrap();

  let looked_up = scope.get("f").unwrap();
  assert!(matches!(arena.get(looked_up).kind, SymKind::Choice { .. }));
  if let SymKind::Choice { choices } = &arena.get(looked_up).kind {
    assert_eq!(choices.len(), 2);
  }
}

#[test]
fn same_signature_twice_is_a_redeclaration() {
  let mut arena = SymArena::default();
  let (_, prims) = make_system_module(&mut arena);
  let mut scope = Scope::new(ContextAllocator::ROOT);

  insert(&mut arena, &mut scope, "f", proc_sym("f", vec![("x", prims.number)], prims.void)).unwrap();
  let err = insert(&mut arena, &mut scope, "f", proc_sym("f", vec![("y", prims.number)], prims.void)).unwrap_err();
  assert_eq!(err, RedeclKind::Redeclared);
}

#[test]
fn two_variables_under_one_name_redeclare_rather_than_choice() {
  let mut arena = SymArena::default();
  let (_, prims) = make_system_module(&mut arena);
  let mut scope = Scope::new(ContextAllocator::ROOT);

  let var = Sym::new(
    "x",
    SymKind::Var {
      ty: prims.number,
      set: false,
      local: true,
      stack_pos: 0,
    },
  );
  insert(&mut arena, &mut scope, "x", var.clone()).unwrap();
  let err = insert(&mut arena, &mut scope, "x", var).unwrap_err();
  assert_eq!(err, RedeclKind::Redeclared);
}

#[test]
fn overload_resolve_picks_matching_candidate_in_declaration_order() {
  let mut arena = SymArena::default();
  let (_, prims) = make_system_module(&mut arena);
  let mut scope = Scope::new(ContextAllocator::ROOT);

  insert(&mut arena, &mut scope, "f", proc_sym("f", vec![("x", prims.number)], prims.void)).unwrap();
  insert(&mut arena, &mut scope, "f", proc_sym("f", vec![("x", prims.string)], prims.void)).unwrap();
  let choice = scope.get("f").unwrap();

  let picked = resolve(&arena, choice, &[prims.string]).unwrap();
  if let SymKind::Proc { params, .. } = &arena.get(picked).kind {
    assert_eq!(params[0].1, prims.string);
  } else {
    panic!("expected a proc");
  }
}

#[test]
fn overload_resolve_reports_every_candidate_on_mismatch() {
  let mut arena = SymArena::default();
  let (_, prims) = make_system_module(&mut arena);
  let mut scope = Scope::new(ContextAllocator::ROOT);

  insert(&mut arena, &mut scope, "f", proc_sym("f", vec![("x", prims.number)], prims.void)).unwrap();
  insert(&mut arena, &mut scope, "f", proc_sym("f", vec![("x", prims.string)], prims.void)).unwrap();
  let choice = scope.get("f").unwrap();

  match resolve(&arena, choice, &[prims.boolean]) {
    Err(OverloadError::TypeMismatchChoice(sigs)) => assert_eq!(sigs.len(), 2),
    other => panic!("expected TypeMismatchChoice, got {:?}", other),
  }
}

#[test]
fn lookup_skips_scopes_from_a_different_context() {
  let mut arena = SymArena::default();
  let (module, prims) = make_system_module(&mut arena);
  let mut alloc = ContextAllocator::new();
  let caller_ctx = ContextAllocator::ROOT;
  let iter_ctx = alloc.alloc();

  let mut caller_scope = Scope::new(caller_ctx);
  insert(
    &mut arena,
    &mut caller_scope,
    "n",
    Sym::new(
      "n",
      SymKind::Let {
        ty: prims.number,
        set: true,
        local: true,
        stack_pos: 0,
      },
    ),
  )
  .unwrap();

  let iter_scope = Scope::new(iter_ctx);
  let scopes = vec![caller_scope, iter_scope];

  // Looking up "n" while the current context is the iterator's own
  // context must not see the caller's local, since the caller's scope
  // carries a different context tag.
  assert!(lookup(&scopes, iter_ctx, &module, "n").is_none());
  // But with the caller's own context active, it resolves normally.
  assert!(lookup(&scopes, caller_ctx, &module, "n").is_some());
}

#[test]
fn lookup_falls_back_to_the_module_scope() {
  let mut arena = SymArena::default();
  let (module, prims) = make_system_module(&mut arena);
  let scopes: Vec<Scope> = vec![];

  let found = lookup(&scopes, ContextAllocator::ROOT, &module, "number").unwrap();
  assert_eq!(found, prims.number);
}

#[test]
fn bind_alias_does_not_go_through_overload_rules() {
  let mut arena = SymArena::default();
  let (_, prims) = make_system_module(&mut arena);
  let mut scope = Scope::new(ContextAllocator::ROOT);

  scope.bind_alias("T", prims.number);
  scope.bind_alias("T", prims.string);
  assert_eq!(scope.get("T"), Some(prims.string));
}
