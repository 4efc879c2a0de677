use hashbrown::HashMap;

use crate::arena::{SymArena, SymRef};
use crate::sym::{Sym, SymKind};

/// A tag distinguishing which for-loop splice (if any) a scope or flow
/// block belongs to. Lookups and flow-block searches skip any scope
/// whose context doesn't match the generator's current context, which
/// is exactly what keeps an iterator's internal variables and loops
/// from leaking into -- or being reachable from -- the loop body
/// spliced into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub u32);

/// Hands out fresh [`ContextId`]s for each `for`-loop splice and
/// reclaims them once the splice is done. A context id must never be
/// reused while a live scope or flow block still carries it.
#[derive(Debug, Default)]
pub struct ContextAllocator {
  next: u32,
}

impl ContextAllocator {
  pub const ROOT: ContextId = ContextId(0);

  pub fn new() -> Self {
    ContextAllocator { next: 1 }
  }

  pub fn alloc(&mut self) -> ContextId {
    let id = ContextId(self.next);
    self.next += 1;
    id
  }

  /// No-op placeholder for symmetry with `alloc`: ids are monotonically
  /// increasing and never recycled, so "freeing" one is just letting it
  /// go out of scope. Kept as an explicit step (see the splice
  /// algorithm) so the lifecycle reads the same as an allocator that
  /// does recycle.
  pub fn free(&mut self, _id: ContextId) {}
}

/// A lexical scope: the symbols declared directly in it, and the
/// context it belongs to.
#[derive(Debug, Default)]
pub struct Scope {
  syms: HashMap<String, SymRef>,
  pub context: ContextId,
}

impl Scope {
  pub fn new(context: ContextId) -> Self {
    Scope {
      syms: HashMap::new(),
      context,
    }
  }

  pub fn get(&self, name: &str) -> Option<SymRef> {
    self.syms.get(name).copied()
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.syms.keys().map(|s| s.as_str())
  }

  /// Binds `name` directly to an already-existing symbol, bypassing
  /// arena allocation and the overload/redeclaration rules `insert`
  /// enforces. Used for generic-parameter and instantiation-argument
  /// aliases, which name an existing `SymRef` rather than introduce a
  /// new one.
  pub fn bind_alias(&mut self, name: impl Into<String>, r: SymRef) {
    self.syms.insert(name.into(), r);
  }
}

/// A module is just a named root scope; one source file populates one
/// module.
#[derive(Debug)]
pub struct Module {
  pub name: String,
  pub scope: Scope,
}

impl Module {
  pub fn new(name: impl Into<String>) -> Self {
    Module {
      name: name.into(),
      scope: Scope::new(ContextAllocator::ROOT),
    }
  }
}

/// Whether a new symbol can join an existing `Choice` (see the
/// insertion rules): a `Var`/`Let` only if no variable is already in
/// the set, a `Type` only if no type is, and a callable only if no
/// existing callable shares its exact parameter-type signature.
fn can_add(arena: &SymArena, choice: &[SymRef], incoming: &Sym) -> bool {
  match &incoming.kind {
    SymKind::Var { .. } | SymKind::Let { .. } => !choice.iter().any(|c| arena.get(*c).is_var_or_let()),
    SymKind::Type(_) => !choice.iter().any(|c| arena.get(*c).is_type()),
    SymKind::Proc { .. } | SymKind::Iterator { .. } => {
      let incoming_sig = incoming.callable_params().expect("callable").iter().map(|(_, t)| *t).collect::<Vec<_>>();
      !choice.iter().any(|c| {
        let existing = arena.get(*c);
        existing.is_callable()
          && existing.callable_params().expect("callable").iter().map(|(_, t)| *t).collect::<Vec<_>>() == incoming_sig
      })
    }
    SymKind::GenericParam { .. } | SymKind::Choice { .. } => false,
  }
}

/// The outcome of an [`insert`] call that didn't add the symbol
/// outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeclKind {
  /// Nothing in the scope prevents re-declaration; `can_add` simply
  /// refused this pairing (e.g. a second variable under the same name).
  Redeclared,
}

/// Inserts `sym` under `name` into `scope`, implementing the overload
/// rules for name insertion: a first declaration is direct, a second wraps the
/// existing symbol in a `Choice`, and further declarations either join
/// the choice (if `can_add`) or are rejected as a redeclaration.
pub fn insert(arena: &mut SymArena, scope: &mut Scope, name: &str, sym: Sym) -> Result<SymRef, RedeclKind> {
  match scope.get(name) {
    None => {
      let r = arena.push(sym);
      scope.syms.insert(name.to_string(), r);
      Ok(r)
    }
    Some(existing_ref) => {
      let is_choice = matches!(arena.get(existing_ref).kind, SymKind::Choice { .. });

      if !is_choice {
        let choice_syms = vec![existing_ref];
        if !can_add(arena, &choice_syms, &sym) {
          return Err(RedeclKind::Redeclared);
        }
        let new_ref = arena.push(sym);
        let choice = Sym::new(name, SymKind::Choice { choices: vec![existing_ref, new_ref] });
        let choice_ref = arena.push(choice);
        scope.syms.insert(name.to_string(), choice_ref);
        Ok(new_ref)
      } else {
        let choices = match &arena.get(existing_ref).kind {
          SymKind::Choice { choices } => choices.clone(),
          _ => unreachable!(),
        };
        if !can_add(arena, &choices, &sym) {
          return Err(RedeclKind::Redeclared);
        }
        let new_ref = arena.push(sym);
        if let SymKind::Choice { choices } = &mut arena.get_mut(existing_ref).kind {
          choices.push(new_ref);
        }
        Ok(new_ref)
      }
    }
  }
}

/// Looks `name` up through `scopes` (innermost-last order, i.e. the
/// slice's last entry is the most recently pushed scope), skipping any
/// scope whose context doesn't match `current_context` -- exactly the
/// mechanism that gives an iterator splice's internal scopes hygiene
/// from its caller's, and vice versa. Falls back to `module` if no
/// local scope yields a hit.
pub fn lookup(scopes: &[Scope], current_context: ContextId, module: &Module, name: &str) -> Option<SymRef> {
  for scope in scopes.iter().rev() {
    if scope.context != current_context {
      continue;
    }
    if let Some(r) = scope.get(name) {
      return Some(r);
    }
  }
  module.scope.get(name)
}
