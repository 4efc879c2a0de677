use crate::arena::{SymArena, SymRef};
use crate::scope::{insert, Module};
use crate::sym::{Sym, SymKind, TypeKind};

/// The four primitive types, interned once per compilation into the
/// `system` module and handed out by [`crate::gen_expr`]-style callers
/// whenever a literal or builtin operator needs its result type.
#[derive(Debug, Clone, Copy)]
pub struct Primitives {
  pub void: SymRef,
  pub boolean: SymRef,
  pub number: SymRef,
  pub string: SymRef,
}

/// Builds the `system` module: a root scope pre-populated with the
/// primitive types, analogous to how a module populates itself from one
/// source file except this one has no source.
pub fn make_system_module(arena: &mut SymArena) -> (Module, Primitives) {
  let mut module = Module::new("system");

  let mut declare = |arena: &mut SymArena, module: &mut Module, name: &str, kind: TypeKind| -> SymRef {
    insert(arena, &mut module.scope, name, Sym::new(name, SymKind::Type(kind)))
      .unwrap_or_else(|_| panic!("builtin type '{}' declared twice", name))
  };

  let void = declare(arena, &mut module, "void", TypeKind::Void);
  let boolean = declare(arena, &mut module, "bool", TypeKind::Bool);
  let number = declare(arena, &mut module, "number", TypeKind::Number);
  let string = declare(arena, &mut module, "string", TypeKind::String);

  (
    module,
    Primitives {
      void,
      boolean,
      number,
      string,
    },
  )
}
