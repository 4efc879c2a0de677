use hashbrown::HashMap;

use core::ast::{NodeIdx, Param};

use crate::arena::SymRef;

/// One field of an object type: its declaration order (used to emit
/// `constrObj` initializers in field order regardless of source
/// order), its name, and its type.
#[derive(Debug, Clone)]
pub struct ObjectField {
  pub id: u8,
  pub name: String,
  pub ty: SymRef,
}

/// The four primitive type kinds, plus `Object`, which carries its own
/// dense id and field list.
#[derive(Debug, Clone)]
pub enum TypeKind {
  Void,
  Bool,
  Number,
  String,
  Object {
    /// Offset by `core::TY_FIRST_OBJECT` when emitted as a wire id.
    object_id: u16,
    fields: Vec<ObjectField>,
    /// Present only on a generic template: the field list's original
    /// type-expression nodes, re-resolved (under a fresh `object_id`)
    /// once per distinct argument vector by `crate::generics::instantiate`
    /// (in the `codegen` crate).
    fields_ast: Option<Vec<Param>>,
  },
}

impl TypeKind {
  /// The 16-bit id this type is addressed by in emitted bytecode
  /// (`pushNil`, `constrObj`, …). Primitives occupy `0..TY_FIRST_OBJECT`
  /// in declaration order; object ids are offset above that so the two
  /// spaces never collide.
  pub fn wire_id(&self) -> u16 {
    match self {
      TypeKind::Void => 0,
      TypeKind::Bool => 1,
      TypeKind::Number => 2,
      TypeKind::String => 3,
      TypeKind::Object { object_id, .. } => core::TY_FIRST_OBJECT + object_id,
    }
  }
}

/// The tagged union of everything a name can refer to.
#[derive(Debug, Clone)]
pub enum SymKind {
  Var {
    ty: SymRef,
    set: bool,
    local: bool,
    stack_pos: u8,
  },
  Let {
    ty: SymRef,
    set: bool,
    local: bool,
    stack_pos: u8,
  },
  Type(TypeKind),
  Proc {
    proc_id: u16,
    params: Vec<(String, SymRef)>,
    return_ty: SymRef,
    /// The proc's body, kept so a generic template can be recompiled
    /// once per distinct argument vector.
    body: NodeIdx,
    /// Present only on a generic template: the original parameter and
    /// return type-expression nodes, re-resolved under the
    /// instantiation's argument substitution (the already-resolved
    /// `params`/`return_ty` above still point at the template's own
    /// `GenericParam` symbols and can't be reused directly).
    sig_ast: Option<(Vec<Param>, Option<NodeIdx>)>,
  },
  /// Declaring an iterator only ever registers this symbol: the body is
  /// never compiled into its own chunk, only spliced into the `for`
  /// loop(s) that drive it (see the code generator's iterator-splicing
  /// pass).
  Iterator {
    params: Vec<(String, SymRef)>,
    yield_ty: SymRef,
    body_ast: NodeIdx,
    /// Present only on a generic template; the `for`-loop splice
    /// re-resolves these under its own argument substitution instead of
    /// going through `crate::generics::instantiate`, since an
    /// iterator's body is inlined fresh at every use rather than
    /// compiled once and cached.
    sig_ast: Option<(Vec<Param>, NodeIdx)>,
  },
  GenericParam {
    constraint: Option<SymRef>,
  },
  /// An overload set. Populated by `crate::scope::insert`, consulted by
  /// `crate::overload::resolve`.
  Choice {
    choices: Vec<SymRef>,
  },
}

impl SymKind {
  /// Name used in `SymKindMismatch` diagnostics ("'{name}' does not
  /// name a {expected}").
  pub fn describe(&self) -> &'static str {
    match self {
      SymKind::Var { .. } => "variable",
      SymKind::Let { .. } => "variable",
      SymKind::Type(_) => "type",
      SymKind::Proc { .. } => "procedure",
      SymKind::Iterator { .. } => "iterator",
      SymKind::GenericParam { .. } => "generic parameter",
      SymKind::Choice { .. } => "overload set",
    }
  }
}

/// A named entity known to the compiler. See the module-level docs for
/// how the optional generic-related fields combine: a symbol with
/// `generic_params: Some(_)` is a template; one with
/// `generic_inst_args: Some(_)` is an instantiation produced from a
/// template; a plain symbol has neither.
#[derive(Debug, Clone)]
pub struct Sym {
  pub name: String,
  pub kind: SymKind,
  pub generic_params: Option<Vec<SymRef>>,
  pub generic_inst_cache: Option<HashMap<Vec<SymRef>, SymRef>>,
  pub generic_inst_args: Option<Vec<SymRef>>,
}

impl Sym {
  pub fn new(name: impl Into<String>, kind: SymKind) -> Self {
    Sym {
      name: name.into(),
      kind,
      generic_params: None,
      generic_inst_cache: None,
      generic_inst_args: None,
    }
  }

  /// Marks this symbol as a generic template: it now owns an
  /// instantiation cache and can no longer be referenced directly
  /// (lookup requires `name[args...]`, see `CouldNotInferGeneric`).
  pub fn with_generics(mut self, params: Vec<SymRef>) -> Self {
    self.generic_params = Some(params);
    self.generic_inst_cache = Some(HashMap::new());
    self
  }

  pub fn is_generic_template(&self) -> bool {
    self.generic_params.is_some()
  }

  pub fn is_instantiation(&self) -> bool {
    self.generic_inst_args.is_some()
  }

  /// The parameter `(name, type)` list for a `Proc` or `Iterator`
  /// symbol; `None` for every other kind.
  pub fn callable_params(&self) -> Option<&[(String, SymRef)]> {
    match &self.kind {
      SymKind::Proc { params, .. } => Some(params),
      SymKind::Iterator { params, .. } => Some(params),
      _ => None,
    }
  }

  pub fn is_callable(&self) -> bool {
    matches!(self.kind, SymKind::Proc { .. } | SymKind::Iterator { .. })
  }

  pub fn is_type(&self) -> bool {
    matches!(self.kind, SymKind::Type(_))
  }

  pub fn is_var_or_let(&self) -> bool {
    matches!(self.kind, SymKind::Var { .. } | SymKind::Let { .. })
  }

  /// Looks up a previously-produced instantiation for this exact
  /// argument vector. `args` is compared by `SymRef` identity, which is
  /// exactly the "structurally equal `A`" the instantiation-idempotence
  /// invariant asks for.
  pub fn cached_instantiation(&self, args: &[SymRef]) -> Option<SymRef> {
    self.generic_inst_cache.as_ref()?.get(args).copied()
  }

  pub fn cache_instantiation(&mut self, args: Vec<SymRef>, result: SymRef) {
    self
      .generic_inst_cache
      .as_mut()
      .expect("cache_instantiation called on a non-template symbol")
      .insert(args, result);
  }
}
