/// The index of a [`crate::sym::Sym`] inside a [`SymArena`].
///
/// `SymRef` doubles as the identity a symbol is compared by: the
/// language has no subtyping or coercion, so "is this the same type?"
/// is answered entirely by index equality (see the overload-selection
/// rules in `crate::overload`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymRef(pub usize);

impl From<usize> for SymRef {
  fn from(x: usize) -> Self {
    SymRef(x)
  }
}

/// Owns every [`crate::sym::Sym`] ever created during a compilation,
/// addressed by a stable [`SymRef`]. Using a slab instead of
/// `Rc`/`Weak` handles sidesteps the cyclic references that arise
/// between a generic template and its own instantiation cache, and
/// between a self-referential object type and its field list (see the
/// design notes on cyclic symbol references).
#[derive(Debug, Default)]
pub struct SymArena {
  syms: Vec<crate::sym::Sym>,
}

impl SymArena {
  pub fn push(&mut self, sym: crate::sym::Sym) -> SymRef {
    self.syms.push(sym);
    SymRef(self.syms.len() - 1)
  }

  pub fn get(&self, r: SymRef) -> &crate::sym::Sym {
    &self.syms[r.0]
  }

  pub fn get_mut(&mut self, r: SymRef) -> &mut crate::sym::Sym {
    &mut self.syms[r.0]
  }
}
