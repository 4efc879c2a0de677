//! Symbol table, scope and overload-resolution model shared by the
//! code generator. Holds no AST-walking logic of its own -- that lives
//! in the generator, which owns the actual scope stack and drives
//! `insert`/`lookup`/`resolve` while it walks a module.

pub mod arena;
pub mod builtins;
pub mod overload;
pub mod scope;
pub mod sym;

pub use arena::{SymArena, SymRef};
pub use builtins::{make_system_module, Primitives};
pub use overload::{format_signature, resolve, OverloadError};
pub use scope::{insert, lookup, ContextAllocator, ContextId, Module, RedeclKind, Scope};
pub use sym::{ObjectField, Sym, SymKind, TypeKind};

#[cfg(test)]
mod tests;
