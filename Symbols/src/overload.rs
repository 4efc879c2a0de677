use crate::arena::{SymArena, SymRef};
use crate::sym::SymKind;

/// Why a call failed to resolve to exactly one callable.
#[derive(Debug, Clone)]
pub enum OverloadError {
  /// The callee isn't callable at all.
  NotAProc,
  /// The callee is a single callable whose signature doesn't match.
  TypeMismatch,
  /// The callee is a `Choice` and no candidate (or more than one,
  /// impossible given `can_add`'s arity+signature uniqueness) matches;
  /// carries every candidate's rendered signature for the diagnostic.
  TypeMismatchChoice(Vec<String>),
}

fn signature_matches(arena: &SymArena, callable: SymRef, arg_types: &[SymRef]) -> bool {
  let sym = arena.get(callable);
  match sym.callable_params() {
    Some(params) => params.len() == arg_types.len() && params.iter().zip(arg_types).all(|((_, p), a)| *p == *a),
    None => false,
  }
}

/// Renders `proc_name(t1, t2) -> ret` for a callable symbol, used both
/// when listing a `Choice`'s candidates and for ordinary call-site
/// diagnostics.
pub fn format_signature(arena: &SymArena, callable: SymRef) -> String {
  let sym = arena.get(callable);
  let params = sym
    .callable_params()
    .unwrap_or(&[])
    .iter()
    .map(|(_, t)| arena.get(*t).name.clone())
    .collect::<Vec<_>>()
    .join(", ");

  let ret = match &sym.kind {
    SymKind::Proc { return_ty, .. } => arena.get(*return_ty).name.clone(),
    SymKind::Iterator { yield_ty, .. } => format!("iterator<{}>", arena.get(*yield_ty).name),
    _ => "void".to_string(),
  };

  format!("{}({}) -> {}", sym.name, params, ret)
}

/// Resolves a call's callee against its argument types. A `Choice`'s
/// candidates are tried in declaration order;
/// the first exact match wins -- a deterministic, first-declared-wins
/// tie-break, since `can_add` already guarantees at most one candidate
/// can match a given arity+signature.
pub fn resolve(arena: &SymArena, callee: SymRef, arg_types: &[SymRef]) -> Result<SymRef, OverloadError> {
  match &arena.get(callee).kind {
    SymKind::Choice { choices } => {
      for candidate in choices {
        if signature_matches(arena, *candidate, arg_types) {
          return Ok(*candidate);
        }
      }
      let sigs = choices.iter().map(|c| format_signature(arena, *c)).collect();
      Err(OverloadError::TypeMismatchChoice(sigs))
    }
    SymKind::Proc { .. } | SymKind::Iterator { .. } => {
      if signature_matches(arena, callee, arg_types) {
        Ok(callee)
      } else {
        Err(OverloadError::TypeMismatch)
      }
    }
    _ => Err(OverloadError::NotAProc),
  }
}
