//! Generic instantiation: binds a template's generic parameters
//! to concrete argument symbols and recompiles (or re-resolves) the
//! underlying declaration under that substitution, memoizing the
//! result per distinct argument vector on the template itself.
//!
//! Iterators are a template kind too, but they never reach this module:
//! an iterator's body is inlined fresh at every `for` site rather than
//! compiled once, so its own generic substitution is handled directly
//! by `gen_for::resolve_iterator_callee`.

use core::ast::{NodeIdx, Param};
use core::errors::ErrorKind;

use symbols::{ObjectField, Sym, SymKind, SymRef, TypeKind};

use crate::{GenResult, Generator};

impl<'a> Generator<'a> {
  /// Instantiates `template` with `args`, caching the result so a
  /// repeated call with a structurally-equal argument vector returns
  /// the same symbol, and guarding against a template that recursively
  /// instantiates itself with the same arguments by failing with a
  /// hard error instead of recursing forever.
  pub(crate) fn instantiate(&mut self, template: SymRef, args: Vec<SymRef>, error_node: NodeIdx) -> GenResult<SymRef> {
    if let Some(cached) = self.arena.get(template).cached_instantiation(&args) {
      return Ok(cached);
    }

    let expected = self
      .arena
      .get(template)
      .generic_params
      .as_ref()
      .expect("instantiate called on a non-template symbol")
      .len();
    if expected != args.len() {
      return Err(self.err(
        error_node,
        ErrorKind::GenericArgLenMismatch,
        format!(
          "'{}' expects {} generic argument(s), got {}.",
          self.arena.get(template).name,
          expected,
          args.len()
        ),
      ));
    }

    if self.instantiating.iter().any(|(t, a)| *t == template && *a == args) {
      return Err(self.err(
        error_node,
        ErrorKind::GenericCycle,
        format!("Generic instantiation of '{}' recurses on itself.", self.arena.get(template).name),
      ));
    }
    self.instantiating.push((template, args.clone()));
    let result = self.instantiate_uncached(template, &args, error_node);
    self.instantiating.pop();

    let inst = result?;
    self.arena.get_mut(template).cache_instantiation(args, inst);
    Ok(inst)
  }

  /// `(name, arg)` pairs for each of `template`'s generic parameters,
  /// zipped against `args` in declaration order -- exactly what a bare
  /// alias scope needs to make `T` resolve to the concrete argument
  /// while re-resolving a template's signature or body.
  fn alias_bindings(&self, template: SymRef, args: &[SymRef]) -> Vec<(String, SymRef)> {
    self
      .arena
      .get(template)
      .generic_params
      .as_ref()
      .expect("checked by caller")
      .iter()
      .map(|gp| self.arena.get(*gp).name.clone())
      .zip(args.iter().copied())
      .collect()
  }

  /// Dispatches on `template`'s kind, with a bare alias
  /// scope active so any type-expression re-resolved along the way sees
  /// the generic parameters bound to `args`.
  fn instantiate_uncached(&mut self, template: SymRef, args: &[SymRef], error_node: NodeIdx) -> GenResult<SymRef> {
    let aliases = self.alias_bindings(template, args);
    self.push_bare_scope();
    for (name, r) in &aliases {
      self.bind_alias(name.clone(), *r);
    }

    let result = (|| -> GenResult<SymRef> {
      match self.arena.get(template).kind.clone() {
        SymKind::Type(TypeKind::Object { fields_ast: Some(fields_ast), .. }) => {
          self.instantiate_object(template, args.to_vec(), &fields_ast)
        }
        SymKind::Type(other) => {
          // A non-object generic type carries no body to recompile: a
          // shallow clone marked as this instantiation's result is
          // enough.
          let name = self.arena.get(template).name.clone();
          let mut inst = Sym::new(name, SymKind::Type(other));
          inst.generic_inst_args = Some(args.to_vec());
          Ok(self.arena.push(inst))
        }
        SymKind::Proc { body, sig_ast: Some((param_asts, ret_ast)), .. } => {
          self.instantiate_proc(template, args.to_vec(), body, &param_asts, ret_ast)
        }
        _ => Err(self.err(
          error_node,
          ErrorKind::NotGeneric,
          format!("'{}' cannot be instantiated.", self.arena.get(template).name),
        )),
      }
    })();

    self.pop_bare_scope();
    result
  }

  /// Object type with body: re-resolves the field list's type
  /// expressions under the substitution and assigns a fresh
  /// `object_id`, since an instantiation is a distinct wire type from
  /// both its template and every other instantiation.
  fn instantiate_object(&mut self, template: SymRef, args: Vec<SymRef>, fields_ast: &[Param]) -> GenResult<SymRef> {
    let name = self.arena.get(template).name.clone();
    let object_id = self.script.next_type_id();

    let mut fields = Vec::with_capacity(fields_ast.len());
    for (id, field) in fields_ast.iter().enumerate() {
      let ty = self.gen_type_expr(field.ty)?;
      fields.push(ObjectField { id: id as u8, name: field.name.clone(), ty });
    }

    let mut inst = Sym::new(name, SymKind::Type(TypeKind::Object { object_id, fields, fields_ast: None }));
    inst.generic_inst_args = Some(args);
    Ok(self.arena.push(inst))
  }

  /// Procedure: re-resolves the parameter and return type expressions
  /// under the substitution (the template's own `params`/`return_ty`
  /// point at its `GenericParam` symbols and can't be reused directly),
  /// reserves a fresh `proc_id`, and recompiles the body -- reusing
  /// `compile_proc_body`'s `aliases` parameter, the same mechanism a
  /// non-generic proc's compile step leaves unused.
  fn instantiate_proc(
    &mut self,
    template: SymRef,
    args: Vec<SymRef>,
    body: NodeIdx,
    param_asts: &[Param],
    ret_ast: Option<NodeIdx>,
  ) -> GenResult<SymRef> {
    let name = self.arena.get(template).name.clone();

    let mut params = Vec::with_capacity(param_asts.len());
    for p in param_asts {
      let ty = self.gen_type_expr(p.ty)?;
      params.push((p.name.clone(), ty));
    }
    let return_ty = match ret_ast {
      Some(t) => self.gen_type_expr(t)?,
      None => self.prims.void,
    };

    let proc_id = self.script.reserve_proc(name.clone(), params.len() as u8, !self.is_void(return_ty));

    let mut inst = Sym::new(name, SymKind::Proc {
      proc_id,
      params: params.clone(),
      return_ty,
      body,
      sig_ast: None,
    });
    inst.generic_inst_args = Some(args.clone());
    let inst_ref = self.arena.push(inst);

    let body_aliases = self.alias_bindings(template, &args);
    self.compile_proc_body(proc_id, &params, return_ty, body, &body_aliases)?;

    Ok(inst_ref)
  }
}
