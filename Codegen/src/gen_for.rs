//! `for`-loop lowering, the hardest correctness problem in the
//! generator: there is no real iterator object. The iterator's body is
//! code-generated directly into the chunk already under construction,
//! with every `yield` site rewritten in place to run the loop's own
//! body. Scope hygiene is the whole game: the iterator's internal
//! locals and `while` loops must not leak into -- or be reachable from
//! -- the spliced loop body, and the loop body's `break`/`continue`
//! must resolve to the `for` loop itself rather than some `while`
//! sitting inside the iterator. A fresh [`symbols::ContextId`] for the
//! iterator's own scopes, crossed with an outer flow block deliberately
//! stamped with the *caller's* context, is what makes both hold.

use core::ast::{ForNode, NodeIdx, NodeKind};
use core::errors::ErrorKind;

use symbols::{SymKind, SymRef};

use crate::{FlowKind, GenResult, Generator};

impl<'a> Generator<'a> {
  pub(crate) fn gen_for(&mut self, node: NodeIdx, f: ForNode) -> GenResult<()> {
    let call = match self.ast.get(f.iter_call).clone() {
      NodeKind::Call(c) => c,
      _ => return Err(self.err(f.iter_call, ErrorKind::NotAnIterator, "A 'for' loop must be driven by a call to an iterator.")),
    };

    let caller_ctx = self.frame().current_ctx;
    let (params, yield_ty, body_ast, aliases) = self.resolve_iterator_callee(call.callee, &call.args)?;

    // An outer flow block for `break`, stamped with the context active
    // right now -- the caller's -- rather than whatever context the
    // iterator's internals are about to get. The loop body runs under
    // this same context once a `yield` splices it in, so `break` finds
    // this block; nothing inside the iterator's own `while`s can reach
    // it, since those run under the iterator's context instead.
    self.push_flow(FlowKind::LoopOuter);

    // Everything the iterator declares from here on -- its parameters,
    // whatever scopes and loops its body pushes -- gets a fresh context
    // that no scope of the caller's shares, so lookups and flow-block
    // searches performed while generating the iterator's own code
    // never see past it.
    let iter_ctx = self.ctx_alloc.alloc();
    self.frame_mut().current_ctx = iter_ctx;
    self.push_scope();
    if !aliases.is_empty() {
      self.push_bare_scope();
      for (name, r) in &aliases {
        self.bind_alias(name.clone(), *r);
      }
    }

    let decl_result = (|| -> GenResult<()> {
      for (name, ty) in &params {
        self.declare_var(node, name, *ty, true)?;
      }
      Ok(())
    })();

    let prev_ctx = self.frame().iter_for_ctx;
    let prev_yield_ty = self.frame().iter_yield_ty;
    let prev_var = self.frame_mut().iter_for_var.take();
    let prev_body = self.frame_mut().iter_for_body.take();

    self.frame_mut().iter_for_ctx = Some(caller_ctx);
    self.frame_mut().iter_for_var = Some(f.loop_var.clone());
    self.frame_mut().iter_for_body = Some(f.body);
    self.frame_mut().iter_yield_ty = Some(yield_ty);

    let body_result = decl_result.and_then(|_| self.gen_stmt(body_ast));

    self.frame_mut().iter_for_ctx = prev_ctx;
    self.frame_mut().iter_for_var = prev_var;
    self.frame_mut().iter_for_body = prev_body;
    self.frame_mut().iter_yield_ty = prev_yield_ty;

    if !aliases.is_empty() {
      self.pop_bare_scope();
    }
    self.pop_scope();
    self.frame_mut().current_ctx = caller_ctx;
    self.ctx_alloc.free(iter_ctx);

    self.pop_flow();
    body_result
  }

  /// Resolves the call driving a `for` loop to its iterator's concrete
  /// `(params, yield_ty, body)`, evaluating the call's argument
  /// expressions as a side effect (they're pushed onto the stack in
  /// parameter order, exactly like any other call's arguments, ready
  /// for `gen_for` to declare as the iterator's own locals).
  ///
  /// A generic iterator (`name[A, B](args)`) has its signature
  /// re-resolved in place under a transient bare scope; unlike
  /// `generics::instantiate`, nothing here is cached, since the body is
  /// inlined fresh at every `for` site regardless of whether the
  /// iterator is generic. The returned alias list is empty for a
  /// non-generic iterator and otherwise must stay bound while the
  /// caller generates the spliced body, since that body can itself
  /// reference the generic parameter names.
  fn resolve_iterator_callee(
    &mut self,
    callee: NodeIdx,
    call_args: &[NodeIdx],
  ) -> GenResult<(Vec<(String, SymRef)>, SymRef, NodeIdx, Vec<(String, SymRef)>)> {
    match self.ast.get(callee).clone() {
      NodeKind::Ident(name) => {
        let r = self
          .lookup_name(&name)
          .ok_or_else(|| self.err(callee, ErrorKind::UndefinedReference, format!("Undefined reference to '{}'.", name)))?;
        if self.sym_matching(r, |s| s.is_generic_template()).is_some() {
          return Err(self.err(
            callee,
            ErrorKind::CouldNotInferGeneric,
            format!("Could not infer generic arguments for '{}'; use '{}[T, ...]'.", name, name),
          ));
        }

        let arg_types = self.gen_plain_args(call_args)?;
        let resolved = symbols::resolve(&self.arena, r, &arg_types).map_err(|e| self.overload_err(callee, &name, e))?;
        let (params, yield_ty, body_ast) = match &self.arena.get(resolved).kind {
          SymKind::Iterator { params, yield_ty, body_ast, .. } => (params.clone(), *yield_ty, *body_ast),
          _ => return Err(self.err(callee, ErrorKind::NotAnIterator, format!("'{}' is not an iterator.", name))),
        };
        Ok((params, yield_ty, body_ast, Vec::new()))
      }

      NodeKind::Index(idx) => {
        let name = match self.ast.get(idx.target).clone() {
          NodeKind::Ident(n) => n,
          _ => return Err(self.err(idx.target, ErrorKind::InvalidSymName, ErrorKind::InvalidSymName.template())),
        };
        let r = self
          .lookup_name(&name)
          .ok_or_else(|| self.err(idx.target, ErrorKind::UndefinedReference, format!("Undefined reference to '{}'.", name)))?;
        let template = self
          .sym_matching(r, |s| s.is_generic_template())
          .ok_or_else(|| self.err(idx.target, ErrorKind::NotGeneric, format!("'{}' is not generic.", name)))?;
        if !matches!(self.arena.get(template).kind, SymKind::Iterator { .. }) {
          return Err(self.err(idx.target, ErrorKind::NotAnIterator, format!("'{}' is not an iterator.", name)));
        }

        let mut type_args = Vec::with_capacity(idx.args.len());
        for a in &idx.args {
          type_args.push(self.gen_type_expr(*a)?);
        }
        let gparams = self.arena.get(template).generic_params.clone().expect("checked is_generic_template");
        if gparams.len() != type_args.len() {
          return Err(self.err(
            idx.target,
            ErrorKind::GenericArgLenMismatch,
            format!("'{}' expects {} generic argument(s), got {}.", name, gparams.len(), type_args.len()),
          ));
        }
        let aliases: Vec<(String, SymRef)> = gparams
          .iter()
          .map(|gp| self.arena.get(*gp).name.clone())
          .zip(type_args)
          .collect();

        self.push_bare_scope();
        for (n, ty) in &aliases {
          self.bind_alias(n.clone(), *ty);
        }
        let sig_result = (|| -> GenResult<(Vec<(String, SymRef)>, SymRef, NodeIdx)> {
          let (param_asts, yield_ast, body_ast) = match &self.arena.get(template).kind {
            SymKind::Iterator { sig_ast: Some((p, y)), body_ast, .. } => (p.clone(), *y, *body_ast),
            _ => unreachable!("template is a generic Iterator, so declaration always recorded a sig_ast"),
          };
          let mut params = Vec::with_capacity(param_asts.len());
          for p in &param_asts {
            let ty = self.gen_type_expr(p.ty)?;
            params.push((p.name.clone(), ty));
          }
          let yield_ty = self.gen_type_expr(yield_ast)?;
          Ok((params, yield_ty, body_ast))
        })();
        self.pop_bare_scope();
        let (params, yield_ty, body_ast) = sig_result?;

        if call_args.len() != params.len() {
          return Err(self.err(
            idx.target,
            ErrorKind::TypeMismatch,
            format!("Iterator expects {} argument(s), got {}.", params.len(), call_args.len()),
          ));
        }
        for (arg, (_, param_ty)) in call_args.iter().zip(&params) {
          let at = self.gen_expr(*arg)?;
          self.require_value(at, *arg)?;
          self.require_type(*param_ty, at, *arg)?;
        }

        Ok((params, yield_ty, body_ast, aliases))
      }

      _ => Err(self.err(callee, ErrorKind::NotAProc, "Invalid call target.")),
    }
  }
}
