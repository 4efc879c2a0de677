//! `proc`/`iterator`/`object` declarations: registering the symbol and,
//! for procedures, compiling the body into its own chunk. Generic
//! declarations additionally open a bare scope so the declaration's own
//! signature and body can refer to its generic parameters by name.

use core::ast::{GenericParamDecl, IteratorDeclNode, NodeIdx, NodeKind, ObjectDeclNode, ProcDeclNode};
use core::bytecode::OpCode;
use core::errors::ErrorKind;

use symbols::{ContextAllocator, ObjectField, Sym, SymKind, SymRef, TypeKind};

use crate::{Frame, FrameKind, GenResult, Generator};

impl<'a> Generator<'a> {
  /// Declares each generic parameter (with its optional constraint) as a
  /// `GenericParam` symbol in the current (bare) scope, returning their
  /// refs in declaration order -- exactly what `Sym::with_generics`
  /// expects and what `generics::instantiate` substitutes against.
  pub(crate) fn declare_generic_params(&mut self, node: NodeIdx, generics: &[GenericParamDecl]) -> GenResult<Vec<SymRef>> {
    let mut refs = Vec::with_capacity(generics.len());
    for g in generics {
      let constraint = match &g.constraint {
        Some(c) => Some(self.gen_type_expr(*c)?),
        None => None,
      };
      let r = self.declare(node, &g.name, Sym::new(&g.name, SymKind::GenericParam { constraint }))?;
      refs.push(r);
    }
    Ok(refs)
  }

  /// Declares a local without the `declare_var` reserved-name guard,
  /// used only for the synthetic `result` local: `declare_var` would
  /// otherwise reject it as the very `ShadowResult` collision it's meant
  /// to block user code from causing.
  pub(crate) fn declare_local_bypassing_reserved(&mut self, node: NodeIdx, name: &str, ty: SymRef, is_let: bool) -> GenResult<SymRef> {
    let stack_pos = self.frame().locals.len() as u8;
    let kind = self.var_kind(is_let, ty, true, stack_pos);
    let r = self.declare(node, name, Sym::new(name, kind))?;
    self.frame_mut().locals.push(r);
    Ok(r)
  }

  pub(crate) fn emit_default_for_type(&mut self, ty: SymRef) {
    if ty == self.prims.boolean {
      self.emit_op(OpCode::PushFalse);
    } else if ty == self.prims.number {
      self.emit_op(OpCode::PushN);
      self.frame_mut().chunk.push_f64(0.0);
    } else if ty == self.prims.string {
      let id = self.frame_mut().chunk.intern_string("");
      self.emit_op(OpCode::PushS);
      self.frame_mut().chunk.push_u16(id);
    } else {
      let wire_id = self.type_wire_id(ty);
      self.emit_op(OpCode::PushNil);
      self.frame_mut().chunk.push_u16(wire_id);
    }
  }

  fn body_ends_in_return(&self, children: &[NodeIdx]) -> bool {
    matches!(children.last().map(|n| self.ast.get(*n)), Some(NodeKind::ReturnStmt(_)))
  }

  /// Compiles a procedure body into a fresh frame: binds `aliases`
  /// (generic-parameter substitutions, empty for a non-generic proc)
  /// directly into the frame's top scope, declares the parameters and
  /// the synthetic `result` local, walks the body, and appends the
  /// frame's implicit fallthrough return if the body didn't already end
  /// in an explicit one.
  pub(crate) fn compile_proc_body(
    &mut self,
    proc_id: u16,
    params: &[(String, SymRef)],
    return_ty: SymRef,
    body: NodeIdx,
    aliases: &[(String, SymRef)],
  ) -> GenResult<()> {
    self.frames.push(Frame::new(FrameKind::Proc, ContextAllocator::ROOT));
    self.frame_mut().return_ty = Some(return_ty);

    for (name, ty) in aliases {
      self
        .frame_mut()
        .scopes
        .last_mut()
        .expect("fresh proc frame has a scope")
        .bind_alias(name.clone(), *ty);
    }

    for (name, ty) in params {
      self.declare_var(body, name, *ty, true)?;
    }

    if !self.is_void(return_ty) {
      self.emit_default_for_type(return_ty);
      self.declare_local_bypassing_reserved(body, "result", return_ty, false)?;
      self.frame_mut().result_pos = Some((self.frame().locals.len() - 1) as u8);
    }

    let body_children = match self.ast.get(body).clone() {
      NodeKind::Block(c) => c,
      _ => unreachable!("procedure body must be a block"),
    };

    let gen_result = (|| -> GenResult<()> {
      for stmt in &body_children {
        self.gen_stmt(*stmt)?;
      }
      Ok(())
    })();

    if gen_result.is_ok() && !self.body_ends_in_return(&body_children) {
      if self.is_void(return_ty) {
        self.emit_op(OpCode::ReturnVoid);
      } else {
        let pos = self.frame().result_pos.expect("non-void proc declares a result local");
        self.emit_op(OpCode::PushL);
        self.frame_mut().chunk.push_byte(pos);
        self.emit_op(OpCode::ReturnVal);
      }
    }

    let frame = self.frames.pop().expect("just pushed a proc frame");
    gen_result?;
    self.script.fill_native_proc(proc_id, frame.chunk);
    Ok(())
  }

  pub(crate) fn gen_proc_decl(&mut self, node: NodeIdx, p: ProcDeclNode) -> GenResult<()> {
    let is_generic = !p.generics.is_empty();
    if is_generic {
      self.push_bare_scope();
    }
    let generic_param_refs = self.declare_generic_params(node, &p.generics)?;

    let decl_result = (|| -> GenResult<()> {
      let mut params = Vec::with_capacity(p.params.len());
      for param in &p.params {
        let ty = self.gen_type_expr(param.ty)?;
        params.push((param.name.clone(), ty));
      }
      let return_ty = match &p.ret_ty {
        Some(t) => self.gen_type_expr(*t)?,
        None => self.prims.void,
      };

      let proc_id = self.script.reserve_proc(p.name.clone(), params.len() as u8, !self.is_void(return_ty));

      let mut sym = Sym::new(&p.name, SymKind::Proc {
        proc_id,
        params: params.clone(),
        return_ty,
        body: p.body,
        sig_ast: is_generic.then(|| (p.params.clone(), p.ret_ty)),
      });
      if is_generic {
        sym = sym.with_generics(generic_param_refs.clone());
      }
      self.declare(node, &p.name, sym)?;

      if !is_generic {
        self.compile_proc_body(proc_id, &params, return_ty, p.body, &[])?;
      }
      Ok(())
    })();

    if is_generic {
      self.pop_bare_scope();
    }
    decl_result
  }

  /// Declaring an iterator only ever registers its symbol; the body is
  /// never compiled on its own, only spliced by `gen_for` into whatever
  /// `for` loop drives it.
  pub(crate) fn gen_iterator_decl(&mut self, node: NodeIdx, it: IteratorDeclNode) -> GenResult<()> {
    let is_generic = !it.generics.is_empty();
    if is_generic {
      self.push_bare_scope();
    }
    let generic_param_refs = self.declare_generic_params(node, &it.generics)?;

    let decl_result = (|| -> GenResult<()> {
      let mut params = Vec::with_capacity(it.params.len());
      for param in &it.params {
        let ty = self.gen_type_expr(param.ty)?;
        params.push((param.name.clone(), ty));
      }
      let yield_ty = self.gen_type_expr(it.yield_ty)?;

      let mut sym = Sym::new(&it.name, SymKind::Iterator {
        params,
        yield_ty,
        body_ast: it.body,
        sig_ast: is_generic.then(|| (it.params.clone(), it.yield_ty)),
      });
      if is_generic {
        sym = sym.with_generics(generic_param_refs.clone());
      }
      self.declare(node, &it.name, sym)?;
      Ok(())
    })();

    if is_generic {
      self.pop_bare_scope();
    }
    decl_result
  }

  /// Same skeleton as a procedure, minus a body: assigns `object_id`
  /// before registering fields so a self-referencing field list could
  /// be supported later without renumbering existing types.
  pub(crate) fn gen_object_decl(&mut self, node: NodeIdx, o: ObjectDeclNode) -> GenResult<()> {
    let is_generic = !o.generics.is_empty();
    if is_generic {
      self.push_bare_scope();
    }
    let generic_param_refs = self.declare_generic_params(node, &o.generics)?;

    let decl_result = (|| -> GenResult<()> {
      let object_id = self.script.next_type_id();
      let mut fields = Vec::with_capacity(o.fields.len());
      for (id, field) in o.fields.iter().enumerate() {
        let ty = self.gen_type_expr(field.ty)?;
        fields.push(ObjectField {
          id: id as u8,
          name: field.name.clone(),
          ty,
        });
      }

      let mut sym = Sym::new(&o.name, SymKind::Type(TypeKind::Object {
        object_id,
        fields,
        fields_ast: is_generic.then(|| o.fields.clone()),
      }));
      if is_generic {
        sym = sym.with_generics(generic_param_refs.clone());
      }
      self.declare(node, &o.name, sym)?;
      Ok(())
    })();

    if is_generic {
      self.pop_bare_scope();
    }
    decl_result
  }
}
