//! Expression code generation: literals, identifiers, operators, calls,
//! object construction and field access, and type-expression resolution.
//! Operators dispatch to a fixed builtin table when both operands are
//! primitives, falling back to an operator-overload procedure (a `proc`
//! declared under the operator's own lexeme, e.g. `proc +(...)`) otherwise.

use core::ast::{AssignNode, CallNode, DotNode, IndexNode, InfixNode, NodeIdx, NodeKind, PrefixNode};
use core::bytecode::OpCode;
use core::errors::{CompileError, ErrorKind};

use symbols::{OverloadError, SymKind, SymRef, TypeKind};

use crate::{GenResult, Generator};

impl<'a> Generator<'a> {
  pub(crate) fn gen_expr(&mut self, node: NodeIdx) -> GenResult<SymRef> {
    match self.ast.get(node).clone() {
      NodeKind::NumberLit(n) => {
        self.sync_pos(node);
        self.emit_op(OpCode::PushN);
        self.frame_mut().chunk.push_f64(n);
        Ok(self.prims.number)
      }
      NodeKind::StringLit(s) => {
        self.sync_pos(node);
        let id = self.frame_mut().chunk.intern_string(&s);
        self.emit_op(OpCode::PushS);
        self.frame_mut().chunk.push_u16(id);
        Ok(self.prims.string)
      }
      NodeKind::BoolLit(b) => {
        self.sync_pos(node);
        self.emit_op(if b { OpCode::PushTrue } else { OpCode::PushFalse });
        Ok(self.prims.boolean)
      }
      NodeKind::NullLit => {
        self.sync_pos(node);
        self.emit_op(OpCode::PushNil);
        self.frame_mut().chunk.push_u16(0);
        Ok(self.prims.void)
      }
      NodeKind::Ident(name) => self.gen_ident(node, &name),
      NodeKind::Prefix(p) => self.gen_prefix(node, p),
      NodeKind::Infix(i) => self.gen_infix(node, i),
      NodeKind::LogicAnd(i) => self.gen_logic(node, i, true),
      NodeKind::LogicOr(i) => self.gen_logic(node, i, false),
      NodeKind::Assign(a) => self.gen_assign(node, a),
      NodeKind::Call(c) => self.gen_call(node, c),
      NodeKind::Dot(d) => self.gen_dot(node, d),
      NodeKind::IfExpr(i) => self.gen_if(node, i, true),
      other => unreachable!("{:?} is not an expression node", other),
    }
  }

  fn gen_ident(&mut self, node: NodeIdx, name: &str) -> GenResult<SymRef> {
    let r = self
      .lookup_name(name)
      .ok_or_else(|| self.err(node, ErrorKind::UndefinedReference, format!("Undefined reference to '{}'.", name)))?;
    let r = self
      .sym_matching(r, |s| s.is_var_or_let())
      .ok_or_else(|| self.err(node, ErrorKind::SymKindMismatch, format!("'{}' does not name a variable.", name)))?;

    let (ty, local, stack_pos) = match &self.arena.get(r).kind {
      SymKind::Var { ty, local, stack_pos, .. } => (*ty, *local, *stack_pos),
      SymKind::Let { ty, local, stack_pos, .. } => (*ty, *local, *stack_pos),
      _ => unreachable!("sym_matching guaranteed a Var or Let"),
    };

    self.sync_pos(node);
    if local {
      self.emit_op(OpCode::PushL);
      self.frame_mut().chunk.push_byte(stack_pos);
    } else {
      let id = self.frame_mut().chunk.intern_string(name);
      self.emit_op(OpCode::PushG);
      self.frame_mut().chunk.push_u16(id);
    }
    Ok(ty)
  }

  fn builtin_infix(&self, op: &str, lt: SymRef, rt: SymRef) -> Option<(OpCode, SymRef)> {
    let num = self.prims.number;
    let boolean = self.prims.boolean;
    match op {
      "+" if lt == num && rt == num => Some((OpCode::AddN, num)),
      "-" if lt == num && rt == num => Some((OpCode::SubN, num)),
      "*" if lt == num && rt == num => Some((OpCode::MultN, num)),
      "/" if lt == num && rt == num => Some((OpCode::DivN, num)),
      "<" if lt == num && rt == num => Some((OpCode::LessN, boolean)),
      ">" if lt == num && rt == num => Some((OpCode::GreaterN, boolean)),
      "==" if lt == num && rt == num => Some((OpCode::EqN, boolean)),
      "==" if lt == boolean && rt == boolean => Some((OpCode::EqB, boolean)),
      _ => None,
    }
  }

  fn builtin_prefix(&self, op: &str, t: SymRef) -> Option<(OpCode, SymRef)> {
    match op {
      "-" if t == self.prims.number => Some((OpCode::NegN, self.prims.number)),
      "!" if t == self.prims.boolean => Some((OpCode::InvB, self.prims.boolean)),
      _ => None,
    }
  }

  fn gen_infix(&mut self, node: NodeIdx, i: InfixNode) -> GenResult<SymRef> {
    let lt = self.gen_expr(i.left)?;
    self.require_value(lt, i.left)?;
    let rt = self.gen_expr(i.right)?;
    self.require_value(rt, i.right)?;
    self.sync_pos(node);

    if let Some((op_code, result_ty)) = self.builtin_infix(&i.op, lt, rt) {
      self.emit_op(op_code);
      return Ok(result_ty);
    }

    self.emit_operator_call(node, &i.op, &[lt, rt])
  }

  fn gen_prefix(&mut self, node: NodeIdx, p: PrefixNode) -> GenResult<SymRef> {
    let t = self.gen_expr(p.operand)?;
    self.require_value(t, p.operand)?;
    self.sync_pos(node);

    if let Some((op_code, result_ty)) = self.builtin_prefix(&p.op, t) {
      self.emit_op(op_code);
      return Ok(result_ty);
    }

    self.emit_operator_call(node, &p.op, &[t])
  }

  /// An operator with no builtin rule for these operand types falls back
  /// to a `proc` declared under the operator's own lexeme, resolved the
  /// same way any other overloaded call would be.
  fn emit_operator_call(&mut self, node: NodeIdx, op: &str, arg_types: &[SymRef]) -> GenResult<SymRef> {
    let callee = self.lookup_name(op).ok_or_else(|| {
      self.err(
        node,
        ErrorKind::NotAProc,
        format!("No operator overload of '{}' is declared for these operand types.", op),
      )
    })?;
    let resolved = symbols::resolve(&self.arena, callee, arg_types).map_err(|e| self.overload_err(node, op, e))?;
    self.emit_resolved_call(node, resolved)
  }

  /// `and`/`or` short-circuit: evaluate the left operand, conditionally
  /// jump past the right operand keeping the left value on the stack
  /// (the short-circuited case), otherwise discard it and evaluate the
  /// right operand as the result.
  fn gen_logic(&mut self, node: NodeIdx, i: InfixNode, is_and: bool) -> GenResult<SymRef> {
    let lt = self.gen_expr(i.left)?;
    self.require_bool(lt, i.left)?;
    self.sync_pos(node);

    let short_circuit_op = if is_and { OpCode::JumpFwdF } else { OpCode::JumpFwdT };
    let hole = self.emit_hole_op(short_circuit_op);
    self.emit_op(OpCode::Discard);

    let rt = self.gen_expr(i.right)?;
    self.require_bool(rt, i.right)?;

    self.patch_hole(hole);
    Ok(self.prims.boolean)
  }

  fn gen_assign(&mut self, node: NodeIdx, a: AssignNode) -> GenResult<SymRef> {
    match self.ast.get(a.target).clone() {
      NodeKind::Ident(name) => self.gen_assign_ident(node, &name, a.value),
      NodeKind::Dot(d) => self.gen_assign_field(node, d, a.value),
      _ => Err(self.err(a.target, ErrorKind::InvalidAssignment, ErrorKind::InvalidAssignment.template())),
    }
  }

  fn gen_assign_ident(&mut self, node: NodeIdx, name: &str, value: NodeIdx) -> GenResult<SymRef> {
    let r = self
      .lookup_name(name)
      .ok_or_else(|| self.err(node, ErrorKind::UndefinedReference, format!("Undefined reference to '{}'.", name)))?;
    let r = self
      .sym_matching(r, |s| s.is_var_or_let())
      .ok_or_else(|| self.err(node, ErrorKind::InvalidAssignment, ErrorKind::InvalidAssignment.template()))?;

    let (is_let, ty, local, stack_pos) = match &self.arena.get(r).kind {
      SymKind::Var { ty, local, stack_pos, .. } => (false, *ty, *local, *stack_pos),
      SymKind::Let { ty, local, stack_pos, .. } => (true, *ty, *local, *stack_pos),
      _ => unreachable!("sym_matching guaranteed a Var or Let"),
    };
    if is_let {
      return Err(self.err(node, ErrorKind::LetReassignment, format!("'{}' cannot be reassigned.", name)));
    }

    let vt = self.gen_expr(value)?;
    self.require_type(ty, vt, value)?;
    self.sync_pos(node);

    if local {
      self.emit_op(OpCode::PopL);
      self.frame_mut().chunk.push_byte(stack_pos);
    } else {
      let id = self.frame_mut().chunk.intern_string(name);
      self.emit_op(OpCode::PopG);
      self.frame_mut().chunk.push_u16(id);
    }

    Ok(self.prims.void)
  }

  fn gen_assign_field(&mut self, node: NodeIdx, d: DotNode, value: NodeIdx) -> GenResult<SymRef> {
    let obj_ty = self.gen_expr(d.target)?;
    self.require_value(obj_ty, d.target)?;
    let (field_id, field_ty) = self.object_field(node, obj_ty, &d.field)?;

    let vt = self.gen_expr(value)?;
    self.require_type(field_ty, vt, value)?;
    self.sync_pos(node);
    self.emit_op(OpCode::PopF);
    self.frame_mut().chunk.push_byte(field_id);

    Ok(self.prims.void)
  }

  fn gen_dot(&mut self, node: NodeIdx, d: DotNode) -> GenResult<SymRef> {
    let obj_ty = self.gen_expr(d.target)?;
    self.require_value(obj_ty, d.target)?;
    let (field_id, field_ty) = self.object_field(node, obj_ty, &d.field)?;
    self.sync_pos(node);
    self.emit_op(OpCode::PushF);
    self.frame_mut().chunk.push_byte(field_id);
    Ok(field_ty)
  }

  /// Looks `field_name` up on an object type, translating the two ways
  /// this can fail into their respective diagnostics.
  pub(crate) fn object_field(&self, node: NodeIdx, obj_ty: SymRef, field_name: &str) -> GenResult<(u8, SymRef)> {
    match &self.arena.get(obj_ty).kind {
      SymKind::Type(TypeKind::Object { fields, .. }) => fields
        .iter()
        .find(|f| f.name == field_name)
        .map(|f| (f.id, f.ty))
        .ok_or_else(|| {
          self.err(
            node,
            ErrorKind::NoSuchField,
            format!("Type '{}' has no field named '{}'.", self.arena.get(obj_ty).name, field_name),
          )
        }),
      _ => Err(self.err(
        node,
        ErrorKind::TypeIsNotAnObject,
        format!("'{}' is not an object type.", self.arena.get(obj_ty).name),
      )),
    }
  }

  fn gen_call(&mut self, node: NodeIdx, c: CallNode) -> GenResult<SymRef> {
    match self.ast.get(c.callee).clone() {
      NodeKind::Ident(name) => self.gen_named_call(node, &name, c.callee, &c.args),
      NodeKind::Index(idx) => self.gen_generic_call(node, idx, &c.args),
      _ => Err(self.err(c.callee, ErrorKind::NotAProc, "Invalid call target.")),
    }
  }

  fn gen_named_call(&mut self, node: NodeIdx, name: &str, callee_node: NodeIdx, args: &[NodeIdx]) -> GenResult<SymRef> {
    let r = self
      .lookup_name(name)
      .ok_or_else(|| self.err(callee_node, ErrorKind::UndefinedReference, format!("Undefined reference to '{}'.", name)))?;

    if let Some(ty_ref) = self.sym_matching(r, |s| s.is_type()) {
      if self.arena.get(ty_ref).is_generic_template() {
        return Err(self.err(
          callee_node,
          ErrorKind::CouldNotInferGeneric,
          format!("Could not infer generic arguments for '{}'; use '{}[T, ...]'.", name, name),
        ));
      }
      return self.gen_object_ctor(node, ty_ref, args);
    }

    if self.sym_matching(r, |s| s.is_generic_template()).is_some() {
      return Err(self.err(
        callee_node,
        ErrorKind::CouldNotInferGeneric,
        format!("Could not infer generic arguments for '{}'; use '{}[T, ...]'.", name, name),
      ));
    }

    let arg_types = self.gen_plain_args(args)?;
    let resolved = symbols::resolve(&self.arena, r, &arg_types).map_err(|e| self.overload_err(node, name, e))?;
    self.emit_resolved_call(node, resolved)
  }

  fn gen_generic_call(&mut self, node: NodeIdx, idx: IndexNode, args: &[NodeIdx]) -> GenResult<SymRef> {
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

    let mut type_args = Vec::with_capacity(idx.args.len());
    for a in &idx.args {
      type_args.push(self.gen_type_expr(*a)?);
    }
    let inst = self.instantiate(template, type_args, idx.target)?;

    if self.arena.get(inst).is_type() {
      return self.gen_object_ctor(node, inst, args);
    }

    let arg_types = self.gen_plain_args(args)?;
    let resolved = symbols::resolve(&self.arena, inst, &arg_types).map_err(|e| self.overload_err(node, &name, e))?;
    self.emit_resolved_call(node, resolved)
  }

  pub(crate) fn gen_plain_args(&mut self, args: &[NodeIdx]) -> GenResult<Vec<SymRef>> {
    let mut types = Vec::with_capacity(args.len());
    for a in args {
      let t = self.gen_expr(*a)?;
      self.require_value(t, *a)?;
      types.push(t);
    }
    Ok(types)
  }

  pub(crate) fn emit_resolved_call(&mut self, node: NodeIdx, callable: SymRef) -> GenResult<SymRef> {
    let (proc_id, return_ty) = match &self.arena.get(callable).kind {
      SymKind::Proc { proc_id, return_ty, .. } => (*proc_id, *return_ty),
      SymKind::Iterator { .. } => return Err(self.err(node, ErrorKind::NotAProc, "An iterator can only be driven by a 'for' loop.")),
      _ => unreachable!("emit_resolved_call given a non-callable symbol"),
    };
    self.sync_pos(node);
    self.emit_op(OpCode::CallD);
    self.frame_mut().chunk.push_u16(proc_id);
    Ok(return_ty)
  }

  /// `T(field: v, …)`: evaluates arguments in field-declaration order
  /// regardless of source order, then emits a single `constrObj`.
  fn gen_object_ctor(&mut self, node: NodeIdx, obj_ty: SymRef, args: &[NodeIdx]) -> GenResult<SymRef> {
    let fields = match &self.arena.get(obj_ty).kind {
      SymKind::Type(TypeKind::Object { fields, .. }) => fields.clone(),
      _ => {
        return Err(self.err(
          node,
          ErrorKind::TypeIsNotAnObject,
          format!("'{}' is not an object type.", self.arena.get(obj_ty).name),
        ))
      }
    };

    let mut inits: Vec<Option<NodeIdx>> = vec![None; fields.len()];
    for arg in args {
      let colon = match self.ast.get(*arg).clone() {
        NodeKind::ColonExpr(c) => c,
        _ => return Err(self.err(*arg, ErrorKind::FieldInitMustBeAColonExpr, ErrorKind::FieldInitMustBeAColonExpr.template())),
      };
      let field_name = match self.ast.get(colon.name).clone() {
        NodeKind::Ident(n) => n,
        _ => return Err(self.err(colon.name, ErrorKind::InvalidField, ErrorKind::InvalidField.template())),
      };
      let idx = fields.iter().position(|f| f.name == field_name).ok_or_else(|| {
        self.err(
          *arg,
          ErrorKind::NoSuchField,
          format!("Type '{}' has no field named '{}'.", self.arena.get(obj_ty).name, field_name),
        )
      })?;
      if inits[idx].is_some() {
        return Err(self.err(*arg, ErrorKind::NoSuchField, format!("Field '{}' is already initialized.", field_name)));
      }
      inits[idx] = Some(colon.value);
    }

    for (i, field) in fields.iter().enumerate() {
      let value = inits[i].ok_or_else(|| {
        self.err(
          node,
          ErrorKind::ObjectFieldsMustBeInitialized,
          format!("All fields of '{}' must be initialized exactly once.", self.arena.get(obj_ty).name),
        )
      })?;
      let vt = self.gen_expr(value)?;
      self.require_type(field.ty, vt, value)?;
    }

    self.sync_pos(node);
    let wire_id = self.type_wire_id(obj_ty);
    self.emit_op(OpCode::ConstrObj);
    self.frame_mut().chunk.push_u16(wire_id);
    self.frame_mut().chunk.push_byte(fields.len() as u8);
    Ok(obj_ty)
  }

  pub(crate) fn type_wire_id(&self, ty: SymRef) -> u16 {
    match &self.arena.get(ty).kind {
      SymKind::Type(tk) => tk.wire_id(),
      _ => 0,
    }
  }

  /// Resolves a type-position expression: a plain name, a generic
  /// instantiation (`name[args...]`), or the (unsupported) `proc(...)`
  /// annotation.
  pub(crate) fn gen_type_expr(&mut self, node: NodeIdx) -> GenResult<SymRef> {
    match self.ast.get(node).clone() {
      NodeKind::Ident(name) => self.resolve_type_name(node, &name),
      NodeKind::Index(idx) => {
        let name = match self.ast.get(idx.target).clone() {
          NodeKind::Ident(n) => n,
          _ => return Err(self.err(idx.target, ErrorKind::InvalidSymName, ErrorKind::InvalidSymName.template())),
        };
        let r = self
          .lookup_type_name(&name)
          .ok_or_else(|| self.err(idx.target, ErrorKind::UndefinedReference, format!("Undefined reference to '{}'.", name)))?;
        let template = self
          .sym_matching(r, |s| s.is_generic_template())
          .ok_or_else(|| self.err(idx.target, ErrorKind::NotGeneric, format!("'{}' is not generic.", name)))?;

        let mut args = Vec::with_capacity(idx.args.len());
        for a in &idx.args {
          args.push(self.gen_type_expr(*a)?);
        }
        self.instantiate(template, args, idx.target)
      }
      NodeKind::ProcType(_) => Err(self.err(node, ErrorKind::ProcTypeUnsupported, ErrorKind::ProcTypeUnsupported.template())),
      _ => Err(self.err(node, ErrorKind::InvalidSymName, ErrorKind::InvalidSymName.template())),
    }
  }

  fn resolve_type_name(&self, node: NodeIdx, name: &str) -> GenResult<SymRef> {
    let r = self
      .lookup_type_name(name)
      .ok_or_else(|| self.err(node, ErrorKind::UndefinedReference, format!("Undefined reference to '{}'.", name)))?;
    let r = self
      .sym_matching(r, |s| s.is_type())
      .ok_or_else(|| self.err(node, ErrorKind::SymKindMismatch, format!("'{}' does not name a type.", name)))?;
    if self.arena.get(r).is_generic_template() {
      return Err(self.err(
        node,
        ErrorKind::CouldNotInferGeneric,
        format!("Could not infer generic arguments for '{}'; use '{}[T, ...]'.", name, name),
      ));
    }
    Ok(r)
  }

  pub(crate) fn overload_err(&self, node: NodeIdx, name: &str, e: OverloadError) -> CompileError {
    match e {
      OverloadError::NotAProc => self.err(node, ErrorKind::NotAProc, format!("'{}' is not callable.", name)),
      OverloadError::TypeMismatch => self.err(
        node,
        ErrorKind::TypeMismatch,
        format!("No overload of '{}' matches the given arguments.", name),
      ),
      OverloadError::TypeMismatchChoice(sigs) => self.err(
        node,
        ErrorKind::TypeMismatchChoice,
        format!("No overload of '{}' matches the given arguments. Candidates:\n  {}", name, sigs.join("\n  ")),
      ),
    }
  }
}
