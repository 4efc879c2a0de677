//! Statement code generation: blocks, `if`/`while`, `break`/`continue`,
//! `return`/`yield`, and `var`/`let` declarations. Declaration of
//! `proc`/`iterator`/`object` and the `for` splice live in their own
//! modules; this one dispatches to them.

use core::ast::{IfNode, NodeIdx, NodeKind, VarDeclNode, WhileNode};
use core::bytecode::OpCode;
use core::errors::ErrorKind;

use crate::{FlowKind, FrameKind, GenResult, Generator};

impl<'a> Generator<'a> {
  pub(crate) fn gen_stmt(&mut self, node: NodeIdx) -> GenResult<()> {
    match self.ast.get(node).clone() {
      NodeKind::Block(children) => {
        self.gen_block(&children, false)?;
        Ok(())
      }
      NodeKind::ExprStmt(e) => self.gen_expr_stmt(e),
      NodeKind::IfExpr(i) => {
        self.gen_if(node, i, false)?;
        Ok(())
      }
      NodeKind::WhileStmt(w) => self.gen_while(node, w),
      NodeKind::ForStmt(f) => self.gen_for(node, f),
      NodeKind::BreakStmt => self.gen_break(node),
      NodeKind::ContinueStmt => self.gen_continue(node),
      NodeKind::ReturnStmt(e) => self.gen_return(node, e),
      NodeKind::YieldStmt(v) => self.gen_yield(node, v),
      NodeKind::VarDecl(v) => self.gen_var_decl(node, v),
      NodeKind::ProcDecl(p) => self.gen_proc_decl(node, p),
      NodeKind::IteratorDecl(it) => self.gen_iterator_decl(node, it),
      NodeKind::ObjectDecl(o) => self.gen_object_decl(node, o),
      other => unreachable!("{:?} is not a statement node", other),
    }
  }

  fn gen_expr_stmt(&mut self, e: NodeIdx) -> GenResult<()> {
    let ty = self.gen_expr(e)?;
    if !self.is_void(ty) {
      self.emit_discard_n(1);
    }
    Ok(())
  }

  /// Pushes a scope, generates every statement in `children`, then pops
  /// it. In expression mode the final child is generated as a value
  /// (via `gen_block_tail`) instead of being discarded; its type becomes
  /// the block's type.
  pub(crate) fn gen_block(&mut self, children: &[NodeIdx], as_expr: bool) -> GenResult<symbols::SymRef> {
    self.push_scope();
    let mut result_ty = self.prims.void;
    for (i, child) in children.iter().enumerate() {
      let is_last = i + 1 == children.len();
      if is_last && as_expr {
        result_ty = self.gen_block_tail(*child)?;
      } else {
        self.gen_stmt(*child)?;
      }
    }
    self.pop_scope();
    Ok(result_ty)
  }

  fn gen_block_tail(&mut self, node: NodeIdx) -> GenResult<symbols::SymRef> {
    match self.ast.get(node).clone() {
      NodeKind::ExprStmt(e) => self.gen_expr(e),
      _ => {
        self.gen_stmt(node)?;
        Ok(self.prims.void)
      }
    }
  }

  pub(crate) fn gen_block_node(&mut self, node: NodeIdx, as_expr: bool) -> GenResult<symbols::SymRef> {
    match self.ast.get(node).clone() {
      NodeKind::Block(children) => self.gen_block(&children, as_expr),
      _ => unreachable!("if/while body must be a block"),
    }
  }

  /// `if`/`elif`/`else` chain. Each clause follows the same pattern as
  /// `while`'s condition test: the condition's boolean is discarded on
  /// whichever path (true or false) didn't take the jump. In expression
  /// mode every branch's type must agree and a missing `else` is an
  /// error.
  pub(crate) fn gen_if(&mut self, node: NodeIdx, i: IfNode, as_expr: bool) -> GenResult<symbols::SymRef> {
    let mut branches: Vec<(NodeIdx, NodeIdx)> = Vec::with_capacity(i.elifs.len() + 1);
    branches.push((i.cond, i.then_branch));
    branches.extend(i.elifs.iter().copied());

    let mut end_holes = Vec::new();
    let mut result_ty: Option<symbols::SymRef> = None;

    for (cond, body) in branches {
      let ct = self.gen_expr(cond)?;
      self.require_bool(ct, cond)?;
      self.sync_pos(cond);
      let skip_hole = self.emit_hole_op(OpCode::JumpFwdF);
      self.emit_op(OpCode::Discard);

      let bt = self.gen_block_node(body, as_expr)?;
      if as_expr {
        result_ty = Some(match result_ty {
          None => bt,
          Some(expected) => {
            self.require_type(expected, bt, body)?;
            expected
          }
        });
      }

      end_holes.push(self.emit_hole_op(OpCode::JumpFwd));
      self.patch_hole(skip_hole);
      self.emit_op(OpCode::Discard);
    }

    match i.else_branch {
      Some(else_body) => {
        let bt = self.gen_block_node(else_body, as_expr)?;
        if as_expr {
          result_ty = Some(match result_ty {
            None => bt,
            Some(expected) => {
              self.require_type(expected, bt, else_body)?;
              expected
            }
          });
        }
      }
      None if as_expr => {
        return Err(self.err(node, ErrorKind::ValueIsVoid, "An if-expression must have an 'else' branch."));
      }
      None => {}
    }

    for hole in end_holes {
      self.patch_hole(hole);
    }

    Ok(result_ty.unwrap_or(self.prims.void))
  }

  /// `while true { ... }` and `while false { ... }` are special-cased:
  /// the former skips the condition test and its discard entirely, the
  /// latter emits nothing at all.
  fn gen_while(&mut self, node: NodeIdx, w: WhileNode) -> GenResult<()> {
    let cond_kind = self.ast.get(w.cond).clone();
    self.push_flow(FlowKind::LoopOuter);

    match cond_kind {
      NodeKind::BoolLit(false) => {
        self.pop_flow();
        return Ok(());
      }
      NodeKind::BoolLit(true) => {
        let loop_top = self.frame().chunk.len();
        self.push_flow(FlowKind::LoopIter);
        self.gen_block_node(w.body, false)?;
        self.pop_flow();
        self.sync_pos(node);
        self.emit_jump_back(loop_top);
      }
      _ => {
        let loop_top = self.frame().chunk.len();
        let ct = self.gen_expr(w.cond)?;
        self.require_bool(ct, w.cond)?;
        self.sync_pos(w.cond);
        let exit_hole = self.emit_hole_op(OpCode::JumpFwdF);
        self.emit_op(OpCode::Discard);

        self.push_flow(FlowKind::LoopIter);
        self.gen_block_node(w.body, false)?;
        self.pop_flow();

        self.sync_pos(node);
        self.emit_jump_back(loop_top);
        self.patch_hole(exit_hole);
        self.emit_op(OpCode::Discard);
      }
    }

    self.pop_flow();
    Ok(())
  }

  fn gen_break(&mut self, node: NodeIdx) -> GenResult<()> {
    let idx = self
      .find_flow(FlowKind::LoopOuter)
      .ok_or_else(|| self.err(node, ErrorKind::OnlyUsableInABlock, "'break' can only be used inside a loop."))?;
    self.emit_flow_exit(node, idx);
    Ok(())
  }

  fn gen_continue(&mut self, node: NodeIdx) -> GenResult<()> {
    let idx = self
      .find_flow(FlowKind::LoopIter)
      .ok_or_else(|| self.err(node, ErrorKind::OnlyUsableInALoop, "'continue' can only be used inside a loop."))?;
    self.emit_flow_exit(node, idx);
    Ok(())
  }

  /// Discards every local declared since the target flow block was
  /// pushed, then records a forward-jump hole against that block to be
  /// patched once its end position is known.
  fn emit_flow_exit(&mut self, node: NodeIdx, idx: usize) {
    let locals_at_entry = self.frame().flow[idx].locals_at_entry;
    let n = (self.frame().locals.len() - locals_at_entry) as u8;
    self.sync_pos(node);
    self.emit_discard_n(n);
    let hole = self.emit_hole_op(OpCode::JumpFwd);
    self.frame_mut().flow[idx].exit_holes.push(hole);
  }

  /// A bare `return` yields whatever the synthetic `result` local
  /// currently holds; `return expr` first assigns `expr` into `result`.
  /// Either way the frame's trailing fallthrough return (emitted once
  /// the body finishes, see `gen_declarations`) is bypassed here.
  fn gen_return(&mut self, node: NodeIdx, e: Option<NodeIdx>) -> GenResult<()> {
    if self.frame().kind != FrameKind::Proc {
      return Err(self.err(node, ErrorKind::OnlyUsableInAProc, "'return' can only be used inside a procedure."));
    }
    let return_ty = self.frame().return_ty.expect("proc frame always has a return_ty");

    match e {
      Some(expr) => {
        let vt = self.gen_expr(expr)?;
        self.require_type(return_ty, vt, expr)?;
        self.sync_pos(node);
        if self.is_void(return_ty) {
          self.emit_discard_n(1);
          self.emit_op(OpCode::ReturnVoid);
        } else {
          let pos = self.frame().result_pos.expect("non-void proc declares a result local");
          self.emit_op(OpCode::PopL);
          self.frame_mut().chunk.push_byte(pos);
          self.emit_op(OpCode::PushL);
          self.frame_mut().chunk.push_byte(pos);
          self.emit_op(OpCode::ReturnVal);
        }
      }
      None => {
        self.sync_pos(node);
        if self.is_void(return_ty) {
          self.emit_op(OpCode::ReturnVoid);
        } else {
          let pos = self.frame().result_pos.expect("non-void proc declares a result local");
          self.emit_op(OpCode::PushL);
          self.frame_mut().chunk.push_byte(pos);
          self.emit_op(OpCode::ReturnVal);
        }
      }
    }
    Ok(())
  }

  /// Splices the yielded value into the `for` loop currently driving
  /// this iterator body: binds the loop variable to the yielded value
  /// under the *caller's* context, generates the loop body there, then
  /// restores this frame's own context.
  fn gen_yield(&mut self, node: NodeIdx, value: NodeIdx) -> GenResult<()> {
    let target_ctx = self
      .frame()
      .iter_for_ctx
      .ok_or_else(|| self.err(node, ErrorKind::OnlyUsableInAnIterator, ErrorKind::OnlyUsableInAnIterator.template()))?;
    if self.frame().current_ctx == target_ctx {
      return Err(self.err(node, ErrorKind::OnlyUsableInAnIterator, ErrorKind::OnlyUsableInAnIterator.template()));
    }

    let yield_ty = self.frame().iter_yield_ty.expect("iterator splice always records its yield type");
    let vt = self.gen_expr(value)?;
    self.require_type(yield_ty, vt, value)?;

    let splice_ctx = self.frame().current_ctx;
    self.frame_mut().current_ctx = target_ctx;
    self.push_flow(FlowKind::LoopIter);
    self.push_scope();

    let loop_var = self.frame().iter_for_var.clone().expect("iterator splice always records its loop var");
    self.declare_var(node, &loop_var, yield_ty, true)?;

    let body = self.frame().iter_for_body.expect("iterator splice always records its body");
    let result = self.gen_stmt(body);

    self.pop_scope();
    self.pop_flow();
    self.frame_mut().current_ctx = splice_ctx;

    result
  }

  fn gen_var_decl(&mut self, node: NodeIdx, v: VarDeclNode) -> GenResult<()> {
    let value = v
      .value
      .ok_or_else(|| self.err(node, ErrorKind::VarMustHaveValue, ErrorKind::VarMustHaveValue.template()))?;

    let annotation = match v.ty {
      Some(ty_node) => Some(self.gen_type_expr(ty_node)?),
      None => None,
    };

    for name in &v.names {
      let vt = self.gen_expr(value)?;
      self.require_value(vt, value)?;
      if let Some(ann) = annotation {
        self.require_type(ann, vt, value)?;
      }
      self.sync_pos(node);
      let (_, is_global) = self.declare_var(node, name, vt, v.is_let)?;
      if is_global {
        let id = self.frame_mut().chunk.intern_string(name);
        self.emit_op(OpCode::PopG);
        self.frame_mut().chunk.push_u16(id);
      }
    }
    Ok(())
  }
}
