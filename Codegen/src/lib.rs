//! Walks an AST produced by `parser` and lowers it into a `core::script::Script`:
//! resolving names and types against the symbol model in `symbols`, checking
//! types, and emitting opcodes into a `Chunk` per procedure.

use core::ast::{AstArena, NodeIdx, NodeKind};
use core::bytecode::OpCode;
use core::chunk::Chunk;
use core::errors::{CompileError, Diagnostic, ErrorKind};
use core::script::Script;
use core::tokens::SrcLoc;

use symbols::{make_system_module, ContextAllocator, ContextId, Module, Primitives, Scope, Sym, SymArena, SymRef};

mod gen_declarations;
mod gen_expressions;
mod gen_for;
mod gen_statements;
mod generics;
#[cfg(test)]
mod tests;

pub type GenResult<T> = Result<T, CompileError>;

/// Which kind of chunk a [`Frame`] is accumulating. Purely informational:
/// it's what makes `return` and `yield` context-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
  Script,
  Proc,
  Iterator,
}

/// A flow-control block pushed by `while` (outer + iter) and consulted by
/// `break`/`continue`. Stamped with a [`ContextId`] so the for-loop splice
/// can make a block visible only to code running under a specific context
/// (see `gen_for`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlowKind {
  LoopOuter,
  LoopIter,
}

#[derive(Debug)]
struct FlowBlock {
  kind: FlowKind,
  context: ContextId,
  /// `frame.locals.len()` at the time this block was pushed; `break`
  /// discards everything declared since.
  locals_at_entry: usize,
  /// Forward-jump holes recorded by `break` (on a `LoopOuter` block) or
  /// `continue` (on a `LoopIter` block), patched once this block's end
  /// position is known.
  exit_holes: Vec<usize>,
}

/// One chunk under construction: the top-level script, a procedure body,
/// or (while splicing) an iterator body sharing the caller's chunk.
struct Frame {
  kind: FrameKind,
  chunk: Chunk,
  scopes: Vec<Scope>,
  flow: Vec<FlowBlock>,
  current_ctx: ContextId,
  /// Every local declared so far, in stack order; its length doubles as
  /// the next local's `stack_pos`.
  locals: Vec<SymRef>,
  /// `Some(ty)` for a `Proc` frame (`ty` may be `void`); `None` otherwise.
  return_ty: Option<SymRef>,
  /// `stack_pos` of the synthetic `result` local, if the frame declared one.
  result_pos: Option<u8>,
  /// While generating an iterator body that's being spliced into a `for`
  /// loop, the context/var/body of the loop a `yield` should splice into.
  iter_for_ctx: Option<ContextId>,
  iter_for_var: Option<String>,
  iter_for_body: Option<NodeIdx>,
  /// The type a spliced iterator's `yield` must produce, while this
  /// frame is generating that iterator's body.
  iter_yield_ty: Option<SymRef>,
}

impl Frame {
  fn new(kind: FrameKind, context: ContextId) -> Self {
    Frame {
      kind,
      chunk: Chunk::new(),
      scopes: vec![Scope::new(context)],
      flow: Vec::new(),
      current_ctx: context,
      locals: Vec::new(),
      return_ty: None,
      result_pos: None,
      iter_for_ctx: None,
      iter_for_var: None,
      iter_for_body: None,
      iter_yield_ty: None,
    }
  }
}

pub struct Generator<'a> {
  ast: &'a AstArena,
  arena: SymArena,
  module: Module,
  system: Module,
  prims: Primitives,
  script: Script,
  ctx_alloc: ContextAllocator,
  frames: Vec<Frame>,
  /// Stack of `(template, args)` pairs currently being instantiated, so a
  /// generic instantiation that recurses on itself can be caught instead
  /// of looping forever.
  instantiating: Vec<(SymRef, Vec<SymRef>)>,
}

impl<'a> Generator<'a> {
  /// Generates a `Script` from a parsed module's root `Script` node.
  pub fn compile(ast: &'a AstArena, root: NodeIdx) -> GenResult<(Script, SymArena)> {
    let mut arena = SymArena::default();
    let (system, prims) = make_system_module(&mut arena);

    let mut gen = Generator {
      ast,
      arena,
      module: Module::new("main"),
      system,
      prims,
      script: Script::new(),
      ctx_alloc: ContextAllocator::new(),
      frames: vec![Frame::new(FrameKind::Script, ContextAllocator::ROOT)],
      instantiating: Vec::new(),
    };

    let stmts = match gen.ast.get(root) {
      NodeKind::Script(stmts) => stmts.clone(),
      other => unreachable!("compile root must be a Script node, found {:?}", other),
    };

    for stmt in stmts {
      gen.gen_stmt(stmt)?;
    }

    let mut top = gen.frames.pop().expect("script frame").chunk;
    top.push_op(OpCode::Halt);
    gen.script.main = top;

    Ok((gen.script, gen.arena))
  }

  fn frame(&self) -> &Frame {
    self.frames.last().expect("generator always has an active frame")
  }

  fn frame_mut(&mut self) -> &mut Frame {
    self.frames.last_mut().expect("generator always has an active frame")
  }

  fn loc(&self, node: NodeIdx) -> (String, SrcLoc) {
    let l = self.ast.loc(node);
    (l.file.to_string(), l.loc)
  }

  fn err(&self, node: NodeIdx, kind: ErrorKind, message: impl Into<String>) -> CompileError {
    let (file, loc) = self.loc(node);
    CompileError::Semantic(Diagnostic::new(file, loc, kind, message))
  }

  fn sync_pos(&mut self, node: NodeIdx) {
    let (file, loc) = self.loc(node);
    self.frame_mut().chunk.set_pos(&file, loc.line, loc.col);
  }

  fn emit_op(&mut self, op: OpCode) {
    self.frame_mut().chunk.push_op(op);
  }

  fn emit_hole_op(&mut self, op: OpCode) -> usize {
    self.frame_mut().chunk.push_op(op);
    self.frame_mut().chunk.emit_hole()
  }

  fn patch_hole(&mut self, offset: usize) {
    self.frame_mut().chunk.patch_hole_fwd(offset);
  }

  fn emit_jump_back(&mut self, target: usize) {
    let dist = self.frame().chunk.jump_back_distance(target);
    self.emit_op(OpCode::JumpBack);
    self.frame_mut().chunk.push_u16(dist);
  }

  /// Looks a symbol matching `want` up, unwrapping a `Choice` to its
  /// first member that satisfies `want`. Used to pick out e.g. the `Type`
  /// member of a name that is also used as a variable.
  fn sym_matching(&self, r: SymRef, want: impl Fn(&Sym) -> bool) -> Option<SymRef> {
    match &self.arena.get(r).kind {
      symbols::SymKind::Choice { choices } => choices.iter().copied().find(|c| want(self.arena.get(*c))),
      _ if want(self.arena.get(r)) => Some(r),
      _ => None,
    }
  }

  /// Plain name lookup through the active frame's scopes (context-aware),
  /// falling back to the module.
  fn lookup_name(&self, name: &str) -> Option<SymRef> {
    symbols::lookup(&self.frame().scopes, self.frame().current_ctx, &self.module, name)
  }

  /// Type-name lookup: local generic-parameter scopes first (so `T`
  /// resolves inside a generic template's own body), then the `system`
  /// module's primitives, then user-declared object types.
  fn lookup_type_name(&self, name: &str) -> Option<SymRef> {
    for scope in self.frame().scopes.iter().rev() {
      if scope.context != self.frame().current_ctx {
        continue;
      }
      if let Some(r) = scope.get(name) {
        return Some(r);
      }
    }
    self.system.scope.get(name).or_else(|| self.module.scope.get(name))
  }

  fn is_void(&self, ty: SymRef) -> bool {
    ty == self.prims.void
  }

  fn require_value(&self, ty: SymRef, node: NodeIdx) -> GenResult<()> {
    if self.is_void(ty) {
      return Err(self.err(node, ErrorKind::ValueIsVoid, ErrorKind::ValueIsVoid.template()));
    }
    Ok(())
  }

  fn require_type(&self, expected: SymRef, found: SymRef, node: NodeIdx) -> GenResult<()> {
    if expected != found {
      let msg = format!(
        "Expected a value of type '{}' but got '{}'.",
        self.arena.get(expected).name,
        self.arena.get(found).name
      );
      return Err(self.err(node, ErrorKind::TypeMismatch, msg));
    }
    Ok(())
  }

  fn require_bool(&self, ty: SymRef, node: NodeIdx) -> GenResult<()> {
    self.require_type(self.prims.boolean, ty, node)
  }

  /// Inserts `sym` into the current frame's innermost scope, translating
  /// an `insert` collision into the right redeclaration diagnostic.
  fn declare(&mut self, node: NodeIdx, name: &str, sym: Sym) -> GenResult<SymRef> {
    let scope = self.frame_mut().scopes.last_mut().expect("frame always has a scope");
    symbols::insert(&mut self.arena, scope, name, sym).map_err(|_| {
      let kind = if self.frame().scopes.len() == 1 && self.frames.len() == 1 {
        ErrorKind::GlobalRedeclaration
      } else {
        ErrorKind::LocalRedeclaration
      };
      self.err(node, kind, format!("'{}' is already declared here.", name))
    })
  }

  /// True only for a `var`/`let` sitting directly in the top-level
  /// scope of the script's own frame -- exactly the declarations backed
  /// by the global name table rather than a stack slot.
  fn at_global_scope(&self) -> bool {
    matches!(self.frame().kind, FrameKind::Script) && self.frame().scopes.len() == 1
  }

  /// Declares `name` as a `var`/`let`, choosing a global or local
  /// binding per `at_global_scope`, and returns the symbol plus whether
  /// it landed in the global table. A local's value is assumed to
  /// already sit on top of the operand stack; a global still needs its
  /// value popped into the name table by the caller.
  fn declare_var(&mut self, node: NodeIdx, name: &str, ty: SymRef, is_let: bool) -> GenResult<(SymRef, bool)> {
    if self.frame().return_ty.is_some() && name == "result" {
      return Err(self.err(node, ErrorKind::ShadowResult, ErrorKind::ShadowResult.template()));
    }

    if self.at_global_scope() {
      let kind = self.var_kind(is_let, ty, false, 0);
      let r = symbols::insert(&mut self.arena, &mut self.module.scope, name, Sym::new(name, kind)).map_err(|_| {
        self.err(node, ErrorKind::GlobalRedeclaration, format!("'{}' is already declared in this module.", name))
      })?;
      Ok((r, true))
    } else {
      let stack_pos = self.frame().locals.len() as u8;
      let kind = self.var_kind(is_let, ty, true, stack_pos);
      let r = self.declare(node, name, Sym::new(name, kind))?;
      self.frame_mut().locals.push(r);
      Ok((r, false))
    }
  }

  fn var_kind(&self, is_let: bool, ty: SymRef, local: bool, stack_pos: u8) -> symbols::SymKind {
    if is_let {
      symbols::SymKind::Let { ty, set: true, local, stack_pos }
    } else {
      symbols::SymKind::Var { ty, set: true, local, stack_pos }
    }
  }

  fn push_scope(&mut self) {
    let ctx = self.frame().current_ctx;
    self.frame_mut().scopes.push(Scope::new(ctx));
  }

  /// Pushes a scope that exists only to hold compile-time names (generic
  /// parameters, or an instantiation's argument aliases) with no runtime
  /// stack presence. Pair with `pop_bare_scope`, never `pop_scope`: popping
  /// it that way would emit a spurious `discard`.
  fn push_bare_scope(&mut self) {
    self.push_scope();
  }

  fn pop_bare_scope(&mut self) {
    self.frame_mut().scopes.pop().expect("pop_bare_scope without a matching push_bare_scope");
  }

  /// Binds `name` directly to `r` in the current frame's innermost
  /// scope, bypassing `declare`'s overload/redeclaration rules. Used to
  /// substitute a generic template's parameters with concrete argument
  /// symbols, both for `generics::instantiate` and for the `for`-loop
  /// splice's own generic-iterator resolution.
  fn bind_alias(&mut self, name: impl Into<String>, r: SymRef) {
    self.frame_mut().scopes.last_mut().expect("frame always has a scope").bind_alias(name, r);
  }

  /// Pops the innermost scope, emitting `nDiscard n` (or `discard` for
  /// `n == 1`) for however many locals it declared.
  fn pop_scope(&mut self) {
    let scope = self.frame_mut().scopes.pop().expect("pop_scope without a matching push_scope");
    let declared = scope.names().count();
    if declared > 0 {
      let new_len = self.frame().locals.len() - declared;
      self.frame_mut().locals.truncate(new_len);
      self.emit_discard_n(declared as u8);
    }
  }

  fn emit_discard_n(&mut self, n: u8) {
    if n == 0 {
      return;
    }
    if n == 1 {
      self.emit_op(OpCode::Discard);
    } else {
      self.emit_op(OpCode::NDiscard);
      self.frame_mut().chunk.push_byte(n);
    }
  }

  fn push_flow(&mut self, kind: FlowKind) {
    let context = self.frame().current_ctx;
    let locals_at_entry = self.frame().locals.len();
    self.frame_mut().flow.push(FlowBlock {
      kind,
      context,
      locals_at_entry,
      exit_holes: Vec::new(),
    });
  }

  /// Pops the innermost flow block and patches every `break`/`continue`
  /// recorded against it to land here.
  fn pop_flow(&mut self) {
    let block = self.frame_mut().flow.pop().expect("pop_flow without a matching push_flow");
    for hole in block.exit_holes {
      self.frame_mut().chunk.patch_hole_fwd(hole);
    }
  }

  fn find_flow(&self, kind: FlowKind) -> Option<usize> {
    let ctx = self.frame().current_ctx;
    self.frame().flow.iter().rposition(|b| b.kind == kind && b.context == ctx)
  }
}
