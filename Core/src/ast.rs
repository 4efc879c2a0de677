use std::rc::Rc;

use crate::tokens::SrcLoc;

/// The index of a node inside an [`AstArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIdx(pub usize);

impl From<usize> for NodeIdx {
  fn from(x: usize) -> Self {
    NodeIdx(x)
  }
}

/// `(file, line, col)`, attached to every node for diagnostics.
#[derive(Debug, Clone)]
pub struct NodeLoc {
  pub file: Rc<str>,
  pub loc: SrcLoc,
}

/// An arena-allocated AST. Every node is addressed by a stable
/// [`NodeIdx`]; the tree never needs to move or re-parent a node once
/// pushed.
#[derive(Debug, Default)]
pub struct AstArena {
  nodes: Vec<NodeKind>,
  locs: Vec<NodeLoc>,
}

impl AstArena {
  pub fn push(&mut self, node: NodeKind, file: Rc<str>, loc: SrcLoc) -> NodeIdx {
    self.nodes.push(node);
    self.locs.push(NodeLoc { file, loc });
    NodeIdx(self.nodes.len() - 1)
  }

  pub fn get(&self, idx: NodeIdx) -> &NodeKind {
    &self.nodes[idx.0]
  }

  pub fn loc(&self, idx: NodeIdx) -> &NodeLoc {
    &self.locs[idx.0]
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }
}

/// A single typed or `let`-bound parameter: `name: type`.
#[derive(Debug, Clone)]
pub struct Param {
  pub name: String,
  pub ty: NodeIdx,
}

/// One `name: value` field initializer inside an object constructor.
#[derive(Debug, Clone)]
pub struct ColonExprNode {
  pub name: NodeIdx, // always an Ident node
  pub value: NodeIdx,
}

#[derive(Debug, Clone)]
pub struct IfNode {
  pub cond: NodeIdx,
  pub then_branch: NodeIdx, // always a Block node
  /// `elif` clauses, evaluated in order.
  pub elifs: Vec<(NodeIdx, NodeIdx)>,
  pub else_branch: Option<NodeIdx>, // always a Block node
}

#[derive(Debug, Clone)]
pub struct WhileNode {
  pub cond: NodeIdx,
  pub body: NodeIdx, // always a Block node
}

#[derive(Debug, Clone)]
pub struct ForNode {
  pub loop_var: String,
  /// The `iter_expr(args)` call driving the loop.
  pub iter_call: NodeIdx,
  pub body: NodeIdx, // always a Block node
}

#[derive(Debug, Clone)]
pub struct VarDeclNode {
  pub is_let: bool,
  pub names: Vec<String>,
  pub ty: Option<NodeIdx>,
  /// `None` when the declaration had no `= expr`; parsed this way so the
  /// generator -- not the parser -- raises `VarMustHaveValue`.
  pub value: Option<NodeIdx>,
}

#[derive(Debug, Clone)]
pub struct ProcDeclNode {
  pub name: String,
  pub generics: Vec<GenericParamDecl>,
  pub params: Vec<Param>,
  pub ret_ty: Option<NodeIdx>,
  pub body: NodeIdx, // always a Block node
}

#[derive(Debug, Clone)]
pub struct IteratorDeclNode {
  pub name: String,
  pub generics: Vec<GenericParamDecl>,
  pub params: Vec<Param>,
  pub yield_ty: NodeIdx,
  pub body: NodeIdx, // always a Block node
}

#[derive(Debug, Clone)]
pub struct ObjectDeclNode {
  pub name: String,
  pub generics: Vec<GenericParamDecl>,
  pub fields: Vec<Param>,
}

#[derive(Debug, Clone)]
pub struct GenericParamDecl {
  pub name: String,
  pub constraint: Option<NodeIdx>,
}

#[derive(Debug, Clone)]
pub struct CallNode {
  pub callee: NodeIdx,
  /// Either plain value expressions (procedure call) or `ColonExpr`
  /// nodes (object constructor).
  pub args: Vec<NodeIdx>,
}

#[derive(Debug, Clone)]
pub struct IndexNode {
  pub target: NodeIdx,
  /// Generic argument list, e.g. `id[number]`.
  pub args: Vec<NodeIdx>,
}

#[derive(Debug, Clone)]
pub struct DotNode {
  pub target: NodeIdx,
  pub field: String,
}

#[derive(Debug, Clone)]
pub struct PrefixNode {
  pub op: String,
  pub operand: NodeIdx,
}

#[derive(Debug, Clone)]
pub struct InfixNode {
  pub op: String,
  pub left: NodeIdx,
  pub right: NodeIdx,
}

#[derive(Debug, Clone)]
pub struct AssignNode {
  pub target: NodeIdx,
  pub value: NodeIdx,
}

#[derive(Debug, Clone)]
pub struct ProcTypeNode {
  pub param_tys: Vec<NodeIdx>,
  pub ret_ty: Option<NodeIdx>,
}

/// The full set of AST node kinds. Branch nodes hold their children
/// through typed index fields; leaves hold a literal payload directly.
#[derive(Debug, Clone)]
pub enum NodeKind {
  Script(Vec<NodeIdx>),
  Block(Vec<NodeIdx>),
  ExprStmt(NodeIdx),

  NumberLit(f64),
  StringLit(String),
  BoolLit(bool),
  NullLit,
  Ident(String),

  Prefix(PrefixNode),
  Infix(InfixNode),
  LogicAnd(InfixNode),
  LogicOr(InfixNode),
  Assign(AssignNode),
  Call(CallNode),
  Index(IndexNode),
  Dot(DotNode),
  ColonExpr(ColonExprNode),
  ProcType(ProcTypeNode),
  IfExpr(IfNode),

  WhileStmt(WhileNode),
  ForStmt(ForNode),
  BreakStmt,
  ContinueStmt,
  ReturnStmt(Option<NodeIdx>),
  YieldStmt(NodeIdx),
  VarDecl(VarDeclNode),
  ProcDecl(ProcDeclNode),
  IteratorDecl(IteratorDeclNode),
  ObjectDecl(ObjectDeclNode),
}

impl NodeKind {
  /// Name used in diagnostics ("'if' can only be used...", etc).
  pub fn keyword(&self) -> &'static str {
    match self {
      NodeKind::BreakStmt => "break",
      NodeKind::ContinueStmt => "continue",
      NodeKind::ReturnStmt(_) => "return",
      NodeKind::YieldStmt(_) => "yield",
      _ => "",
    }
  }
}
