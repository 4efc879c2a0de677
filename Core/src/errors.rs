use crate::tokens::{SrcLoc, TokenList};

/// The two fatal error categories the front-end can raise. Both abort
/// compilation immediately; there is no error-recovery list.
#[derive(Debug, Clone)]
pub enum CompileError {
  Syntax(Diagnostic),
  Semantic(Diagnostic),
}

impl CompileError {
  pub fn diagnostic(&self) -> &Diagnostic {
    match self {
      CompileError::Syntax(d) | CompileError::Semantic(d) => d,
    }
  }
}

/// A fully-formatted error: where it happened and what went wrong.
#[derive(Debug, Clone)]
pub struct Diagnostic {
  pub file: String,
  pub loc: SrcLoc,
  pub kind: ErrorKind,
  pub message: String,
}

impl Diagnostic {
  pub fn new(file: impl Into<String>, loc: SrcLoc, kind: ErrorKind, message: impl Into<String>) -> Self {
    Diagnostic {
      file: file.into(),
      loc,
      kind,
      message: message.into(),
    }
  }

  /// Renders this diagnostic using the canonical `"%s(%d, %d): %s"` format.
  pub fn render(&self) -> String {
    format!("{}({}, {}): {}", self.file, self.loc.line, self.loc.col, self.message)
  }
}

/// Non-exhaustive catalog of compile error kinds. Every kind has exactly
/// one template string, built once here rather than scattered at call
/// sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  SyntaxError,
  ShadowResult,
  LocalRedeclaration,
  GlobalRedeclaration,
  UndefinedReference,
  LetReassignment,
  TypeMismatch,
  TypeMismatchChoice,
  NotAProc,
  InvalidField,
  NonExistentField,
  InvalidAssignment,
  TypeIsNotAnObject,
  ObjectFieldsMustBeInitialized,
  FieldInitMustBeAColonExpr,
  NoSuchField,
  ValueIsVoid,
  OnlyUsableInABlock,
  OnlyUsableInALoop,
  OnlyUsableInAProc,
  OnlyUsableInAnIterator,
  VarMustHaveValue,
  IterMustHaveYieldType,
  SymKindMismatch,
  InvalidSymName,
  CouldNotInferGeneric,
  NotGeneric,
  GenericArgLenMismatch,
  GenericCycle,
  NotAnIterator,
  ProcTypeUnsupported,
}

impl ErrorKind {
  pub fn template(&self) -> &'static str {
    match self {
      ErrorKind::SyntaxError => "{msg}",
      ErrorKind::ShadowResult => "'result' is a reserved name inside a procedure body.",
      ErrorKind::LocalRedeclaration => "'{name}' is already declared in this scope.",
      ErrorKind::GlobalRedeclaration => "'{name}' is already declared in this module.",
      ErrorKind::UndefinedReference => "Undefined reference to '{name}'.",
      ErrorKind::LetReassignment => "'{name}' cannot be reassigned.",
      ErrorKind::TypeMismatch => "Expected a value of type '{expected}' but got '{found}'.",
      ErrorKind::TypeMismatchChoice => "No overload of '{name}' matches the given arguments.",
      ErrorKind::NotAProc => "'{name}' is not callable.",
      ErrorKind::InvalidField => "'{name}' is not a valid field initializer.",
      ErrorKind::NonExistentField => "Type '{ty}' has no field named '{name}'.",
      ErrorKind::InvalidAssignment => "Invalid assignment target.",
      ErrorKind::TypeIsNotAnObject => "'{name}' is not an object type.",
      ErrorKind::ObjectFieldsMustBeInitialized => "All fields of '{ty}' must be initialized exactly once.",
      ErrorKind::FieldInitMustBeAColonExpr => "Object field initializers must be of the form 'name: value'.",
      ErrorKind::NoSuchField => "Type '{ty}' has no field named '{name}'.",
      ErrorKind::ValueIsVoid => "Expression does not produce a value.",
      ErrorKind::OnlyUsableInABlock => "'{kw}' can only be used inside a block.",
      ErrorKind::OnlyUsableInALoop => "'{kw}' can only be used inside a loop.",
      ErrorKind::OnlyUsableInAProc => "'{kw}' can only be used inside a procedure.",
      ErrorKind::OnlyUsableInAnIterator => "'yield' can only be used inside an iterator, outside of the loop it feeds.",
      ErrorKind::VarMustHaveValue => "Variable declarations must have an initializer.",
      ErrorKind::IterMustHaveYieldType => "Iterators must declare the type they yield.",
      ErrorKind::SymKindMismatch => "'{name}' does not name a {expected}.",
      ErrorKind::InvalidSymName => "'{name}' is not a valid identifier here.",
      ErrorKind::CouldNotInferGeneric => "Could not infer generic arguments for '{name}'; use 'name[T, ...]'.",
      ErrorKind::NotGeneric => "'{name}' is not generic.",
      ErrorKind::GenericArgLenMismatch => "'{name}' expects {expected} generic argument(s), got {found}.",
      ErrorKind::GenericCycle => "Generic instantiation of '{name}' recurses on itself.",
      ErrorKind::NotAnIterator => "'{name}' is not an iterator.",
      ErrorKind::ProcTypeUnsupported => "Procedure-typed values are not supported; 'proc(...)' may only appear as a discarded type annotation.",
    }
  }
}

/// Prints a single diagnostic to stderr, using the canonical format and
/// the color scheme the reference scanner/parser already establish.
pub fn report(tokens: &TokenList, err: &CompileError) {
  let d = err.diagnostic();
  let label = match err {
    CompileError::Syntax(_) => "\x1b[31;1mSyntaxError\x1b[0m",
    CompileError::Semantic(_) => "\x1b[31;1mCompileError\x1b[0m",
  };
  eprintln!("{} at {}", label, d.render());
  let _ = tokens;
}
