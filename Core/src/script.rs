use crate::chunk::Chunk;

/// A foreign (host-registered) procedure callback. Opaque to the
/// front-end: the generator only ever needs the procedure's signature,
/// never the callback itself.
pub type ForeignId = usize;

#[derive(Debug)]
pub enum ProcKind {
  /// Compiled from source; owns its own chunk.
  Native(Chunk),
  /// Registered by the host environment through `Script::add_proc`.
  Foreign(ForeignId),
}

/// One procedure known to a [`Script`]: either a user-defined proc
/// compiled to its own chunk, or a foreign callback registered by the
/// embedding environment.
#[derive(Debug)]
pub struct Proc {
  pub name: String,
  pub kind: ProcKind,
  pub param_count: u8,
  pub has_result: bool,
}

/// The compilation unit's output: the top-level chunk plus every
/// procedure reachable from it, addressed by a dense `proc_id`.
#[derive(Debug, Default)]
pub struct Script {
  /// The chunk holding top-level code, i.e. everything not inside a
  /// `proc` body. Always ends with exactly one `halt`.
  pub main: Chunk,
  pub procs: Vec<Proc>,
  /// Assigns unique object-type ids to object declarations as they're
  /// registered; never reused, even across generic instantiations.
  pub type_count: u16,
  next_foreign: ForeignId,
}

impl Script {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends a native procedure and returns its dense `proc_id`.
  pub fn add_native_proc(&mut self, name: impl Into<String>, param_count: u8, has_result: bool, chunk: Chunk) -> u16 {
    let id = self.procs.len() as u16;
    self.procs.push(Proc {
      name: name.into(),
      kind: ProcKind::Native(chunk),
      param_count,
      has_result,
    });
    id
  }

  /// Reserves a dense `proc_id` for a procedure whose body hasn't been
  /// generated yet, so that a recursive call inside the body can refer
  /// to its own id before `fill_native_proc` supplies the chunk.
  pub fn reserve_proc(&mut self, name: impl Into<String>, param_count: u8, has_result: bool) -> u16 {
    let id = self.procs.len() as u16;
    self.procs.push(Proc {
      name: name.into(),
      kind: ProcKind::Native(Chunk::new()),
      param_count,
      has_result,
    });
    id
  }

  /// Supplies the compiled chunk for a procedure previously reserved
  /// with `reserve_proc`.
  pub fn fill_native_proc(&mut self, id: u16, chunk: Chunk) {
    self.procs[id as usize].kind = ProcKind::Native(chunk);
  }

  /// Registers a foreign procedure, as a host environment would when
  /// exposing a native function.
  pub fn add_foreign_proc(&mut self, name: impl Into<String>, param_count: u8, has_result: bool) -> u16 {
    let foreign_id = self.next_foreign;
    self.next_foreign += 1;

    let id = self.procs.len() as u16;
    self.procs.push(Proc {
      name: name.into(),
      kind: ProcKind::Foreign(foreign_id),
      param_count,
      has_result,
    });
    id
  }

  pub fn next_type_id(&mut self) -> u16 {
    let id = self.type_count;
    self.type_count += 1;
    id
  }
}
