use num_derive::{FromPrimitive, ToPrimitive};

/// The instruction set executed by the (external) stack-machine virtual
/// machine. One byte per opcode; operand widths are documented per
/// variant and are bit-exact (see the wire-format notes in the crate
/// that owns the generator).
///
/// **NOTE:** The order in which variants are declared is part of the
/// wire format. Reordering breaks compatibility between a compiled
/// chunk and any virtual machine built against a different ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum OpCode {
  // --- Zero-operand instructions ---
  PushTrue,
  PushFalse,
  Discard,
  NegN,
  AddN,
  SubN,
  MultN,
  DivN,
  InvB,
  EqB,
  EqN,
  LessN,
  GreaterN,
  ReturnVal,
  ReturnVoid,
  Halt,

  // --- One-byte-operand instructions ---
  PushL,
  PopL,
  PushF,
  PopF,
  NDiscard,

  // --- Two-byte-operand instructions ---
  PushN,  // <f64, 8 bytes> -- widened below, see `OPERAND_BYTES`
  PushS,  // <str_id: u16>
  PushNil, // <obj_ty: u16>
  PushG,  // <name_id: u16>
  PopG,   // <name_id: u16>
  JumpFwd,  // <i16>
  JumpFwdT, // <i16>
  JumpFwdF, // <i16>
  JumpBack, // <u16>
  CallD,    // <proc_id: u16>
  ConstrObj, // <ty: u16> <n_fields: u8>
}

impl OpCode {
  /// Number of operand bytes this opcode consumes, not counting the
  /// opcode byte itself. `ConstrObj` is the only variable-shaped
  /// instruction: 2 bytes for the type id, 1 for the field count.
  pub fn operand_len(self) -> usize {
    use OpCode::*;
    match self {
      PushTrue | PushFalse | Discard | NegN | AddN | SubN | MultN | DivN | InvB | EqB | EqN | LessN | GreaterN
      | ReturnVal | ReturnVoid | Halt => 0,
      PushL | PopL | PushF | PopF | NDiscard => 1,
      PushN => 8,
      PushS | PushNil | PushG | PopG | JumpFwd | JumpFwdT | JumpFwdF | JumpBack | CallD => 2,
      ConstrObj => 3,
    }
  }
}
