//! Global Architectural Constants.
//!
//! This module defines constants shared by the decoder, the run loop, and the machine models:
//! 1. **Register Constants:** Register count and the reserved index 0xF.
//! 2. **Instruction Constants:** Base word size and extension word sizes.
//! 3. **Machine Constants:** CSR values and high bits used by the models.

/// Number of general-purpose registers ($r0..$r14).
pub const NUM_REGS: usize = 15;

/// Field value that never names a general-purpose register.
///
/// In an operand position it means "the operand lives in the extension word"; in
/// a destination position of a control instruction it means "the program counter".
pub const REG_SENTINEL: usize = 0xF;

/// Size of the base instruction word in bytes.
pub const INSTRUCTION_SIZE_16: u32 = 2;

/// Size of an instruction carrying a 16-bit extension word.
pub const INSTRUCTION_SIZE_32: u32 = 4;

/// Size of an instruction carrying a 32-bit extension word.
pub const INSTRUCTION_SIZE_48: u32 = 6;

/// Bit OR-ed into the latched exception cause when it is read from task mode.
pub const ECAUSE_TASK_MODE_FLAG: u32 = 0x8000_0000;

/// Value reported by the architecture-id CSR.
pub const ARCH_ID: u32 = 0;

/// Value reported by the capability CSR.
pub const CAPABILITY: u32 = 0;

/// Column at which the side-effect part of a trace line starts.
pub const TRACE_SIDE_EFFECT_COLUMN: usize = 80;
