//! # ISA Unit Tests
//!
//! Instruction length, branch offset encoding, decoding and disassembly.


/// Assembly text of every instruction family.
pub mod disasm;

/// Length of an instruction as a function of its base word alone.
pub mod length_rule;
