//! Instruction Set Architecture (ISA) Definitions.
//!
//! Contains the brew encoding rules, the decoder, and the text renderer.
//!
//! # Modules
//!
//! * `abi`: Register roles and assembler register names.
//! * `instruction`: Field extraction, length rule, and the decoded instruction model.
//! * `decode`: Ordered template table mapping encodings to instructions.
//! * `disasm`: Assembly text rendering.

/// Application Binary Interface (ABI) register roles and names.
pub mod abi;

/// Ordered template decoder for 16/32/48-bit encodings.
pub mod decode;

/// Instruction disassembler for traces and diagnostics.
pub mod disasm;

/// Instruction encoding helpers and the decoded instruction model.
pub mod instruction;
