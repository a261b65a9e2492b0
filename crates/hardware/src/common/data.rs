//! Memory Access Types.
//!
//! This module defines the classification of memory accesses used throughout the simulator.
//! These types are used for the following:
//! 1. **Protection:** Choosing the instruction or data window in the protected model.
//! 2. **Fault Generation:** Picking the access-violation cause that matches the access.
//! 3. **Tracing:** Rendering the width of the single memory access an instruction performs.

use crate::common::error::ExceptionCause;

/// Type of memory access operation.
///
/// Used to distinguish between instruction fetches, data loads, and data stores
/// for proper memory protection enforcement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    /// Instruction fetch access.
    ///
    /// Checked against the instruction window in the protected model.
    Fetch,

    /// Data read access.
    ///
    /// Occurs during load instructions and syscall buffer copies.
    Read,

    /// Data write access.
    ///
    /// Occurs during store instructions and syscall buffer copies.
    Write,
}

impl AccessType {
    /// Returns the access-violation cause raised when this access falls outside its window.
    pub const fn violation(self) -> ExceptionCause {
        match self {
            Self::Fetch => ExceptionCause::InstAv,
            Self::Read | Self::Write => ExceptionCause::MemAv,
        }
    }
}

/// Width of a memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessWidth {
    /// 8-bit access.
    Byte,
    /// 16-bit access.
    Half,
    /// 32-bit access.
    Word,
}

impl AccessWidth {
    /// Returns the width in bytes.
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
        }
    }

    /// Returns the width in bits, as printed in traces (`mem8`, `mem16`, `mem32`).
    pub const fn bits(self) -> u32 {
        self.bytes() * 8
    }

    /// Returns `true` if `addr` is naturally aligned for this width.
    pub const fn is_aligned(self, addr: u32) -> bool {
        addr & (self.bytes() - 1) == 0
    }
}
