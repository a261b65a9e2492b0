//! Control and Status Register (CSR) definitions and operations.
//!
//! This module implements the CSR subsystem shared by every machine model. It provides:
//! 1. **Address Definitions:** Constants for the universal and protected-model CSRs.
//! 2. **Register Storage:** The `CsrLatch` holding the latched exception cause and address.
//! 3. **Access Logic:** Read and write of the universal CSR set; models layer their
//!    own registers on top and report anything else as a host fault.

use crate::common::constants::{self, ECAUSE_TASK_MODE_FLAG};
use crate::common::error::SimError;
use crate::core::arch::mode::ExecMode;

/// Architecture ID CSR address (read-only).
pub const ARCH_ID: u32 = 0x000;

/// Capability bits CSR address (read-only).
pub const CAPABILITY: u32 = 0x001;

/// Latched exception cause CSR address. Reading clears the latch.
pub const ECAUSE: u32 = 0x002;

/// Latched exception address CSR address.
pub const EADDR: u32 = 0x003;

/// Floating-point status CSR address (not implemented).
pub const FP_STATUS: u32 = 0x004;

/// Instruction window base CSR address (protected model).
pub const INST_BASE: u32 = 0x080;

/// Instruction window limit CSR address (protected model).
pub const INST_LIMIT: u32 = 0x081;

/// Data window base CSR address (protected model).
pub const DATA_BASE: u32 = 0x082;

/// Data window limit CSR address (protected model).
pub const DATA_LIMIT: u32 = 0x083;

/// Exception state latched for the scheduler to inspect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CsrLatch {
    /// Cause code of the last exception not yet read.
    pub ecause: u32,
    /// Address associated with the last faulting access.
    pub eaddr: u32,
}

impl CsrLatch {
    /// Reads a CSR of the universal set.
    ///
    /// # Arguments
    ///
    /// * `mode` - Mode of the reading instruction.
    /// * `addr` - CSR address.
    ///
    /// # Returns
    ///
    /// `Ok(Some(value))` for a universal CSR, `Ok(None)` for an address the
    /// caller has to resolve itself.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Unimplemented` for the floating-point status register.
    pub fn read(&mut self, mode: ExecMode, addr: u32) -> Result<Option<u32>, SimError> {
        Ok(Some(match addr {
            ARCH_ID => constants::ARCH_ID,
            CAPABILITY => constants::CAPABILITY,
            ECAUSE => {
                let cause = std::mem::take(&mut self.ecause);
                if mode.is_task() { cause | ECAUSE_TASK_MODE_FLAG } else { cause }
            }
            EADDR => self.eaddr,
            FP_STATUS => return Err(SimError::Unimplemented("floating-point status CSR")),
            _ => return Ok(None),
        }))
    }

    /// Writes a CSR of the universal set.
    ///
    /// Writes to the read-only registers are ignored.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if `addr` belongs to the universal set.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Unimplemented` for the floating-point status register.
    pub fn write(&mut self, addr: u32, value: u32) -> Result<bool, SimError> {
        match addr {
            ARCH_ID | CAPABILITY => {}
            ECAUSE => self.ecause = value,
            EADDR => self.eaddr = value,
            FP_STATUS => return Err(SimError::Unimplemented("floating-point status CSR")),
            _ => return Ok(false),
        }
        Ok(true)
    }
}
