//! Architectural State and Shadow Commit.
//!
//! `ArchState` holds everything a brew instruction can observe or change. It implements:
//! 1. **Dual Program Counters:** `$spc` and `$tpc`, with the active one chosen by the mode.
//! 2. **Shadow State:** `nspc`, `ntpc` and `next_mode` receive every write during an
//!    instruction and are committed in one step by the run loop.
//! 3. **Dirty Tracking:** A per-instruction bitmap of registers whose value changed.
//! 4. **Exception Latching:** The cause of the previous instruction moves into the CSR
//!    latch when the next instruction starts.

use crate::common::error::{ExceptionCause, SimError};
use crate::common::reg::{RegisterFile, TypedReg};
use crate::core::arch::csr::CsrLatch;
use crate::core::arch::mode::ExecMode;

/// Architectural state of the single brew execution context.
#[derive(Clone, Debug, Default)]
pub struct ArchState {
    /// General-purpose registers.
    pub regs: RegisterFile,
    /// Scheduler-mode program counter.
    pub spc: u32,
    /// Task-mode program counter.
    pub tpc: u32,
    /// Current execution mode.
    pub mode: ExecMode,
    /// Shadow `$spc`, committed at the end of the instruction.
    pub nspc: u32,
    /// Shadow `$tpc`, committed at the end of the instruction.
    pub ntpc: u32,
    /// Shadow mode, committed at the end of the instruction.
    pub next_mode: ExecMode,
    /// Cause raised by the instruction just executed.
    pub cause: ExceptionCause,
    /// Faulting address of the instruction just executed, if it faulted on memory.
    pub fault_addr: Option<u32>,
    /// CSR-visible exception latch.
    pub csr: CsrLatch,
    dirty: u16,
}

impl ArchState {
    /// Creates a zeroed state in task mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the program counter of the current mode.
    pub const fn pc(&self) -> u32 {
        match self.mode {
            ExecMode::Task => self.tpc,
            ExecMode::Scheduler => self.spc,
        }
    }

    /// Sets the program counter of the current mode and its shadow.
    pub const fn set_pc(&mut self, pc: u32) {
        match self.mode {
            ExecMode::Task => {
                self.tpc = pc;
                self.ntpc = pc;
            }
            ExecMode::Scheduler => {
                self.spc = pc;
                self.nspc = pc;
            }
        }
    }

    /// Sets the mode and its shadow.
    pub const fn set_mode(&mut self, mode: ExecMode) {
        self.mode = mode;
        self.next_mode = mode;
    }

    /// Returns the shadow program counter of the current mode.
    pub const fn next_pc(&self) -> u32 {
        match self.mode {
            ExecMode::Task => self.ntpc,
            ExecMode::Scheduler => self.nspc,
        }
    }

    /// Writes the shadow program counter of the current mode.
    pub const fn set_next_pc(&mut self, pc: u32) {
        match self.mode {
            ExecMode::Task => self.ntpc = pc,
            ExecMode::Scheduler => self.nspc = pc,
        }
    }

    /// Returns the fall-through program counter for an instruction of `len` bytes.
    ///
    /// Bit 0 of the program counter is ignored.
    pub const fn fall_through(&self, len: u32) -> u32 {
        (self.pc() & !1).wrapping_add(len)
    }

    /// Prepares the shadow state for the next instruction.
    ///
    /// Clears the dirty bitmap, sets the shadow program counters to their
    /// fall-through defaults, latches the previous instruction's cause and clears it.
    pub fn begin_instruction(&mut self, len: u32) {
        self.dirty = 0;
        self.ntpc = self.tpc;
        self.nspc = self.spc;
        self.set_next_pc(self.fall_through(len));
        self.next_mode = self.mode;
        if self.cause.is_some() {
            self.csr.ecause = self.cause.code();
            if let Some(addr) = self.fault_addr {
                self.csr.eaddr = addr;
            }
        }
        self.cause = ExceptionCause::None;
        self.fault_addr = None;
    }

    /// Writes a register and records it in the dirty bitmap if its contents changed.
    ///
    /// # Errors
    ///
    /// Returns `SimError::ReservedRegister` for the sentinel index.
    pub fn write_reg(&mut self, idx: usize, val: TypedReg) -> Result<(), SimError> {
        if self.regs.write(idx, val)? {
            self.dirty |= 1 << idx;
        }
        Ok(())
    }

    /// Returns the dirty bitmap of the current instruction (bit `i` for register `i`).
    pub const fn dirty(&self) -> u16 {
        self.dirty
    }

    /// Returns the indices of the registers changed by the current instruction.
    pub fn dirty_regs(&self) -> impl Iterator<Item = usize> + '_ {
        (0..16).filter(move |i| self.dirty & (1 << i) != 0)
    }

    /// Commits the shadow program counters and mode.
    pub const fn commit(&mut self) {
        self.tpc = self.ntpc;
        self.spc = self.nspc;
        self.mode = self.next_mode;
    }
}
