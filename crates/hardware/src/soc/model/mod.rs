//! Machine Models.
//!
//! A machine model is the pluggable policy layered on top of the shared instruction
//! semantics. It decides:
//! 1. **Translation:** How a virtual address of an instruction fetch or data access
//!    maps to a physical bus address, and which accesses fault.
//! 2. **CSR Space:** Which control/status registers exist beyond the universal set.
//! 3. **Exception Response:** What happens when an instruction raises a cause, and
//!    whether a pending interrupt is taken.
//! 4. **Reset:** The initial mode and model-specific register values.
//!
//! Three variants exist: [`GenericModel`], [`ProtectedModel`] and [`PeripheralModel`].
//! The CPU owns exactly one of them as a `Box<dyn MachineModel>` for its lifetime.

/// Identity-mapped model with the universal CSR set.
pub mod generic;

/// Generic model with memory-mapped console and GPIO devices.
pub mod peripheral;

/// Base/limit protection-window model.
pub mod protected;

pub use generic::GenericModel;
pub use peripheral::PeripheralModel;
pub use protected::ProtectedModel;

use std::fmt;

use crate::common::data::{AccessType, AccessWidth};
use crate::common::error::{ExceptionCause, HaltReason, MemFault, SimError};
use crate::config::Environment;
use crate::core::arch::csr::CsrLatch;
use crate::core::arch::mode::ExecMode;
use crate::core::cpu::state::ArchState;
use crate::core::cpu::trap;
use crate::soc::interconnect::Bus;

/// Policy object defining translation, CSRs, and exception response.
///
/// Only `name` and `bus` are required; the provided methods implement the
/// generic behavior and are overridden where a variant differs.
pub trait MachineModel: fmt::Debug + Send {
    /// Returns the model name.
    fn name(&self) -> &'static str;

    /// Returns the system bus.
    fn bus(&mut self) -> &mut Bus;

    /// Translates a virtual address to a physical bus address.
    ///
    /// # Arguments
    ///
    /// * `mode` - Mode of the accessing instruction.
    /// * `addr` - Virtual address, already checked for alignment.
    /// * `access` - Fetch, read or write.
    ///
    /// # Errors
    ///
    /// Returns the access-violation fault for addresses the model denies.
    fn translate(&self, _mode: ExecMode, addr: u32, _access: AccessType) -> Result<u32, MemFault> {
        Ok(addr)
    }

    /// Performs a checked, translated bus read.
    ///
    /// # Errors
    ///
    /// Returns `Unaligned` for a misaligned address, or the access-violation cause
    /// when translation denies the access or no device answers. The bus is not
    /// touched when the check or translation fails.
    fn access_read(
        &mut self,
        mode: ExecMode,
        addr: u32,
        width: AccessWidth,
        access: AccessType,
    ) -> Result<u32, MemFault> {
        if !width.is_aligned(addr) {
            return Err(MemFault::new(ExceptionCause::Unaligned, addr));
        }
        let paddr = self.translate(mode, addr, access)?;
        self.bus()
            .read(paddr, width)
            .ok_or_else(|| MemFault::new(access.violation(), addr))
    }

    /// Fetches one 16-bit instruction halfword.
    ///
    /// # Errors
    ///
    /// Returns the fault to raise for the fetch.
    fn read_inst(&mut self, mode: ExecMode, addr: u32) -> Result<u16, MemFault> {
        self.access_read(mode, addr, AccessWidth::Half, AccessType::Fetch)
            .map(|v| v as u16)
    }

    /// Reads data memory; the value is zero-extended.
    ///
    /// # Errors
    ///
    /// Returns the fault to raise for the load.
    fn read_mem(&mut self, mode: ExecMode, addr: u32, width: AccessWidth) -> Result<u32, MemFault> {
        self.access_read(mode, addr, width, AccessType::Read)
    }

    /// Writes data memory.
    ///
    /// # Errors
    ///
    /// Returns the fault to raise for the store; memory is unchanged in that case.
    fn write_mem(
        &mut self,
        mode: ExecMode,
        addr: u32,
        width: AccessWidth,
        value: u32,
    ) -> Result<(), MemFault> {
        if !width.is_aligned(addr) {
            return Err(MemFault::new(ExceptionCause::Unaligned, addr));
        }
        let paddr = self.translate(mode, addr, AccessType::Write)?;
        if self.bus().write(paddr, width, value) {
            Ok(())
        } else {
            Err(MemFault::new(ExceptionCause::MemAv, addr))
        }
    }

    /// Reads a CSR.
    ///
    /// # Errors
    ///
    /// Returns `SimError::UnknownCsr` for an address the model does not implement.
    fn read_csr(&mut self, latch: &mut CsrLatch, mode: ExecMode, addr: u32) -> Result<u32, SimError> {
        latch.read(mode, addr)?.ok_or(SimError::UnknownCsr { addr })
    }

    /// Writes a CSR.
    ///
    /// # Errors
    ///
    /// Returns `SimError::UnknownCsr` for an address the model does not implement.
    fn write_csr(&mut self, latch: &mut CsrLatch, addr: u32, value: u32) -> Result<(), SimError> {
        if latch.write(addr, value)? {
            Ok(())
        } else {
            Err(SimError::UnknownCsr { addr })
        }
    }

    /// Resets the architectural state and any model registers.
    ///
    /// A user-level run starts in task mode, any other environment in scheduler mode.
    fn reset(&mut self, state: &mut ArchState, user_mode: bool) {
        *state = ArchState::new();
        state.set_mode(ExecMode::from_task_flag(user_mode));
    }

    /// One-time setup after construction, before the first instruction.
    ///
    /// # Errors
    ///
    /// Returns a host fault if the model cannot be brought up.
    fn setup(&mut self) -> Result<(), SimError> {
        Ok(())
    }

    /// Responds to the cause raised by the instruction just executed.
    ///
    /// # Returns
    ///
    /// `Some(reason)` if the run loop has to stop.
    ///
    /// # Errors
    ///
    /// Propagates host faults raised while servicing the exception.
    fn handle_exception(
        &mut self,
        state: &mut ArchState,
        env: Environment,
    ) -> Result<Option<HaltReason>, SimError> {
        trap::respond(self, state, env)
    }

    /// Offers a pending hardware interrupt; returns `true` if it was taken.
    fn handle_interrupt(&mut self, state: &mut ArchState, env: Environment) -> bool {
        trap::take_interrupt(state, env)
    }

    /// Returns a pending halt request raised by a device.
    fn take_exit(&mut self) -> Option<HaltReason> {
        self.bus().take_exit()
    }
}
