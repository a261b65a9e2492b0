//! Memory Access Recording and Data Path.
//!
//! This module handles the single data access a brew instruction may perform. It provides:
//! 1. **Trace Record:** `MemTrace`, the most recent access with its address, width,
//!    direction and value, rendered into the instruction trace.
//! 2. **Data Path:** `DataPath`, which forwards loads and stores to the machine model
//!    and records each completed access.

use std::fmt;

use crate::common::data::AccessWidth;
use crate::common::error::MemFault;
use crate::core::arch::mode::ExecMode;
use crate::soc::model::MachineModel;

/// The single memory access performed by the current instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemTrace {
    /// Virtual address of the access.
    pub addr: u32,
    /// Access width in bytes.
    pub size: u32,
    /// `true` for a store.
    pub is_write: bool,
    /// Value loaded or stored.
    pub value: u32,
    /// Whether the record describes an access of the current instruction.
    pub valid: bool,
}

impl MemTrace {
    /// Invalidates the record at the start of an instruction.
    pub const fn clear(&mut self) {
        self.valid = false;
    }

    /// Records a completed access.
    pub const fn record(&mut self, addr: u32, width: AccessWidth, is_write: bool, value: u32) {
        *self = Self {
            addr,
            size: width.bytes(),
            is_write,
            value,
            valid: true,
        };
    }
}

impl fmt::Display for MemTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = self.size * 8;
        let (addr, value) = (self.addr, self.value);
        if self.is_write {
            write!(f, "mem{bits}[{addr} (0x{addr:x})] <- {} (0x{value:x})", value as i32)
        } else {
            write!(f, "{} (0x{value:x}) <- mem{bits}[{addr} (0x{addr:x})]", value as i32)
        }
    }
}

/// Data-side view of the machine model used while executing one instruction.
#[derive(Debug)]
pub struct DataPath<'a> {
    model: &'a mut dyn MachineModel,
    trace: &'a mut MemTrace,
    mode: ExecMode,
}

impl<'a> DataPath<'a> {
    /// Creates a data path for an instruction running in `mode`.
    pub fn new(model: &'a mut dyn MachineModel, trace: &'a mut MemTrace, mode: ExecMode) -> Self {
        Self { model, trace, mode }
    }

    /// Loads a value of the given width, zero-extended.
    ///
    /// # Errors
    ///
    /// Returns the fault raised by the model; nothing is recorded in that case.
    pub fn load(&mut self, addr: u32, width: AccessWidth) -> Result<u32, MemFault> {
        let value = self.model.read_mem(self.mode, addr, width)?;
        self.trace.record(addr, width, false, value);
        Ok(value)
    }

    /// Stores the low bytes of `value` at the given width.
    ///
    /// # Errors
    ///
    /// Returns the fault raised by the model; nothing is recorded in that case.
    pub fn store(&mut self, addr: u32, width: AccessWidth, value: u32) -> Result<(), MemFault> {
        let value = match width {
            AccessWidth::Byte => value & 0xff,
            AccessWidth::Half => value & 0xffff,
            AccessWidth::Word => value,
        };
        self.model.write_mem(self.mode, addr, width, value)?;
        self.trace.record(addr, width, true, value);
        Ok(())
    }
}
