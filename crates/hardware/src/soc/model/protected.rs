//! Protected-window machine model.
//!
//! Task-mode accesses go through one of two base/limit windows, one for
//! instruction fetches and one for data. It implements:
//! 1. **Window Check:** `(v & mask & !1023) > (limit & mask & !1023)` raises the
//!    access-violation cause matching the access and suppresses the bus access.
//! 2. **Relocation:** `((v & mask) + (base & mask & !1023)) & mask`.
//! 3. **Scheduler Bypass:** Scheduler-mode addresses are only masked to 28 bits.
//!
//! The 28-bit mask makes the physical map repeat every `1 << 28` bytes, which
//! gives every region its sixteen aliases.

use crate::common::data::AccessType;
use crate::common::error::{MemFault, SimError};
use crate::core::arch::csr::{self, CsrLatch};
use crate::core::arch::mode::ExecMode;
use crate::core::cpu::state::ArchState;
use crate::soc::interconnect::Bus;
use crate::soc::memory::Ram;
use crate::soc::model::MachineModel;

/// Physical address bits kept by translation.
pub const ADDR_MASK: u32 = 0x0FFF_FFFF;

/// Window granularity mask (1024 bytes).
pub const PAGE_MASK: u32 = !1023;

/// One base/limit window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    /// Physical base of the window.
    pub base: u32,
    /// Highest virtual page the window admits.
    pub limit: u32,
}

impl Window {
    /// A window admitting the whole 28-bit space without relocation.
    pub const OPEN: Self = Self { base: 0, limit: ADDR_MASK };

    /// Translates a task-mode virtual address, or returns `None` past the limit.
    pub const fn translate(self, vaddr: u32) -> Option<u32> {
        let page = vaddr & ADDR_MASK & PAGE_MASK;
        if page > self.limit & ADDR_MASK & PAGE_MASK {
            return None;
        }
        let base = self.base & ADDR_MASK & PAGE_MASK;
        Some(((vaddr & ADDR_MASK).wrapping_add(base)) & ADDR_MASK)
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::OPEN
    }
}

/// Machine with task-mode protection windows.
#[derive(Debug)]
pub struct ProtectedModel {
    bus: Bus,
    inst: Window,
    data: Window,
}

impl ProtectedModel {
    /// Creates a model with `ram_size` bytes of RAM at `ram_base` and open windows.
    pub fn new(ram_base: u32, ram_size: usize) -> Self {
        let mut bus = Bus::new();
        bus.add_device(Box::new(Ram::new(ram_base & ADDR_MASK, ram_size)));
        Self {
            bus,
            inst: Window::OPEN,
            data: Window::OPEN,
        }
    }

    /// Returns the instruction window.
    pub const fn inst_window(&self) -> Window {
        self.inst
    }

    /// Returns the data window.
    pub const fn data_window(&self) -> Window {
        self.data
    }
}

impl MachineModel for ProtectedModel {
    fn name(&self) -> &'static str {
        "protected"
    }

    fn bus(&mut self) -> &mut Bus {
        &mut self.bus
    }

    fn translate(&self, mode: ExecMode, addr: u32, access: AccessType) -> Result<u32, MemFault> {
        if !mode.is_task() {
            return Ok(addr & ADDR_MASK);
        }
        let window = match access {
            AccessType::Fetch => self.inst,
            AccessType::Read | AccessType::Write => self.data,
        };
        window
            .translate(addr)
            .ok_or_else(|| MemFault::new(access.violation(), addr))
    }

    fn read_csr(&mut self, latch: &mut CsrLatch, mode: ExecMode, addr: u32) -> Result<u32, SimError> {
        match addr {
            csr::INST_BASE => Ok(self.inst.base),
            csr::INST_LIMIT => Ok(self.inst.limit),
            csr::DATA_BASE => Ok(self.data.base),
            csr::DATA_LIMIT => Ok(self.data.limit),
            _ => latch.read(mode, addr)?.ok_or(SimError::UnknownCsr { addr }),
        }
    }

    fn write_csr(&mut self, latch: &mut CsrLatch, addr: u32, value: u32) -> Result<(), SimError> {
        match addr {
            csr::INST_BASE => self.inst.base = value,
            csr::INST_LIMIT => self.inst.limit = value,
            csr::DATA_BASE => self.data.base = value,
            csr::DATA_LIMIT => self.data.limit = value,
            _ if latch.write(addr, value)? => {}
            _ => return Err(SimError::UnknownCsr { addr }),
        }
        Ok(())
    }

    fn reset(&mut self, state: &mut ArchState, user_mode: bool) {
        *state = ArchState::new();
        state.set_mode(ExecMode::from_task_flag(user_mode));
        self.inst = Window::OPEN;
        self.data = Window::OPEN;
    }
}
