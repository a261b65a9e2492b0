//! General-Purpose I/O port.
//!
//! A single one-byte data register. Reads report the simulation flag (bit 1
//! set: software simulation). A port configured to terminate on write turns
//! any write into a halt request carrying the written value as exit status;
//! otherwise writes are accepted and dropped.

use crate::common::error::HaltReason;
use crate::soc::traits::Device;

/// Data register offset.
pub const REG_DATA: u32 = 0;

/// Value read from the data register: bit 0 marks RTL simulation, bit 1 software simulation.
pub const GPIO_SIM_FLAGS: u8 = 0x02;

/// GPIO device structure.
#[derive(Debug)]
pub struct Gpio {
    base_addr: u32,
    terminate_on_write: bool,
    exit: Option<HaltReason>,
}

impl Gpio {
    /// Creates a GPIO port.
    ///
    /// # Arguments
    ///
    /// * `base_addr` - The base physical address.
    /// * `terminate_on_write` - Halt the simulation when the data register is written.
    pub const fn new(base_addr: u32, terminate_on_write: bool) -> Self {
        Self { base_addr, terminate_on_write, exit: None }
    }
}

impl Device for Gpio {
    fn name(&self) -> &str {
        "GPIO"
    }

    fn address_range(&self) -> (u32, u32) {
        (self.base_addr, 1)
    }

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> bool {
        match (offset, buf) {
            (REG_DATA, [byte]) => {
                *byte = GPIO_SIM_FLAGS;
                true
            }
            _ => false,
        }
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> bool {
        match (offset, data) {
            (REG_DATA, [byte]) => {
                if self.terminate_on_write {
                    tracing::info!(value = byte, "GPIO terminate request");
                    self.exit = Some(HaltReason::Exited(i32::from(*byte)));
                }
                true
            }
            _ => false,
        }
    }

    fn take_exit(&mut self) -> Option<HaltReason> {
        self.exit.take()
    }
}
