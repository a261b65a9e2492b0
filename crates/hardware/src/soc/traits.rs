//! Device trait for memory-mapped I/O.
//!
//! This module defines the `Device` trait implemented by all bus-attached components. It provides:
//! 1. **Identification:** `name` and `address_range` for bus routing.
//! 2. **Access:** Buffer read/write at device-relative offsets.
//! 3. **Halt Requests:** Optional `take_exit` for devices that can stop the simulation.
//!
//! All implementors must be `Send` so a simulator can be moved to a worker thread.

use std::fmt;

use crate::common::error::HaltReason;

/// Trait for memory-mapped I/O devices attached to the system bus.
///
/// Devices provide a name, address range, and buffer read/write methods. Every
/// access is routed here with an offset relative to the device base.
pub trait Device: fmt::Debug + Send {
    /// Returns a short name for this device (e.g., `"CONSOLE"`, `"RAM"`).
    fn name(&self) -> &str;

    /// Returns `(base_address, size_in_bytes)` for this device's region.
    fn address_range(&self) -> (u32, u32);

    /// Fills `buf` from the device starting at `offset`.
    ///
    /// # Returns
    ///
    /// `false` if the device does not decode the access (unmapped register,
    /// unsupported width). Nothing is read in that case.
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> bool;

    /// Writes `data` to the device starting at `offset`.
    ///
    /// # Returns
    ///
    /// `false` if the device does not decode the access.
    fn write(&mut self, offset: u32, data: &[u8]) -> bool;

    /// Returns and clears a pending halt request raised by a register write.
    fn take_exit(&mut self) -> Option<HaltReason> {
        None
    }
}
