//! Memory-Mapped IO Devices.
//!
//! This module contains the peripherals the peripheral-extended machine model
//! attaches to the bus: a byte-wide console and general-purpose I/O ports.

/// Five-register byte console.
pub mod console;

/// One-byte general-purpose I/O port.
pub mod gpio;

pub use console::Console;
pub use gpio::Gpio;

pub use crate::soc::traits::Device;
