//! Peripheral-extended machine model.
//!
//! Identity translation and the universal CSR set, like the generic model, with
//! a console and a set of GPIO ports claiming their own physical ranges. Device
//! registers are reached through the same load/store path as RAM.

use crate::config::Config;
use crate::soc::devices::{Console, Gpio};
use crate::soc::interconnect::Bus;
use crate::soc::memory::Ram;
use crate::soc::model::MachineModel;

/// Identity-mapped machine with RAM, a console and GPIO ports.
#[derive(Debug)]
pub struct PeripheralModel {
    bus: Bus,
}

impl PeripheralModel {
    /// Creates a model from explicit devices.
    ///
    /// # Arguments
    ///
    /// * `ram_base` - Physical base of RAM.
    /// * `ram_size` - RAM size in bytes.
    /// * `console` - The console device.
    /// * `gpio` - GPIO ports.
    pub fn new(ram_base: u32, ram_size: usize, console: Console, gpio: Vec<Gpio>) -> Self {
        let mut bus = Bus::new();
        bus.add_device(Box::new(Ram::new(ram_base, ram_size)));
        bus.add_device(Box::new(console));
        for port in gpio {
            bus.add_device(Box::new(port));
        }
        Self { bus }
    }

    /// Creates a model whose console is attached to the host terminal.
    pub fn from_config(config: &Config) -> Self {
        let p = &config.peripherals;
        let console = Console::with_host_io(p.console_base, p.console_to_stderr);
        let gpio = p
            .gpio
            .iter()
            .map(|g| Gpio::new(g.base, g.terminate_on_write))
            .collect();
        Self::new(config.memory.ram_base(), config.memory.ram_size, console, gpio)
    }
}

impl MachineModel for PeripheralModel {
    fn name(&self) -> &'static str {
        "peripheral"
    }

    fn bus(&mut self) -> &mut Bus {
        &mut self.bus
    }
}
