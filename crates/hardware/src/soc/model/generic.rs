//! Generic machine model.
//!
//! Virtual addresses are physical addresses, only the universal CSR set exists,
//! and RAM is the only device on the bus. Any other CSR address is a host fault.

use crate::soc::interconnect::Bus;
use crate::soc::memory::Ram;
use crate::soc::model::MachineModel;

/// Identity-mapped machine with RAM only.
#[derive(Debug)]
pub struct GenericModel {
    bus: Bus,
}

impl GenericModel {
    /// Creates a model with `ram_size` bytes of RAM at `ram_base`.
    pub fn new(ram_base: u32, ram_size: usize) -> Self {
        let mut bus = Bus::new();
        bus.add_device(Box::new(Ram::new(ram_base, ram_size)));
        Self { bus }
    }
}

impl MachineModel for GenericModel {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn bus(&mut self) -> &mut Bus {
        &mut self.bus
    }
}
