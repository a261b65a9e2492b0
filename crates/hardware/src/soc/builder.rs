//! Machine construction from configuration.
//!
//! Builds the machine model selected by `config.general.model` with its bus and
//! devices, ready to be handed to the CPU.

use crate::config::{Config, ModelKind};
use crate::soc::model::{GenericModel, MachineModel, PeripheralModel, ProtectedModel};

/// Builds the configured machine model.
///
/// # Arguments
///
/// * `config` - Simulator configuration (model kind, memory, peripherals).
///
/// # Returns
///
/// The model, boxed for ownership by the CPU.
pub fn build_model(config: &Config) -> Box<dyn MachineModel> {
    let base = config.memory.ram_base();
    let size = config.memory.ram_size;
    let model: Box<dyn MachineModel> = match config.general.model {
        ModelKind::Generic => Box::new(GenericModel::new(base, size)),
        ModelKind::Protected => Box::new(ProtectedModel::new(base, size)),
        ModelKind::Peripheral => Box::new(PeripheralModel::from_config(config)),
    };
    tracing::debug!(model = model.name(), ram_size = size, "machine model built");
    model
}
