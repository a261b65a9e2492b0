//! System-on-Chip (SoC) Components.
//!
//! This module organizes the components behind the CPU's memory port: the
//! system bus, RAM, memory-mapped devices, the machine models layering
//! translation and CSR policy over them, and the builder that assembles a
//! model from configuration.

/// Machine model construction from configuration.
pub mod builder;

/// Memory-mapped I/O device implementations.
pub mod devices;

/// System bus interconnect and routing.
pub mod interconnect;

/// RAM device.
pub mod memory;

/// Machine model trait and its variants.
pub mod model;

/// Device trait definitions for MMIO access.
pub mod traits;

pub use builder::build_model;
pub use model::MachineModel;
