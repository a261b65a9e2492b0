//! brew instruction-set simulator library.
//!
//! This crate implements an instruction-accurate simulator for the brew ISA with the following:
//! 1. **ISA:** Length rule, ordered template decoder, and assembly formatter for the
//!    16/32/48-bit brew encodings.
//! 2. **Core:** Typed register file, lane-wise ALU/FPU, and a run loop that retires one
//!    instruction per step with shadow program counters and a dirty bitmap.
//! 3. **SoC:** Pluggable machine models (generic, protected-window, peripheral) over a
//!    bus with RAM, console and GPIO devices.
//! 4. **Simulation:** ELF/raw loader, argv block, host syscall bridge, configuration,
//!    tracing, and statistics.

/// Common types and constants (causes, halt reasons, host faults, typed registers).
pub mod common;
/// Simulator configuration (environment, model, memory, peripherals).
pub mod config;
/// CPU core (state, execution, trap response, run loop).
pub mod core;
/// Instruction set (encoding, decode, disassembly, ABI).
pub mod isa;
/// Loader, syscall bridge and the top-level simulator.
pub mod sim;
/// System-on-chip (bus, memory, devices, machine models).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Main CPU type; holds the architectural state and the machine model.
pub use crate::core::{Cpu, StepOutcome};
/// Guest exception causes, halt reasons, and host faults.
pub use crate::common::{ExceptionCause, HaltReason, SimError};
/// Top-level simulator; construct with `Simulator::new`.
pub use crate::sim::Simulator;
/// Machine model trait and its constructor.
pub use crate::soc::{MachineModel, build_model};
