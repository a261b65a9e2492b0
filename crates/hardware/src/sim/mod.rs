//! Simulation front end.
//!
//! Program loading, the host syscall bridge, and the top-level `Simulator`.

/// Program image parsing, placement and the guest argv block.
pub mod loader;

/// Top-level simulator wrapping the CPU.
pub mod simulator;

/// Host syscall bridge for user-level environments.
pub mod syscall;

pub use simulator::Simulator;
