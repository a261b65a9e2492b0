//! Core processor implementation.
//!
//! This module contains the brew CPU: architectural definitions (modes, CSR latch),
//! the typed execution units, and the run loop that retires one instruction per step.

/// Architecture-specific components (execution modes, CSR latch).
pub mod arch;

/// CPU state, instruction execution and the run loop.
pub mod cpu;

/// Execution units (typed ALU, FPU).
pub mod units;

pub use self::cpu::{Cpu, StepOutcome};
