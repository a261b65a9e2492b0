//! Common utilities and types used throughout the brew simulator.
//!
//! This module provides the building blocks shared by every component of the simulator:
//! 1. **Constants:** Architectural constants (register count, address mask, reset values).
//! 2. **Memory Access:** Access direction and width used by the machine models.
//! 3. **Error Handling:** Guest-visible exception causes, halt reasons, and host faults.
//! 4. **Register Management:** Typed registers and the 15-entry register file.

/// Common constants used throughout the simulator.
pub mod constants;

/// Memory access type definitions.
pub mod data;

/// Exception causes, halt reasons, and host fault types.
pub mod error;

/// Typed register file implementation.
pub mod reg;

pub use data::{AccessType, AccessWidth};
pub use error::{ExceptionCause, HaltReason, MemFault, SimError};
pub use reg::{RegType, RegisterFile, TypedReg};
