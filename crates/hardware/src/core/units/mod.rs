//! Execution units and functional components.
//!
//! This module contains the functional units the executor dispatches typed
//! register operations to: the lane-aware integer ALU and the floating-point
//! unit for fp32 and fp16x2 values.

/// Arithmetic Logic Unit for integer and lane operations.
pub mod alu;

/// Floating-Point Unit for IEEE 754 operations.
pub mod fpu;
