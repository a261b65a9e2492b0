//! brew architecture-specific components.
//!
//! This module contains the architectural elements shared by every machine model.
//! It includes the following modules:
//! 1. **CSRs:** Control and Status Register addresses and the universal CSR set.
//! 2. **Modes:** Task and scheduler execution modes.

/// Control and Status Register (CSR) definitions and access logic.
pub mod csr;

/// Execution mode definitions.
pub mod mode;
