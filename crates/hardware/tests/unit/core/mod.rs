/// Typed lane arithmetic, shifts, conversions and comparisons.
pub mod alu;

/// Universal and model-specific control and status registers.
pub mod csr;
