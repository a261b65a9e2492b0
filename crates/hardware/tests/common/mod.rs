//! Shared test infrastructure.


/// `TestContext`: a simulator with RAM and convenience accessors.
pub mod harness;

/// Mock devices and sinks.
pub mod mocks;
