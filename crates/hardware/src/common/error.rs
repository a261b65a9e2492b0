//! Exception, Halt, and Host Fault definitions.
//!
//! The simulator keeps two disjoint error taxonomies apart. It provides:
//! 1. **Guest Exceptions:** `ExceptionCause`, the architecturally visible cause of an
//!    instruction's exception. These are plain values, latched into CSR state and handled
//!    by the active machine model.
//! 2. **Halt Reasons:** `HaltReason`, the distinguished outcome that stops the run loop.
//! 3. **Host Faults:** `SimError`, raised when the simulator itself reaches an unimplemented
//!    or structurally unreachable state. These stop the simulator and are never shown to the guest.

use std::fmt;

use thiserror::Error;

/// Guest-visible exception causes.
///
/// The discriminants are the architectural cause codes reported through the
/// latched cause CSR.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ExceptionCause {
    /// No exception.
    #[default]
    None = 0x00,
    /// Hardware interrupt (only taken in task mode).
    Hwi = 0x10,
    /// `fill` instruction (software interrupt 0).
    Fill = 0x20,
    /// `break` instruction (software interrupt 1).
    Break = 0x21,
    /// `syscall` instruction (software interrupt 2).
    Syscall = 0x22,
    /// Software interrupt 3.
    Swi3 = 0x23,
    /// Software interrupt 4.
    Swi4 = 0x24,
    /// Software interrupt 5.
    Swi5 = 0x25,
    /// Software interrupt 6.
    Swi6 = 0x26,
    /// Undefined instruction encoding.
    UnknownInst = 0x30,
    /// Operand type not supported by the operation.
    Type = 0x31,
    /// Unaligned memory access.
    Unaligned = 0x32,
    /// Instruction fetch outside the permitted window.
    InstAv = 0x40,
    /// Data access outside the permitted window.
    MemAv = 0x41,
}

impl ExceptionCause {
    /// Returns the numeric cause code.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Returns `true` for every cause except `None`.
    pub const fn is_some(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns the software-interrupt cause for `level` (3..=6).
    pub const fn swi(level: u8) -> Option<Self> {
        match level {
            3 => Some(Self::Swi3),
            4 => Some(Self::Swi4),
            5 => Some(Self::Swi5),
            6 => Some(Self::Swi6),
            _ => None,
        }
    }

    /// Converts a numeric cause code back into a cause.
    pub const fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0x00 => Self::None,
            0x10 => Self::Hwi,
            0x20 => Self::Fill,
            0x21 => Self::Break,
            0x22 => Self::Syscall,
            0x23 => Self::Swi3,
            0x24 => Self::Swi4,
            0x25 => Self::Swi5,
            0x26 => Self::Swi6,
            0x30 => Self::UnknownInst,
            0x31 => Self::Type,
            0x32 => Self::Unaligned,
            0x40 => Self::InstAv,
            0x41 => Self::MemAv,
            _ => return None,
        })
    }

    /// Returns the name printed in instruction traces.
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Hwi => "hwi",
            Self::Fill => "fill",
            Self::Break => "break",
            Self::Syscall => "syscall",
            Self::Swi3 => "swi3",
            Self::Swi4 => "swi4",
            Self::Swi5 => "swi5",
            Self::Swi6 => "swi6",
            Self::UnknownInst => "unknown instruction",
            Self::Type => "type error",
            Self::Unaligned => "unaligned access",
            Self::InstAv => "instruction access violation",
            Self::MemAv => "memory access violation",
        }
    }

    /// Returns the host signal a user-level environment reports for this cause.
    pub const fn signal(self) -> i32 {
        match self {
            Self::None | Self::Hwi | Self::Fill | Self::Break | Self::Syscall => libc::SIGTRAP,
            Self::Swi3 | Self::Swi4 | Self::Swi5 | Self::Swi6 => libc::SIGTRAP,
            Self::UnknownInst | Self::Type => libc::SIGILL,
            Self::Unaligned => libc::SIGBUS,
            Self::InstAv | Self::MemAv => libc::SIGSEGV,
        }
    }
}

impl fmt::Display for ExceptionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.name(), self.code())
    }
}

/// A memory access that did not complete.
///
/// Carries the cause to raise and the faulting virtual address, which the
/// run loop latches into the fault-address CSR.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemFault {
    /// Cause to raise for the faulting instruction.
    pub cause: ExceptionCause,
    /// Virtual address of the access.
    pub addr: u32,
}

impl MemFault {
    /// Creates a fault record.
    pub const fn new(cause: ExceptionCause, addr: u32) -> Self {
        Self { cause, addr }
    }
}

/// Why the run loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HaltReason {
    /// The guest exited with the given status.
    Exited(i32),
    /// The guest was stopped by a signal-like condition (`SIGTRAP`, `SIGILL`, ...).
    Signalled(i32),
}

impl HaltReason {
    /// Returns the process exit code the CLI reports for this halt.
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::Signalled(sig) => 128 + sig,
        }
    }
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with status {code}"),
            Self::Signalled(sig) => write!(f, "stopped by signal {sig}"),
        }
    }
}

/// Host-side simulator faults.
///
/// These indicate a simulator defect, an unimplemented feature, or a configuration
/// problem. They are never converted into guest exceptions.
#[derive(Debug, Error)]
pub enum SimError {
    /// A CSR address the active model does not implement.
    #[error("unknown CSR address 0x{addr:03x}")]
    UnknownCsr {
        /// The CSR address accessed.
        addr: u32,
    },

    /// A feature that exists architecturally but is not implemented.
    #[error("unimplemented: {0}")]
    Unimplemented(&'static str),

    /// A decode or execute branch that no well-formed word can reach.
    #[error("unreachable decode state for word 0x{word:04x}: {reason}")]
    Unreachable {
        /// The instruction word being processed.
        word: u16,
        /// Which invariant was violated.
        reason: &'static str,
    },

    /// A memory reference with neither a base register nor a displacement.
    #[error("memory reference without base or displacement")]
    NoMemoryOperand,

    /// An attempt to commit a write to the reserved register index.
    #[error("write to reserved register index {0}")]
    ReservedRegister(usize),

    /// I/O failure on the host side (loading programs, writing traces).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The program image could not be parsed or placed.
    #[error("ELF load error: {0}")]
    Elf(String),

    /// The configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<object::read::Error> for SimError {
    fn from(err: object::read::Error) -> Self {
        Self::Elf(err.to_string())
    }
}
