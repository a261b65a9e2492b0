//! Typed Register File.
//!
//! This module provides the register types shared by the decoder, the executor and the
//! run loop. It provides:
//! 1. **Runtime Types:** `RegType`, the 4-bit type tag carried by every register.
//! 2. **Typed Values:** `TypedReg`, a 32-bit value paired with its type tag.
//! 3. **Register File:** `RegisterFile`, the 15 architectural general-purpose registers.

use std::fmt;

use crate::common::constants::NUM_REGS;
use crate::common::error::SimError;

/// Runtime type tag of a register value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RegType {
    /// 32-bit integer.
    #[default]
    Int32,
    /// IEEE single-precision float.
    Fp32,
    /// Two wrapping 16-bit integer lanes.
    Int16x2,
    /// Four wrapping 8-bit integer lanes.
    Int8x4,
    /// Two unsigned saturating 16-bit lanes.
    Uint16x2s,
    /// Two signed saturating 16-bit lanes.
    Sint16x2s,
    /// Four unsigned saturating 8-bit lanes.
    Uint8x4s,
    /// Four signed saturating 8-bit lanes.
    Sint8x4s,
    /// Two IEEE half-precision float lanes.
    Fp16x2,
    /// Lane mask produced by lane compares.
    Mask,
    /// Architecturally reserved type code (9..=14).
    Reserved(u8),
}

impl RegType {
    /// Decodes a 4-bit type code. Only the low nibble of `code` is used.
    pub const fn from_code(code: u32) -> Self {
        match code & 0xf {
            0 => Self::Int32,
            1 => Self::Fp32,
            2 => Self::Int16x2,
            3 => Self::Int8x4,
            4 => Self::Uint16x2s,
            5 => Self::Sint16x2s,
            6 => Self::Uint8x4s,
            7 => Self::Sint8x4s,
            8 => Self::Fp16x2,
            0xf => Self::Mask,
            other => Self::Reserved(other as u8),
        }
    }

    /// Returns the 4-bit type code.
    pub const fn code(self) -> u32 {
        match self {
            Self::Int32 => 0,
            Self::Fp32 => 1,
            Self::Int16x2 => 2,
            Self::Int8x4 => 3,
            Self::Uint16x2s => 4,
            Self::Sint16x2s => 5,
            Self::Uint8x4s => 6,
            Self::Sint8x4s => 7,
            Self::Fp16x2 => 8,
            Self::Mask => 0xf,
            Self::Reserved(code) => (code & 0xf) as u32,
        }
    }

    /// Returns the assembler name of the type.
    pub fn name(self) -> String {
        match self {
            Self::Int32 => "int32".into(),
            Self::Fp32 => "fp32".into(),
            Self::Int16x2 => "int16x2".into(),
            Self::Int8x4 => "int8x4".into(),
            Self::Uint16x2s => "uint16x2s".into(),
            Self::Sint16x2s => "sint16x2s".into(),
            Self::Uint8x4s => "uint8x4s".into(),
            Self::Sint8x4s => "sint8x4s".into(),
            Self::Fp16x2 => "fp16x2".into(),
            Self::Mask => "mask".into(),
            Self::Reserved(code) => format!("type{code}"),
        }
    }

    /// Returns `true` for the floating-point types.
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Fp32 | Self::Fp16x2)
    }
}

impl fmt::Display for RegType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// A 32-bit register value tagged with its runtime type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TypedReg {
    /// Raw 32-bit contents.
    pub value: u32,
    /// Runtime type tag.
    pub ty: RegType,
}

impl TypedReg {
    /// Creates a typed value.
    pub const fn new(value: u32, ty: RegType) -> Self {
        Self { value, ty }
    }

    /// Creates an `int32` value.
    pub const fn int(value: u32) -> Self {
        Self::new(value, RegType::Int32)
    }

    /// Returns the same value re-tagged with `ty`.
    #[must_use]
    pub const fn with_type(self, ty: RegType) -> Self {
        Self::new(self.value, ty)
    }
}

impl fmt::Display for TypedReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x} ({})", self.value, self.ty)
    }
}

/// General-purpose register file.
///
/// Holds the 15 architectural registers. Index 15 is a sentinel in the
/// instruction encoding and has no storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterFile {
    regs: [TypedReg; NUM_REGS],
}

impl RegisterFile {
    /// Creates a register file with every register `0` typed `int32`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a register.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-14). The sentinel index reads as `0`.
    ///
    /// # Returns
    ///
    /// The typed contents of the register.
    pub fn read(&self, idx: usize) -> TypedReg {
        self.regs.get(idx).copied().unwrap_or_default()
    }

    /// Writes a register.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-14).
    /// * `val` - The typed value to store.
    ///
    /// # Returns
    ///
    /// `true` if the value or its type changed.
    ///
    /// # Errors
    ///
    /// Returns `SimError::ReservedRegister` for an index outside 0-14.
    pub fn write(&mut self, idx: usize, val: TypedReg) -> Result<bool, SimError> {
        let slot = self
            .regs
            .get_mut(idx)
            .ok_or(SimError::ReservedRegister(idx))?;
        let changed = *slot != val;
        *slot = val;
        Ok(changed)
    }

    /// Returns a view of all registers.
    pub fn as_slice(&self) -> &[TypedReg] {
        &self.regs
    }

    /// Dumps the register file to stderr, three registers per line.
    pub fn dump(&self) {
        for (i, chunk) in self.regs.chunks(3).enumerate() {
            let line: Vec<String> = chunk
                .iter()
                .enumerate()
                .map(|(j, r)| format!("{:>5} = {r}", crate::isa::abi::reg_name(i * 3 + j)))
                .collect();
            eprintln!("{}", line.join("   "));
        }
    }
}
