//! Lane layouts of typed registers.
//!
//! Every non-mask register type splits its 32-bit value into one, two or four lanes.
//! This module maps types to lane layouts and provides helpers to extract, saturate
//! and repack lanes.

use crate::common::error::ExceptionCause;
use crate::common::reg::RegType;

/// How lane values behave on overflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaneKind {
    /// Two's-complement wrap-around.
    Wrap,
    /// Unsigned saturation.
    UnsignedSat,
    /// Signed saturation.
    SignedSat,
    /// IEEE floating point.
    Float,
}

/// Lane layout of a register type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaneFormat {
    /// Width of one lane in bits (8, 16 or 32).
    pub bits: u32,
    /// Overflow behavior.
    pub kind: LaneKind,
}

impl LaneFormat {
    /// Returns the lane layout of `ty`.
    ///
    /// # Errors
    ///
    /// Returns `ExceptionCause::Type` for the mask type and reserved codes.
    pub const fn of(ty: RegType) -> Result<Self, ExceptionCause> {
        let (bits, kind) = match ty {
            RegType::Int32 => (32, LaneKind::Wrap),
            RegType::Fp32 => (32, LaneKind::Float),
            RegType::Int16x2 => (16, LaneKind::Wrap),
            RegType::Int8x4 => (8, LaneKind::Wrap),
            RegType::Uint16x2s => (16, LaneKind::UnsignedSat),
            RegType::Sint16x2s => (16, LaneKind::SignedSat),
            RegType::Uint8x4s => (8, LaneKind::UnsignedSat),
            RegType::Sint8x4s => (8, LaneKind::SignedSat),
            RegType::Fp16x2 => (16, LaneKind::Float),
            RegType::Mask | RegType::Reserved(_) => return Err(ExceptionCause::Type),
        };
        Ok(Self { bits, kind })
    }

    /// Number of lanes in a 32-bit register.
    pub const fn count(self) -> u32 {
        32 / self.bits
    }

    /// Mask covering one lane.
    pub const fn mask(self) -> u32 {
        if self.bits == 32 { u32::MAX } else { (1 << self.bits) - 1 }
    }

    /// Extracts lane `i`, zero-extended.
    pub const fn lane(self, value: u32, i: u32) -> u32 {
        (value >> (i * self.bits)) & self.mask()
    }

    /// Extracts lane `i`, sign-extended.
    pub const fn lane_signed(self, value: u32, i: u32) -> i64 {
        let shift = 32 - self.bits;
        (((self.lane(value, i) << shift) as i32) >> shift) as i64
    }

    /// Extracts lane `i` with the signedness its kind implies.
    pub const fn lane_value(self, value: u32, i: u32) -> i64 {
        match self.kind {
            LaneKind::SignedSat => self.lane_signed(value, i),
            _ => self.lane(value, i) as i64,
        }
    }

    /// Narrows a wide lane result to the lane width per the lane kind.
    pub const fn narrow(self, wide: i64) -> u32 {
        let narrowed = match self.kind {
            LaneKind::UnsignedSat => {
                let max = self.mask() as i64;
                if wide < 0 {
                    0
                } else if wide > max {
                    max
                } else {
                    wide
                }
            }
            LaneKind::SignedSat => {
                let max = (1i64 << (self.bits - 1)) - 1;
                let min = -(1i64 << (self.bits - 1));
                if wide < min {
                    min
                } else if wide > max {
                    max
                } else {
                    wide
                }
            }
            LaneKind::Wrap | LaneKind::Float => wide,
        };
        (narrowed as u32) & self.mask()
    }

    /// Applies `f` to every pair of lanes and repacks the results.
    ///
    /// `f` receives the lane index and both lanes zero-extended.
    pub fn map2(self, a: u32, b: u32, f: impl Fn(u32, u32, u32) -> u32) -> u32 {
        (0..self.count()).fold(0, |acc, i| {
            let lane = f(i, self.lane(a, i), self.lane(b, i)) & self.mask();
            acc | (lane << (i * self.bits))
        })
    }

    /// Applies `f` to every lane and repacks the results.
    pub fn map(self, a: u32, f: impl Fn(u32, u32) -> u32) -> u32 {
        self.map2(a, 0, |i, x, _| f(i, x))
    }
}

/// Byte swizzle: destination byte `i` takes source byte `(pattern >> 2i) & 3`.
pub const fn swizzle(value: u32, pattern: u8) -> u32 {
    let mut out = 0;
    let mut i = 0;
    while i < 4 {
        let src = ((pattern >> (2 * i)) & 3) as u32;
        out |= ((value >> (src * 8)) & 0xff) << (i * 8);
        i += 1;
    }
    out
}
