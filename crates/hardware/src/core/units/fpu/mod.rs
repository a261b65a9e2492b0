//! Floating-Point Unit (FPU).
//!
//! This module implements the floating-point half of the typed ALU. It handles
//! fp32 scalars and fp16x2 lane pairs, plus the conversions between integer and
//! floating-point register types.
//!
//! Operations are organized as follows:
//! - [`fp16`]: binary16 widening and rounding.
//! - [`Fpu`]: arithmetic, conversions, reciprocal and reciprocal square root.

/// IEEE 754 binary16 conversions.
pub mod fp16;

use crate::common::error::ExceptionCause;
use crate::common::reg::{RegType, TypedReg};
use crate::core::units::alu::lanes::LaneFormat;

/// Floating-Point Unit for fp32 and fp16x2 values.
#[derive(Debug)]
pub struct Fpu;

/// Lanes of a float-typed register widened to `f32`.
fn lanes(reg: TypedReg) -> Result<Vec<f32>, ExceptionCause> {
    match reg.ty {
        RegType::Fp32 => Ok(vec![f32::from_bits(reg.value)]),
        RegType::Fp16x2 => Ok(vec![
            fp16::to_f32(reg.value as u16),
            fp16::to_f32((reg.value >> 16) as u16),
        ]),
        _ => Err(ExceptionCause::Type),
    }
}

/// Packs `f32` lane results into a register of type `ty`.
fn pack(ty: RegType, values: &[f32]) -> TypedReg {
    let value = match ty {
        RegType::Fp16x2 => values
            .iter()
            .enumerate()
            .fold(0, |acc, (i, v)| acc | (u32::from(fp16::from_f32(*v)) << (16 * i))),
        _ => values.first().map_or(0, |v| v.to_bits()),
    };
    TypedReg::new(value, ty)
}

impl Fpu {
    /// Applies a lane-wise binary floating-point operation.
    ///
    /// # Arguments
    ///
    /// * `a` - First operand; its type selects the lane layout and the result type.
    /// * `b` - Second operand, read with the same layout.
    /// * `op` - The lane operation.
    ///
    /// # Returns
    ///
    /// The result typed as `a`, or `ExceptionCause::Type` if `a` is not a float type.
    pub fn binary(
        a: TypedReg,
        b: TypedReg,
        op: impl Fn(f32, f32) -> f32,
    ) -> Result<TypedReg, ExceptionCause> {
        let lhs = lanes(a)?;
        let rhs = lanes(b.with_type(a.ty))?;
        let out: Vec<f32> = lhs.iter().zip(&rhs).map(|(x, y)| op(*x, *y)).collect();
        Ok(pack(a.ty, &out))
    }

    /// Applies a lane-wise unary floating-point operation.
    pub fn unary(a: TypedReg, op: impl Fn(f32) -> f32) -> Result<TypedReg, ExceptionCause> {
        let out: Vec<f32> = lanes(a)?.into_iter().map(op).collect();
        Ok(pack(a.ty, &out))
    }

    /// Negates every lane by flipping its sign bit.
    pub fn neg(a: TypedReg) -> Result<TypedReg, ExceptionCause> {
        match a.ty {
            RegType::Fp32 => Ok(TypedReg::new(a.value ^ 0x8000_0000, a.ty)),
            RegType::Fp16x2 => Ok(TypedReg::new(a.value ^ 0x8000_8000, a.ty)),
            _ => Err(ExceptionCause::Type),
        }
    }

    /// Converts integer lanes to floating point.
    ///
    /// `int32` becomes `fp32`; 16-bit integer lanes become `fp16x2`. Eight-bit
    /// lanes and float types raise `ExceptionCause::Type`.
    pub fn to_float(a: TypedReg) -> Result<TypedReg, ExceptionCause> {
        match a.ty {
            RegType::Int32 => Ok(pack(RegType::Fp32, &[a.value as i32 as f32])),
            RegType::Int16x2 | RegType::Uint16x2s | RegType::Sint16x2s => {
                let fmt = LaneFormat::of(a.ty)?;
                let signed = a.ty != RegType::Uint16x2s;
                let values: Vec<f32> = (0..2)
                    .map(|i| {
                        if signed {
                            fmt.lane_signed(a.value, i) as f32
                        } else {
                            fmt.lane(a.value, i) as f32
                        }
                    })
                    .collect();
                Ok(pack(RegType::Fp16x2, &values))
            }
            _ => Err(ExceptionCause::Type),
        }
    }

    /// Converts floating-point lanes to integers, rounding by adding one half and truncating.
    ///
    /// `fp32` becomes `int32`; `fp16x2` becomes `int16x2`. Out-of-range values saturate.
    pub fn to_int(a: TypedReg) -> Result<TypedReg, ExceptionCause> {
        match a.ty {
            RegType::Fp32 => {
                let v = f32::from_bits(a.value) + 0.5;
                Ok(TypedReg::int(v as i32 as u32))
            }
            RegType::Fp16x2 => {
                let value = lanes(a)?
                    .iter()
                    .enumerate()
                    .fold(0, |acc, (i, v)| acc | ((((v + 0.5) as i16) as u16 as u32) << (16 * i)));
                Ok(TypedReg::new(value, RegType::Int16x2))
            }
            _ => Err(ExceptionCause::Type),
        }
    }

    /// Lane-wise reciprocal.
    pub fn recip(a: TypedReg) -> Result<TypedReg, ExceptionCause> {
        Self::unary(a, |x| 1.0 / x)
    }

    /// Lane-wise reciprocal square root.
    pub fn rsqrt(a: TypedReg) -> Result<TypedReg, ExceptionCause> {
        Self::unary(a, |x| 1.0 / x.sqrt())
    }

    /// Returns the lanes of a float register widened to `f32`.
    pub fn lanes_of(a: TypedReg) -> Result<Vec<f32>, ExceptionCause> {
        lanes(a)
    }
}
