//! ALU arithmetic operations.
//!
//! Implements add, subtract, multiply, full multiply, negate and lane sum for
//! every integer lane layout. Float types are forwarded to the FPU.

use crate::common::error::ExceptionCause;
use crate::common::reg::{RegType, TypedReg};
use crate::core::units::alu::lanes::{LaneFormat, LaneKind};
use crate::core::units::fpu::Fpu;
use crate::isa::instruction::BinaryOp;

/// Executes `add`, `sub` or `mul` lane-wise.
///
/// # Arguments
///
/// * `op` - One of `Add`, `Sub`, `Mul`.
/// * `a`  - First operand; selects the lane layout and result type.
/// * `b`  - Second operand, read with the layout of `a`.
///
/// # Returns
///
/// Wrapping results for plain lanes, saturated results for saturating lanes,
/// IEEE results for float lanes.
pub fn execute(op: BinaryOp, a: TypedReg, b: TypedReg) -> Result<TypedReg, ExceptionCause> {
    let fmt = LaneFormat::of(a.ty)?;
    if fmt.kind == LaneKind::Float {
        return match op {
            BinaryOp::Add => Fpu::binary(a, b, |x, y| x + y),
            BinaryOp::Sub => Fpu::binary(a, b, |x, y| x - y),
            _ => Fpu::binary(a, b, |x, y| x * y),
        };
    }
    let value = fmt.map2(a.value, b.value, |i, _, _| {
        let x = fmt.lane_value(a.value, i);
        let y = fmt.lane_value(b.value, i);
        let wide = match op {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            _ => x.wrapping_mul(y),
        };
        fmt.narrow(wide)
    });
    Ok(TypedReg::new(value, a.ty))
}

/// Full multiply: lane products at double width, shifted right by `shift`.
///
/// `signed` selects sign-extended lanes and an arithmetic shift; otherwise lanes
/// are zero-extended and the shift is logical. Saturating lanes clamp the shifted
/// product. Float lanes ignore the shift.
pub fn full_mul(
    a: TypedReg,
    b: TypedReg,
    shift: u32,
    signed: bool,
) -> Result<TypedReg, ExceptionCause> {
    let fmt = LaneFormat::of(a.ty)?;
    if fmt.kind == LaneKind::Float {
        return Fpu::binary(a, b, |x, y| x * y);
    }
    let shift = shift & 31;
    let value = fmt.map2(a.value, b.value, |i, _, _| {
        let product = if signed {
            (i128::from(fmt.lane_signed(a.value, i)) * i128::from(fmt.lane_signed(b.value, i))) >> shift
        } else {
            let x = u128::from(fmt.lane(a.value, i));
            let y = u128::from(fmt.lane(b.value, i));
            ((x * y) >> shift) as i128
        };
        match fmt.kind {
            LaneKind::Wrap => product as u32,
            _ => fmt.narrow(product.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64),
        }
    });
    Ok(TypedReg::new(value, a.ty))
}

/// Lane-wise negation. Integer lanes wrap.
pub fn neg(a: TypedReg) -> Result<TypedReg, ExceptionCause> {
    let fmt = LaneFormat::of(a.ty)?;
    if fmt.kind == LaneKind::Float {
        return Fpu::neg(a);
    }
    Ok(TypedReg::new(fmt.map(a.value, |_, x| x.wrapping_neg()), a.ty))
}

/// Horizontal sum of all lanes.
///
/// Scalars are returned unchanged. Integer lanes sum into an `int32`;
/// `fp16x2` lanes sum into an `fp32`.
pub fn sum(a: TypedReg) -> Result<TypedReg, ExceptionCause> {
    let fmt = LaneFormat::of(a.ty)?;
    if fmt.count() == 1 {
        return Ok(a);
    }
    if fmt.kind == LaneKind::Float {
        let total: f32 = Fpu::lanes_of(a)?.iter().sum();
        return Ok(TypedReg::new(total.to_bits(), RegType::Fp32));
    }
    let total = (0..fmt.count()).fold(0i64, |acc, i| acc + fmt.lane_value(a.value, i));
    Ok(TypedReg::int(total as u32))
}
