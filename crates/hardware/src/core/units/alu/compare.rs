//! Typed lane comparisons.
//!
//! Conditional branches reduce a lane-wise comparison to one flag ("any lane" or
//! "all lanes"); lane compares instead produce a mask with all-ones lanes where
//! the comparison holds. The lane layout always comes from a designated operand.

use crate::common::error::ExceptionCause;
use crate::common::reg::{RegType, TypedReg};
use crate::core::units::alu::lanes::{LaneFormat, LaneKind};
use crate::core::units::fpu::Fpu;
use crate::isa::instruction::Cond;

/// Evaluates `cond` on every lane of `left` and `right` laid out as `ty`.
fn lane_results(
    ty: RegType,
    left: u32,
    right: u32,
    cond: Cond,
    signed: bool,
) -> Result<(LaneFormat, Vec<bool>), ExceptionCause> {
    let fmt = LaneFormat::of(ty)?;
    let results = if fmt.kind == LaneKind::Float {
        let lhs = Fpu::lanes_of(TypedReg::new(left, ty))?;
        let rhs = Fpu::lanes_of(TypedReg::new(right, ty))?;
        lhs.iter().zip(&rhs).map(|(x, y)| cond.holds(x, y)).collect()
    } else if signed {
        (0..fmt.count())
            .map(|i| cond.holds(fmt.lane_signed(left, i), fmt.lane_signed(right, i)))
            .collect()
    } else {
        (0..fmt.count())
            .map(|i| cond.holds(fmt.lane(left, i), fmt.lane(right, i)))
            .collect()
    };
    Ok((fmt, results))
}

/// Evaluates a branch condition.
///
/// # Arguments
///
/// * `ty` - Type selecting the lane layout.
/// * `left`, `right` - Raw register values.
/// * `cond` - Comparison.
/// * `signed` - Compare integer lanes as signed.
/// * `all_lanes` - Require every lane to satisfy the condition instead of any.
///
/// # Returns
///
/// Whether the branch is taken, or `ExceptionCause::Type` for mask and reserved types.
pub fn condition(
    ty: RegType,
    left: u32,
    right: u32,
    cond: Cond,
    signed: bool,
    all_lanes: bool,
) -> Result<bool, ExceptionCause> {
    let (_, results) = lane_results(ty, left, right, cond, signed)?;
    Ok(if all_lanes {
        results.iter().all(|r| *r)
    } else {
        results.iter().any(|r| *r)
    })
}

/// Computes a lane mask: all-ones lanes where `left cond right` holds.
///
/// The mask is typed `int32`, `int16x2` or `int8x4` to match the lane width of `ty`.
pub fn lane_mask(
    ty: RegType,
    left: u32,
    right: u32,
    cond: Cond,
    signed: bool,
) -> Result<TypedReg, ExceptionCause> {
    let (fmt, results) = lane_results(ty, left, right, cond, signed)?;
    let value = results
        .iter()
        .enumerate()
        .filter(|(_, hit)| **hit)
        .fold(0u32, |acc, (i, _)| acc | (fmt.mask() << (i as u32 * fmt.bits)));
    let mask_ty = match fmt.bits {
        32 => RegType::Int32,
        16 => RegType::Int16x2,
        _ => RegType::Int8x4,
    };
    Ok(TypedReg::new(value, mask_ty))
}
