//! ALU shift operations.
//!
//! Shifts apply per lane; each lane of the first operand is shifted by the
//! matching lane of the second operand, masked to 5 bits. Float types are
//! shifted as raw bit patterns.

use crate::common::error::ExceptionCause;
use crate::common::reg::TypedReg;
use crate::core::units::alu::lanes::LaneFormat;
use crate::isa::instruction::BinaryOp;

/// Executes `<<`, `>>` or `>>>` lane-wise.
pub fn execute(op: BinaryOp, a: TypedReg, b: TypedReg) -> Result<TypedReg, ExceptionCause> {
    let fmt = LaneFormat::of(a.ty)?;
    let value = fmt.map2(a.value, b.value, |i, x, amount| {
        let amount = amount & 31;
        match op {
            BinaryOp::Lsh => x.checked_shl(amount).unwrap_or(0),
            BinaryOp::Rsh => x.checked_shr(amount).unwrap_or(0),
            _ => (fmt.lane_signed(a.value, i) >> amount) as u32,
        }
    });
    Ok(TypedReg::new(value, a.ty))
}
