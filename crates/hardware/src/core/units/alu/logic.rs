//! ALU bitwise operations.
//!
//! Bitwise operations ignore lane boundaries and keep the type of the first
//! operand, so they are valid for every register type.

use crate::common::reg::TypedReg;
use crate::isa::instruction::BinaryOp;

/// Executes `xor`, `or` or `and`.
pub const fn execute(op: BinaryOp, a: TypedReg, b: TypedReg) -> TypedReg {
    let value = match op {
        BinaryOp::Xor => a.value ^ b.value,
        BinaryOp::Or => a.value | b.value,
        _ => a.value & b.value,
    };
    TypedReg::new(value, a.ty)
}

/// `~a & b`, typed as `a`.
pub const fn and_not(a: TypedReg, b: TypedReg) -> TypedReg {
    TypedReg::new(!a.value & b.value, a.ty)
}

/// Bitwise complement.
pub const fn not(a: TypedReg) -> TypedReg {
    TypedReg::new(!a.value, a.ty)
}

/// Sign-extends the low byte to 32 bits.
pub const fn bsi(a: TypedReg) -> TypedReg {
    TypedReg::new(a.value as u8 as i8 as i32 as u32, a.ty)
}

/// Sign-extends the low halfword to 32 bits.
pub const fn wsi(a: TypedReg) -> TypedReg {
    TypedReg::new(a.value as u16 as i16 as i32 as u32, a.ty)
}
