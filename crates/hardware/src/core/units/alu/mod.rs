//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the typed ALU used by the executor. Every operation
//! dispatches on the runtime type of its first operand: plain integer lanes wrap,
//! saturating lanes clamp, float lanes go to the FPU. An operation the type does
//! not support yields `ExceptionCause::Type`, which the run loop raises as a guest
//! exception.
//!
//! Operations are organized into submodules by category:
//! - [`arithmetic`]: Add, Sub, Mul, full multiply, Neg, Sum
//! - [`logic`]:      Xor, Or, And, AndNot, Not, Bsi, Wsi
//! - [`shifts`]:     Lsh, Rsh, Srsh
//! - [`compare`]:    branch conditions and lane masks
//! - [`lanes`]:      lane layouts, saturation and swizzle

/// Integer arithmetic operations.
pub mod arithmetic;

/// Typed lane comparisons.
pub mod compare;

/// Lane layouts and saturation helpers.
pub mod lanes;

/// Bitwise operations.
pub mod logic;

/// Lane-wise shifts.
pub mod shifts;

use crate::common::error::ExceptionCause;
use crate::common::reg::{RegType, TypedReg};
use crate::core::units::fpu::Fpu;
use crate::isa::instruction::{BinaryOp, UnaryOp};

/// Operand kind of an ALU dispatch slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandKind {
    /// Unsigned or sign-agnostic integer.
    Unsigned,
    /// Signed integer.
    Signed,
    /// Floating point.
    Float,
}

impl OperandKind {
    /// Returns the kind of an arithmetic operand of type `ty`.
    pub const fn of(ty: RegType) -> Self {
        match ty {
            RegType::Fp32 | RegType::Fp16x2 => Self::Float,
            RegType::Sint16x2s | RegType::Sint8x4s => Self::Signed,
            _ => Self::Unsigned,
        }
    }
}

/// Arithmetic Logic Unit (ALU) for typed register operations.
#[derive(Debug)]
pub struct Alu;

impl Alu {
    /// Returns the (destination, first, second) operand kinds of `op` on operands
    /// typed `a` and `b`.
    ///
    /// Add, Sub and Mul take their kinds from the operand types. Bitwise ops and
    /// shifts work on raw lanes, so their kinds are fixed.
    pub const fn operand_kinds(
        op: BinaryOp,
        a: RegType,
        b: RegType,
    ) -> (OperandKind, OperandKind, OperandKind) {
        use OperandKind::{Signed, Unsigned};
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
                let first = OperandKind::of(a);
                (first, first, OperandKind::of(b))
            }
            BinaryOp::Srsh => (Signed, Signed, Unsigned),
            _ => (Unsigned, Unsigned, Unsigned),
        }
    }

    /// Checks that an operand-kind triple is one the ALU supports.
    ///
    /// # Errors
    ///
    /// Returns `ExceptionCause::Type` for any triple other than
    /// (U, U, U), (S, S, U), (S, S, S) or (F, F, F).
    pub const fn check_operand_kinds(
        kinds: (OperandKind, OperandKind, OperandKind),
    ) -> Result<(), ExceptionCause> {
        use OperandKind::{Float, Signed, Unsigned};
        match kinds {
            (Unsigned, Unsigned, Unsigned)
            | (Signed, Signed, Unsigned)
            | (Signed, Signed, Signed)
            | (Float, Float, Float) => Ok(()),
            _ => Err(ExceptionCause::Type),
        }
    }

    /// Executes a binary ALU operation.
    ///
    /// # Arguments
    ///
    /// * `op` - The operation.
    /// * `a`  - First operand; selects the lane layout and the result type.
    /// * `b`  - Second operand.
    ///
    /// # Returns
    ///
    /// The typed result, or the exception cause to raise.
    pub fn binary(op: BinaryOp, a: TypedReg, b: TypedReg) -> Result<TypedReg, ExceptionCause> {
        match op {
            BinaryOp::Xor | BinaryOp::Or | BinaryOp::And => Ok(logic::execute(op, a, b)),
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => arithmetic::execute(op, a, b),
            BinaryOp::Lsh | BinaryOp::Rsh | BinaryOp::Srsh => shifts::execute(op, a, b),
        }
    }

    /// Executes a unary ALU operation.
    pub fn unary(op: UnaryOp, a: TypedReg) -> Result<TypedReg, ExceptionCause> {
        match op {
            UnaryOp::Neg => arithmetic::neg(a),
            UnaryOp::Not => Ok(logic::not(a)),
            UnaryOp::Bsi => Ok(logic::bsi(a)),
            UnaryOp::Wsi => Ok(logic::wsi(a)),
            UnaryOp::ToFloat => Fpu::to_float(a),
            UnaryOp::ToInt => Fpu::to_int(a),
            UnaryOp::Recip => Fpu::recip(a),
            UnaryOp::Rsqrt => Fpu::rsqrt(a),
            UnaryOp::Sum => arithmetic::sum(a),
        }
    }
}
