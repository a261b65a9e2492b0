//! # ALU Tests
//!
//! Lane arithmetic per register type: wrapping and saturating lanes, per-lane
//! shifts, float forwarding, conversions, horizontal sums and full multiply.

use brewsim_core::ExceptionCause;
use brewsim_core::common::reg::{RegType, TypedReg};
use brewsim_core::core::units::alu::{Alu, arithmetic, compare};
use brewsim_core::core::units::fpu::{Fpu, fp16};
use brewsim_core::isa::instruction::{BinaryOp, Cond, UnaryOp};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

fn reg(value: u32, ty: RegType) -> TypedReg {
    TypedReg::new(value, ty)
}

fn fp32(value: f32) -> TypedReg {
    reg(value.to_bits(), RegType::Fp32)
}

#[rstest]
#[case::int16x2_wraps(BinaryOp::Add, RegType::Int16x2, 0xffff_0001, 0x0001_0001, 0x0000_0002)]
#[case::uint8x4s_clamps_high(BinaryOp::Add, RegType::Uint8x4s, 0xff10_0000, 0x0110_0000, 0xff20_0000)]
#[case::uint16x2s_clamps_low(BinaryOp::Sub, RegType::Uint16x2s, 0x0001_0005, 0x0002_0001, 0x0000_0004)]
#[case::sint16x2s_clamps_both(BinaryOp::Add, RegType::Sint16x2s, 0x7fff_8000, 0x0001_ffff, 0x7fff_8000)]
#[case::int8x4_mul(BinaryOp::Mul, RegType::Int8x4, 0x0203_0405, 0x0202_0202, 0x0406_080a)]
#[case::int32_sub_wraps(BinaryOp::Sub, RegType::Int32, 0, 1, 0xffff_ffff)]
#[case::lsh_per_lane(BinaryOp::Lsh, RegType::Int8x4, 0x0101_0101, 0x0001_0203, 0x0102_0408)]
#[case::rsh_masks_amount(BinaryOp::Rsh, RegType::Int32, 0x8000_0000, 33, 0x4000_0000)]
#[case::srsh_int32(BinaryOp::Srsh, RegType::Int32, 0x8000_0000, 4, 0xf800_0000)]
#[case::fp32_shifts_raw_bits(BinaryOp::Lsh, RegType::Fp32, 0x3f80_0000, 1, 0x7f00_0000)]
#[case::xor_on_any_type(BinaryOp::Xor, RegType::Fp16x2, 0xffff_0000, 0x0f0f_0f0f, 0xf0f0_0f0f)]
fn test_binary_lanes(
    #[case] op: BinaryOp,
    #[case] ty: RegType,
    #[case] a: u32,
    #[case] b: u32,
    #[case] expected: u32,
) {
    let result = Alu::binary(op, reg(a, ty), reg(b, ty));
    assert_eq!(result, Ok(reg(expected, ty)));
}

#[test]
fn test_result_takes_first_operand_type() {
    let result = Alu::binary(BinaryOp::Add, reg(1, RegType::Int16x2), TypedReg::int(0x0001_0001));
    assert_eq!(result, Ok(reg(0x0001_0002, RegType::Int16x2)));
}

#[rstest]
#[case::add(BinaryOp::Add)]
#[case::mul(BinaryOp::Mul)]
#[case::lsh(BinaryOp::Lsh)]
#[case::srsh(BinaryOp::Srsh)]
fn test_mask_type_raises_type(#[case] op: BinaryOp) {
    let mask = reg(0xff00_ff00, RegType::Mask);
    assert_eq!(Alu::binary(op, mask, TypedReg::int(1)), Err(ExceptionCause::Type));
}

#[test]
fn test_reserved_type_raises_type() {
    let r = reg(1, RegType::from_code(0xa));
    assert_eq!(Alu::binary(BinaryOp::Sub, r, r), Err(ExceptionCause::Type));
    assert_eq!(Alu::unary(UnaryOp::Neg, r), Err(ExceptionCause::Type));
}

#[test]
fn test_float_arithmetic() {
    assert_eq!(Alu::binary(BinaryOp::Add, fp32(1.5), fp32(2.25)), Ok(fp32(3.75)));
    assert_eq!(Alu::binary(BinaryOp::Mul, fp32(-2.0), fp32(0.5)), Ok(fp32(-1.0)));
    let halves = reg(0x4000_3c00, RegType::Fp16x2); // [1.0, 2.0]
    assert_eq!(
        Alu::binary(BinaryOp::Sub, halves, halves),
        Ok(reg(0, RegType::Fp16x2))
    );
}

#[rstest]
#[case::int8x4_wraps(reg(0x0001_ff80, RegType::Int8x4), reg(0x00ff_0180, RegType::Int8x4))]
#[case::int32_min(TypedReg::int(0x8000_0000), TypedReg::int(0x8000_0000))]
#[case::fp32_sign_bit(fp32(1.0), fp32(-1.0))]
#[case::fp16x2_sign_bits(reg(0x4000_3c00, RegType::Fp16x2), reg(0xc000_bc00, RegType::Fp16x2))]
fn test_neg(#[case] input: TypedReg, #[case] expected: TypedReg) {
    assert_eq!(Alu::unary(UnaryOp::Neg, input), Ok(expected));
}

#[test]
fn test_sign_extension_ops() {
    assert_eq!(Alu::unary(UnaryOp::Bsi, TypedReg::int(0x1234_0080)), Ok(TypedReg::int(0xffff_ff80)));
    assert_eq!(Alu::unary(UnaryOp::Wsi, TypedReg::int(0x0001_7fff)), Ok(TypedReg::int(0x7fff)));
    assert_eq!(Alu::unary(UnaryOp::Not, TypedReg::int(0)), Ok(TypedReg::int(u32::MAX)));
}

#[rstest]
#[case::rounds_half_up(2.5, 3)]
#[case::negative_truncates_toward_zero(-1.25, 0)]
#[case::below_half(1.4, 1)]
#[case::negative_whole_moves_up(-3.0, 0xffff_fffe)]
fn test_to_int_rounding(#[case] input: f32, #[case] expected: u32) {
    assert_eq!(Alu::unary(UnaryOp::ToInt, fp32(input)), Ok(TypedReg::int(expected)));
}

#[test]
fn test_conversions() {
    assert_eq!(Alu::unary(UnaryOp::ToFloat, TypedReg::int((-3i32) as u32)), Ok(fp32(-3.0)));
    // [1, -2] as int16x2 -> [1.0, -2.0] as fp16x2
    let lanes = reg(0xfffe_0001, RegType::Int16x2);
    assert_eq!(Alu::unary(UnaryOp::ToFloat, lanes), Ok(reg(0xc000_3c00, RegType::Fp16x2)));
    assert_eq!(Alu::unary(UnaryOp::ToFloat, reg(0, RegType::Int8x4)), Err(ExceptionCause::Type));
    assert_eq!(Alu::unary(UnaryOp::ToInt, TypedReg::int(1)), Err(ExceptionCause::Type));
}

#[test]
fn test_recip_and_rsqrt() {
    assert_eq!(Fpu::recip(fp32(4.0)), Ok(reg(0x3e80_0000, RegType::Fp32)));
    assert_eq!(Fpu::rsqrt(fp32(4.0)), Ok(reg(0x3f00_0000, RegType::Fp32)));
    assert_eq!(Alu::unary(UnaryOp::Recip, TypedReg::int(4)), Err(ExceptionCause::Type));
}

#[rstest]
#[case::scalar_unchanged(TypedReg::int(7), TypedReg::int(7))]
#[case::int8x4(reg(0x0102_0304, RegType::Int8x4), TypedReg::int(10))]
#[case::sint8x4s_signed(reg(0xffff_ffff, RegType::Sint8x4s), TypedReg::int(0xffff_fffc))]
#[case::uint16x2s(reg(0xffff_ffff, RegType::Uint16x2s), TypedReg::int(0x0001_fffe))]
#[case::fp16x2_to_fp32(reg(0x4000_3c00, RegType::Fp16x2), fp32(3.0))]
fn test_sum(#[case] input: TypedReg, #[case] expected: TypedReg) {
    assert_eq!(arithmetic::sum(input), Ok(expected));
}

#[test]
fn test_full_mul_saturates_after_shift() {
    let a = reg(0x4000, RegType::Sint16x2s);
    assert_eq!(arithmetic::full_mul(a, a, 0, true), Ok(reg(0x7fff, RegType::Sint16x2s)));
    assert_eq!(arithmetic::full_mul(a, a, 14, true), Ok(reg(0x4000, RegType::Sint16x2s)));
}

#[test]
fn test_full_mul_ignores_shift_on_floats() {
    assert_eq!(arithmetic::full_mul(fp32(3.0), fp32(0.5), 7, true), Ok(fp32(1.5)));
}

#[test]
fn test_float_compare() {
    let l = 1.0f32.to_bits();
    let r = (-1.0f32).to_bits();
    assert_eq!(compare::condition(RegType::Fp32, r, l, Cond::Lt, false, false), Ok(true));
    // The same bits compared as unsigned integers order the other way.
    assert_eq!(compare::condition(RegType::Int32, r, l, Cond::Lt, false, false), Ok(false));
}

#[test]
fn test_fp16_conversion_edges() {
    assert_eq!(fp16::from_f32(1.0), 0x3c00);
    assert_eq!(fp16::from_f32(65504.0), 0x7bff);
    assert_eq!(fp16::from_f32(70000.0), 0x7c00);
    assert!((fp16::to_f32(0xc000) + 2.0).abs() < f32::EPSILON);
}

proptest! {
    #[test]
    fn test_int32_add_matches_wrapping_add(a: u32, b: u32) {
        let result = Alu::binary(BinaryOp::Add, TypedReg::int(a), TypedReg::int(b));
        prop_assert_eq!(result, Ok(TypedReg::int(a.wrapping_add(b))));
    }

    #[test]
    fn test_uint8x4s_add_never_wraps(a: u32, b: u32) {
        let result = Alu::binary(BinaryOp::Add, reg(a, RegType::Uint8x4s), reg(b, RegType::Uint8x4s));
        let value = result.map(|r| r.value).unwrap_or_default();
        for i in 0..4 {
            let lane = |v: u32| (v >> (8 * i)) & 0xff;
            prop_assert_eq!(lane(value), (lane(a) + lane(b)).min(0xff));
        }
    }

    #[test]
    fn test_fp16_round_trips_exact_halves(half in 0u16..0x7c00) {
        prop_assert_eq!(fp16::from_f32(fp16::to_f32(half)), half);
    }
}
