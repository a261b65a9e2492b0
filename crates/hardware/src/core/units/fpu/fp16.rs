//! IEEE 754 binary16 conversions.
//!
//! fp16x2 lanes are computed in single precision and rounded back to half
//! precision (round to nearest, ties to even).

/// 2^-24, the value of the smallest binary16 subnormal.
const HALF_SUBNORMAL_UNIT: f32 = 5.960_464_5e-8;

/// Widens a binary16 bit pattern to `f32`.
pub fn to_f32(half: u16) -> f32 {
    let sign = u32::from(half >> 15) << 31;
    let exp = u32::from((half >> 10) & 0x1f);
    let frac = u32::from(half & 0x3ff);
    match (exp, frac) {
        (0, 0) => f32::from_bits(sign),
        (0, _) => {
            let magnitude = frac as f32 * HALF_SUBNORMAL_UNIT;
            if sign == 0 { magnitude } else { -magnitude }
        }
        (0x1f, _) => f32::from_bits(sign | 0x7f80_0000 | (frac << 13)),
        _ => f32::from_bits(sign | ((exp + 112) << 23) | (frac << 13)),
    }
}

/// Rounds an `f32` to the nearest binary16 bit pattern.
pub fn from_f32(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32;
    let mant = bits & 0x7f_ffff;

    if exp == 0xff {
        let payload = if mant == 0 { 0 } else { 0x200 | (mant >> 13) as u16 };
        return sign | 0x7c00 | payload;
    }

    let half_exp = exp - 112;
    if half_exp >= 0x1f {
        return sign | 0x7c00;
    }
    if half_exp <= 0 {
        if half_exp < -10 {
            return sign;
        }
        let full = mant | 0x80_0000;
        let shift = (14 - half_exp) as u32;
        return sign | round_shift(full, shift) as u16;
    }

    let base = ((half_exp as u32) << 10) | (mant >> 13);
    let rem = mant & 0x1fff;
    let rounded = if rem > 0x1000 || (rem == 0x1000 && base & 1 == 1) {
        base + 1
    } else {
        base
    };
    sign | rounded as u16
}

/// Shifts `value` right by `shift` bits, rounding to nearest even.
const fn round_shift(value: u32, shift: u32) -> u32 {
    let kept = value >> shift;
    let rem = value & ((1 << shift) - 1);
    let half = 1 << (shift - 1);
    if rem > half || (rem == half && kept & 1 == 1) {
        kept + 1
    } else {
        kept
    }
}
