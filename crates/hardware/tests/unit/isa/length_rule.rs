//! Instruction Length Rule.
//!
//! The length of a brew instruction depends only on its base word: 2 bytes when
//! no field among A, B and D is `0xF` (outside the long memory group), otherwise 4
//! or 6 depending on where the `0xF` sits.

use brewsim_core::isa::decode::decode;
use brewsim_core::isa::instruction::InstructionBits;
use proptest::prelude::*;
use rstest::rstest;

use crate::common::builder::instruction::word;

fn expected_len(w: u16) -> u32 {
    let long = w >> 11 == 0b1_1111;
    let (a, b, d) = (w.field_a(), w.field_b(), w.field_d());
    if !long && a != 0xf && b != 0xf && d != 0xf {
        return 2;
    }
    let wide = if long { a == 0xf } else { a == 0xf && d != 0xf };
    if wide { 6 } else { 4 }
}

proptest! {
    #[test]
    fn words_without_escape_nibbles_are_two_bytes(
        c in 0u16..16,
        b in 0u16..15,
        a in 0u16..15,
        d in 0u16..15,
    ) {
        let w = word(c, b, a, d);
        prop_assume!(w >> 11 != 0b1_1111);
        prop_assert_eq!(w.insn_len(), 2);
    }

    #[test]
    fn decoded_length_follows_the_base_word(w in any::<u16>(), ext in any::<u32>()) {
        prop_assert_eq!(decode(w, ext).len, w.insn_len());
    }
}

#[test]
fn test_length_rule_exhaustive() {
    for w in 0..=u16::MAX {
        assert_eq!(w.insn_len(), expected_len(w), "word {w:#06x}");
    }
}

#[rstest]
#[case::add(0x4654, 2)]
#[case::short_immediate(0x4f54, 4)]
#[case::long_immediate(0x45f4, 6)]
#[case::load_imm32(0x00f3, 6)]
#[case::branch(0x121f, 4)]
#[case::long_group_displacement(0xfa54, 4)]
#[case::long_group_absolute(0xfaf4, 6)]
#[case::long_group_no_escape(0xf854, 4)]
#[case::a_and_d_escaped(0x0fff, 4)]
fn test_length_examples(#[case] w: u16, #[case] len: u32) {
    assert_eq!(w.insn_len(), len);
}

#[test]
fn test_field_extraction() {
    let w: u16 = 0x1234;
    assert_eq!(w.field_c(), 1);
    assert_eq!(w.field_b(), 2);
    assert_eq!(w.field_a(), 3);
    assert_eq!(w.field_d(), 4);
    assert_eq!(w.top5(), 0x1234 >> 11);
}
