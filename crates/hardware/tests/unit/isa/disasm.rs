//! Disassembler Output.
//!
//! The trace and the `disasm` command print these strings verbatim, so they are
//! compared exactly.

use brewsim_core::isa::decode::decode;
use brewsim_core::isa::disasm::{Formatter, disassemble};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
// Exception group and mode control
#[case(0x0000, 0, "fill")]
#[case(0x0001, 0, "break")]
#[case(0x0002, 0, "syscall")]
#[case(0x0005, 0, "swi 5")]
#[case(0x0007, 0, "sii")]
#[case(0x0008, 0, "stm")]
#[case(0x0009, 0, "woi")]
#[case(0x0010, 0, "fence rw, rw")]
#[case(0x0015, 0, "fence w, w")]
// PC moves and immediates
#[case(0x0024, 0, "$pc <- $r4")]
#[case(0x0034, 0, "$tpc <- $r4")]
#[case(0x0044, 0, "$r4 <- $pc")]
#[case(0x00f3, 0x10, "$r3 <- 16 (0x10)")]
#[case(0x0f03, 0xfffe, "$r3 <- short 4294967294 (0xfffffffe)")]
#[case(0x0ef2, 0x1000, "$pc <- 4096 (0x1000)")]
#[case(0x0137, 0, "$r7 <- tiny 3")]
#[case(0x0237, 0, "$r7 <- $pc + 6 (0x6)")]
// Unary and type management
#[case(0x0354, 0, "$r4 <- -$r5")]
#[case(0x0454, 0, "$r4 <- ~$r5")]
#[case(0x0b54, 0, "$r4 <- sum $r5")]
#[case(0x0e11, 0, "type $r1 <- fp32")]
#[case(0x0c21, 0, "type $r1 <- $r2")]
#[case(0x0d12, 0, "$r2 <- type $r1")]
#[case(
    0xa0f0,
    0x10,
    "type $r0...$r7 <- int32, fp32, int32, int32, int32, int32, int32, int32"
)]
// Binary ALU
#[case(0x4654, 0, "$r4 <- $r5 + $r6")]
#[case(0x4f54, 0x8000, "$r4 <- short -32768 (0xffff8000) + $r5")]
#[case(0x45f4, 0x10, "$r4 <- 16 (0x10) + $r5")]
#[case(0xa654, 0, "$r4 <- ~$r5 & $r6")]
#[case(0xb934, 0, "$r4 <- tiny $r9 + 3")]
// Memory
#[case(0xe2a4, 0, "$r4 <- mem32[$r10]")]
#[case(0xe7a4, 0, "mem32[$r10] <- $r4")]
#[case(0xfa54, 0xfffc, "$r4 <- mem32[$r5 - 4 (0x4)]")]
#[case(0xfaf4, 0x1000, "$r4 <- mem32[4096 (0x1000)]")]
#[case(0xd134, 0, "$r4 <- mem32[$sp + tiny 36 (0x24)]")]
#[case(0xea52, 0, "$pc <- mem32[$r5]")]
#[case(0xeb3c, 0, "type $r0...$r7 <- mem32[$fp + 12 (0xc)]")]
#[case(0xed3c, 0, "mem32[$fp + 12 (0xc)] <- type $r0...$r7")]
// Branches
#[case(0x121f, 4, "if $r2 == $r1 $pc <- $pc + 8 (0x8)")]
#[case(0x321f, 0xfffe, "if signed $r2 < $r1 $pc <- $pc - 4 (0x4)")]
#[case(0x521f, 4, "if $r2 < $r1 $pc <- $pc + 8 (0x8)")]
#[case(0x921f, 4, "if all $r2 == $r1 $pc <- $pc + 8 (0x8)")]
#[case(0x003f, 0xfffe, "if $r3 == 0 $pc <- $pc - 4 (0x4)")]
#[case(0xdf3f, 2, "if $r3[30] == 1 $pc <- $pc + 4 (0x4)")]
#[case(0x13ff, 2, "if $r3[1] == 0 $pc <- $pc + 4 (0x4)")]
// Extended group
#[case(0xf05f, 0x0321, "$r1 <- full $r2 * $r3 >>> 5")]
#[case(0xf05f, 0x1321, "$r1 <- full $r2 * $r3 >> 5")]
#[case(0xff0f, 0x0254, "$r4 <- $r5 < 0")]
#[case(0xf0f4, 2, "$r4 <- csr[2 (0x2)]")]
#[case(0xf1f4, 0x80, "csr[128 (0x80)] <- $r4")]
// Undefined
#[case(0x000a, 0, "unknown instruction 0x000a")]
fn test_disassembly(#[case] word: u16, #[case] ext: u32, #[case] text: &str) {
    assert_eq!(disassemble(word, ext).unwrap(), text);
}

proptest! {
    #[test]
    fn every_encoding_renders(word in any::<u16>(), ext in any::<u32>()) {
        let text = Formatter.format(&decode(word, ext));
        prop_assert!(text.is_ok());
        prop_assert!(!text.unwrap().is_empty());
    }
}
