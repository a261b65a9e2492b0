//! brew Application Binary Interface (ABI) register roles.
//!
//! Defines the register indices the simulator core needs to know about
//! (argument passing, stack, link and syscall errno) and the assembler
//! names of all general-purpose registers.

/// Register $r4 (first argument/return value).
pub const REG_ARG0: usize = 4;
/// Register $r5 (second argument).
pub const REG_ARG1: usize = 5;
/// Register $r6 (third argument).
pub const REG_ARG2: usize = 6;
/// Register $r7 (fourth argument).
pub const REG_ARG3: usize = 7;
/// Register $r12 (frame pointer, $fp).
pub const REG_FP: usize = 12;
/// Register $r13 (stack pointer, $sp).
pub const REG_SP: usize = 13;
/// Register $r14 (link register, $lr).
pub const REG_LINK: usize = 14;
/// Register holding the guest address of `errno` on a syscall.
///
/// A failed syscall stores the host errno to `mem32[$r3]` unless `$r3` is zero.
pub const REG_SYSCALL_ERRNO: usize = 3;

/// Assembler names for $r0–$r14 plus the sentinel index.
const REG_NAMES: [&str; 16] = [
    "$r0", "$r1", "$r2", "$r3", "$r4", "$r5", "$r6", "$r7", "$r8", "$r9", "$r10", "$r11", "$fp",
    "$sp", "$lr", "<<<INVALID>>>",
];

/// Returns the assembler name for a register index.
#[inline]
pub fn reg_name(idx: usize) -> &'static str {
    REG_NAMES.get(idx).copied().unwrap_or("<<<INVALID>>>")
}
