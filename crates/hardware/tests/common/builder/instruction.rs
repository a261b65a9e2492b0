//! brew instruction encoders.
//!
//! Each encoder returns the 16-bit base word; [`Program`] appends base words and
//! their extension words as little-endian halfwords, the layout the fetch path reads.

use brewsim_core::isa::instruction::munge;

// ─── Opcode fields ──────────────────────────────────────────────────────────

/// Field C of the binary ALU operations.
pub mod alu_op {
    pub const XOR: u16 = 1;
    pub const OR: u16 = 2;
    pub const AND: u16 = 3;
    pub const ADD: u16 = 4;
    pub const SUB: u16 = 5;
    pub const LSH: u16 = 6;
    pub const RSH: u16 = 7;
    pub const SRSH: u16 = 8;
    pub const MUL: u16 = 9;
}

/// Field B of the unary group.
pub mod unary_op {
    pub const TINY: u16 = 1;
    pub const LINK: u16 = 2;
    pub const NEG: u16 = 3;
    pub const NOT: u16 = 4;
    pub const FLOAT: u16 = 7;
    pub const INT: u16 = 8;
    pub const SUM: u16 = 0xb;
    pub const SET_TYPE_REG: u16 = 0xc;
    pub const GET_TYPE: u16 = 0xd;
    pub const SET_TYPE_IMM: u16 = 0xe;
}

/// Load/store codes shared by both memory groups.
pub mod mem_op {
    pub const LD8: u16 = 0;
    pub const LD16: u16 = 1;
    pub const LD32: u16 = 2;
    pub const SLD8: u16 = 3;
    pub const SLD16: u16 = 4;
    pub const ST8: u16 = 5;
    pub const ST16: u16 = 6;
    pub const ST32: u16 = 7;
}

/// Field C of the register-compare branches.
pub mod cond {
    pub const EQ: u16 = 1;
    pub const NE: u16 = 2;
    pub const SLT: u16 = 3;
    pub const SGE: u16 = 4;
    pub const LT: u16 = 5;
    pub const GE: u16 = 6;
    /// Added to a condition for all-lanes semantics.
    pub const ALL: u16 = 8;
}

pub const FILL: u16 = 0x0000;
pub const BREAK: u16 = 0x0001;
pub const SYSCALL: u16 = 0x0002;
pub const SII: u16 = 0x0007;
pub const STM: u16 = 0x0008;
pub const WOI: u16 = 0x0009;

// ─── Encoders ───────────────────────────────────────────────────────────────

/// Packs the four nibble fields in C, B, A, D order.
pub const fn word(c: u16, b: u16, a: u16, d: u16) -> u16 {
    (c & 0xf) << 12 | (b & 0xf) << 8 | (a & 0xf) << 4 | (d & 0xf)
}

/// `$rD <- $rA op $rB`.
pub const fn alu(op: u16, rd: u16, ra: u16, rb: u16) -> u16 {
    word(op, rb, ra, rd)
}

/// Unary group member `op` (`$rD <- op $rA`).
pub const fn unary(op: u16, rd: u16, ra: u16) -> u16 {
    word(0, op, ra, rd)
}

/// `$rD <- ext32`.
pub const fn load_imm32(rd: u16) -> u16 {
    word(0, 0, 0xf, rd)
}

/// `$rD <- sext16`.
pub const fn load_imm16(rd: u16) -> u16 {
    word(0, 0xf, 0, rd)
}

/// `$pc <- ext32`.
pub const fn jump_imm32() -> u16 {
    word(0, 0xe, 0xf, 2)
}

/// `$tpc <- $rD`.
pub const fn set_tpc(rd: u16) -> u16 {
    word(0, 0, 3, rd)
}

/// `type $rD <- ty`.
pub const fn set_type(rd: u16, ty: u16) -> u16 {
    unary(unary_op::SET_TYPE_IMM, rd, ty)
}

/// Short memory group: `op` on `mem[$rA]` with `$rD`.
pub const fn mem(op: u16, rd: u16, ra: u16) -> u16 {
    word(0xe, op, ra, rd)
}

/// Long memory group: `op` on `mem[$rA + sext16]` with `$rD`.
pub const fn mem_disp(op: u16, rd: u16, ra: u16) -> u16 {
    word(0xf, 8 | op, ra, rd)
}

/// `if $rB cond $rA $pc <- $pc + offset`.
pub const fn branch(cond: u16, rb: u16, ra: u16) -> u16 {
    word(cond, rb, ra, 0xf)
}

/// `if $rA cond 0 $pc <- $pc + offset`, `code` selecting `==, !=, <, >=, >, <=`.
pub const fn branch_zero(code: u16, ra: u16) -> u16 {
    word(0, code, ra, 0xf)
}

/// `$rD <- csr[ext32]`.
pub const fn csr_read(rd: u16) -> u16 {
    word(0xf, 0, 0xf, rd)
}

/// `csr[ext32] <- $rD`.
pub const fn csr_write(rd: u16) -> u16 {
    word(0xf, 1, 0xf, rd)
}

// ─── Program images ─────────────────────────────────────────────────────────

/// Fluent builder for a flat program image.
#[derive(Clone, Debug, Default)]
pub struct Program {
    bytes: Vec<u8>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    fn half(mut self, half: u16) -> Self {
        self.bytes.extend_from_slice(&half.to_le_bytes());
        self
    }

    /// Appends a 2-byte instruction.
    pub fn op(self, word: u16) -> Self {
        self.half(word)
    }

    /// Appends a 4-byte instruction.
    pub fn op16(self, word: u16, ext: u16) -> Self {
        self.half(word).half(ext)
    }

    /// Appends a 6-byte instruction.
    pub fn op32(self, word: u16, ext: u32) -> Self {
        self.half(word).half(ext as u16).half((ext >> 16) as u16)
    }

    pub fn add(self, rd: u16, ra: u16, rb: u16) -> Self {
        self.op(alu(alu_op::ADD, rd, ra, rb))
    }

    pub fn load_imm(self, rd: u16, value: u32) -> Self {
        self.op32(load_imm32(rd), value)
    }

    /// `syscall` followed by the inline syscall number.
    pub fn syscall(self, number: u16) -> Self {
        self.op16(SYSCALL, number)
    }

    pub fn branch(self, cond: u16, rb: u16, ra: u16, offset: i32) -> Self {
        self.op16(branch(cond, rb, ra), munge(offset))
    }

    pub fn csr_read(self, rd: u16, addr: u32) -> Self {
        self.op32(csr_read(rd), addr)
    }

    pub fn csr_write(self, rd: u16, addr: u32) -> Self {
        self.op32(csr_write(rd), addr)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
