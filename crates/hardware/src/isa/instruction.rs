//! Instruction encoding and the decoded instruction model.
//!
//! Provides nibble extraction for the 16-bit base word, the instruction length rule,
//! the branch-offset munging helpers and the structured `Instruction` value that the
//! decoder produces and both the executor and the formatter consume.
//!
//! Field positions within the base word:
//!
//! ```text
//!  15    12 11     8 7      4 3      0
//! +--------+--------+--------+--------+
//! |   C    |   B    |   A    |   D    |
//! +--------+--------+--------+--------+
//! ```

use crate::common::constants::{
    INSTRUCTION_SIZE_16, INSTRUCTION_SIZE_32, INSTRUCTION_SIZE_48, REG_SENTINEL,
};
use crate::common::data::AccessWidth;
use crate::common::error::ExceptionCause;
use crate::common::reg::RegType;

/// Value of the top five bits that marks the long memory group.
const TOP5_LONG_GROUP: u16 = 0b1_1111;

/// Trait for extracting nibble fields from a 16-bit instruction word.
pub trait InstructionBits {
    /// Extracts field D (bits 0-3).
    fn field_d(&self) -> usize;

    /// Extracts field A (bits 4-7).
    fn field_a(&self) -> usize;

    /// Extracts field B (bits 8-11).
    fn field_b(&self) -> usize;

    /// Extracts field C (bits 12-15).
    fn field_c(&self) -> usize;

    /// Extracts the top five bits (bits 11-15).
    fn top5(&self) -> u16;

    /// Returns the total encoded length in bytes (2, 4 or 6).
    fn insn_len(&self) -> u32;
}

impl InstructionBits for u16 {
    #[inline(always)]
    fn field_d(&self) -> usize {
        usize::from(self & 0xf)
    }

    #[inline(always)]
    fn field_a(&self) -> usize {
        usize::from((self >> 4) & 0xf)
    }

    #[inline(always)]
    fn field_b(&self) -> usize {
        usize::from((self >> 8) & 0xf)
    }

    #[inline(always)]
    fn field_c(&self) -> usize {
        usize::from((self >> 12) & 0xf)
    }

    #[inline(always)]
    fn top5(&self) -> u16 {
        self >> 11
    }

    /// Computes the encoded length.
    ///
    /// A word without any `0xF` in fields A, B or D, and outside the long memory
    /// group, has no extension word. Otherwise the extension word is 32 bits wide
    /// when A is `0xF` (and, outside the long group, D is not `0xF`), else 16 bits.
    fn insn_len(&self) -> u32 {
        let a = self.field_a();
        let b = self.field_b();
        let d = self.field_d();
        let long_group = self.top5() == TOP5_LONG_GROUP;

        if a != REG_SENTINEL && b != REG_SENTINEL && d != REG_SENTINEL && !long_group {
            return INSTRUCTION_SIZE_16;
        }
        let wide = if long_group {
            a == REG_SENTINEL
        } else {
            a == REG_SENTINEL && d != REG_SENTINEL
        };
        if wide {
            INSTRUCTION_SIZE_48
        } else {
            INSTRUCTION_SIZE_32
        }
    }
}

/// Recovers a byte offset from a munged 16-bit branch field.
///
/// The field is sign-extended and shifted left by one, so only even offsets in
/// `-65536..=65534` are representable.
pub const fn unmunge(field: u16) -> i32 {
    ((field as i32) << 16) >> 15
}

/// Encodes a byte offset into a 16-bit branch field.
///
/// Odd offsets are truncated toward negative infinity (`3` encodes as `1`,
/// `-3` as `0xFFFE`).
pub const fn munge(offset: i32) -> u16 {
    (offset >> 1) as u16
}

/// Reads the low `bits` of `data` as a ones'-complement number.
///
/// # Arguments
///
/// * `data` - Raw field contents.
/// * `bits` - Field width in bits (1-31).
///
/// # Returns
///
/// `data` if its top bit is clear, otherwise `-(!data & mask)`.
pub const fn ones_complement(data: u32, bits: u32) -> i32 {
    let mask = (1u32 << bits) - 1;
    let data = data & mask;
    if (data >> (bits - 1)) & 1 == 0 {
        data as i32
    } else {
        -((!data & mask) as i32)
    }
}

/// Sign-extends a 16-bit extension word to 32 bits.
pub const fn sext16(ext: u32) -> u32 {
    ext as u16 as i16 as i32 as u32
}

/// Which program counter a control transfer or read refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PcTarget {
    /// `$pc`: the program counter of the current mode.
    Active,
    /// `$tpc`: the task-mode program counter.
    Task,
}

impl PcTarget {
    /// Returns the assembler name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Active => "$pc",
            Self::Task => "$tpc",
        }
    }
}

/// Comparison condition used by branches and lane compares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cond {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `>`
    Gt,
    /// `<=`
    Le,
}

impl Cond {
    /// Condition selected by a zero-compare code (0-5).
    pub const fn from_zero_code(code: usize) -> Option<Self> {
        match code {
            0 => Some(Self::Eq),
            1 => Some(Self::Ne),
            2 => Some(Self::Lt),
            3 => Some(Self::Ge),
            4 => Some(Self::Gt),
            5 => Some(Self::Le),
            _ => None,
        }
    }

    /// Condition and signedness selected by a register-compare code (1-6).
    pub const fn from_reg_code(code: usize) -> Option<(Self, bool)> {
        match code {
            1 => Some((Self::Eq, false)),
            2 => Some((Self::Ne, false)),
            3 => Some((Self::Lt, true)),
            4 => Some((Self::Ge, true)),
            5 => Some((Self::Lt, false)),
            6 => Some((Self::Ge, false)),
            _ => None,
        }
    }

    /// Returns the operator text.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Le => "<=",
        }
    }

    /// Evaluates the condition on two ordered values.
    pub fn holds<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Lt => lhs < rhs,
            Self::Ge => lhs >= rhs,
            Self::Gt => lhs > rhs,
            Self::Le => lhs <= rhs,
        }
    }
}

/// Single-operand ALU operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// Lane-wise negation.
    Neg,
    /// Bitwise complement.
    Not,
    /// Sign-extend the low byte.
    Bsi,
    /// Sign-extend the low halfword.
    Wsi,
    /// Integer to float conversion.
    ToFloat,
    /// Float to integer conversion, rounded.
    ToInt,
    /// Reciprocal.
    Recip,
    /// Reciprocal square root.
    Rsqrt,
    /// Horizontal lane sum.
    Sum,
}

/// Two-operand ALU operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// `^`
    Xor,
    /// `|`
    Or,
    /// `&`
    And,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `<<`
    Lsh,
    /// `>>` (logical)
    Rsh,
    /// `>>>` (arithmetic)
    Srsh,
    /// `*`
    Mul,
}

impl BinaryOp {
    /// Operation selected by field C (1-9).
    pub const fn from_field(c: usize) -> Option<Self> {
        Some(match c {
            1 => Self::Xor,
            2 => Self::Or,
            3 => Self::And,
            4 => Self::Add,
            5 => Self::Sub,
            6 => Self::Lsh,
            7 => Self::Rsh,
            8 => Self::Srsh,
            9 => Self::Mul,
            _ => return None,
        })
    }

    /// Returns the operator text.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Xor => "^",
            Self::Or => "|",
            Self::And => "&",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Lsh => "<<",
            Self::Rsh => ">>",
            Self::Srsh => ">>>",
            Self::Mul => "*",
        }
    }

    /// Returns the instruction class of the operation.
    pub const fn class(self) -> InsnClass {
        match self {
            Self::Xor | Self::Or | Self::And => InsnClass::Logic,
            Self::Add | Self::Sub => InsnClass::Arith,
            Self::Lsh | Self::Rsh | Self::Srsh => InsnClass::Shift,
            Self::Mul => InsnClass::Mul,
        }
    }
}

/// First operand of a binary ALU instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// A register operand.
    Reg(usize),
    /// An immediate from the extension word, typed like the other operand.
    Imm {
        /// The operand value (already sign-extended for the short form).
        value: u32,
        /// `true` for the 16-bit form.
        short: bool,
    },
}

/// Memory operation performed by a load/store instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemOp {
    /// Load into a register.
    Load {
        /// Access width.
        width: AccessWidth,
        /// Sign-extend the loaded value.
        signed: bool,
    },
    /// Load-linked 32-bit load.
    LoadLinked,
    /// Store from a register.
    Store {
        /// Access width.
        width: AccessWidth,
    },
    /// Store-conditional 32-bit store.
    StoreConditional,
}

impl MemOp {
    /// Operation selected by the 3-bit load/store code shared by both memory groups.
    pub const fn from_code(code: usize) -> Option<Self> {
        Some(match code {
            0 => Self::Load { width: AccessWidth::Byte, signed: false },
            1 => Self::Load { width: AccessWidth::Half, signed: false },
            2 => Self::Load { width: AccessWidth::Word, signed: false },
            3 => Self::Load { width: AccessWidth::Byte, signed: true },
            4 => Self::Load { width: AccessWidth::Half, signed: true },
            5 => Self::Store { width: AccessWidth::Byte },
            6 => Self::Store { width: AccessWidth::Half },
            7 => Self::Store { width: AccessWidth::Word },
            8 => Self::LoadLinked,
            9 => Self::StoreConditional,
            _ => return None,
        })
    }

    /// Returns the access width.
    pub const fn width(self) -> AccessWidth {
        match self {
            Self::Load { width, .. } | Self::Store { width } => width,
            Self::LoadLinked | Self::StoreConditional => AccessWidth::Word,
        }
    }

    /// Returns `true` for the store forms.
    pub const fn is_store(self) -> bool {
        matches!(self, Self::Store { .. } | Self::StoreConditional)
    }

    /// Returns the memory-reference prefix used in assembly text.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Load { width: AccessWidth::Byte, signed: true } => "smem8",
            Self::Load { width: AccessWidth::Half, signed: true } => "smem16",
            Self::Load { width: AccessWidth::Byte, .. } | Self::Store { width: AccessWidth::Byte } => "mem8",
            Self::Load { width: AccessWidth::Half, .. } | Self::Store { width: AccessWidth::Half } => "mem16",
            Self::Load { .. } | Self::Store { .. } => "mem32",
            Self::LoadLinked => "memll32",
            Self::StoreConditional => "memsr32",
        }
    }
}

/// Address operand of a memory instruction.
///
/// At least one of `base` and `offset` is present for every well-formed encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemRef {
    /// Base register, if any.
    pub base: Option<usize>,
    /// Displacement or absolute address, if any.
    pub offset: Option<u32>,
    /// Displacement came from the compact frame-relative encoding.
    pub tiny: bool,
}

impl MemRef {
    /// A register-only reference.
    pub const fn base(reg: usize) -> Self {
        Self { base: Some(reg), offset: None, tiny: false }
    }

    /// A register plus displacement reference.
    pub const fn based(reg: usize, offset: u32) -> Self {
        Self { base: Some(reg), offset: Some(offset), tiny: false }
    }

    /// An absolute-address reference.
    pub const fn absolute(addr: u32) -> Self {
        Self { base: None, offset: Some(addr), tiny: false }
    }
}

/// Instruction classification used for tracing and profiling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InsnClass {
    /// Undefined encoding.
    #[default]
    Unknown,
    /// Software interrupts and syscalls.
    Exception,
    /// Fences, load-linked/store-conditional and cache invalidation.
    Atomic,
    /// Register/PC moves.
    Mov,
    /// Immediate loads.
    Imm,
    /// Bit manipulation.
    Bit,
    /// Logic operations.
    Logic,
    /// Arithmetic.
    Arith,
    /// Shifts.
    Shift,
    /// Multiplication.
    Mul,
    /// Floating point.
    Fp,
    /// Loads.
    Load,
    /// Stores.
    Store,
    /// Unconditional branches.
    Branch,
    /// Register-register conditional branches.
    CondBranch,
    /// Compare-with-zero conditional branches.
    CondBranchZero,
    /// Bit-test conditional branches.
    CondBranchBit,
    /// Type manipulation.
    Type,
    /// Vector-specific operations.
    Vector,
    /// Link-register setup.
    Link,
    /// Power management.
    Power,
    /// No operation.
    Nop,
}

impl InsnClass {
    /// Returns the display name used in traces and profiles.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Exception => "exception/syscall",
            Self::Atomic => "atomic",
            Self::Mov => "move",
            Self::Imm => "load immediate",
            Self::Bit => "bit manipulation",
            Self::Logic => "logic",
            Self::Arith => "arithmetic",
            Self::Shift => "shift",
            Self::Mul => "multiply",
            Self::Fp => "floating point",
            Self::Load => "load",
            Self::Store => "store",
            Self::Branch => "unconditional branch",
            Self::CondBranch => "conditional branch",
            Self::CondBranchZero => "conditional branch with 0",
            Self::CondBranchBit => "bit-test conditional branch",
            Self::Type => "type manipulation",
            Self::Vector => "vector specific",
            Self::Link => "link setup",
            Self::Power => "power management",
            Self::Nop => "nop",
        }
    }
}

/// A decoded brew instruction.
///
/// Produced by [`crate::isa::decode::decode`]; consumed by the executor to compute
/// effects and by the formatter to render assembly text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Undefined encoding; raises `UnknownInst`.
    Unknown,
    /// Software interrupt: `fill`, `break`, `syscall`, `swi n` or `sii`.
    SoftwareInterrupt(ExceptionCause),
    /// `stm`: enter task mode.
    SetTaskMode,
    /// `woi`: wait for interrupt.
    WaitForInterrupt,
    /// `fence`; bits of `flags` clear for each ordered access kind.
    Fence {
        /// Raw field D.
        flags: u8,
    },
    /// `$pc <- $rD` / `$tpc <- $rD`.
    JumpReg {
        /// Program counter written.
        target: PcTarget,
        /// Source register.
        rd: usize,
    },
    /// `$pc <- imm` / `$tpc <- imm`.
    JumpImm {
        /// Program counter written.
        target: PcTarget,
        /// Target address.
        addr: u32,
        /// `true` for the 16-bit form.
        short: bool,
    },
    /// `$rD <- $pc` / `$rD <- $tpc`.
    ReadPc {
        /// Destination register.
        rd: usize,
        /// Program counter read.
        source: PcTarget,
    },
    /// `$rD <- imm`; keeps the type of `$rD`.
    LoadImm {
        /// Destination register.
        rd: usize,
        /// Immediate value.
        value: u32,
        /// `true` for the 16-bit form.
        short: bool,
    },
    /// `$rD <- tiny imm`; keeps the type of `$rD`.
    TinyImm {
        /// Destination register.
        rd: usize,
        /// Ones'-complement immediate.
        value: i32,
    },
    /// `$rD <- $pc + offset`.
    Link {
        /// Destination register.
        rd: usize,
        /// Byte offset.
        offset: u32,
    },
    /// `$rD <- op $rA`.
    Unary {
        /// Operation.
        op: UnaryOp,
        /// Destination register.
        rd: usize,
        /// Source register.
        ra: usize,
    },
    /// `type $rD <- $rA`: retype from a register's value.
    SetTypeReg {
        /// Register retyped.
        rd: usize,
        /// Register holding the type code.
        ra: usize,
    },
    /// `$rD <- type $rA`.
    GetType {
        /// Destination register.
        rd: usize,
        /// Register whose type is read.
        ra: usize,
    },
    /// `type $rD <- code`.
    SetTypeImm {
        /// Register retyped.
        rd: usize,
        /// New type.
        ty: RegType,
    },
    /// `$rD <- lhs op $rX`.
    Binary {
        /// Operation.
        op: BinaryOp,
        /// Destination register.
        rd: usize,
        /// First operand.
        lhs: Operand,
        /// Second operand register.
        rhs: usize,
    },
    /// `$rD <- ~$rA & $rB`.
    AndNot {
        /// Destination register.
        rd: usize,
        /// Complemented operand.
        ra: usize,
        /// Second operand.
        rb: usize,
    },
    /// `$rD <- tiny $rB + imm`.
    TinyAdd {
        /// Destination register.
        rd: usize,
        /// Source register.
        rb: usize,
        /// Ones'-complement immediate.
        value: i32,
    },
    /// `type $rN..$rM <- nibbles`.
    LoadTypes {
        /// First register of the half (0 or 8).
        first: usize,
        /// Packed type codes, nibble `i` for register `first + i`.
        types: u32,
    },
    /// `$rD <- lane_swizzle $rA pattern`.
    Swizzle {
        /// Destination register.
        rd: usize,
        /// Source register.
        ra: usize,
        /// Lane selector, two bits per destination lane.
        pattern: u8,
    },
    /// Load or store between `$reg` and memory.
    Memory {
        /// Operation.
        op: MemOp,
        /// Data register.
        reg: usize,
        /// Address operand.
        mem: MemRef,
    },
    /// `inv32[ref]`: cache invalidate.
    Invalidate {
        /// Address operand.
        mem: MemRef,
    },
    /// `$pc <- mem32[ref]` / `$tpc <- mem32[ref]`.
    JumpMem {
        /// Program counter written.
        target: PcTarget,
        /// Address operand.
        mem: MemRef,
    },
    /// `type $rN..$rM <- mem32[ref]`.
    LoadTypesMem {
        /// First register of the half (0 or 8).
        first: usize,
        /// Address operand.
        mem: MemRef,
    },
    /// `mem32[ref] <- type $rN..$rM`.
    StoreTypesMem {
        /// First register of the half (0 or 8).
        first: usize,
        /// Address operand.
        mem: MemRef,
    },
    /// `if left cond right $pc <- $pc + offset`.
    Branch {
        /// Condition.
        cond: Cond,
        /// Compare lanes as signed values.
        signed: bool,
        /// Require the condition on every lane.
        all_lanes: bool,
        /// Left register.
        left: usize,
        /// Right register; `None` compares against zero.
        right: Option<usize>,
        /// Register whose type selects the lane layout.
        typed_by: usize,
        /// Byte offset from the branch.
        offset: i32,
    },
    /// `if $rX[bit] == v $pc <- $pc + offset`.
    BitBranch {
        /// Tested register.
        reg: usize,
        /// Bit index.
        bit: u32,
        /// Branch when the bit is set (`true`) or clear (`false`).
        set: bool,
        /// Byte offset from the branch.
        offset: i32,
    },
    /// `$rD <- full $rA * $rB >> shift`.
    FullMul {
        /// Destination register.
        rd: usize,
        /// First source.
        ra: usize,
        /// Second source.
        rb: usize,
        /// Right shift applied to the double-width product.
        shift: u32,
        /// Arithmetic (`>>>`) rather than logical shift.
        signed: bool,
    },
    /// `$rD <- left cond right` lane mask.
    LaneCompare {
        /// Destination register.
        rd: usize,
        /// Condition.
        cond: Cond,
        /// Compare lanes as signed values.
        signed: bool,
        /// Left register.
        left: usize,
        /// Right register; `None` compares against zero.
        right: Option<usize>,
        /// Register whose type selects the lane layout.
        typed_by: usize,
    },
    /// `$rD <- interpolate $rA $rB`.
    Interpolate {
        /// Destination register.
        rd: usize,
        /// First source.
        ra: usize,
        /// Second source.
        rb: usize,
    },
    /// `$rD <- csr[addr]`.
    CsrRead {
        /// Destination register.
        rd: usize,
        /// CSR address.
        addr: u32,
    },
    /// `csr[addr] <- $rD`.
    CsrWrite {
        /// Source register.
        rd: usize,
        /// CSR address.
        addr: u32,
    },
}

impl Instruction {
    /// Returns the profiling class of the instruction.
    pub const fn class(&self) -> InsnClass {
        match self {
            Self::Unknown => InsnClass::Unknown,
            Self::SoftwareInterrupt(_) => InsnClass::Exception,
            Self::SetTaskMode | Self::JumpImm { .. } | Self::JumpMem { .. } => InsnClass::Branch,
            Self::JumpReg { target: PcTarget::Active, .. } => InsnClass::Branch,
            Self::WaitForInterrupt => InsnClass::Power,
            Self::Fence { .. } | Self::Invalidate { .. } => InsnClass::Atomic,
            Self::JumpReg { .. } | Self::ReadPc { .. } | Self::CsrRead { .. } | Self::CsrWrite { .. } => {
                InsnClass::Mov
            }
            Self::LoadImm { .. } => InsnClass::Imm,
            Self::TinyImm { .. } | Self::TinyAdd { .. } => InsnClass::Arith,
            Self::Link { .. } => InsnClass::Link,
            Self::Unary { op, .. } => match op {
                UnaryOp::Neg | UnaryOp::Sum => InsnClass::Arith,
                UnaryOp::Not | UnaryOp::Bsi | UnaryOp::Wsi => InsnClass::Bit,
                UnaryOp::ToFloat | UnaryOp::ToInt | UnaryOp::Recip | UnaryOp::Rsqrt => InsnClass::Fp,
            },
            Self::SetTypeReg { .. }
            | Self::GetType { .. }
            | Self::SetTypeImm { .. }
            | Self::LoadTypes { .. }
            | Self::LoadTypesMem { .. }
            | Self::StoreTypesMem { .. } => InsnClass::Type,
            Self::Binary { op, .. } => op.class(),
            Self::AndNot { .. } => InsnClass::Bit,
            Self::Swizzle { .. } | Self::LaneCompare { .. } | Self::Interpolate { .. } => InsnClass::Vector,
            Self::Memory { op, .. } => match op {
                MemOp::LoadLinked | MemOp::StoreConditional => InsnClass::Atomic,
                MemOp::Load { .. } => InsnClass::Load,
                MemOp::Store { .. } => InsnClass::Store,
            },
            Self::Branch { right: None, .. } => InsnClass::CondBranchZero,
            Self::Branch { .. } => InsnClass::CondBranch,
            Self::BitBranch { .. } => InsnClass::CondBranchBit,
            Self::FullMul { .. } => InsnClass::Mul,
        }
    }
}

/// An instruction together with its encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoded {
    /// The 16-bit base word.
    pub word: u16,
    /// Raw extension word (16 or 32 bits, zero when absent).
    pub ext: u32,
    /// Encoded length in bytes.
    pub len: u32,
    /// The decoded instruction.
    pub insn: Instruction,
}
