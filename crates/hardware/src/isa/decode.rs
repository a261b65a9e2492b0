//! brew Instruction Decoder.
//!
//! This module turns a 16-bit base word plus its optional extension word into a structured
//! [`Instruction`]. Opcodes are selected by matching the four nibbles of the base word against
//! an ordered list of templates. It provides:
//! 1. **Templates:** Each template is a (mask, expected-bits) pair plus a set of nibbles that
//!    must not be `0xF`, parsed from a four-character pattern in C, B, A, D order.
//! 2. **Ordered Dispatch:** The first matching template wins; words matched by no template
//!    decode to [`Instruction::Unknown`].
//! 3. **Operand Extraction:** Each template carries a builder that reads register fields,
//!    immediates and displacements out of the encoding.
//!
//! Pattern characters: a hex digit matches that exact nibble, `.` matches any nibble except
//! `0xF` (an `0xF` in that position selects an extension-word operand), `*` matches anything.

use std::sync::LazyLock;

use crate::common::constants::REG_SENTINEL;
use crate::common::data::AccessWidth;
use crate::common::error::ExceptionCause;
use crate::common::reg::RegType;
use crate::isa::instruction::{
    BinaryOp, Cond, Decoded, Instruction, InstructionBits, MemOp, MemRef, Operand, PcTarget,
    UnaryOp, ones_complement, sext16, unmunge,
};

/// Bit index tested by the bit-test branches, indexed by field C.
const BIT_TEST_MAP: [u32; 15] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 14, 15, 16, 30, 31];

/// Builds an instruction from its base word and raw extension word.
type Builder = fn(u16, u32) -> Instruction;

/// One entry of the opcode table.
#[derive(Clone)]
struct Template {
    /// Pattern text, kept for diagnostics.
    pattern: String,
    /// Bits that must equal `expected`.
    mask: u16,
    /// Expected value of the masked bits.
    expected: u16,
    /// Nibble masks that must not be all ones.
    not_f: [u16; 4],
    /// Operand extraction.
    build: Builder,
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("pattern", &self.pattern)
            .field("mask", &format_args!("{:#06x}", self.mask))
            .field("expected", &format_args!("{:#06x}", self.expected))
            .finish_non_exhaustive()
    }
}

impl Template {
    /// Parses a four-character pattern (C, B, A, D).
    fn new(pattern: impl Into<String>, build: Builder) -> Self {
        let pattern = pattern.into();
        let mut mask = 0u16;
        let mut expected = 0u16;
        let mut not_f = [0u16; 4];
        for (i, ch) in pattern.bytes().enumerate() {
            let shift = 12 - 4 * i as u32;
            match ch {
                b'.' => not_f[i] = 0xf << shift,
                b'*' => {}
                digit => {
                    let value = char::from(digit).to_digit(16).unwrap_or(0) as u16;
                    mask |= 0xf << shift;
                    expected |= value << shift;
                }
            }
        }
        Self { pattern, mask, expected, not_f, build }
    }

    /// Returns `true` if `word` matches this template.
    fn matches(&self, word: u16) -> bool {
        word & self.mask == self.expected
            && self.not_f.iter().all(|&m| m == 0 || word & m != m)
    }
}

/// The ordered opcode table.
static TEMPLATES: LazyLock<Vec<Template>> = LazyLock::new(build_table);

/// Decodes an instruction.
///
/// # Arguments
///
/// * `word` - The 16-bit base word.
/// * `ext` - The raw extension word: 16 bits zero-extended for 4-byte instructions,
///   the full 32 bits for 6-byte instructions, ignored for 2-byte instructions.
///
/// # Returns
///
/// The decoded instruction together with its encoding and length.
pub fn decode(word: u16, ext: u32) -> Decoded {
    let len = word.insn_len();
    let ext = match len {
        2 => 0,
        4 => ext & 0xffff,
        _ => ext,
    };
    let insn = TEMPLATES
        .iter()
        .find(|t| t.matches(word))
        .map_or(Instruction::Unknown, |t| (t.build)(word, ext));
    Decoded { word, ext, len, insn }
}

/// Returns the patterns of every template matching `word`, in table order.
pub fn matching_patterns(word: u16) -> Vec<String> {
    TEMPLATES
        .iter()
        .filter(|t| t.matches(word))
        .map(|t| t.pattern.clone())
        .collect()
}

/// Splits a 16-bit extension word into its nibble fields (D, A, B, C).
const fn ext_fields(ext: u32) -> (usize, usize, usize, usize) {
    (
        (ext & 0xf) as usize,
        ((ext >> 4) & 0xf) as usize,
        ((ext >> 8) & 0xf) as usize,
        ((ext >> 12) & 0xf) as usize,
    )
}

/// Branch displacement carried in a 16-bit extension word.
const fn branch_offset(ext: u32) -> i32 {
    unmunge(ext as u16)
}

/// Address operand of the compact frame-relative load/store.
fn tiny_ref(word: u16) -> MemRef {
    let a = word.field_a();
    let byte = ((word.field_b() << 4) | a) as u32 & 0xfe;
    MemRef {
        base: Some(12 | (a & 1)),
        offset: Some((ones_complement(byte, 8) * 2) as u32),
        tiny: true,
    }
}

/// Exception group builder (C, B, A = 0).
fn software_interrupt(word: u16, _: u32) -> Instruction {
    match word.field_d() {
        0 => Instruction::SoftwareInterrupt(ExceptionCause::Fill),
        1 => Instruction::SoftwareInterrupt(ExceptionCause::Break),
        2 => Instruction::SoftwareInterrupt(ExceptionCause::Syscall),
        7 => Instruction::SoftwareInterrupt(ExceptionCause::UnknownInst),
        level => ExceptionCause::swi(level as u8)
            .map_or(Instruction::Unknown, Instruction::SoftwareInterrupt),
    }
}

fn unary(word: u16, _: u32) -> Instruction {
    let op = match word.field_b() {
        3 => UnaryOp::Neg,
        4 => UnaryOp::Not,
        5 => UnaryOp::Bsi,
        6 => UnaryOp::Wsi,
        7 => UnaryOp::ToFloat,
        8 => UnaryOp::ToInt,
        9 => UnaryOp::Recip,
        0xa => UnaryOp::Rsqrt,
        0xb => UnaryOp::Sum,
        _ => return Instruction::Unknown,
    };
    Instruction::Unary { op, rd: word.field_d(), ra: word.field_a() }
}

fn binary(word: u16, ext: u32) -> Instruction {
    let Some(op) = BinaryOp::from_field(word.field_c()) else {
        return Instruction::Unknown;
    };
    let (lhs, rhs) = if word.field_b() == REG_SENTINEL {
        (Operand::Imm { value: sext16(ext), short: true }, word.field_a())
    } else if word.field_a() == REG_SENTINEL {
        (Operand::Imm { value: ext, short: false }, word.field_b())
    } else {
        (Operand::Reg(word.field_a()), word.field_b())
    };
    Instruction::Binary { op, rd: word.field_d(), lhs, rhs }
}

fn load_imm32(word: u16, ext: u32) -> Instruction {
    Instruction::LoadImm { rd: word.field_d(), value: ext, short: false }
}

fn memory_short(word: u16, _: u32) -> Instruction {
    MemOp::from_code(word.field_b()).map_or(Instruction::Unknown, |op| Instruction::Memory {
        op,
        reg: word.field_d(),
        mem: MemRef::base(word.field_a()),
    })
}

fn memory_long(word: u16, ext: u32) -> Instruction {
    let mem = if word.field_a() == REG_SENTINEL {
        MemRef::absolute(ext)
    } else {
        MemRef::based(word.field_a(), sext16(ext))
    };
    if word.field_d() == REG_SENTINEL {
        return match word.field_b() {
            0xa => Instruction::JumpMem { target: PcTarget::Active, mem },
            0xb => Instruction::JumpMem { target: PcTarget::Task, mem },
            _ => Instruction::Unknown,
        };
    }
    MemOp::from_code(word.field_b() & 7).map_or(Instruction::Unknown, |op| Instruction::Memory {
        op,
        reg: word.field_d(),
        mem,
    })
}

fn bulk_types(word: u16, _: u32) -> Instruction {
    let mem = MemRef::based(word.field_d(), (ones_complement(word.field_a() as u32, 4) * 4) as u32);
    match word.field_b() {
        0xb => Instruction::LoadTypesMem { first: 0, mem },
        0xc => Instruction::LoadTypesMem { first: 8, mem },
        0xd => Instruction::StoreTypesMem { first: 0, mem },
        0xe => Instruction::StoreTypesMem { first: 8, mem },
        _ => Instruction::Unknown,
    }
}

fn branch_zero(word: u16, ext: u32) -> Instruction {
    let b = word.field_b();
    let all_lanes = b >= 8;
    let Some(cond) = Cond::from_zero_code(b & 7) else {
        return Instruction::Unknown;
    };
    Instruction::Branch {
        cond,
        signed: true,
        all_lanes,
        left: word.field_a(),
        right: None,
        typed_by: word.field_a(),
        offset: branch_offset(ext),
    }
}

fn branch_reg(word: u16, ext: u32) -> Instruction {
    let c = word.field_c();
    let all_lanes = c >= 8;
    let Some((cond, signed)) = Cond::from_reg_code(if all_lanes { c - 8 } else { c }) else {
        return Instruction::Unknown;
    };
    Instruction::Branch {
        cond,
        signed,
        all_lanes,
        left: word.field_b(),
        right: Some(word.field_a()),
        typed_by: word.field_a(),
        offset: branch_offset(ext),
    }
}

fn bit_branch(word: u16, ext: u32) -> Instruction {
    let Some(&bit) = BIT_TEST_MAP.get(word.field_c()) else {
        return Instruction::Unknown;
    };
    let (reg, set) = if word.field_b() == REG_SENTINEL {
        (word.field_a(), true)
    } else {
        (word.field_b(), false)
    };
    Instruction::BitBranch { reg, bit, set, offset: branch_offset(ext) }
}

fn full_mul(word: u16, ext: u32) -> Instruction {
    let (ed, ea, eb, ec) = ext_fields(ext);
    if [ed, ea, eb].contains(&REG_SENTINEL) {
        return Instruction::Unknown;
    }
    let signed = match ec {
        0 => true,
        1 => false,
        _ => return Instruction::Unknown,
    };
    Instruction::FullMul {
        rd: ed,
        ra: ea,
        rb: eb,
        shift: u32::from((word >> 4) & 0x1f),
        signed,
    }
}

fn lane_compare(_: u16, ext: u32) -> Instruction {
    let (ed, ea, eb, ec) = ext_fields(ext);
    if ed == REG_SENTINEL || ea == REG_SENTINEL {
        return Instruction::Unknown;
    }
    if ec == 0 {
        return Cond::from_zero_code(eb).map_or(Instruction::Unknown, |cond| {
            Instruction::LaneCompare {
                rd: ed,
                cond,
                signed: true,
                left: ea,
                right: None,
                typed_by: ea,
            }
        });
    }
    if eb == REG_SENTINEL {
        return Instruction::Unknown;
    }
    Cond::from_reg_code(ec).map_or(Instruction::Unknown, |(cond, signed)| {
        Instruction::LaneCompare {
            rd: ed,
            cond,
            signed,
            left: eb,
            right: Some(ea),
            typed_by: ea,
        }
    })
}

fn interpolate(_: u16, ext: u32) -> Instruction {
    let (ed, ea, eb, ec) = ext_fields(ext);
    if ec != 0 || [ed, ea, eb].contains(&REG_SENTINEL) {
        return Instruction::Unknown;
    }
    Instruction::Interpolate { rd: ed, ra: ea, rb: eb }
}

/// Builds the opcode table in match order.
fn build_table() -> Vec<Template> {
    let mut t: Vec<Template> = vec![
        // Exception group
        Template::new("0000", software_interrupt),
        Template::new("0001", software_interrupt),
        Template::new("0002", software_interrupt),
        Template::new("0003", software_interrupt),
        Template::new("0004", software_interrupt),
        Template::new("0005", software_interrupt),
        Template::new("0006", software_interrupt),
        Template::new("0007", software_interrupt),
        Template::new("0008", |_, _| Instruction::SetTaskMode),
        Template::new("0009", |_, _| Instruction::WaitForInterrupt),
        Template::new("001.", |w, _| Instruction::Fence { flags: w.field_d() as u8 }),
        // PC moves
        Template::new("002.", |w, _| Instruction::JumpReg { target: PcTarget::Active, rd: w.field_d() }),
        Template::new("003.", |w, _| Instruction::JumpReg { target: PcTarget::Task, rd: w.field_d() }),
        Template::new("004.", |w, _| Instruction::ReadPc { rd: w.field_d(), source: PcTarget::Active }),
        Template::new("005.", |w, _| Instruction::ReadPc { rd: w.field_d(), source: PcTarget::Task }),
        // Immediates and immediate jumps
        Template::new("00f.", load_imm32),
        Template::new("0ef2", |_, e| Instruction::JumpImm { target: PcTarget::Active, addr: e, short: false }),
        Template::new("0ef3", |_, e| Instruction::JumpImm { target: PcTarget::Task, addr: e, short: false }),
        Template::new("0f0.", |w, e| Instruction::LoadImm { rd: w.field_d(), value: sext16(e), short: true }),
        Template::new("0fe2", |_, e| Instruction::JumpImm { target: PcTarget::Active, addr: sext16(e), short: true }),
        Template::new("0fe3", |_, e| Instruction::JumpImm { target: PcTarget::Task, addr: sext16(e), short: true }),
        // Unary group
        Template::new("01..", |w, _| Instruction::TinyImm {
            rd: w.field_d(),
            value: ones_complement(w.field_a() as u32, 4),
        }),
        Template::new("02..", |w, _| Instruction::Link { rd: w.field_d(), offset: (w.field_a() as u32) * 2 }),
        Template::new("03..", unary),
        Template::new("04..", unary),
        Template::new("05..", unary),
        Template::new("06..", unary),
        Template::new("07..", unary),
        Template::new("08..", unary),
        Template::new("09..", unary),
        Template::new("0a..", unary),
        Template::new("0b..", unary),
        Template::new("0c..", |w, _| Instruction::SetTypeReg { rd: w.field_d(), ra: w.field_a() }),
        Template::new("0d..", |w, _| Instruction::GetType { rd: w.field_d(), ra: w.field_a() }),
        Template::new("0e..", |w, _| Instruction::SetTypeImm {
            rd: w.field_d(),
            ty: RegType::from_code(w.field_a() as u32),
        }),
    ];

    // Reserved load-immediate template for every ALU group.
    for c in ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "a", "b"] {
        t.push(Template::new(format!("{c}ff."), load_imm32));
    }

    // Binary ALU: register, 32-bit immediate and 16-bit immediate forms.
    for c in ["1", "2", "3", "4", "5", "6", "7", "8", "9"] {
        t.push(Template::new(format!("{c}..."), binary));
        t.push(Template::new(format!("{c}.f."), binary));
        t.push(Template::new(format!("{c}f.."), binary));
    }

    t.extend([
        Template::new("a...", |w, _| Instruction::AndNot { rd: w.field_d(), ra: w.field_a(), rb: w.field_b() }),
        Template::new("a.f.", |_, e| Instruction::LoadTypes { first: 0, types: e }),
        Template::new("af..", |w, e| Instruction::Swizzle { rd: w.field_d(), ra: w.field_a(), pattern: e as u8 }),
        Template::new("b...", |w, _| Instruction::TinyAdd {
            rd: w.field_d(),
            rb: w.field_b(),
            value: ones_complement(w.field_a() as u32, 4),
        }),
        Template::new("b.f.", |_, e| Instruction::LoadTypes { first: 8, types: e }),
        // Compact frame-relative load/store
        Template::new("c...", |w, _| Instruction::Memory {
            op: MemOp::Store { width: AccessWidth::Word },
            reg: w.field_d(),
            mem: tiny_ref(w),
        }),
        Template::new("d...", |w, _| Instruction::Memory {
            op: MemOp::Load { width: AccessWidth::Word, signed: false },
            reg: w.field_d(),
            mem: tiny_ref(w),
        }),
    ]);

    // Short memory group, base register only.
    for b in ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"] {
        t.push(Template::new(format!("e{b}.."), memory_short));
    }
    t.extend([
        Template::new("ea.1", |w, _| Instruction::Invalidate { mem: MemRef::base(w.field_a()) }),
        Template::new("ea.2", |w, _| Instruction::JumpMem { target: PcTarget::Active, mem: MemRef::base(w.field_a()) }),
        Template::new("ea.3", |w, _| Instruction::JumpMem { target: PcTarget::Task, mem: MemRef::base(w.field_a()) }),
        Template::new("eb..", bulk_types),
        Template::new("ec..", bulk_types),
        Template::new("ed..", bulk_types),
        Template::new("ee..", bulk_types),
    ]);

    // Conditional branches.
    for b in ["0", "1", "2", "3", "4", "5", "8", "9", "a", "b", "c", "d"] {
        t.push(Template::new(format!("0{b}.f"), branch_zero));
    }
    for c in ["1", "2", "3", "4", "5", "6", "9", "a", "b", "c", "d", "e"] {
        t.push(Template::new(format!("{c}..f"), branch_reg));
    }
    for c in ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "a", "b", "c", "d", "e"] {
        t.push(Template::new(format!("{c}f.f"), bit_branch));
        t.push(Template::new(format!("{c}.ff"), bit_branch));
    }

    // Extended group.
    t.extend([
        Template::new("f0f.", |w, e| Instruction::CsrRead { rd: w.field_d(), addr: e }),
        Template::new("f1f.", |w, e| Instruction::CsrWrite { rd: w.field_d(), addr: e }),
        Template::new("f0*f", full_mul),
        Template::new("f1*f", full_mul),
        Template::new("ff0f", lane_compare),
        Template::new("ff1f", interpolate),
    ]);

    // Long memory group: register + displacement, absolute, and PC loads.
    for b in ["8", "9", "a", "b", "c", "d", "e", "f"] {
        t.push(Template::new(format!("f{b}.."), memory_long));
        t.push(Template::new(format!("f{b}f."), memory_long));
    }
    t.extend([
        Template::new("fa.f", memory_long),
        Template::new("fb.f", memory_long),
        Template::new("faff", memory_long),
        Template::new("fbff", memory_long),
    ]);

    t
}
