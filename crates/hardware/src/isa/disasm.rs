//! Instruction Disassembler for brew.
//!
//! Renders a decoded instruction as brew assembly text for instruction traces,
//! the `disasm` command and test diagnostics. Rendering is a pure function of
//! the [`Decoded`] value; it never touches simulator state.
//!
//! # Usage
//!
//! ```
//! use brewsim_core::isa::disasm::disassemble;
//! let text = disassemble(0x4654, 0).unwrap(); // $r4 <- $r5 + $r6
//! assert_eq!(text, "$r4 <- $r5 + $r6");
//! ```

use std::fmt::Write as _;

use crate::common::error::{ExceptionCause, SimError};
use crate::common::reg::RegType;
use crate::isa::abi::reg_name;
use crate::isa::decode::decode;
use crate::isa::instruction::{
    Cond, Decoded, Instruction, MemRef, Operand, UnaryOp,
};

/// Disassembles an instruction word and its extension word.
///
/// # Errors
///
/// Returns `SimError::NoMemoryOperand` if a memory reference has neither base nor
/// displacement, which no decoded encoding produces.
pub fn disassemble(word: u16, ext: u32) -> Result<String, SimError> {
    Formatter.format(&decode(word, ext))
}

/// Text renderer for decoded instructions.
#[derive(Clone, Copy, Debug, Default)]
pub struct Formatter;

impl Formatter {
    /// Renders `decoded` as assembly text.
    ///
    /// # Errors
    ///
    /// Returns `SimError::NoMemoryOperand` for a memory reference with neither base
    /// nor displacement.
    pub fn format(self, decoded: &Decoded) -> Result<String, SimError> {
        let text = match decoded.insn {
            Instruction::Unknown => unknown(decoded),
            Instruction::SoftwareInterrupt(cause) => match cause {
                ExceptionCause::Fill => "fill".into(),
                ExceptionCause::Break => "break".into(),
                ExceptionCause::Syscall => "syscall".into(),
                ExceptionCause::Swi3 => "swi 3".into(),
                ExceptionCause::Swi4 => "swi 4".into(),
                ExceptionCause::Swi5 => "swi 5".into(),
                ExceptionCause::Swi6 => "swi 6".into(),
                _ => "sii".into(),
            },
            Instruction::SetTaskMode => "stm".into(),
            Instruction::WaitForInterrupt => "woi".into(),
            Instruction::Fence { flags } => fence(flags),
            Instruction::JumpReg { target, rd } => format!("{} <- {}", target.name(), reg_name(rd)),
            Instruction::JumpImm { target, addr, short } => {
                format!("{} <- {}{addr} (0x{addr:x})", target.name(), short_prefix(short))
            }
            Instruction::ReadPc { rd, source } => format!("{} <- {}", reg_name(rd), source.name()),
            Instruction::LoadImm { rd, value, short } => {
                format!("{} <- {}{value} (0x{value:x})", reg_name(rd), short_prefix(short))
            }
            Instruction::TinyImm { rd, value } => format!("{} <- tiny {value}", reg_name(rd)),
            Instruction::Link { rd, offset } => {
                format!("{} <- $pc + {offset} (0x{offset:x})", reg_name(rd))
            }
            Instruction::Unary { op, rd, ra } => {
                let prefix = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Not => "~",
                    UnaryOp::Bsi => "bsi ",
                    UnaryOp::Wsi => "wsi ",
                    UnaryOp::ToFloat => "float ",
                    UnaryOp::ToInt => "int ",
                    UnaryOp::Recip => "1 / ",
                    UnaryOp::Rsqrt => "rsqrt ",
                    UnaryOp::Sum => "sum ",
                };
                format!("{} <- {prefix}{}", reg_name(rd), reg_name(ra))
            }
            Instruction::SetTypeReg { rd, ra } => format!("type {} <- {}", reg_name(rd), reg_name(ra)),
            Instruction::GetType { rd, ra } => format!("{} <- type {}", reg_name(rd), reg_name(ra)),
            Instruction::SetTypeImm { rd, ty } => format!("type {} <- {ty}", reg_name(rd)),
            Instruction::Binary { op, rd, lhs, rhs } => match lhs {
                Operand::Reg(ra) => {
                    format!("{} <- {} {} {}", reg_name(rd), reg_name(ra), op.symbol(), reg_name(rhs))
                }
                Operand::Imm { value, short } => format!(
                    "{} <- {}{} (0x{value:x}) {} {}",
                    reg_name(rd),
                    short_prefix(short),
                    value as i32,
                    op.symbol(),
                    reg_name(rhs)
                ),
            },
            Instruction::AndNot { rd, ra, rb } => {
                format!("{} <- ~{} & {}", reg_name(rd), reg_name(ra), reg_name(rb))
            }
            Instruction::TinyAdd { rd, rb, value } => {
                format!("{} <- tiny {} + {value}", reg_name(rd), reg_name(rb))
            }
            Instruction::LoadTypes { first, types } => {
                let count = if first == 0 { 8 } else { 7 };
                let names: Vec<String> = (0..count)
                    .map(|i| RegType::from_code(types >> (i * 4)).name())
                    .collect();
                format!("type {} <- {}", reg_range(first), names.join(", "))
            }
            Instruction::Swizzle { rd, ra, pattern } => format!(
                "{} <- lane_swizzle {} {}{}{}{}",
                reg_name(rd),
                reg_name(ra),
                (pattern >> 6) & 3,
                (pattern >> 4) & 3,
                (pattern >> 2) & 3,
                pattern & 3
            ),
            Instruction::Memory { op, reg, mem } => {
                let reference = mem_ref(op.mnemonic(), &mem)?;
                if op.is_store() {
                    format!("{reference} <- {}", reg_name(reg))
                } else {
                    format!("{} <- {reference}", reg_name(reg))
                }
            }
            Instruction::Invalidate { mem } => mem_ref("inv32", &mem)?,
            Instruction::JumpMem { target, mem } => {
                format!("{} <- {}", target.name(), mem_ref("mem32", &mem)?)
            }
            Instruction::LoadTypesMem { first, mem } => {
                format!("type {} <- {}", reg_range(first), mem_ref("mem32", &mem)?)
            }
            Instruction::StoreTypesMem { first, mem } => {
                format!("{} <- type {}", mem_ref("mem32", &mem)?, reg_range(first))
            }
            Instruction::Branch { cond, signed, all_lanes, left, right, offset, .. } => {
                let mut text = String::from("if ");
                if all_lanes {
                    text.push_str("all ");
                }
                text.push_str(&comparison(cond, signed, left, right));
                let _ = write!(text, " $pc {}", branch_target(offset));
                text
            }
            Instruction::BitBranch { reg, bit, set, offset } => format!(
                "if {}[{bit}] == {} $pc {}",
                reg_name(reg),
                u8::from(set),
                branch_target(offset)
            ),
            Instruction::FullMul { rd, ra, rb, shift, signed } => format!(
                "{} <- full {} * {} {} {shift}",
                reg_name(rd),
                reg_name(ra),
                reg_name(rb),
                if signed { ">>>" } else { ">>" }
            ),
            Instruction::LaneCompare { rd, cond, signed, left, right, .. } => {
                format!("{} <- {}", reg_name(rd), comparison(cond, signed, left, right))
            }
            Instruction::Interpolate { rd, ra, rb } => {
                format!("{} <- interpolate {} {}", reg_name(rd), reg_name(ra), reg_name(rb))
            }
            Instruction::CsrRead { rd, addr } => {
                format!("{} <- csr[{addr} (0x{addr:x})]", reg_name(rd))
            }
            Instruction::CsrWrite { rd, addr } => {
                format!("csr[{addr} (0x{addr:x})] <- {}", reg_name(rd))
            }
        };
        Ok(text)
    }
}

fn unknown(decoded: &Decoded) -> String {
    match decoded.len {
        2 => format!("unknown instruction 0x{:04x}", decoded.word),
        4 => format!("unknown instruction 0x{:04x} 0x{:04x}", decoded.word, decoded.ext),
        _ => format!("unknown instruction 0x{:04x} 0x{:08x}", decoded.word, decoded.ext),
    }
}

const fn short_prefix(short: bool) -> &'static str {
    if short { "short " } else { "" }
}

fn fence(flags: u8) -> String {
    let mut before = String::new();
    let mut after = String::new();
    if flags & 1 == 0 {
        before.push('r');
    }
    if flags & 2 == 0 {
        before.push('w');
    }
    if flags & 4 == 0 {
        after.push('r');
    }
    if flags & 8 == 0 {
        after.push('w');
    }
    format!("fence {before}, {after}")
}

fn reg_range(first: usize) -> &'static str {
    if first == 0 { "$r0...$r7" } else { "$r8...$r14" }
}

fn comparison(cond: Cond, signed: bool, left: usize, right: Option<usize>) -> String {
    let rhs = right.map_or("0", reg_name);
    let qualifier = if signed && right.is_some() && !matches!(cond, Cond::Eq | Cond::Ne) {
        "signed "
    } else {
        ""
    };
    format!("{qualifier}{} {} {rhs}", reg_name(left), cond.symbol())
}

fn branch_target(offset: i32) -> String {
    if offset < 0 {
        let magnitude = offset.unsigned_abs();
        format!("<- $pc - {magnitude} (0x{magnitude:x})")
    } else {
        format!("<- $pc + {offset} (0x{offset:x})")
    }
}

/// Renders a memory reference such as `mem32[$r4 + 8 (0x8)]`.
fn mem_ref(prefix: &str, mem: &MemRef) -> Result<String, SimError> {
    let tiny = if mem.tiny { "tiny " } else { "" };
    match (mem.base, mem.offset) {
        (Some(base), Some(offset)) if (offset as i32) < 0 => {
            let magnitude = (offset as i32).unsigned_abs();
            Ok(format!("{prefix}[{} - {tiny}{magnitude} (0x{magnitude:x})]", reg_name(base)))
        }
        (Some(base), Some(offset)) => {
            Ok(format!("{prefix}[{} + {tiny}{offset} (0x{offset:x})]", reg_name(base)))
        }
        (Some(base), None) => Ok(format!("{prefix}[{}]", reg_name(base))),
        (None, Some(addr)) => Ok(format!("{prefix}[{addr} (0x{addr:x})]")),
        (None, None) => Err(SimError::NoMemoryOperand),
    }
}
