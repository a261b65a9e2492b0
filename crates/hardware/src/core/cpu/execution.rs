//! Instruction Execution.
//!
//! The executor maps one decoded instruction onto the effects it has on the machine.
//! It implements the following:
//! 1. **Effects as Data:** Every instruction yields an [`Effects`] value (register writes,
//!    program counter and mode proposals, exception cause, CSR access) that the run loop
//!    applies in one place.
//! 2. **Typed Dispatch:** ALU, FPU and lane operations dispatch on the runtime type of
//!    their operands; unsupported types yield the `Type` cause.
//! 3. **Single Memory Access:** Loads and stores go through the [`DataPath`] immediately,
//!    so a faulting access produces a cause and no register writes.

use crate::common::data::AccessWidth;
use crate::common::error::{ExceptionCause, MemFault, SimError};
use crate::common::reg::{RegType, TypedReg};
use crate::core::arch::mode::ExecMode;
use crate::core::cpu::memory::DataPath;
use crate::core::cpu::state::ArchState;
use crate::core::units::alu::{Alu, arithmetic, compare, lanes, logic};
use crate::isa::instruction::{BinaryOp, Decoded, Instruction, MemOp, MemRef, Operand, PcTarget};

/// A CSR access requested by an instruction, performed by the run loop through the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsrOp {
    /// `$rd <- csr[addr]`.
    Read {
        /// Destination register.
        rd: usize,
        /// CSR address.
        addr: u32,
    },
    /// `csr[addr] <- value`.
    Write {
        /// CSR address.
        addr: u32,
        /// Value written.
        value: u32,
    },
}

/// Pending effects of one instruction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Effects {
    /// Register writes in program order.
    pub writes: Vec<(usize, TypedReg)>,
    /// New value of the active program counter.
    pub next_pc: Option<u32>,
    /// New value of `$tpc`.
    pub next_tpc: Option<u32>,
    /// New execution mode.
    pub next_mode: Option<ExecMode>,
    /// Exception cause raised by the instruction.
    pub cause: ExceptionCause,
    /// Faulting address, for memory faults.
    pub fault_addr: Option<u32>,
    /// CSR access to perform.
    pub csr: Option<CsrOp>,
}

impl Effects {
    /// No effect beyond falling through.
    pub fn none() -> Self {
        Self::default()
    }

    /// A single register write.
    pub fn write(rd: usize, val: TypedReg) -> Self {
        Self { writes: vec![(rd, val)], ..Self::default() }
    }

    /// Raises `cause`.
    pub fn raise(cause: ExceptionCause) -> Self {
        Self { cause, ..Self::default() }
    }

    /// Raises the cause of a memory fault and records its address.
    pub fn fault(fault: MemFault) -> Self {
        Self {
            cause: fault.cause,
            fault_addr: Some(fault.addr),
            ..Self::default()
        }
    }

    /// Writes the program counter selected by `target`.
    pub fn jump(target: PcTarget, addr: u32) -> Self {
        match target {
            PcTarget::Active => Self { next_pc: Some(addr), ..Self::default() },
            PcTarget::Task => Self { next_tpc: Some(addr), ..Self::default() },
        }
    }

    /// Converts an ALU result into a register write or a raised cause.
    fn from_result(rd: usize, result: Result<TypedReg, ExceptionCause>) -> Self {
        match result {
            Ok(val) => Self::write(rd, val),
            Err(cause) => Self::raise(cause),
        }
    }
}

/// Executes decoded instructions against a read-only view of the state.
#[derive(Debug)]
pub struct Executor<'a> {
    state: &'a ArchState,
    mem: DataPath<'a>,
}

impl<'a> Executor<'a> {
    /// Creates an executor.
    ///
    /// # Arguments
    ///
    /// * `state` - Architectural state before the instruction.
    /// * `mem` - Data path for the instruction's memory access.
    pub const fn new(state: &'a ArchState, mem: DataPath<'a>) -> Self {
        Self { state, mem }
    }

    fn reg(&self, idx: usize) -> TypedReg {
        self.state.regs.read(idx)
    }

    /// `value` tagged with the current type of `rd`.
    fn retyped(&self, rd: usize, value: u32) -> TypedReg {
        TypedReg::new(value, self.reg(rd).ty)
    }

    fn effective_address(&self, mem: &MemRef) -> Result<u32, SimError> {
        match (mem.base, mem.offset) {
            (None, None) => Err(SimError::NoMemoryOperand),
            (base, offset) => {
                let base = base.map_or(0, |r| self.reg(r).value);
                Ok(base.wrapping_add(offset.unwrap_or(0)))
            }
        }
    }

    /// Number of registers covered by a bulk type transfer starting at `first`.
    const fn type_half(first: usize) -> usize {
        if first == 0 { 8 } else { 7 }
    }

    /// Retypes the half of the register file starting at `first` from packed nibbles.
    fn load_types(&self, first: usize, types: u32) -> Effects {
        let writes = (0..Self::type_half(first))
            .map(|i| {
                let ty = RegType::from_code(types >> (i * 4));
                (first + i, self.reg(first + i).with_type(ty))
            })
            .collect();
        Effects { writes, ..Effects::default() }
    }

    /// Executes one instruction.
    ///
    /// # Arguments
    ///
    /// * `decoded` - The decoded instruction and its encoding.
    ///
    /// # Returns
    ///
    /// The effects to apply.
    ///
    /// # Errors
    ///
    /// Returns a host fault for unimplemented instructions and violated decode invariants.
    pub fn execute(&mut self, decoded: &Decoded) -> Result<Effects, SimError> {
        let pc = self.state.pc() & !1;
        let effects = match decoded.insn {
            Instruction::Unknown => Effects::raise(ExceptionCause::UnknownInst),
            Instruction::SoftwareInterrupt(cause) => Effects::raise(cause),
            Instruction::SetTaskMode => match self.state.mode {
                ExecMode::Scheduler => Effects {
                    next_mode: Some(ExecMode::Task),
                    ..Effects::default()
                },
                ExecMode::Task => Effects::none(),
            },
            Instruction::WaitForInterrupt
            | Instruction::Fence { .. }
            | Instruction::Invalidate { .. } => Effects::none(),
            Instruction::JumpReg { target, rd } => Effects::jump(target, self.reg(rd).value),
            Instruction::JumpImm { target, addr, .. } => Effects::jump(target, addr),
            Instruction::ReadPc { rd, source } => {
                let value = match source {
                    PcTarget::Active => pc,
                    PcTarget::Task => self.state.tpc,
                };
                Effects::write(rd, TypedReg::int(value))
            }
            Instruction::LoadImm { rd, value, .. } => Effects::write(rd, self.retyped(rd, value)),
            Instruction::TinyImm { rd, value } => Effects::write(rd, self.retyped(rd, value as u32)),
            Instruction::Link { rd, offset } => {
                Effects::write(rd, TypedReg::int(pc.wrapping_add(offset)))
            }
            Instruction::Unary { op, rd, ra } => Effects::from_result(rd, Alu::unary(op, self.reg(ra))),
            Instruction::SetTypeReg { rd, ra } => {
                let ty = RegType::from_code(self.reg(ra).value);
                Effects::write(rd, self.reg(rd).with_type(ty))
            }
            Instruction::GetType { rd, ra } => Effects::write(rd, TypedReg::int(self.reg(ra).ty.code())),
            Instruction::SetTypeImm { rd, ty } => Effects::write(rd, self.reg(rd).with_type(ty)),
            Instruction::Binary { op, rd, lhs, rhs } => {
                let b = self.reg(rhs);
                let a = match lhs {
                    Operand::Reg(ra) => self.reg(ra),
                    Operand::Imm { short: true, .. } if b.ty.is_float() => {
                        return Ok(Effects::raise(ExceptionCause::Type));
                    }
                    Operand::Imm { value, .. } => TypedReg::new(value, b.ty),
                };
                let result = Alu::check_operand_kinds(Alu::operand_kinds(op, a.ty, b.ty))
                    .and_then(|()| Alu::binary(op, a, b));
                Effects::from_result(rd, result)
            }
            Instruction::AndNot { rd, ra, rb } => {
                Effects::write(rd, logic::and_not(self.reg(ra), self.reg(rb)))
            }
            Instruction::TinyAdd { rd, rb, value } => {
                let b = self.reg(rb);
                let imm = TypedReg::new(value as u32, b.ty);
                Effects::from_result(rd, Alu::binary(BinaryOp::Add, b, imm))
            }
            Instruction::LoadTypes { first, types } => self.load_types(first, types),
            Instruction::Swizzle { rd, ra, pattern } => {
                let a = self.reg(ra);
                Effects::write(rd, TypedReg::new(lanes::swizzle(a.value, pattern), a.ty))
            }
            Instruction::Memory { op, reg, mem } => self.memory(op, reg, &mem)?,
            Instruction::JumpMem { target, mem } => {
                let addr = self.effective_address(&mem)?;
                match self.mem.load(addr, AccessWidth::Word) {
                    Ok(value) => Effects::jump(target, value),
                    Err(fault) => Effects::fault(fault),
                }
            }
            Instruction::LoadTypesMem { first, mem } => {
                let addr = self.effective_address(&mem)?;
                match self.mem.load(addr, AccessWidth::Word) {
                    Ok(types) => self.load_types(first, types),
                    Err(fault) => Effects::fault(fault),
                }
            }
            Instruction::StoreTypesMem { first, mem } => {
                let addr = self.effective_address(&mem)?;
                let packed = (0..Self::type_half(first))
                    .fold(0u32, |acc, i| acc | (self.reg(first + i).ty.code() << (i * 4)));
                match self.mem.store(addr, AccessWidth::Word, packed) {
                    Ok(()) => Effects::none(),
                    Err(fault) => Effects::fault(fault),
                }
            }
            Instruction::Branch { cond, signed, all_lanes, left, right, typed_by, offset } => {
                let ty = self.reg(typed_by).ty;
                let lhs = self.reg(left).value;
                let rhs = right.map_or(0, |r| self.reg(r).value);
                match compare::condition(ty, lhs, rhs, cond, signed, all_lanes) {
                    Ok(true) => Effects::jump(PcTarget::Active, pc.wrapping_add(offset as u32)),
                    Ok(false) => Effects::none(),
                    Err(cause) => Effects::raise(cause),
                }
            }
            Instruction::BitBranch { reg, bit, set, offset } => {
                let bit_set = (self.reg(reg).value >> bit) & 1 == 1;
                if bit_set == set {
                    Effects::jump(PcTarget::Active, pc.wrapping_add(offset as u32))
                } else {
                    Effects::none()
                }
            }
            Instruction::FullMul { rd, ra, rb, shift, signed } => Effects::from_result(
                rd,
                arithmetic::full_mul(self.reg(ra), self.reg(rb), shift, signed),
            ),
            Instruction::LaneCompare { rd, cond, signed, left, right, typed_by } => {
                let ty = self.reg(typed_by).ty;
                let lhs = self.reg(left).value;
                let rhs = right.map_or(0, |r| self.reg(r).value);
                Effects::from_result(rd, compare::lane_mask(ty, lhs, rhs, cond, signed))
            }
            Instruction::Interpolate { .. } => {
                return Err(SimError::Unimplemented("lane interpolation"));
            }
            Instruction::CsrRead { rd, addr } => Effects {
                csr: Some(CsrOp::Read { rd, addr }),
                ..Effects::default()
            },
            Instruction::CsrWrite { rd, addr } => Effects {
                csr: Some(CsrOp::Write { addr, value: self.reg(rd).value }),
                ..Effects::default()
            },
        };
        Ok(effects)
    }

    fn memory(&mut self, op: MemOp, reg: usize, mem: &MemRef) -> Result<Effects, SimError> {
        let addr = self.effective_address(mem)?;
        let width = op.width();
        let effects = match op {
            MemOp::Load { signed, .. } => match self.mem.load(addr, width) {
                Ok(raw) => {
                    let value = match (signed, width) {
                        (true, AccessWidth::Byte) => raw as u8 as i8 as i32 as u32,
                        (true, AccessWidth::Half) => raw as u16 as i16 as i32 as u32,
                        _ => raw,
                    };
                    Effects::write(reg, self.retyped(reg, value))
                }
                Err(fault) => Effects::fault(fault),
            },
            MemOp::LoadLinked => match self.mem.load(addr, width) {
                Ok(value) => Effects::write(reg, self.retyped(reg, value)),
                Err(fault) => Effects::fault(fault),
            },
            MemOp::Store { .. } | MemOp::StoreConditional => {
                match self.mem.store(addr, width, self.reg(reg).value) {
                    Ok(()) => Effects::none(),
                    Err(fault) => Effects::fault(fault),
                }
            }
        };
        Ok(effects)
    }
}
