//! CPU Core Definition and Run Loop.
//!
//! This module defines the central `Cpu` structure, which owns the architectural state and
//! the machine model for the lifetime of a run. Each call to [`Cpu::step`] retires exactly
//! one instruction:
//! 1. **Fetch:** The active PC (bit 0 ignored) selects the base word through the model's
//!    instruction path; extension halfwords follow at `pc + 2` and `pc + 4`.
//! 2. **Pre-exec:** Shadow program counters take their fall-through defaults and the
//!    previous cause is latched into the CSR state.
//! 3. **Execute:** The [`Executor`] computes the instruction's [`Effects`], which are
//!    applied in one place unless the instruction raised a cause.
//! 4. **Trace and Profile:** An optional trace line and the statistics counters.
//! 5. **Exception Dispatch:** A raised cause restores the pre-instruction task PC and is
//!    handed to the machine model, which may resume, switch modes, or halt.
//! 6. **Commit:** Shadow program counters and mode become current.

/// Instruction semantics producing pending effects.
pub mod execution;

/// Memory access recording and the per-instruction data path.
pub mod memory;

/// Architectural and shadow state.
pub mod state;

/// Per-instruction trace output.
pub mod trace;

/// Default exception and interrupt response.
pub mod trap;

use crate::common::constants::{INSTRUCTION_SIZE_16, INSTRUCTION_SIZE_32};
use crate::common::error::{ExceptionCause, HaltReason, MemFault, SimError};
use crate::common::reg::TypedReg;
use crate::config::Environment;
use crate::core::arch::mode::ExecMode;
use crate::isa::decode::decode;
use crate::isa::disasm::Formatter;
use crate::isa::instruction::{Decoded, InsnClass, InstructionBits};
use crate::soc::model::MachineModel;
use crate::stats::SimStats;

use self::execution::{CsrOp, Effects, Executor};
use self::memory::{DataPath, MemTrace};
use self::state::ArchState;
use self::trace::{TraceRecord, Tracer};

/// Result of retiring one instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Execution continues with the next instruction.
    Continue,
    /// The run loop has to stop.
    Halted(HaltReason),
}

/// Main CPU structure: architectural state plus the machine model that owns memory.
#[derive(Debug)]
pub struct Cpu {
    /// Architectural and shadow state.
    pub state: ArchState,
    /// Execution profile.
    pub stats: SimStats,
    model: Box<dyn MachineModel>,
    env: Environment,
    tracer: Option<Tracer>,
    mem_trace: MemTrace,
    irq_pending: bool,
}

impl Cpu {
    /// Creates a CPU owning `model`, reset for `env`.
    ///
    /// # Arguments
    ///
    /// * `model` - The machine model; owned for the lifetime of the CPU.
    /// * `env` - Execution environment; selects the initial mode and the exception policy.
    pub fn new(model: Box<dyn MachineModel>, env: Environment) -> Self {
        let mut cpu = Self {
            state: ArchState::new(),
            stats: SimStats::default(),
            model,
            env,
            tracer: None,
            mem_trace: MemTrace::default(),
            irq_pending: false,
        };
        cpu.reset();
        cpu
    }

    /// Resets the architectural state through the model.
    pub fn reset(&mut self) {
        self.model.reset(&mut self.state, self.env.is_user());
        self.mem_trace = MemTrace::default();
        self.irq_pending = false;
    }

    /// Runs the model's one-time setup.
    ///
    /// # Errors
    ///
    /// Propagates the model's setup failure.
    pub fn setup(&mut self) -> Result<(), SimError> {
        self.model.setup()
    }

    /// Enables or disables the per-instruction trace.
    pub fn set_tracer(&mut self, tracer: Option<Tracer>) {
        self.tracer = tracer;
    }

    /// Returns the execution environment.
    pub const fn env(&self) -> Environment {
        self.env
    }

    /// Returns the machine model.
    pub fn model(&self) -> &dyn MachineModel {
        self.model.as_ref()
    }

    /// Returns the machine model for direct memory setup.
    pub fn model_mut(&mut self) -> &mut dyn MachineModel {
        self.model.as_mut()
    }

    /// Returns the memory access of the last retired instruction.
    pub const fn mem_trace(&self) -> &MemTrace {
        &self.mem_trace
    }

    /// Latches a hardware interrupt request, polled after each instruction.
    pub const fn raise_interrupt(&mut self) {
        self.irq_pending = true;
    }

    /// Returns `true` while an interrupt request waits to be taken.
    pub const fn interrupt_pending(&self) -> bool {
        self.irq_pending
    }

    /// Fetches and decodes the instruction at `pc` in the current mode.
    fn fetch(&mut self, pc: u32) -> Result<Decoded, MemFault> {
        let mode = self.state.mode;
        let word = self.model.read_inst(mode, pc)?;
        let ext = match word.insn_len() {
            INSTRUCTION_SIZE_16 => 0,
            INSTRUCTION_SIZE_32 => u32::from(self.model.read_inst(mode, pc.wrapping_add(2))?),
            _ => {
                let low = u32::from(self.model.read_inst(mode, pc.wrapping_add(2))?);
                let high = u32::from(self.model.read_inst(mode, pc.wrapping_add(4))?);
                low | (high << 16)
            }
        };
        Ok(decode(word, ext))
    }

    /// Applies the effects of an instruction, or latches its cause.
    fn apply(&mut self, effects: &Effects) -> Result<(), SimError> {
        if effects.cause.is_some() {
            self.state.cause = effects.cause;
            self.state.fault_addr = effects.fault_addr;
            return Ok(());
        }
        for &(idx, val) in &effects.writes {
            self.state.write_reg(idx, val)?;
        }
        if let Some(pc) = effects.next_pc {
            self.state.set_next_pc(pc);
        }
        if let Some(tpc) = effects.next_tpc {
            self.state.ntpc = tpc;
        }
        if let Some(mode) = effects.next_mode {
            self.state.next_mode = mode;
        }
        match effects.csr {
            Some(CsrOp::Read { rd, addr }) => {
                let value = self.model.read_csr(&mut self.state.csr, self.state.mode, addr)?;
                let ty = self.state.regs.read(rd).ty;
                self.state.write_reg(rd, TypedReg::new(value, ty))?;
            }
            Some(CsrOp::Write { addr, value }) => {
                self.model.write_csr(&mut self.state.csr, addr, value)?;
            }
            None => {}
        }
        Ok(())
    }

    /// Retires one instruction.
    ///
    /// # Returns
    ///
    /// `StepOutcome::Halted` once the guest exits, is stopped by a signal-like
    /// condition, or a device requests termination.
    ///
    /// # Errors
    ///
    /// Returns a host fault such as an unknown CSR. The architectural state is left
    /// as it was when the fault was detected.
    pub fn step(&mut self) -> Result<StepOutcome, SimError> {
        let mode = self.state.mode;
        let pc = self.state.pc() & !1;
        let pre_tpc = self.state.tpc;
        self.mem_trace.clear();

        let (decoded, effects) = match self.fetch(pc) {
            Ok(decoded) => {
                self.state.begin_instruction(decoded.len);
                let mem = DataPath::new(&mut *self.model, &mut self.mem_trace, mode);
                let effects = Executor::new(&self.state, mem).execute(&decoded)?;
                (Some(decoded), effects)
            }
            Err(fault) => {
                self.state.begin_instruction(INSTRUCTION_SIZE_16);
                (None, Effects::fault(fault))
            }
        };
        let fall_through = (self.state.ntpc, self.state.nspc);
        self.apply(&effects)?;

        if let Some(tracer) = self.tracer.as_mut() {
            let text = match &decoded {
                Some(decoded) => Formatter.format(decoded)?,
                None => String::from("<fetch fault>"),
            };
            tracing::trace!(pc = format_args!("{pc:#x}"), %text, "retire");
            tracer.emit(&TraceRecord {
                mode,
                pc,
                text: &text,
                state: &self.state,
                fall_through,
                mem: &self.mem_trace,
            })?;
        }
        let (class, len) = decoded.map_or((InsnClass::Unknown, INSTRUCTION_SIZE_16), |d| {
            (d.insn.class(), d.len)
        });
        self.stats.record(class, len, mode.is_task());

        let mut halt = None;
        if self.state.cause.is_some() {
            let cause = self.state.cause;
            self.state.ntpc = pre_tpc;
            self.stats.exceptions += 1;
            if cause == ExceptionCause::Syscall && self.env.is_user() {
                self.stats.syscalls += 1;
            }
            tracing::debug!(
                cause = cause.name(),
                pc = format_args!("{pc:#x}"),
                mode = mode.name(),
                "exception"
            );
            halt = self.model.handle_exception(&mut self.state, self.env)?;
        }

        let (ntpc, nspc) = fall_through;
        if self.state.ntpc != ntpc || self.state.nspc != nspc || self.state.next_mode != mode {
            self.stats.taken += 1;
        }
        if self.state.next_mode != mode {
            tracing::debug!(from = mode.name(), to = self.state.next_mode.name(), "mode switch");
        }
        self.state.commit();

        if let Some(reason) = halt.or_else(|| self.model.take_exit()) {
            return Ok(StepOutcome::Halted(reason));
        }
        if self.irq_pending && self.model.handle_interrupt(&mut self.state, self.env) {
            self.irq_pending = false;
            self.stats.interrupts += 1;
        }
        Ok(StepOutcome::Continue)
    }

    /// Returns the mode the next instruction runs in.
    pub const fn mode(&self) -> ExecMode {
        self.state.mode
    }
}
