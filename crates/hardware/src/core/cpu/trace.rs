//! Instruction trace output.
//!
//! One line per retired instruction: the mode letter and PC, the disassembly,
//! then (from column 80) every register the instruction changed, any program
//! counter or mode change away from the fall-through path, the memory access
//! and the exception cause.
//!
//! ```text
//! TPC: 0x100 $r4 <- $r5 + $r6                                                      $r4 <- 0x7 (int32)
//! ```

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::common::constants::TRACE_SIDE_EFFECT_COLUMN;
use crate::common::error::SimError;
use crate::core::arch::mode::ExecMode;
use crate::core::cpu::memory::MemTrace;
use crate::core::cpu::state::ArchState;
use crate::isa::abi::reg_name;

/// Destination of trace lines.
pub type TraceSink = Box<dyn Write + Send>;

/// Snapshot of one instruction for the tracer.
#[derive(Clone, Copy, Debug)]
pub struct TraceRecord<'a> {
    /// Mode the instruction ran in.
    pub mode: ExecMode,
    /// Address of the instruction.
    pub pc: u32,
    /// Disassembly text.
    pub text: &'a str,
    /// State after execute, before commit.
    pub state: &'a ArchState,
    /// Fall-through `(ntpc, nspc)` defaults of the instruction.
    pub fall_through: (u32, u32),
    /// Memory access of the instruction.
    pub mem: &'a MemTrace,
}

/// Per-instruction tracer.
pub struct Tracer {
    sink: TraceSink,
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new(Box::new(io::stderr()))
    }
}

impl Tracer {
    /// Creates a tracer writing to `sink`.
    pub fn new(sink: TraceSink) -> Self {
        Self { sink }
    }

    /// Formats one trace line.
    pub fn format(record: &TraceRecord<'_>) -> String {
        let mut line = format!(
            "{}PC: 0x{:x} {}",
            record.mode.trace_letter(),
            record.pc,
            record.text
        );
        let mut effects = String::new();
        let state = record.state;
        for idx in state.dirty_regs() {
            let val = state.regs.read(idx);
            let _ = write!(effects, " {} <- 0x{:x} ({})", reg_name(idx), val.value, val.ty);
        }
        let (ntpc, nspc) = record.fall_through;
        if state.ntpc != ntpc {
            let _ = write!(effects, " $tpc <- 0x{:x}", state.ntpc);
        }
        if state.nspc != nspc {
            let _ = write!(effects, " $spc <- 0x{:x}", state.nspc);
        }
        if state.next_mode != record.mode {
            let _ = write!(effects, " mode <- {}", state.next_mode);
        }
        if record.mem.valid {
            let _ = write!(effects, " | {}", record.mem);
        }
        if state.cause.is_some() {
            let _ = write!(effects, " | exception: {}", state.cause);
        }
        if !effects.is_empty() {
            let pad = TRACE_SIDE_EFFECT_COLUMN.saturating_sub(line.len());
            line.extend(std::iter::repeat_n(' ', pad));
            line.push_str(&effects);
        }
        line
    }

    /// Writes one trace line.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Io` if the sink fails.
    pub fn emit(&mut self, record: &TraceRecord<'_>) -> Result<(), SimError> {
        writeln!(self.sink, "{}", Self::format(record))?;
        Ok(())
    }
}
