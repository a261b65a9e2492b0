//! Exception and Interrupt Response.
//!
//! This module implements the default reaction of a machine model to a raised cause.
//! The reaction depends on the execution environment:
//! 1. **User Environment:** `syscall` is serviced on the host by the syscall bridge and
//!    execution resumes after the inline syscall number. Every other cause halts the
//!    run loop with the host signal of the cause.
//! 2. **Operating/Virtual Environments:** An exception in task mode switches to
//!    scheduler mode with the cause latched; an exception in scheduler mode halts
//!    with `SIGTRAP`.
//! 3. **Interrupts:** A pending hardware interrupt is taken only in task mode of a
//!    non-user environment.

use crate::common::error::{ExceptionCause, HaltReason, SimError};
use crate::config::Environment;
use crate::core::arch::mode::ExecMode;
use crate::core::cpu::state::ArchState;
use crate::sim::syscall;
use crate::soc::model::MachineModel;

/// Responds to the cause latched in `state.cause`.
///
/// # Arguments
///
/// * `model` - The machine model, used by the syscall bridge to reach guest memory.
/// * `state` - State after execute; shadow fields may be rewritten.
/// * `env` - Execution environment of the run.
///
/// # Returns
///
/// `Some(reason)` if the run loop has to stop.
///
/// # Errors
///
/// Propagates host faults from the syscall bridge.
pub fn respond<M: MachineModel + ?Sized>(
    model: &mut M,
    state: &mut ArchState,
    env: Environment,
) -> Result<Option<HaltReason>, SimError> {
    let cause = state.cause;
    if env.is_user() {
        if cause == ExceptionCause::Syscall {
            return syscall::handle(model, state);
        }
        tracing::warn!(
            cause = cause.name(),
            tpc = format_args!("{:#x}", state.tpc),
            fault_addr = ?state.fault_addr,
            "guest exception halts user environment"
        );
        return Ok(Some(HaltReason::Signalled(cause.signal())));
    }
    match state.mode {
        ExecMode::Task => {
            tracing::debug!(cause = cause.name(), tpc = format_args!("{:#x}", state.tpc), "task -> scheduler");
            state.next_mode = ExecMode::Scheduler;
            Ok(None)
        }
        ExecMode::Scheduler => {
            tracing::warn!(
                cause = cause.name(),
                spc = format_args!("{:#x}", state.spc),
                "exception in scheduler mode"
            );
            Ok(Some(HaltReason::Signalled(libc::SIGTRAP)))
        }
    }
}

/// Takes a pending hardware interrupt if the environment and mode allow it.
///
/// On acceptance the HWI cause is raised and the machine switches to scheduler mode
/// before the next fetch; the task program counter is left pointing at the next
/// task instruction.
pub fn take_interrupt(state: &mut ArchState, env: Environment) -> bool {
    if env.is_user() || !state.mode.is_task() {
        return false;
    }
    tracing::debug!(tpc = format_args!("{:#x}", state.tpc), "hardware interrupt");
    state.cause = ExceptionCause::Hwi;
    state.fault_addr = None;
    state.set_mode(ExecMode::Scheduler);
    true
}
