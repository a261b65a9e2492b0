//! brew Execution Modes.
//!
//! This module defines the two execution contexts of a brew core.
//! It implements the following:
//! 1. **Mode Classification:** Task (user) mode and scheduler (privileged) mode.
//! 2. **Program Counter Selection:** Which PC register is active in each mode.
//! 3. **Observability:** Human-readable naming and the trace prefix for each mode.

/// brew execution mode.
///
/// Exactly one mode is active at a time. Task mode runs on `$tpc`, scheduler
/// mode on `$spc`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExecMode {
    /// Task mode.
    ///
    /// User-level code; memory accesses go through the protection windows of
    /// models that have them.
    #[default]
    Task,

    /// Scheduler mode.
    ///
    /// Privileged code; translation is the identity and exceptions stop the machine.
    Scheduler,
}

impl ExecMode {
    /// Returns the mode for a task-mode flag.
    pub const fn from_task_flag(is_task: bool) -> Self {
        if is_task { Self::Task } else { Self::Scheduler }
    }

    /// Returns `true` in task mode.
    pub const fn is_task(self) -> bool {
        matches!(self, Self::Task)
    }

    /// Returns the assembler name of the active program counter.
    pub const fn pc_name(self) -> &'static str {
        match self {
            Self::Task => "$tpc",
            Self::Scheduler => "$spc",
        }
    }

    /// Returns the one-letter prefix used in instruction traces (`T` or `S`).
    pub const fn trace_letter(self) -> char {
        match self {
            Self::Task => 'T',
            Self::Scheduler => 'S',
        }
    }

    /// Returns the human-readable name of the mode.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Task => "Task",
            Self::Scheduler => "Scheduler",
        }
    }
}

impl std::fmt::Display for ExecMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
