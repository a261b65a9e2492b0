//! Simulation statistics collection and reporting.
//!
//! This module tracks execution profile metrics for the brew simulator. It provides:
//! 1. **Throughput:** Retired instructions, host time, and derived MIPS.
//! 2. **Instruction mix:** Counts bucketed by instruction class and by whether the
//!    encoding carried an extension word.
//! 3. **Control flow:** Instructions whose committed PC or mode left the fall-through path.
//! 4. **Exceptions:** Exceptions dispatched, syscalls bridged, interrupts taken.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::isa::instruction::InsnClass;

/// Simulation statistics structure tracking the execution profile.
#[derive(Clone, Debug)]
pub struct SimStats {
    start_time: Instant,
    /// Number of instructions retired.
    pub instructions_retired: u64,
    /// Retired instructions per (class, has extension word).
    pub class_counts: BTreeMap<(InsnClass, bool), u64>,
    /// Instructions whose committed PC or mode differs from the fall-through default.
    pub taken: u64,
    /// Instructions retired in task mode.
    pub task_instructions: u64,
    /// Instructions retired in scheduler mode.
    pub scheduler_instructions: u64,
    /// Exceptions dispatched to the machine model.
    pub exceptions: u64,
    /// Syscalls serviced by the syscall bridge.
    pub syscalls: u64,
    /// Hardware interrupts taken.
    pub interrupts: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            instructions_retired: 0,
            class_counts: BTreeMap::new(),
            taken: 0,
            task_instructions: 0,
            scheduler_instructions: 0,
            exceptions: 0,
            syscalls: 0,
            interrupts: 0,
        }
    }
}

impl SimStats {
    /// Records one retired instruction.
    ///
    /// # Arguments
    ///
    /// * `class` - Profiling class of the instruction.
    /// * `len` - Encoded length in bytes; anything above 2 counts as carrying an immediate.
    /// * `task_mode` - Whether the instruction ran in task mode.
    pub fn record(&mut self, class: InsnClass, len: u32, task_mode: bool) {
        self.instructions_retired += 1;
        *self.class_counts.entry((class, len > 2)).or_insert(0) += 1;
        if task_mode {
            self.task_instructions += 1;
        } else {
            self.scheduler_instructions += 1;
        }
    }

    /// Returns the retired count of a class, summed over both encodings.
    pub fn class_total(&self, class: InsnClass) -> u64 {
        self.class_counts
            .iter()
            .filter(|((c, _), _)| *c == class)
            .map(|(_, n)| n)
            .sum()
    }

    /// Prints the statistics report to stdout.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        let instr = self.instructions_retired.max(1) as f64;
        let mips = if seconds > 0.0 {
            (self.instructions_retired as f64 / seconds) / 1_000_000.0
        } else {
            0.0
        };
        println!("\n==========================================================");
        println!("BREW SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {seconds:.4} s");
        println!("sim_insts                {}", self.instructions_retired);
        println!("sim_mips                 {mips:.2}");
        println!(
            "insts.task               {} ({:.2}%)",
            self.task_instructions,
            self.task_instructions as f64 / instr * 100.0
        );
        println!(
            "insts.scheduler          {} ({:.2}%)",
            self.scheduler_instructions,
            self.scheduler_instructions as f64 / instr * 100.0
        );
        println!("----------------------------------------------------------");
        println!("INSTRUCTION MIX");
        for ((class, immed), count) in &self.class_counts {
            let label = format!("{}{}", class.name(), if *immed { " (imm)" } else { "" });
            println!(
                "  {label:<36} {count:>10} ({:.2}%)",
                *count as f64 / instr * 100.0
            );
        }
        println!("----------------------------------------------------------");
        println!("CONTROL FLOW");
        println!(
            "  taken                  {} ({:.2}%)",
            self.taken,
            self.taken as f64 / instr * 100.0
        );
        println!("  exceptions             {}", self.exceptions);
        println!("  syscalls               {}", self.syscalls);
        println!("  interrupts             {}", self.interrupts);
        println!("==========================================================");
    }
}
