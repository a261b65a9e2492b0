//! Simulator: the CPU plus the configuration it was built from.
//!
//! Wraps model construction, program loading and the outer run loop. The run loop
//! polls the halt outcome of every retired instruction; a halt is a value, never an unwind.

use std::path::Path;

use crate::common::error::{HaltReason, SimError};
use crate::common::reg::TypedReg;
use crate::config::Config;
use crate::core::cpu::trace::Tracer;
use crate::core::{Cpu, StepOutcome};
use crate::isa::abi::REG_SP;
use crate::sim::loader::{self, ProgramImage};
use crate::soc::builder::build_model;
use crate::soc::model::MachineModel;

/// Top-level simulator.
#[derive(Debug)]
pub struct Simulator {
    /// CPU state, machine model and statistics.
    pub cpu: Cpu,
    config: Config,
}

impl Simulator {
    /// Creates a simulator with the model selected by `config`.
    ///
    /// # Errors
    ///
    /// Propagates the model's setup failure.
    pub fn new(config: &Config) -> Result<Self, SimError> {
        Self::with_model(config, build_model(config))
    }

    /// Creates a simulator around an explicitly constructed model.
    ///
    /// # Errors
    ///
    /// Propagates the model's setup failure.
    pub fn with_model(config: &Config, model: Box<dyn MachineModel>) -> Result<Self, SimError> {
        let mut cpu = Cpu::new(model, config.general.environment);
        if config.general.trace_instructions {
            cpu.set_tracer(Some(Tracer::default()));
        }
        cpu.setup()?;
        Ok(Self { cpu, config: config.clone() })
    }

    /// Returns the configuration the simulator was built from.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Places a program image, writes the argv block and sets the start state.
    ///
    /// # Arguments
    ///
    /// * `image` - Parsed program.
    /// * `args` - Guest argument vector, `args[0]` being the program name.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Elf` if the image or the argv block does not fit in memory.
    pub fn load(&mut self, image: &ProgramImage, args: &[String]) -> Result<(), SimError> {
        let bus = self.cpu.model_mut().bus();
        image.place(bus)?;
        if image.is_elf {
            loader::write_argv_block(bus, args)?;
        }
        self.cpu.state.set_pc(image.entry);
        let sp = self.config.memory.initial_sp();
        self.cpu.state.write_reg(REG_SP, TypedReg::int(sp))?;
        tracing::info!(
            entry = format_args!("{:#x}", image.entry),
            sp = format_args!("{sp:#x}"),
            model = self.cpu.model().name(),
            "program loaded"
        );
        Ok(())
    }

    /// Reads, parses and loads a program file.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Io` or a load error.
    pub fn load_file(&mut self, path: impl AsRef<Path>, args: &[String]) -> Result<(), SimError> {
        let image = ProgramImage::from_file(path)?;
        self.load(&image, args)
    }

    /// Retires one instruction.
    ///
    /// # Errors
    ///
    /// Propagates host faults from the CPU.
    pub fn step(&mut self) -> Result<StepOutcome, SimError> {
        self.cpu.step()
    }

    /// Runs until the guest halts.
    ///
    /// # Errors
    ///
    /// Propagates host faults from the CPU.
    pub fn run(&mut self) -> Result<HaltReason, SimError> {
        loop {
            if let StepOutcome::Halted(reason) = self.cpu.step()? {
                tracing::info!(%reason, retired = self.cpu.stats.instructions_retired, "halted");
                return Ok(reason);
            }
        }
    }

    /// Runs at most `max_steps` instructions.
    ///
    /// # Returns
    ///
    /// `Some(reason)` if the guest halted within the budget.
    ///
    /// # Errors
    ///
    /// Propagates host faults from the CPU.
    pub fn run_for(&mut self, max_steps: u64) -> Result<Option<HaltReason>, SimError> {
        for _ in 0..max_steps {
            if let StepOutcome::Halted(reason) = self.cpu.step()? {
                return Ok(Some(reason));
            }
        }
        Ok(None)
    }

    /// Latches a hardware interrupt request.
    pub const fn raise_interrupt(&mut self) {
        self.cpu.raise_interrupt();
    }
}
