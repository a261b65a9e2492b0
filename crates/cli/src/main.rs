//! brew instruction-set simulator CLI.
//!
//! This binary provides the entry point for running and inspecting brew programs. It performs:
//! 1. **Run:** Load an ELF or raw binary, pass it an argument vector, and run it until it
//!    exits; the process exit code mirrors the guest's.
//! 2. **Disassemble:** Print every loadable segment of a program as brew assembly.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use brewsim_core::config::{Environment, ModelKind};
use brewsim_core::isa::disasm::disassemble;
use brewsim_core::isa::instruction::InstructionBits;
use brewsim_core::sim::loader::{ProgramImage, Segment};
use brewsim_core::{Config, HaltReason, SimError, Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "brewsim",
    author,
    version,
    about = "brew instruction-set simulator",
    long_about = "Run or disassemble brew programs.\n\nExamples:\n  brewsim run hello.elf\n  brewsim run --trace --stats prog.elf arg1 arg2\n  brewsim run --model protected --env operating kernel.elf\n  brewsim disasm hello.elf"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a program until it exits.
    Run {
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print one trace line per retired instruction to stderr.
        #[arg(long)]
        trace: bool,

        /// Machine model, overriding the configuration.
        #[arg(long, value_enum)]
        model: Option<ModelArg>,

        /// Execution environment, overriding the configuration.
        #[arg(long, value_enum)]
        env: Option<EnvArg>,

        /// Print the statistics report after the run.
        #[arg(long)]
        stats: bool,

        /// ELF executable or raw binary.
        program: PathBuf,

        /// Arguments passed to the guest (argv[1..]).
        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Disassemble the loadable segments of a program.
    Disasm {
        /// ELF executable or raw binary.
        program: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModelArg {
    Generic,
    Protected,
    Peripheral,
}

impl From<ModelArg> for ModelKind {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Generic => Self::Generic,
            ModelArg::Protected => Self::Protected,
            ModelArg::Peripheral => Self::Peripheral,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EnvArg {
    User,
    Operating,
    Virtual,
}

impl From<EnvArg> for Environment {
    fn from(arg: EnvArg) -> Self {
        match arg {
            EnvArg::User => Self::User,
            EnvArg::Operating => Self::Operating,
            EnvArg::Virtual => Self::Virtual,
        }
    }
}

/// Options of the `run` subcommand.
struct RunOptions {
    config: Option<PathBuf>,
    trace: bool,
    model: Option<ModelArg>,
    env: Option<EnvArg>,
    stats: bool,
    program: PathBuf,
    args: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Run {
            config,
            trace,
            model,
            env,
            stats,
            program,
            args,
        } => cmd_run(RunOptions {
            config,
            trace,
            model,
            env,
            stats,
            program,
            args,
        }),
        Commands::Disasm { program } => cmd_disasm(&program),
    };
    let _ = std::io::stdout().flush();
    process::exit(code);
}

/// Builds the configuration from the optional file and the command-line overrides.
fn build_config(opts: &RunOptions) -> Result<Config, SimError> {
    let mut config = match &opts.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if opts.trace {
        config.general.trace_instructions = true;
    }
    if let Some(model) = opts.model {
        config.general.model = model.into();
    }
    if let Some(env) = opts.env {
        config.general.environment = env.into();
    }
    Ok(config)
}

/// Runs a program and returns the process exit code.
///
/// Host faults print the register file and statistics and exit with code 1.
fn cmd_run(opts: RunOptions) -> i32 {
    let setup = build_config(&opts).and_then(|config| {
        let mut sim = Simulator::new(&config)?;
        let mut argv = vec![opts.program.display().to_string()];
        argv.extend(opts.args.iter().cloned());
        sim.load_file(&opts.program, &argv)?;
        Ok(sim)
    });
    let mut sim = match setup {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("[!] {e}");
            return 1;
        }
    };

    match sim.run() {
        Ok(reason) => {
            if let HaltReason::Signalled(sig) = reason {
                eprintln!("[*] Program {reason} at pc {:#x}", sim.cpu.state.pc());
                tracing::debug!(sig, "guest stopped");
            }
            if opts.stats {
                sim.cpu.stats.print();
            }
            reason.exit_code()
        }
        Err(e) => {
            eprintln!("\n[!] FATAL: {e}");
            eprintln!("    {} = {:#x}", sim.cpu.mode().pc_name(), sim.cpu.state.pc());
            sim.cpu.state.regs.dump();
            sim.cpu.stats.print();
            1
        }
    }
}

/// Disassembles every loadable segment of a program.
fn cmd_disasm(path: &Path) -> i32 {
    let image = match ProgramImage::from_file(path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("[!] {e}");
            return 1;
        }
    };
    println!("entry: {:#010x}", image.entry);
    for seg in &image.segments {
        println!();
        if let Err(e) = disasm_segment(seg) {
            eprintln!("[!] {e}");
            return 1;
        }
    }
    0
}

fn disasm_segment(seg: &Segment) -> Result<(), SimError> {
    let half = |offset: usize| -> u32 {
        match seg.data.get(offset..offset + 2) {
            Some(&[lo, hi]) => u32::from(u16::from_le_bytes([lo, hi])),
            _ => 0,
        }
    };
    let mut offset = 0usize;
    while offset + 1 < seg.data.len() {
        let word = half(offset) as u16;
        let len = word.insn_len() as usize;
        let ext = match len {
            2 => 0,
            4 => half(offset + 2),
            _ => half(offset + 2) | (half(offset + 4) << 16),
        };
        let bytes: Vec<String> = seg
            .data
            .iter()
            .skip(offset)
            .take(len)
            .map(|b| format!("{b:02x}"))
            .collect();
        println!(
            "{:08x}:  {:<18} {}",
            seg.addr as usize + offset,
            bytes.join(" "),
            disassemble(word, ext)?
        );
        offset += len;
    }
    Ok(())
}
