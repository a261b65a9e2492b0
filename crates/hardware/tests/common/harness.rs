use std::sync::Once;

use brewsim_core::common::data::AccessWidth;
use brewsim_core::common::reg::{RegType, TypedReg};
use brewsim_core::config::{Config, Environment};
use brewsim_core::core::arch::mode::ExecMode;
use brewsim_core::core::cpu::trace::Tracer;
use brewsim_core::soc::model::GenericModel;
use brewsim_core::{Cpu, HaltReason, MachineModel, SimError, Simulator, StepOutcome};
use tracing_subscriber::EnvFilter;

use crate::common::builder::instruction::{Program, SYSCALL};
use crate::common::mocks::SharedBuf;

/// Size of the RAM every default context gets.
pub const RAM_SIZE: usize = 0x1_0000;

/// Where programs are placed unless a test says otherwise.
pub const PROGRAM_BASE: u32 = 0x100;

static TRACING: Once = Once::new();

/// Routes simulator log events to the test writer; filter with `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub struct TestContext {
    pub sim: Simulator,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// User environment on the generic model with 64 KiB of RAM at 0.
    pub fn new() -> Self {
        Self::with_env(Environment::User)
    }

    pub fn with_env(env: Environment) -> Self {
        let mut config = Config::default();
        config.general.environment = env;
        config.memory.ram_size = RAM_SIZE;
        Self::with_model(&config, Box::new(GenericModel::new(0, RAM_SIZE)))
    }

    pub fn with_model(config: &Config, model: Box<dyn MachineModel>) -> Self {
        init_tracing();
        let sim = Simulator::with_model(config, model).expect("model setup");
        Self { sim }
    }

    /// Convenience accessor for the CPU.
    pub fn cpu(&self) -> &Cpu {
        &self.sim.cpu
    }

    /// Mutable convenience accessor for the CPU.
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.sim.cpu
    }

    /// Places `program` at `addr` and points the active PC at it.
    pub fn load_program(mut self, addr: u32, program: &Program) -> Self {
        self.write_bytes(addr, program.bytes());
        self.set_pc(addr);
        self
    }

    /// Captures the instruction trace into the returned buffer.
    pub fn capture_trace(&mut self) -> SharedBuf {
        let buf = SharedBuf::default();
        self.sim.cpu.set_tracer(Some(Tracer::new(Box::new(buf.clone()))));
        buf
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.sim.cpu.state.set_pc(pc);
    }

    pub fn pc(&self) -> u32 {
        self.sim.cpu.state.pc()
    }

    pub fn set_mode(&mut self, mode: ExecMode) {
        self.sim.cpu.state.set_mode(mode);
    }

    /// Writes an int32 value.
    pub fn set_reg(&mut self, idx: usize, value: u32) {
        self.set_typed(idx, value, RegType::Int32);
    }

    pub fn set_typed(&mut self, idx: usize, value: u32, ty: RegType) {
        self.sim
            .cpu
            .state
            .write_reg(idx, TypedReg::new(value, ty))
            .expect("register index in range");
    }

    pub fn reg(&self, idx: usize) -> TypedReg {
        self.sim.cpu.state.regs.read(idx)
    }

    pub fn get_reg(&self, idx: usize) -> u32 {
        self.reg(idx).value
    }

    pub fn write_bytes(&mut self, addr: u32, data: &[u8]) {
        assert!(
            self.sim.cpu.model_mut().bus().load_binary_at(data, addr),
            "write to unmapped address {addr:#x}"
        );
    }

    pub fn read_bytes(&mut self, addr: u32, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        assert!(
            self.sim.cpu.model_mut().bus().read_bytes(addr, &mut buf),
            "read from unmapped address {addr:#x}"
        );
        buf
    }

    pub fn write_word(&mut self, addr: u32, value: u32) {
        assert!(self.sim.cpu.model_mut().bus().write(addr, AccessWidth::Word, value));
    }

    pub fn read_word(&mut self, addr: u32) -> u32 {
        self.sim
            .cpu
            .model_mut()
            .bus()
            .read(addr, AccessWidth::Word)
            .expect("mapped word")
    }

    /// Retires one instruction; host faults fail the test.
    pub fn step(&mut self) -> StepOutcome {
        self.try_step().expect("host fault")
    }

    pub fn try_step(&mut self) -> Result<StepOutcome, SimError> {
        self.sim.step()
    }

    /// Runs at most `max_steps` instructions.
    pub fn run(&mut self, max_steps: u64) -> Option<HaltReason> {
        self.sim.run_for(max_steps).expect("host fault")
    }

    /// Places `syscall nr` at `pc` and retires it.
    pub fn syscall_at(&mut self, pc: u32, nr: u16) -> StepOutcome {
        let program = Program::new().op16(SYSCALL, nr);
        self.write_bytes(pc, program.bytes());
        self.set_pc(pc);
        self.step()
    }

    /// `syscall_at` the default program base.
    pub fn syscall(&mut self, nr: u16) -> StepOutcome {
        self.syscall_at(PROGRAM_BASE, nr)
    }
}
