//! # CSR Tests
//!
//! The universal CSR latch, the instruction path that reaches it, and the
//! window registers only the protected model implements.

use brewsim_core::SimError;
use brewsim_core::common::reg::{RegType, TypedReg};
use brewsim_core::config::{Config, Environment};
use brewsim_core::core::arch::csr::{self, CsrLatch};
use brewsim_core::core::arch::mode::ExecMode;
use brewsim_core::soc::model::ProtectedModel;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::builder::instruction::Program;
use crate::common::harness::{PROGRAM_BASE, RAM_SIZE, TestContext};

fn scheduler_context() -> TestContext {
    TestContext::with_env(Environment::Operating)
}

fn protected_context() -> TestContext {
    let mut config = Config::default();
    config.general.environment = Environment::Operating;
    config.memory.ram_size = RAM_SIZE;
    TestContext::with_model(&config, Box::new(ProtectedModel::new(0, RAM_SIZE)))
}

#[test]
fn test_latch_eaddr_round_trip() {
    let mut latch = CsrLatch::default();
    assert_eq!(latch.write(csr::EADDR, 0x1234).ok(), Some(true));
    assert_eq!(latch.read(ExecMode::Scheduler, csr::EADDR).ok().flatten(), Some(0x1234));
    // EADDR is not consumed by reading.
    assert_eq!(latch.read(ExecMode::Scheduler, csr::EADDR).ok().flatten(), Some(0x1234));
}

#[rstest]
#[case::arch_id(csr::ARCH_ID)]
#[case::capability(csr::CAPABILITY)]
fn test_read_only_registers_ignore_writes(#[case] addr: u32) {
    let mut latch = CsrLatch::default();
    assert_eq!(latch.write(addr, 0xffff_ffff).ok(), Some(true));
    assert_eq!(latch.read(ExecMode::Scheduler, addr).ok().flatten(), Some(0));
}

#[test]
fn test_ecause_read_consumes_cause() {
    let mut latch = CsrLatch { ecause: 0x41, eaddr: 0 };
    assert_eq!(latch.read(ExecMode::Task, csr::ECAUSE).ok().flatten(), Some(0x8000_0041));
    assert_eq!(latch.read(ExecMode::Task, csr::ECAUSE).ok().flatten(), Some(0x8000_0000));
}

#[test]
fn test_fp_status_is_unimplemented() {
    let mut latch = CsrLatch::default();
    assert!(matches!(
        latch.read(ExecMode::Scheduler, csr::FP_STATUS),
        Err(SimError::Unimplemented(_))
    ));
    assert!(matches!(latch.write(csr::FP_STATUS, 0), Err(SimError::Unimplemented(_))));
}

#[test]
fn test_window_addresses_are_left_to_the_model() {
    let mut latch = CsrLatch::default();
    assert_eq!(latch.read(ExecMode::Scheduler, csr::DATA_BASE).ok().flatten(), None);
    assert_eq!(latch.write(csr::DATA_BASE, 0).ok(), Some(false));
}

#[test]
fn test_csr_instructions_reach_the_latch() {
    let program = Program::new()
        .csr_write(4, csr::EADDR)
        .csr_read(5, csr::EADDR);
    let mut ctx = scheduler_context().load_program(PROGRAM_BASE, &program);
    ctx.set_reg(4, 0xcafe);
    ctx.set_typed(5, 0, RegType::Fp32);

    let _ = ctx.step();
    let _ = ctx.step();

    assert_eq!(ctx.cpu().state.csr.eaddr, 0xcafe);
    // A CSR read keeps the destination's type.
    assert_eq!(ctx.reg(5), TypedReg::new(0xcafe, RegType::Fp32));
}

#[test]
fn test_task_mode_ecause_read_sets_flag() {
    let program = Program::new().csr_read(4, csr::ECAUSE);
    let mut ctx = scheduler_context().load_program(PROGRAM_BASE, &program);
    ctx.set_mode(ExecMode::Task);
    ctx.set_pc(PROGRAM_BASE);

    let _ = ctx.step();

    assert_eq!(ctx.get_reg(4), 0x8000_0000);
}

#[test]
fn test_generic_model_rejects_window_registers() {
    let program = Program::new().csr_read(4, csr::INST_BASE);
    let mut ctx = scheduler_context().load_program(PROGRAM_BASE, &program);

    let result = ctx.try_step();

    assert!(matches!(result, Err(SimError::UnknownCsr { addr: 0x80 })));
}

#[test]
fn test_unknown_csr_is_a_host_fault() {
    let program = Program::new().csr_write(4, 0x123);
    let mut ctx = scheduler_context().load_program(PROGRAM_BASE, &program);

    let result = ctx.try_step();

    assert!(matches!(result, Err(SimError::UnknownCsr { addr: 0x123 })));
}

#[rstest]
#[case::inst_base(csr::INST_BASE, 0x0000_8000)]
#[case::inst_limit(csr::INST_LIMIT, 0x0000_0c00)]
#[case::data_base(csr::DATA_BASE, 0x0001_0000)]
#[case::data_limit(csr::DATA_LIMIT, 0x0000_7fff)]
fn test_protected_window_registers(#[case] addr: u32, #[case] value: u32) {
    let program = Program::new().csr_write(4, addr).csr_read(5, addr);
    let mut ctx = protected_context().load_program(PROGRAM_BASE, &program);
    ctx.set_reg(4, value);

    let _ = ctx.step();
    let _ = ctx.step();

    assert_eq!(ctx.get_reg(5), value);
}
