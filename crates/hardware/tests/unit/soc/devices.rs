//! # Device and Bus Tests
//!
//! Bus routing and boundary checks with a recording device, the console and
//! GPIO register files, and guest code driving them through the peripheral model.

use brewsim_core::common::data::AccessWidth;
use brewsim_core::config::{Config, Environment, ModelKind};
use brewsim_core::soc::devices::console::{
    CONSOLE_SIZE, REG_CONFIG1, REG_DATA, REG_DIVIDER, REG_STATUS, STAT_RX_FULL, STAT_TX_EMPTY,
};
use brewsim_core::soc::devices::gpio::GPIO_SIM_FLAGS;
use brewsim_core::soc::devices::{Console, Gpio};
use brewsim_core::soc::interconnect::Bus;
use brewsim_core::soc::memory::Ram;
use brewsim_core::soc::model::PeripheralModel;
use brewsim_core::{HaltReason, MachineModel, build_model};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::builder::instruction::{Program, mem, mem_op};
use crate::common::harness::{PROGRAM_BASE, RAM_SIZE, TestContext};
use crate::common::mocks::{Access, RecordingDevice, SharedBuf};

const CONSOLE_BASE: u32 = 0x4000_0000;
const GPIO_BASE: u32 = 0x4000_1000;
const RECORDER_BASE: u32 = 0x1000;

fn console_bus(console: Console) -> Bus {
    let mut bus = Bus::new();
    bus.add_device(Box::new(console));
    bus
}

// ─── Bus ────────────────────────────────────────────────────────────────────

#[test]
fn test_bus_routes_by_address() {
    let mut bus = Bus::new();
    let recorder = RecordingDevice::new(RECORDER_BASE, 0x10);
    let log = recorder.log();
    bus.add_device(Box::new(recorder));
    bus.add_device(Box::new(Ram::new(0, 0x100)));

    assert!(bus.write(RECORDER_BASE + 4, AccessWidth::Half, 0xbeef));
    assert_eq!(bus.read(RECORDER_BASE + 4, AccessWidth::Word), Some(0xbeef));
    assert!(bus.write(0x10, AccessWidth::Word, 7));

    assert_eq!(bus.device_names(), vec!["RAM".to_owned(), "RECORDER".to_owned()]);
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            Access::Write { offset: 4, data: vec![0xef, 0xbe] },
            Access::Read { offset: 4, len: 4 },
        ]
    );
}

#[rstest]
#[case::unmapped(0x5000)]
#[case::straddles_end(RECORDER_BASE + 0xe)]
#[case::straddles_gap(0xfe)]
fn test_bus_rejects_partial_mappings(#[case] addr: u32) {
    let mut bus = Bus::new();
    let recorder = RecordingDevice::new(RECORDER_BASE, 0x10);
    let log = recorder.log();
    bus.add_device(Box::new(recorder));
    bus.add_device(Box::new(Ram::new(0, 0x100)));

    assert_eq!(bus.read(addr, AccessWidth::Word), None);
    assert!(!bus.write(addr, AccessWidth::Word, 0));
    assert!(!bus.is_valid_address(addr, 4));
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_device_exit_request_is_taken_once() {
    let mut bus = Bus::new();
    bus.add_device(Box::new(RecordingDevice::new(RECORDER_BASE, 0x10).with_exit_register(0xc)));

    assert!(bus.write(RECORDER_BASE + 0xc, AccessWidth::Byte, 3));

    assert_eq!(bus.take_exit(), Some(HaltReason::Exited(3)));
    assert_eq!(bus.take_exit(), None);
}

#[test]
fn test_binary_load_spanning_devices_falls_back_to_bytes() {
    let mut bus = Bus::new();
    bus.add_device(Box::new(Ram::new(0, 0x10)));
    bus.add_device(Box::new(Ram::new(0x10, 0x10)));

    assert!(bus.load_binary_at(&[1, 2, 3, 4], 0xe));
    assert_eq!(bus.read(0x10, AccessWidth::Half), Some(0x0403));
    assert!(!bus.load_binary_at(&[1, 2, 3, 4], 0x1e));
}

// ─── Console ────────────────────────────────────────────────────────────────

#[test]
fn test_console_transmits_bytes() {
    let out = SharedBuf::default();
    let mut bus = console_bus(Console::new(CONSOLE_BASE, Box::new(out.clone())));

    for byte in b"ok\n" {
        assert!(bus.write(CONSOLE_BASE + REG_DATA, AccessWidth::Byte, u32::from(*byte)));
    }

    assert_eq!(out.text(), "ok\n");
}

#[test]
fn test_console_status_tracks_receive_queue() {
    let mut console = Console::new(CONSOLE_BASE, Box::new(SharedBuf::default()));
    console.push_input(b'x');
    let mut bus = console_bus(console);
    let status = |bus: &mut Bus| bus.read(CONSOLE_BASE + REG_STATUS, AccessWidth::Byte);

    assert_eq!(status(&mut bus), Some(u32::from(STAT_RX_FULL | STAT_TX_EMPTY)));
    assert_eq!(bus.read(CONSOLE_BASE + REG_DATA, AccessWidth::Byte), Some(u32::from(b'x')));
    assert_eq!(status(&mut bus), Some(u32::from(STAT_TX_EMPTY)));
    // Reading an empty receive register yields zero.
    assert_eq!(bus.read(CONSOLE_BASE + REG_DATA, AccessWidth::Byte), Some(0));
}

#[rstest]
#[case::config1(REG_CONFIG1)]
#[case::divider(REG_DIVIDER)]
fn test_console_configuration_registers_hold_values(#[case] reg: u32) {
    let mut bus = console_bus(Console::new(CONSOLE_BASE, Box::new(SharedBuf::default())));

    assert!(bus.write(CONSOLE_BASE + reg, AccessWidth::Byte, 0x5a));

    assert_eq!(bus.read(CONSOLE_BASE + reg, AccessWidth::Byte), Some(0x5a));
}

#[test]
fn test_console_rejects_wide_and_out_of_range_accesses() {
    let mut bus = console_bus(Console::new(CONSOLE_BASE, Box::new(SharedBuf::default())));

    assert_eq!(bus.read(CONSOLE_BASE, AccessWidth::Word), None);
    assert_eq!(bus.read(CONSOLE_BASE + CONSOLE_SIZE, AccessWidth::Byte), None);
    assert!(!bus.write(CONSOLE_BASE + REG_STATUS, AccessWidth::Byte, 0));
}

// ─── GPIO ───────────────────────────────────────────────────────────────────

#[rstest]
#[case::plain(false, None)]
#[case::terminating(true, Some(HaltReason::Exited(9)))]
fn test_gpio_write(#[case] terminate: bool, #[case] expected: Option<HaltReason>) {
    let mut bus = Bus::new();
    bus.add_device(Box::new(Gpio::new(GPIO_BASE, terminate)));

    assert_eq!(bus.read(GPIO_BASE, AccessWidth::Byte), Some(u32::from(GPIO_SIM_FLAGS)));
    assert!(bus.write(GPIO_BASE, AccessWidth::Byte, 9));

    assert_eq!(bus.take_exit(), expected);
}

// ─── Peripheral model ───────────────────────────────────────────────────────

fn peripheral_context(out: &SharedBuf) -> TestContext {
    let mut config = Config::default();
    config.memory.ram_size = RAM_SIZE;
    let console = Console::new(CONSOLE_BASE, Box::new(out.clone()));
    let model = PeripheralModel::new(0, RAM_SIZE, console, vec![Gpio::new(GPIO_BASE, true)]);
    TestContext::with_model(&config, Box::new(model))
}

#[test]
fn test_guest_prints_then_terminates_through_gpio() {
    let out = SharedBuf::default();
    let program = Program::new()
        .op(mem(mem_op::LD8, 7, 12))
        .op(mem(mem_op::ST8, 4, 10))
        .op(mem(mem_op::ST8, 5, 10))
        .op(mem(mem_op::ST8, 6, 11));
    let mut ctx = peripheral_context(&out).load_program(PROGRAM_BASE, &program);
    ctx.set_reg(4, u32::from(b'h'));
    ctx.set_reg(5, u32::from(b'i'));
    ctx.set_reg(6, 5);
    ctx.set_reg(10, CONSOLE_BASE + REG_DATA);
    ctx.set_reg(11, GPIO_BASE);
    ctx.set_reg(12, CONSOLE_BASE + REG_STATUS);

    let halt = ctx.run(100);

    assert_eq!(halt, Some(HaltReason::Exited(5)));
    assert_eq!(out.text(), "hi");
    assert_eq!(ctx.get_reg(7), u32::from(STAT_TX_EMPTY));
    assert_eq!(ctx.cpu().stats.instructions_retired, 4);
}

#[test]
fn test_wide_console_access_faults_guest() {
    let out = SharedBuf::default();
    let program = Program::new().op(mem(mem_op::LD32, 7, 12));
    let mut ctx = peripheral_context(&out).load_program(PROGRAM_BASE, &program);
    ctx.set_reg(12, CONSOLE_BASE);

    assert_eq!(ctx.run(1), Some(HaltReason::Signalled(libc::SIGSEGV)));
}

#[rstest]
#[case::generic(ModelKind::Generic, "generic")]
#[case::protected(ModelKind::Protected, "protected")]
fn test_build_model_selects_kind(#[case] kind: ModelKind, #[case] name: &str) {
    let mut config = Config::default();
    config.general.model = kind;
    config.general.environment = Environment::Operating;
    config.memory.ram_size = RAM_SIZE;

    let mut model = build_model(&config);

    assert_eq!(model.name(), name);
    assert!(model.bus().is_valid_address(0, RAM_SIZE as u32));
}
