//! # Syscall Bridge Tests
//!
//! Each test places `syscall <nr>` at the program base with arguments in
//! `$r4..$r6` and checks the result register, the guest errno variable and the
//! resume address.

use std::os::fd::AsRawFd;
use std::path::Path;

use brewsim_core::common::data::AccessWidth;
use brewsim_core::common::reg::TypedReg;
use brewsim_core::sim::syscall::nr;
use brewsim_core::{HaltReason, SimError, StepOutcome};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::builder::instruction::{Program, SYSCALL};
use crate::common::harness::{PROGRAM_BASE, TestContext};

const ERRNO: u32 = 0x700;
const PATH: u32 = 0x800;
const BUF: u32 = 0x900;

const GUEST_O_WRONLY: u32 = 0x1;
const GUEST_O_CREAT: u32 = 0x200;
const GUEST_O_TRUNC: u32 = 0x400;

fn context() -> TestContext {
    let mut ctx = TestContext::new();
    ctx.set_reg(3, ERRNO);
    ctx
}

/// Issues a syscall with up to three arguments and returns `$r4`.
fn call(ctx: &mut TestContext, number: u16, args: &[u32]) -> u32 {
    for (i, arg) in args.iter().enumerate() {
        ctx.set_reg(4 + i, *arg);
    }
    assert_eq!(ctx.syscall(number), StepOutcome::Continue);
    ctx.get_reg(4)
}

fn put_path(ctx: &mut TestContext, path: &Path) {
    let mut bytes = path.to_str().expect("utf-8 temp path").as_bytes().to_vec();
    bytes.push(0);
    ctx.write_bytes(PATH, &bytes);
}

fn errno(ctx: &mut TestContext) -> i32 {
    ctx.read_word(ERRNO) as i32
}

#[test]
fn test_success_resumes_after_the_number() {
    let mut ctx = context();

    let ret = call(&mut ctx, nr::WRITE, &[1, BUF, 0]);

    assert_eq!(ret, 0);
    assert_eq!(ctx.pc(), PROGRAM_BASE + 4);
    assert_eq!(ctx.cpu().stats.syscalls, 1);
    assert_eq!(ctx.cpu().stats.taken, 1);
}

#[rstest]
#[case::line(&b"hi\n"[..])]
#[case::single_byte(&b"x"[..])]
fn test_write_returns_count_and_keeps_errno(#[case] data: &[u8]) {
    let file = tempfile::NamedTempFile::new().expect("temp file");
    let fd = file.as_file().as_raw_fd() as u32;
    let mut ctx = context();
    ctx.write_word(ERRNO, 0x5a5a);
    ctx.write_bytes(BUF, data);

    let ret = call(&mut ctx, nr::WRITE, &[fd, BUF, data.len() as u32]);

    assert_eq!(ret, data.len() as u32);
    assert_eq!(ctx.read_word(ERRNO), 0x5a5a);
    assert_eq!(ctx.pc(), PROGRAM_BASE + 4);
    assert_eq!(std::fs::read(file.path()).expect("written file"), data);
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("data.bin");
    let mut ctx = context();
    put_path(&mut ctx, &path);
    ctx.write_bytes(BUF, b"hello");

    let fd = call(&mut ctx, nr::OPEN, &[PATH, GUEST_O_WRONLY | GUEST_O_CREAT | GUEST_O_TRUNC, 0o644]);
    assert!(fd > 2 && fd != u32::MAX, "open returned {fd:#x}");
    assert_eq!(call(&mut ctx, nr::WRITE, &[fd, BUF, 5]), 5);
    assert_eq!(call(&mut ctx, nr::CLOSE, &[fd]), 0);
    assert_eq!(std::fs::read(&path).expect("written file"), b"hello");

    let fd = call(&mut ctx, nr::OPEN, &[PATH, 0, 0]);
    assert_eq!(call(&mut ctx, nr::LSEEK, &[fd, 1, 0]), 1);
    assert_eq!(call(&mut ctx, nr::READ, &[fd, BUF + 0x10, 16]), 4);
    assert_eq!(ctx.read_bytes(BUF + 0x10, 5), b"ello\0");
    assert_eq!(call(&mut ctx, nr::CLOSE, &[fd]), 0);

    assert_eq!(call(&mut ctx, nr::UNLINK, &[PATH]), 0);
    assert!(!path.exists());
}

#[test]
fn test_failure_stores_errno() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut ctx = context();
    put_path(&mut ctx, &dir.path().join("missing"));

    assert_eq!(call(&mut ctx, nr::OPEN, &[PATH, 0, 0]), u32::MAX);
    assert_eq!(errno(&mut ctx), libc::ENOENT);

    assert_eq!(call(&mut ctx, nr::CLOSE, &[987_654]), u32::MAX);
    assert_eq!(errno(&mut ctx), libc::EBADF);
}

#[test]
fn test_null_errno_pointer_skips_store() {
    let mut ctx = context();
    ctx.set_reg(3, 0);
    ctx.write_word(0, 0x1111);

    assert_eq!(call(&mut ctx, nr::CLOSE, &[987_654]), u32::MAX);

    assert_eq!(ctx.read_word(0), 0x1111);
}

#[test]
fn test_unaligned_errno_pointer_signals_bus_error() {
    let mut ctx = context();
    ctx.set_reg(3, ERRNO + 1);
    ctx.set_reg(4, 987_654);

    assert_eq!(ctx.syscall(nr::CLOSE), StepOutcome::Halted(HaltReason::Signalled(libc::SIGBUS)));

    assert_eq!(ctx.get_reg(4), u32::MAX);
    assert_eq!(ctx.read_word(ERRNO), 0);
}

#[rstest]
#[case::oversized_write(nr::WRITE, [1, BUF, (1 << 28) + 1])]
#[case::oversized_read(nr::READ, [0, BUF, (1 << 28) + 1])]
#[case::write_buffer_outside_ram(nr::WRITE, [1, 0x2_0000, 4])]
#[case::path_outside_ram(nr::UNLINK, [0x2_0000, 0, 0])]
fn test_bad_guest_buffers_fail_with_efault(#[case] number: u16, #[case] args: [u32; 3]) {
    let mut ctx = context();

    assert_eq!(call(&mut ctx, number, &args), u32::MAX);

    assert_eq!(errno(&mut ctx), libc::EFAULT);
}

#[test]
fn test_fstat_reports_overflow() {
    let mut ctx = context();

    assert_eq!(call(&mut ctx, nr::FSTAT, &[1, BUF]), u32::MAX);
    assert_eq!(errno(&mut ctx), libc::EOVERFLOW);
}

#[test]
fn test_isatty_on_a_file_is_false() {
    let file = tempfile::tempfile().expect("temp file");
    let fd = file.as_raw_fd() as u32;
    let mut ctx = context();

    assert_eq!(call(&mut ctx, nr::ISATTY, &[fd]), 0);
    assert_eq!(errno(&mut ctx), libc::ENOTTY);
}

#[test]
fn test_getpid_and_time() {
    let mut ctx = context();

    assert_eq!(call(&mut ctx, nr::GETPID, &[]), std::process::id());

    let before = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs() as u32;
    let now = call(&mut ctx, nr::TIME, &[BUF]);
    assert!(now >= before && now <= before + 5);
    assert_eq!(ctx.read_word(BUF), now);
}

#[rstest]
#[case::exit_status(nr::EXIT, HaltReason::Exited(42))]
#[case::legacy_argc(nr::ARGC, HaltReason::Signalled(libc::SIGTRAP))]
#[case::legacy_reconfig(nr::RECONFIG, HaltReason::Signalled(libc::SIGTRAP))]
#[case::unknown_number(999, HaltReason::Signalled(libc::SIGTRAP))]
fn test_halting_calls(#[case] number: u16, #[case] expected: HaltReason) {
    let mut ctx = context();
    ctx.set_reg(4, 42);
    for idx in [0, 5, 9, 14] {
        ctx.set_reg(idx, 0x1000 + idx as u32);
    }
    let before: Vec<TypedReg> = (0..15).map(|i| ctx.reg(i)).collect();

    assert_eq!(ctx.syscall(number), StepOutcome::Halted(expected));

    let after: Vec<TypedReg> = (0..15).map(|i| ctx.reg(i)).collect();
    assert_eq!(after, before);
}

#[rstest]
#[case::stat(nr::STAT)]
#[case::gettimeofday(nr::GETTIMEOFDAY)]
fn test_untranslated_layouts_are_host_faults(#[case] number: u16) {
    let mut ctx = context().load_program(PROGRAM_BASE, &Program::new().syscall(number));

    assert!(matches!(ctx.try_step(), Err(SimError::Unimplemented(_))));
}

#[test]
fn test_unreadable_number_signals_fetch_fault() {
    let mut ctx = context();
    let last = 0x1_0000 - 2;
    assert!(ctx.cpu_mut().model_mut().bus().write(last, AccessWidth::Half, u32::from(SYSCALL)));
    ctx.set_pc(last);

    assert_eq!(ctx.step(), StepOutcome::Halted(HaltReason::Signalled(libc::SIGSEGV)));
}
