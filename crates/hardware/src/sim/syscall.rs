//! Host Syscall Bridge.
//!
//! Services the `syscall` exception of a user-level environment on the host. It performs:
//! 1. **Number Fetch:** The 16-bit syscall number is the halfword immediately after the
//!    trapping opcode; the task program counter resumes 4 bytes past the opcode.
//! 2. **Argument Marshalling:** Arguments come from `$r4..$r7`, strings are read
//!    NUL-terminated from guest memory, and buffers are copied through host-side
//!    scratch buffers. Guest addresses are never handed to the host.
//! 3. **Result Delivery:** The return value goes to `$r4`. On failure the host errno is
//!    stored to the guest `errno` variable whose address is held in `$r3`. An
//!    unaligned `$r3` halts with `SIGBUS`.
//! 4. **Placeholders:** Calls whose data layouts are not translated fail with a fixed
//!    errno or abort the simulator; unknown numbers halt with `SIGTRAP`.

use std::ffi::CString;
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::common::data::AccessWidth;
use crate::common::error::{ExceptionCause, HaltReason, MemFault, SimError};
use crate::common::reg::TypedReg;
use crate::core::arch::mode::ExecMode;
use crate::core::cpu::state::ArchState;
use crate::isa::abi::{REG_ARG0, REG_ARG1, REG_ARG2, REG_ARG3, REG_SYSCALL_ERRNO};
use crate::soc::model::MachineModel;

/// Syscall numbers (newlib numbering, plus the brew-specific `isatty`).
pub mod nr {
    /// `exit(status)`
    pub const EXIT: u16 = 1;
    /// `open(path, flags, mode)`
    pub const OPEN: u16 = 2;
    /// `close(fd)`
    pub const CLOSE: u16 = 3;
    /// `read(fd, buf, len)`
    pub const READ: u16 = 4;
    /// `write(fd, buf, len)`
    pub const WRITE: u16 = 5;
    /// `lseek(fd, offset, whence)`
    pub const LSEEK: u16 = 6;
    /// `unlink(path)`
    pub const UNLINK: u16 = 7;
    /// `getpid()`
    pub const GETPID: u16 = 8;
    /// `kill(pid, sig)`
    pub const KILL: u16 = 9;
    /// `fstat(fd, buf)`
    pub const FSTAT: u16 = 10;
    /// Legacy argument-vector length query.
    pub const ARGVLEN: u16 = 12;
    /// Legacy argument-vector copy.
    pub const ARGV: u16 = 13;
    /// `chdir(path)`
    pub const CHDIR: u16 = 14;
    /// `stat(path, buf)`
    pub const STAT: u16 = 15;
    /// `chmod(path, mode)`
    pub const CHMOD: u16 = 16;
    /// `utime(path, times)`
    pub const UTIME: u16 = 17;
    /// `time(ptr)`
    pub const TIME: u16 = 18;
    /// `gettimeofday(tv, tz)`
    pub const GETTIMEOFDAY: u16 = 19;
    /// `times(buf)`
    pub const TIMES: u16 = 20;
    /// `link(old, new)`
    pub const LINK: u16 = 21;
    /// Legacy argument count query.
    pub const ARGC: u16 = 172;
    /// Legacy argument length query.
    pub const ARGNLEN: u16 = 173;
    /// Legacy argument copy.
    pub const ARGN: u16 = 174;
    /// Legacy reconfiguration call.
    pub const RECONFIG: u16 = 175;
    /// `isatty(fd)`
    pub const ISATTY: u16 = 256;
}

/// Guest `open()` flag bits and their host equivalents.
const OPEN_FLAGS: [(u32, libc::c_int); 12] = [
    (0x00_0001, libc::O_WRONLY),
    (0x00_0002, libc::O_RDWR),
    (0x00_0008, libc::O_APPEND),
    (0x00_0200, libc::O_CREAT),
    (0x00_0400, libc::O_TRUNC),
    (0x00_0800, libc::O_EXCL),
    (0x00_2000, libc::O_SYNC),
    (0x00_4000, libc::O_NONBLOCK),
    (0x00_8000, libc::O_NOCTTY),
    (0x04_0000, libc::O_CLOEXEC),
    (0x10_0000, libc::O_NOFOLLOW),
    (0x20_0000, libc::O_DIRECTORY),
];

/// Largest buffer a single `read`/`write` may transfer.
const MAX_TRANSFER: u32 = 1 << 28;

/// Translates guest `open()` flags into host flags. Unknown guest bits are dropped.
pub fn host_open_flags(guest: u32) -> libc::c_int {
    OPEN_FLAGS
        .iter()
        .filter(|(bit, _)| guest & bit != 0)
        .fold(libc::O_RDONLY, |acc, (_, host)| acc | host)
}

/// Result of one serviced syscall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Reply {
    /// Success; the value goes to `$r4`.
    Value(u32),
    /// Failure; `ret` goes to `$r4` and `errno` to the guest errno variable.
    Failed {
        /// Value returned to the guest.
        ret: u32,
        /// Host errno.
        errno: i32,
    },
    /// The run loop stops.
    Halt(HaltReason),
}

impl Reply {
    /// Converts a host return value, capturing errno when it signals failure.
    fn from_host(ret: i64) -> Self {
        if ret == -1 {
            Self::failed(last_errno())
        } else {
            Self::Value(ret as u32)
        }
    }

    const fn failed(errno: i32) -> Self {
        Self::Failed { ret: u32::MAX, errno }
    }
}

fn last_errno() -> i32 {
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Byte-wise access to task-mode guest memory through the machine model.
struct Guest<'a, M: ?Sized> {
    model: &'a mut M,
}

impl<M: MachineModel + ?Sized> Guest<'_, M> {
    fn read(&mut self, addr: u32, len: u32) -> Result<Vec<u8>, MemFault> {
        (0..len)
            .map(|i| {
                self.model
                    .read_mem(ExecMode::Task, addr.wrapping_add(i), AccessWidth::Byte)
                    .map(|b| b as u8)
            })
            .collect()
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), MemFault> {
        for (i, byte) in data.iter().enumerate() {
            self.model.write_mem(
                ExecMode::Task,
                addr.wrapping_add(i as u32),
                AccessWidth::Byte,
                u32::from(*byte),
            )?;
        }
        Ok(())
    }

    fn write_word(&mut self, addr: u32, value: u32) -> Result<(), MemFault> {
        self.model.write_mem(ExecMode::Task, addr, AccessWidth::Word, value)
    }

    fn read_cstr(&mut self, addr: u32) -> Result<CString, MemFault> {
        let mut bytes = Vec::new();
        let mut cursor = addr;
        loop {
            let byte = self.model.read_mem(ExecMode::Task, cursor, AccessWidth::Byte)? as u8;
            if byte == 0 {
                break;
            }
            bytes.push(byte);
            cursor = cursor.wrapping_add(1);
        }
        CString::new(bytes).map_err(|_| MemFault::new(ExceptionCause::MemAv, addr))
    }
}

/// Services the syscall trapped at `state.tpc`.
///
/// # Arguments
///
/// * `model` - The machine model providing guest memory.
/// * `state` - State with the `Syscall` cause latched; `ntpc`, `$r4` and guest memory
///   are updated.
///
/// # Returns
///
/// `Some(reason)` if the call halts the run loop (`exit`, unsupported numbers).
///
/// # Errors
///
/// Returns `SimError::Unimplemented` for calls whose host data layout is not translated.
pub fn handle<M: MachineModel + ?Sized>(
    model: &mut M,
    state: &mut ArchState,
) -> Result<Option<HaltReason>, SimError> {
    let tpc = state.tpc & !1;
    let number = match model.read_inst(ExecMode::Task, tpc.wrapping_add(2)) {
        Ok(number) => number,
        Err(fault) => {
            tracing::warn!(tpc = format_args!("{tpc:#x}"), "syscall number not readable");
            return Ok(Some(HaltReason::Signalled(fault.cause.signal())));
        }
    };
    state.ntpc = tpc.wrapping_add(4);

    let args = [REG_ARG0, REG_ARG1, REG_ARG2, REG_ARG3].map(|r| state.regs.read(r).value);
    let mut guest = Guest { model };
    let reply = dispatch(&mut guest, number, args)?;
    tracing::debug!(number, ?args, ?reply, "syscall");

    match reply {
        Reply::Value(value) => state.write_reg(REG_ARG0, TypedReg::int(value))?,
        Reply::Failed { ret, errno } => {
            state.write_reg(REG_ARG0, TypedReg::int(ret))?;
            let errno_addr = state.regs.read(REG_SYSCALL_ERRNO).value;
            if errno_addr & 3 != 0 {
                tracing::warn!(errno_addr = format_args!("{errno_addr:#x}"), "unaligned errno pointer");
                return Ok(Some(HaltReason::Signalled(libc::SIGBUS)));
            }
            if errno_addr != 0 {
                if let Err(fault) = guest.write_word(errno_addr, errno as u32) {
                    tracing::debug!(?fault, "errno store faulted");
                }
            }
        }
        Reply::Halt(reason) => return Ok(Some(reason)),
    }
    Ok(None)
}

fn dispatch<M: MachineModel + ?Sized>(
    guest: &mut Guest<'_, M>,
    number: u16,
    [arg1, arg2, arg3, _arg4]: [u32; 4],
) -> Result<Reply, SimError> {
    let fd = arg1 as libc::c_int;
    let reply = match number {
        nr::EXIT => Reply::Halt(HaltReason::Exited(arg1 as i32)),
        nr::OPEN => match guest.read_cstr(arg1) {
            // SAFETY: `path` is a NUL-terminated string that outlives the call.
            Ok(path) => Reply::from_host(i64::from(unsafe {
                libc::open(path.as_ptr(), host_open_flags(arg2), arg3 as libc::c_uint)
            })),
            Err(_) => Reply::failed(libc::EFAULT),
        },
        nr::CLOSE if fd <= 2 => Reply::Value(0),
        // SAFETY: closing a descriptor has no memory-safety preconditions.
        nr::CLOSE => Reply::from_host(i64::from(unsafe { libc::close(fd) })),
        nr::READ if arg3 > MAX_TRANSFER => Reply::failed(libc::EFAULT),
        nr::READ => {
            let mut buf = vec![0u8; arg3 as usize];
            // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
            let ret = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
            match usize::try_from(ret) {
                Ok(n) => match buf.get(..n).map(|data| guest.write(arg2, data)) {
                    Some(Ok(())) => Reply::Value(n as u32),
                    _ => Reply::failed(libc::EFAULT),
                },
                Err(_) => Reply::failed(last_errno()),
            }
        }
        nr::WRITE if arg3 > MAX_TRANSFER => Reply::failed(libc::EFAULT),
        nr::WRITE => match guest.read(arg2, arg3) {
            // SAFETY: `data` is valid for reads of `data.len()` bytes.
            Ok(data) => Reply::from_host(unsafe {
                libc::write(fd, data.as_ptr().cast(), data.len())
            } as i64),
            Err(_) => Reply::failed(libc::EFAULT),
        },
        nr::LSEEK => {
            let offset = libc::off_t::from(arg2 as i32);
            // SAFETY: seeking has no memory-safety preconditions.
            Reply::from_host(i64::from(unsafe { libc::lseek(fd, offset, arg3 as libc::c_int) }))
        }
        nr::UNLINK => with_path(guest, arg1, |path| {
            // SAFETY: `path` is a NUL-terminated string that outlives the call.
            unsafe { libc::unlink(path.as_ptr()) }
        }),
        nr::GETPID => Reply::Value(std::process::id()),
        // SAFETY: sending a signal has no memory-safety preconditions.
        nr::KILL => Reply::from_host(i64::from(unsafe {
            libc::kill(arg1 as libc::pid_t, arg2 as libc::c_int)
        })),
        nr::FSTAT => Reply::failed(libc::EOVERFLOW),
        nr::CHDIR => with_path(guest, arg1, |path| {
            // SAFETY: `path` is a NUL-terminated string that outlives the call.
            unsafe { libc::chdir(path.as_ptr()) }
        }),
        nr::CHMOD => with_path(guest, arg1, |path| {
            // SAFETY: `path` is a NUL-terminated string that outlives the call.
            unsafe { libc::chmod(path.as_ptr(), arg2 as libc::mode_t) }
        }),
        nr::LINK => match (guest.read_cstr(arg1), guest.read_cstr(arg2)) {
            // SAFETY: both paths are NUL-terminated strings that outlive the call.
            (Ok(old), Ok(new)) => Reply::from_host(i64::from(unsafe {
                libc::link(old.as_ptr(), new.as_ptr())
            })),
            _ => Reply::failed(libc::EFAULT),
        },
        nr::TIME => {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()) as u32;
            if arg1 != 0 && guest.write_word(arg1, now).is_err() {
                Reply::failed(libc::EFAULT)
            } else {
                Reply::Value(now)
            }
        }
        nr::ISATTY => {
            // SAFETY: querying a descriptor has no memory-safety preconditions.
            let ret = unsafe { libc::isatty(fd) };
            if ret == 0 {
                Reply::Failed { ret: 0, errno: last_errno() }
            } else {
                Reply::Value(ret as u32)
            }
        }
        nr::STAT => return Err(SimError::Unimplemented("stat syscall")),
        nr::UTIME => return Err(SimError::Unimplemented("utime syscall")),
        nr::GETTIMEOFDAY => return Err(SimError::Unimplemented("gettimeofday syscall")),
        nr::TIMES => return Err(SimError::Unimplemented("times syscall")),
        other => {
            tracing::warn!(number = other, "unsupported syscall");
            Reply::Halt(HaltReason::Signalled(libc::SIGTRAP))
        }
    };
    Ok(reply)
}

/// Runs a host call taking one guest path; a faulting path read fails with `EFAULT`.
fn with_path<M: MachineModel + ?Sized>(
    guest: &mut Guest<'_, M>,
    addr: u32,
    call: impl FnOnce(&CString) -> libc::c_int,
) -> Reply {
    match guest.read_cstr(addr) {
        Ok(path) => Reply::from_host(i64::from(call(&path))),
        Err(_) => Reply::failed(libc::EFAULT),
    }
}
