//! Console device.
//!
//! A byte-wide serial console occupying five one-byte registers. Writes to the
//! data register go to the host's stdout (or stderr); reads return the next
//! received byte, or 0 when nothing is pending. Received bytes come from a
//! background thread reading the host's stdin, or from `push_input` when no thread is attached.
//!
//! # Registers
//!
//! * `0x00`: Data (read: received byte, write: transmit)
//! * `0x01`: Status (bit 0: RX full, bit 1: TX empty)
//! * `0x02`: Config 1 (stored, no effect)
//! * `0x03`: Config 2 (stored, no effect)
//! * `0x04`: Clock divider (stored, no effect)

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Mutex;
use std::sync::mpsc::{Receiver, channel};
use std::thread;

use crate::soc::traits::Device;

/// Data register offset.
pub const REG_DATA: u32 = 0;
/// Status register offset.
pub const REG_STATUS: u32 = 1;
/// First configuration register offset.
pub const REG_CONFIG1: u32 = 2;
/// Second configuration register offset.
pub const REG_CONFIG2: u32 = 3;
/// Clock divider register offset.
pub const REG_DIVIDER: u32 = 4;

/// Number of bytes the console occupies.
pub const CONSOLE_SIZE: u32 = 5;

/// Status: a received byte is waiting in the data register.
pub const STAT_RX_FULL: u8 = 0x01;
/// Status: the transmitter accepts a byte.
pub const STAT_TX_EMPTY: u8 = 0x02;

/// Where transmitted bytes go.
pub type ConsoleSink = Box<dyn Write + Send>;

/// Console device structure.
pub struct Console {
    base_addr: u32,
    rx_queue: VecDeque<u8>,
    rx_receiver: Option<Mutex<Receiver<u8>>>,
    config1: u8,
    config2: u8,
    divider: u8,
    sink: ConsoleSink,
}

impl Console {
    /// Creates a console writing to `sink`, with no input source attached.
    ///
    /// # Arguments
    ///
    /// * `base_addr` - Base physical address of the registers.
    /// * `sink` - Destination of transmitted bytes.
    pub fn new(base_addr: u32, sink: ConsoleSink) -> Self {
        Self {
            base_addr,
            rx_queue: VecDeque::new(),
            rx_receiver: None,
            config1: 0,
            config2: 0,
            divider: 0,
            sink,
        }
    }

    /// Creates a console on the host's stdout or stderr that reads the host's stdin.
    ///
    /// Spawns a background thread feeding received bytes to the device.
    pub fn with_host_io(base_addr: u32, to_stderr: bool) -> Self {
        let sink: ConsoleSink = if to_stderr {
            Box::new(io::stderr())
        } else {
            Box::new(io::stdout())
        };
        let (tx, rx) = channel();
        let _reader = thread::spawn(move || {
            let mut buffer = [0u8; 1];
            let stdin = io::stdin();
            let mut handle = stdin.lock();
            while handle.read_exact(&mut buffer).is_ok() {
                if tx.send(buffer[0]).is_err() {
                    break;
                }
            }
        });
        let mut console = Self::new(base_addr, sink);
        console.rx_receiver = Some(Mutex::new(rx));
        console
    }

    /// Queues a byte as if it had been received.
    pub fn push_input(&mut self, byte: u8) {
        self.rx_queue.push_back(byte);
    }

    fn poll_input(&mut self) {
        if let Some(rx) = &self.rx_receiver {
            if let Ok(rx) = rx.lock() {
                self.rx_queue.extend(rx.try_iter());
            }
        }
    }

    fn status(&mut self) -> u8 {
        self.poll_input();
        let rx = if self.rx_queue.is_empty() { 0 } else { STAT_RX_FULL };
        rx | STAT_TX_EMPTY
    }

    fn read_reg(&mut self, offset: u32) -> Option<u8> {
        match offset {
            REG_DATA => {
                self.poll_input();
                Some(self.rx_queue.pop_front().unwrap_or(0))
            }
            REG_STATUS => Some(self.status()),
            REG_CONFIG1 => Some(self.config1),
            REG_CONFIG2 => Some(self.config2),
            REG_DIVIDER => Some(self.divider),
            _ => None,
        }
    }

    fn write_reg(&mut self, offset: u32, val: u8) -> bool {
        match offset {
            REG_DATA => {
                if let Err(e) = self.sink.write_all(&[val]).and_then(|()| self.sink.flush()) {
                    tracing::warn!(error = %e, "console output failed");
                }
            }
            REG_CONFIG1 => self.config1 = val,
            REG_CONFIG2 => self.config2 = val,
            REG_DIVIDER => self.divider = val,
            _ => return false,
        }
        true
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("base_addr", &format_args!("{:#x}", self.base_addr))
            .field("pending_rx", &self.rx_queue.len())
            .finish_non_exhaustive()
    }
}

impl Device for Console {
    fn name(&self) -> &str {
        "CONSOLE"
    }

    fn address_range(&self) -> (u32, u32) {
        (self.base_addr, CONSOLE_SIZE)
    }

    /// Registers are one byte wide; wider accesses are not decoded.
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> bool {
        let [byte] = buf else { return false };
        match self.read_reg(offset) {
            Some(val) => {
                *byte = val;
                true
            }
            None => false,
        }
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> bool {
        let [byte] = data else { return false };
        self.write_reg(offset, *byte)
    }
}
