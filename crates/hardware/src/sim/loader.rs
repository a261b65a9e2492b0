//! Program Loader and Argument Setup.
//!
//! This module prepares guest memory before the first instruction. It performs:
//! 1. **Image Parsing:** ELF32 executables are parsed with the `object` crate; every
//!    loadable segment becomes a [`Segment`] and the ELF entry point becomes the start PC.
//!    Anything else is treated as a raw binary placed at address 0 with entry 0.
//! 2. **Placement:** Segments are copied onto the bus at their physical addresses.
//! 3. **Argument Block:** For ELF images the guest argv block is written at address 0:
//!
//! ```text
//! 0x00000000  zero word
//! 0x00000004  argc
//! 0x00000008  argv[0] .. argv[argc-1]
//!             NULL
//!             NUL-terminated argument strings
//! ```

use std::fs;
use std::path::Path;

use object::read::elf::ElfFile32;
use object::{Endianness, Object, ObjectSegment};

use crate::common::error::SimError;
use crate::soc::interconnect::Bus;

/// ELF identification bytes.
const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

/// One contiguous block of the program image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Load address.
    pub addr: u32,
    /// Initialized contents; memory past the end stays zero.
    pub data: Vec<u8>,
}

/// A parsed program ready for placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramImage {
    /// Initial task program counter.
    pub entry: u32,
    /// Loadable segments.
    pub segments: Vec<Segment>,
    /// Whether the image came from an ELF file.
    pub is_elf: bool,
}

impl ProgramImage {
    /// Parses an ELF32 executable, or wraps raw bytes as a binary image at address 0.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Elf` for a malformed ELF file or a segment outside the
    /// 32-bit address space.
    pub fn parse(data: &[u8]) -> Result<Self, SimError> {
        if !data.starts_with(ELF_MAGIC) {
            return Ok(Self {
                entry: 0,
                segments: vec![Segment { addr: 0, data: data.to_vec() }],
                is_elf: false,
            });
        }
        let elf = ElfFile32::<Endianness>::parse(data)?;
        let mut segments = Vec::new();
        for seg in elf.segments() {
            let bytes = seg.data()?;
            if bytes.is_empty() {
                continue;
            }
            let addr = u32::try_from(seg.address())
                .map_err(|_| SimError::Elf(format!("segment address {:#x} out of range", seg.address())))?;
            segments.push(Segment { addr, data: bytes.to_vec() });
        }
        let entry = u32::try_from(elf.entry())
            .map_err(|_| SimError::Elf(format!("entry point {:#x} out of range", elf.entry())))?;
        Ok(Self { entry, segments, is_elf: true })
    }

    /// Reads and parses a program file.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Io` if the file cannot be read, or a parse error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let data = fs::read(path)?;
        Self::parse(&data)
    }

    /// Copies every segment onto the bus.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Elf` if a segment does not fit in mapped memory.
    pub fn place(&self, bus: &mut Bus) -> Result<(), SimError> {
        for seg in &self.segments {
            if !bus.load_binary_at(&seg.data, seg.addr) {
                return Err(SimError::Elf(format!(
                    "segment at {:#x} ({} bytes) does not fit in memory",
                    seg.addr,
                    seg.data.len()
                )));
            }
            tracing::debug!(addr = format_args!("{:#x}", seg.addr), len = seg.data.len(), "segment loaded");
        }
        Ok(())
    }
}

/// Builds the guest argv block.
///
/// # Returns
///
/// The block contents, to be placed at address 0.
pub fn argv_block(args: &[String]) -> Vec<u8> {
    let argc = args.len() as u32;
    let mut block = Vec::new();
    block.extend_from_slice(&0u32.to_le_bytes());
    block.extend_from_slice(&argc.to_le_bytes());
    let mut tp = 4 + 4 + argc * 4 + 4;
    for arg in args {
        block.extend_from_slice(&tp.to_le_bytes());
        tp += arg.len() as u32 + 1;
    }
    block.extend_from_slice(&0u32.to_le_bytes());
    for arg in args {
        block.extend_from_slice(arg.as_bytes());
        block.push(0);
    }
    block
}

/// Writes the argv block at address 0.
///
/// # Errors
///
/// Returns `SimError::Elf` if the block does not fit in mapped memory.
pub fn write_argv_block(bus: &mut Bus, args: &[String]) -> Result<(), SimError> {
    let block = argv_block(args);
    if bus.write_bytes(0, &block) {
        Ok(())
    } else {
        Err(SimError::Elf(format!("argument block of {} bytes does not fit", block.len())))
    }
}
