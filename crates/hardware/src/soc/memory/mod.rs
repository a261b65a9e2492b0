//! Physical System Memory (RAM).
//!
//! This module implements the main system memory device. It provides:
//! 1. **Storage:** A zero-initialized byte buffer sized by configuration.
//! 2. **Device:** Bus access at byte granularity relative to the mapped base.
//! 3. **Loading:** Bulk copies used by the program loader.

use crate::soc::traits::Device;

/// System RAM mapped at a physical base address.
#[derive(Clone, PartialEq, Eq)]
pub struct Ram {
    bytes: Vec<u8>,
    base_addr: u32,
}

impl Ram {
    /// Creates a zero-filled RAM region.
    ///
    /// # Arguments
    ///
    /// * `base_addr` - Starting physical address.
    /// * `size` - Size in bytes.
    pub fn new(base_addr: u32, size: usize) -> Self {
        Self { bytes: vec![0; size], base_addr }
    }

    /// Returns the size of the region in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for a zero-sized region.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn span(&self, offset: u32, len: usize) -> Option<std::ops::Range<usize>> {
        let start = offset as usize;
        let end = start.checked_add(len)?;
        (end <= self.bytes.len()).then_some(start..end)
    }
}

impl std::fmt::Debug for Ram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ram")
            .field("base_addr", &format_args!("{:#x}", self.base_addr))
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl Device for Ram {
    fn name(&self) -> &str {
        "RAM"
    }

    fn address_range(&self) -> (u32, u32) {
        (self.base_addr, self.bytes.len() as u32)
    }

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> bool {
        match self.span(offset, buf.len()) {
            Some(range) => {
                buf.copy_from_slice(&self.bytes[range]);
                true
            }
            None => false,
        }
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> bool {
        match self.span(offset, data.len()) {
            Some(range) => {
                self.bytes[range].copy_from_slice(data);
                true
            }
            None => false,
        }
    }
}
