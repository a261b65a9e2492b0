//! System interconnect (bus) for memory and MMIO access.
//!
//! This module implements the bus that routes physical address accesses to devices. It provides:
//! 1. **Device registration:** Devices are added by address range and sorted for lookup.
//! 2. **Access routing:** Read/write by address with a last-device hint for throughput.
//! 3. **Halt polling:** Collects halt requests raised by device register writes.
//! 4. **Loading:** Bulk writes used by the program loader and the syscall bridge.

use crate::common::data::AccessWidth;
use crate::common::error::HaltReason;
use crate::soc::traits::Device;

/// System bus connecting the core and devices; routes accesses by physical address.
#[derive(Debug, Default)]
pub struct Bus {
    /// Registered memory and MMIO devices, sorted by base address.
    devices: Vec<Box<dyn Device>>,
    last_device_idx: usize,
    ram_idx: Option<usize>,
}

impl Bus {
    /// Creates an empty bus; add devices with `add_device`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device on the bus; devices are sorted by base address for lookup.
    ///
    /// # Arguments
    ///
    /// * `dev` - The device to add.
    pub fn add_device(&mut self, dev: Box<dyn Device>) {
        self.devices.push(dev);
        self.devices.sort_by_key(|d| d.address_range().0);
        self.ram_idx = self.devices.iter().position(|d| d.name() == "RAM");
        self.last_device_idx = 0;
    }

    /// Returns the names of the registered devices in address order.
    pub fn device_names(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.name().to_owned()).collect()
    }

    fn contains(dev: &dyn Device, paddr: u32, len: u32) -> bool {
        let (start, size) = dev.address_range();
        paddr >= start && u64::from(paddr) + u64::from(len) <= u64::from(start) + u64::from(size)
    }

    fn find_device(&mut self, paddr: u32, len: u32) -> Option<(&mut Box<dyn Device>, u32)> {
        let hint = [Some(self.last_device_idx), self.ram_idx];
        let idx = hint
            .into_iter()
            .flatten()
            .find(|&i| self.devices.get(i).is_some_and(|d| Self::contains(d.as_ref(), paddr, len)))
            .or_else(|| {
                self.devices
                    .iter()
                    .position(|d| Self::contains(d.as_ref(), paddr, len))
            })?;
        self.last_device_idx = idx;
        let dev = self.devices.get_mut(idx)?;
        let offset = paddr - dev.address_range().0;
        Some((dev, offset))
    }

    /// Returns whether the given range is backed by a single device.
    pub fn is_valid_address(&mut self, paddr: u32, len: u32) -> bool {
        self.find_device(paddr, len).is_some()
    }

    /// Reads bytes starting at a physical address.
    ///
    /// # Returns
    ///
    /// `false` if no device claims the whole range or the device rejects the access.
    pub fn read_bytes(&mut self, paddr: u32, buf: &mut [u8]) -> bool {
        match self.find_device(paddr, buf.len() as u32) {
            Some((dev, offset)) => dev.read(offset, buf),
            None => false,
        }
    }

    /// Writes bytes starting at a physical address.
    ///
    /// # Returns
    ///
    /// `false` if no device claims the whole range or the device rejects the access.
    pub fn write_bytes(&mut self, paddr: u32, data: &[u8]) -> bool {
        match self.find_device(paddr, data.len() as u32) {
            Some((dev, offset)) => dev.write(offset, data),
            None => false,
        }
    }

    /// Reads a little-endian value of the given width.
    pub fn read(&mut self, paddr: u32, width: AccessWidth) -> Option<u32> {
        let mut buf = [0u8; 4];
        let len = width.bytes() as usize;
        self.read_bytes(paddr, &mut buf[..len])
            .then(|| u32::from_le_bytes(buf))
    }

    /// Writes the low bytes of `value` little-endian at the given width.
    pub fn write(&mut self, paddr: u32, width: AccessWidth, value: u32) -> bool {
        let len = width.bytes() as usize;
        self.write_bytes(paddr, &value.to_le_bytes()[..len])
    }

    /// Writes a binary blob into memory at the given physical address.
    ///
    /// Falls back to byte-by-byte writes when the blob spans several devices.
    ///
    /// # Returns
    ///
    /// `false` if any byte of the blob is unmapped.
    pub fn load_binary_at(&mut self, data: &[u8], addr: u32) -> bool {
        if self.write_bytes(addr, data) {
            return true;
        }
        data.iter()
            .enumerate()
            .all(|(i, byte)| self.write_bytes(addr.wrapping_add(i as u32), &[*byte]))
    }

    /// Returns the first pending halt request raised by a device.
    pub fn take_exit(&mut self) -> Option<HaltReason> {
        self.devices.iter_mut().find_map(|d| d.take_exit())
    }
}
