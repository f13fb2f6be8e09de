//! x86_64 Port I/O Operations
//!
//! Provides low-level port I/O for hardware access.
//! Used by the ATA driver for register access and by the serial console.

use x86_64::instructions::port::{PortReadOnly, PortWriteOnly};

use crate::hal::ata::AtaPorts;

/// Read a byte from an I/O port
#[inline]
pub unsafe fn inb(port: u16) -> u8 {
    let mut port = PortReadOnly::new(port);
    port.read()
}

/// Read a word (16-bit) from an I/O port
#[inline]
pub unsafe fn inw(port: u16) -> u16 {
    let mut port: PortReadOnly<u16> = PortReadOnly::new(port);
    port.read()
}

/// Write a byte to an I/O port
#[inline]
pub unsafe fn outb(port: u16, value: u8) {
    let mut port = PortWriteOnly::new(port);
    port.write(value);
}

/// Write a word (16-bit) to an I/O port
#[inline]
pub unsafe fn outw(port: u16, value: u16) {
    let mut port: PortWriteOnly<u16> = PortWriteOnly::new(port);
    port.write(value);
}

/// Read `buf.len()` words from an I/O port, one `in` per word
///
/// Used for bulk data transfer from ATA devices
#[inline]
pub unsafe fn insw(port: u16, buf: &mut [u16]) {
    let mut port: PortReadOnly<u16> = PortReadOnly::new(port);
    for word in buf.iter_mut() {
        *word = port.read();
    }
}

/// Write `buf.len()` words to an I/O port, one `out` per word
///
/// Used for bulk data transfer to ATA devices
#[inline]
pub unsafe fn outsw(port: u16, buf: &[u16]) {
    let mut port: PortWriteOnly<u16> = PortWriteOnly::new(port);
    for &word in buf.iter() {
        port.write(word);
    }
}

/// Direct access to the machine's I/O port space.
///
/// Holding a `PortBus` is the capability to drive whatever hardware sits
/// behind the ports it is used with, so one must only be created by the
/// code that owns those devices.
#[derive(Debug)]
pub struct PortBus {
    _owned: (),
}

impl PortBus {
    /// Take ownership of the port space.
    ///
    /// # Safety
    /// No other code may access the ports driven through this bus while it
    /// is alive.
    pub const unsafe fn new() -> Self {
        Self { _owned: () }
    }
}

impl AtaPorts for PortBus {
    #[inline]
    fn read_u8(&mut self, port: u16) -> u8 {
        unsafe { inb(port) }
    }

    #[inline]
    fn write_u8(&mut self, port: u16, value: u8) {
        unsafe { outb(port, value) }
    }

    #[inline]
    fn read_u16(&mut self, port: u16) -> u16 {
        unsafe { inw(port) }
    }

    #[inline]
    fn write_u16(&mut self, port: u16, value: u16) {
        unsafe { outw(port, value) }
    }

    fn read_words(&mut self, port: u16, buf: &mut [u16]) {
        unsafe { insw(port, buf) }
    }

    fn write_words(&mut self, port: u16, buf: &[u16]) {
        unsafe { outsw(port, buf) }
    }
}
