//! Serial port output for debugging
//!
//! Outputs to COM1 (0x3F8) for the QEMU serial console, and backs the
//! `log` facade so the storage drivers' messages land there too.

use core::fmt::{self, Write};
use spin::Mutex;

use crate::arch::io::{inb, outb};

/// COM1 port address
const COM1: u16 = 0x3F8;

/// Line status register: transmit holding register empty
const LSR_THR_EMPTY: u8 = 0x20;

/// Serial port writer
pub struct SerialWriter;

impl SerialWriter {
    /// Write a byte to COM1
    fn write_byte(&mut self, byte: u8) {
        unsafe {
            // Wait for transmit buffer to be empty
            while (inb(COM1 + 5) & LSR_THR_EMPTY) == 0 {}
            outb(COM1, byte);
        }
    }
}

impl Write for SerialWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
        Ok(())
    }
}

/// Global serial writer (already initialized by bootloader)
static WRITER: Mutex<SerialWriter> = Mutex::new(SerialWriter);

/// Print to serial port
pub fn _print(args: fmt::Arguments) {
    // SerialWriter never fails
    let _ = WRITER.lock().write_fmt(args);
}

/// Print macro for serial output
#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => ($crate::serial::_print(format_args!($($arg)*)));
}

/// Print with newline macro for serial output
#[macro_export]
macro_rules! serial_println {
    () => ($crate::serial_print!("\n"));
    ($($arg:tt)*) => ($crate::serial_print!("{}\n", format_args!($($arg)*)));
}

/// `log` backend writing `[LEVEL target] message` lines to COM1
pub struct SerialLogger;

static LOGGER: SerialLogger = SerialLogger;

impl log::Log for SerialLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            crate::serial_println!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Route the `log` macros to the serial console.
///
/// Only the first call installs the logger; later calls just change the
/// level.
pub fn init_logger(level: log::LevelFilter) {
    if log::set_logger(&LOGGER).is_err() {
        log::debug!("serial: logger already installed");
    }
    log::set_max_level(level);
}
