//! Architecture-specific code
//!
//! Port I/O used by the ATA driver and the serial console.

#[cfg(target_arch = "x86_64")]
pub mod x86_64;

#[cfg(target_arch = "x86_64")]
pub use self::x86_64::*;
