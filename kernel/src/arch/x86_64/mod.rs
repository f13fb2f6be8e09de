//! x86_64 architecture support
//!
//! Only the legacy I/O port space is needed by the storage stack.

pub mod io;

pub use io::PortBus;
