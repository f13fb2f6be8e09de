//! Nostalgia OS Storage Stack
//!
//! Polling ATA disk driver and FAT32 file system layer for a bare-metal
//! x86_64 kernel. Nothing below these modules is provided by an operating
//! system: no DMA, no interrupts, no paging.
//!
//! # Layering
//!
//! - **arch** - Port I/O primitives (`in`/`out` through the `x86_64` crate)
//! - **hal** - ATA/IDE PIO driver
//! - **io** - Block device abstraction and the RAM disk
//! - **fs** - FAT32 volume, partition table model, root mount slot
//! - **serial** - COM1 output and the `log` backend
//!
//! # Data Flow
//!
//! ```text
//! Fat32Volume ──► BlockDevice::read_sectors / write_sectors
//!                     │
//!          ┌──────────┴──────────┐
//!          ▼                     ▼
//!   AtaDisk<PortBus>          RamDisk
//!          │
//!          ▼
//!   primary IDE channel (0x1F0-0x1F7)
//! ```
//!
//! # Concurrency
//!
//! Every operation takes `&mut self` and busy-polls to completion. Nothing
//! in this crate synchronizes device registers or FAT read-modify-write
//! sequences on its own; share a volume between callers only through
//! [`fs::mount`], which serializes access behind a spinlock.

#![cfg_attr(not(test), no_std)]
// Kernel-specific lint configurations:
// - missing_safety_doc: port I/O wrappers are unsafe by nature
// - needless_range_loop: index access mirrors on-disk offsets
// - new_without_default: drivers need explicit construction
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::new_without_default)]

extern crate alloc;

pub mod arch;
pub mod error;
pub mod fs;
pub mod hal;
pub mod io;
#[cfg(target_arch = "x86_64")]
pub mod serial;

pub use error::{StorageError, StorageResult};
pub use fs::fat32::{DirEntry, DirEntryLocation, Fat32Geometry, Fat32Volume, FileAttributes, ShortName};
pub use hal::ata::{AtaConfig, AtaDisk, AtaIdentity, AtaPorts};
pub use io::block::{BlockDevice, SECTOR_SIZE};
pub use io::ramdisk::RamDisk;
