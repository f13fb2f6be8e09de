//! I/O Layer (io)
//!
//! Sector-addressed storage shared by every file system in the stack:
//!
//! - **block**: the `BlockDevice` trait and request validation
//! - **ramdisk**: in-memory device used for tests and scratch volumes

pub mod block;
pub mod ramdisk;

pub use block::{check_transfer, BlockDevice, MAX_SECTORS_PER_TRANSFER, SECTOR_SIZE};
pub use ramdisk::RamDisk;
