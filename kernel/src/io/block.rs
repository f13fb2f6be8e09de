//! Block Device Abstraction Layer
//!
//! Provides a unified interface for sector-addressed storage.
//! Block devices transfer data in fixed 512-byte sectors.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    FAT32 Volume                              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  BlockDevice trait                           │
//! └─────────────────────────────────────────────────────────────┘
//!                   │                         │
//!                   ▼                         ▼
//!         ┌─────────────────┐       ┌─────────────────┐
//!         │  ATA/IDE (PIO)  │       │    RAM disk     │
//!         └─────────────────┘       └─────────────────┘
//! ```

use alloc::boxed::Box;

use crate::error::{StorageError, StorageResult};

/// Default sector size
pub const SECTOR_SIZE: usize = 512;

/// Largest sector count a single command can move (encoded as 0 on the wire)
pub const MAX_SECTORS_PER_TRANSFER: u32 = 256;

/// First sector number beyond 28-bit LBA addressing
pub const LBA28_LIMIT: u64 = 1 << 28;

/// Sector-granular blocking storage.
///
/// Implementations must validate the request with [`check_transfer`]
/// before touching the hardware, so a rejected request has no side
/// effects.
pub trait BlockDevice {
    /// Bring the device into a state where transfers can be issued
    fn initialize(&mut self) -> StorageResult<()>;

    /// Read `count` sectors starting at `lba` into `buf`
    fn read_sectors(&mut self, lba: u32, count: u32, buf: &mut [u8]) -> StorageResult<()>;

    /// Write `count` sectors starting at `lba` from `buf`
    fn write_sectors(&mut self, lba: u32, count: u32, buf: &[u8]) -> StorageResult<()>;
}

impl<D: BlockDevice + ?Sized> BlockDevice for &mut D {
    fn initialize(&mut self) -> StorageResult<()> {
        (**self).initialize()
    }

    fn read_sectors(&mut self, lba: u32, count: u32, buf: &mut [u8]) -> StorageResult<()> {
        (**self).read_sectors(lba, count, buf)
    }

    fn write_sectors(&mut self, lba: u32, count: u32, buf: &[u8]) -> StorageResult<()> {
        (**self).write_sectors(lba, count, buf)
    }
}

impl<D: BlockDevice + ?Sized> BlockDevice for Box<D> {
    fn initialize(&mut self) -> StorageResult<()> {
        (**self).initialize()
    }

    fn read_sectors(&mut self, lba: u32, count: u32, buf: &mut [u8]) -> StorageResult<()> {
        (**self).read_sectors(lba, count, buf)
    }

    fn write_sectors(&mut self, lba: u32, count: u32, buf: &[u8]) -> StorageResult<()> {
        (**self).write_sectors(lba, count, buf)
    }
}

/// Validate a transfer request.
///
/// Returns the number of bytes the transfer moves.
pub fn check_transfer(lba: u32, count: u32, buf_len: usize) -> StorageResult<usize> {
    if count == 0 || count > MAX_SECTORS_PER_TRANSFER {
        return Err(StorageError::InvalidSectorCount);
    }

    if lba as u64 + count as u64 > LBA28_LIMIT {
        return Err(StorageError::LbaOutOfRange);
    }

    let bytes = count as usize * SECTOR_SIZE;
    if buf_len < bytes {
        return Err(StorageError::BufferTooSmall);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_transfer_counts() {
        assert_eq!(check_transfer(0, 0, 4096), Err(StorageError::InvalidSectorCount));
        assert_eq!(check_transfer(0, 257, 1 << 20), Err(StorageError::InvalidSectorCount));
        assert_eq!(check_transfer(0, 1, 512), Ok(512));
        assert_eq!(check_transfer(0, 256, 256 * 512), Ok(256 * 512));
    }

    #[test]
    fn test_check_transfer_bounds() {
        assert_eq!(check_transfer(0, 2, 1023), Err(StorageError::BufferTooSmall));
        assert_eq!(
            check_transfer((LBA28_LIMIT - 1) as u32, 2, 1024),
            Err(StorageError::LbaOutOfRange)
        );
        assert_eq!(check_transfer((LBA28_LIMIT - 1) as u32, 1, 512), Ok(512));
    }
}
