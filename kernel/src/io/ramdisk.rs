//! RAM Disk Driver
//!
//! Provides an in-memory block device for testing and temporary storage.
//! Behaves like the ATA driver from the file system's point of view:
//! same request validation, same 512-byte sectors, no persistence.
//!
//! The disk also counts sector operations so callers can check how much
//! I/O a higher layer actually issued.

use alloc::vec;
use alloc::vec::Vec;

use super::block::{check_transfer, BlockDevice, SECTOR_SIZE};
use crate::error::{StorageError, StorageResult};

/// In-memory block device
pub struct RamDisk {
    /// Backing store, a whole number of sectors
    data: Vec<u8>,
    /// Sector count
    sector_count: u32,
    /// Number of `read_sectors` calls served
    reads: usize,
    /// Number of `write_sectors` calls served
    writes: usize,
}

impl RamDisk {
    /// Create a zero-filled RAM disk of `sector_count` sectors
    pub fn new(sector_count: u32) -> Self {
        Self {
            data: vec![0u8; sector_count as usize * SECTOR_SIZE],
            sector_count,
            reads: 0,
            writes: 0,
        }
    }

    /// Wrap an existing disk image, padding it to a sector boundary
    pub fn from_image(mut image: Vec<u8>) -> Self {
        let sector_count = image.len().div_ceil(SECTOR_SIZE);
        image.resize(sector_count * SECTOR_SIZE, 0);
        Self {
            data: image,
            sector_count: sector_count as u32,
            reads: 0,
            writes: 0,
        }
    }

    /// Number of sectors on the disk
    pub fn sector_count(&self) -> u32 {
        self.sector_count
    }

    /// Whole disk contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Whole disk contents, mutable (for building test images)
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// One sector's contents
    pub fn sector(&self, lba: u32) -> &[u8] {
        let start = lba as usize * SECTOR_SIZE;
        &self.data[start..start + SECTOR_SIZE]
    }

    /// One sector's contents, mutable
    pub fn sector_mut(&mut self, lba: u32) -> &mut [u8] {
        let start = lba as usize * SECTOR_SIZE;
        &mut self.data[start..start + SECTOR_SIZE]
    }

    /// Number of read requests served
    pub fn read_count(&self) -> usize {
        self.reads
    }

    /// Number of write requests served
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Reset the request counters
    pub fn reset_counters(&mut self) {
        self.reads = 0;
        self.writes = 0;
    }

    fn byte_range(&self, lba: u32, count: u32) -> StorageResult<core::ops::Range<usize>> {
        let end_sector = lba as u64 + count as u64;
        if end_sector > self.sector_count as u64 {
            return Err(StorageError::LbaOutOfRange);
        }
        let start = lba as usize * SECTOR_SIZE;
        Ok(start..end_sector as usize * SECTOR_SIZE)
    }
}

impl BlockDevice for RamDisk {
    fn initialize(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn read_sectors(&mut self, lba: u32, count: u32, buf: &mut [u8]) -> StorageResult<()> {
        let bytes = check_transfer(lba, count, buf.len())?;
        let range = self.byte_range(lba, count)?;
        buf[..bytes].copy_from_slice(&self.data[range]);
        self.reads += 1;
        Ok(())
    }

    fn write_sectors(&mut self, lba: u32, count: u32, buf: &[u8]) -> StorageResult<()> {
        let bytes = check_transfer(lba, count, buf.len())?;
        let range = self.byte_range(lba, count)?;
        self.data[range].copy_from_slice(&buf[..bytes]);
        self.writes += 1;
        Ok(())
    }
}
