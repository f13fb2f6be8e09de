//! MBR Partition Table
//!
//! Locates FAT32 volumes on a partitioned disk. Sector 0 carries four
//! 16-byte partition entries at offset 446 and the 0xAA55 signature at
//! offset 510. Extended partitions are reported but not followed.

use crate::error::{StorageError, StorageResult};
use crate::io::block::{BlockDevice, SECTOR_SIZE};

/// Offset of the partition table within the MBR
const TABLE_OFFSET: usize = 446;

/// Number of primary partition entries
pub const MAX_PARTITIONS: usize = 4;

/// MBR boot signature
pub const MBR_SIGNATURE: u16 = 0xAA55;

/// Partition type codes
pub mod partition_type {
    pub const EMPTY: u8 = 0x00;
    pub const FAT12: u8 = 0x01;
    pub const FAT16_SMALL: u8 = 0x04;
    pub const EXTENDED: u8 = 0x05;
    pub const FAT16: u8 = 0x06;
    pub const NTFS: u8 = 0x07;
    pub const FAT32: u8 = 0x0B;
    pub const FAT32_LBA: u8 = 0x0C;
    pub const FAT16_LBA: u8 = 0x0E;
    pub const EXTENDED_LBA: u8 = 0x0F;
    pub const LINUX: u8 = 0x83;
    pub const GPT_PROTECTIVE: u8 = 0xEE;

    /// Get partition type name
    pub fn name(type_code: u8) -> &'static str {
        match type_code {
            EMPTY => "Empty",
            FAT12 => "FAT12",
            FAT16_SMALL | FAT16 | FAT16_LBA => "FAT16",
            EXTENDED | EXTENDED_LBA => "Extended",
            NTFS => "NTFS",
            FAT32 | FAT32_LBA => "FAT32",
            LINUX => "Linux",
            GPT_PROTECTIVE => "GPT Protective",
            _ => "Unknown",
        }
    }

    /// Check if this is a FAT32 partition
    pub fn is_fat32(type_code: u8) -> bool {
        matches!(type_code, FAT32 | FAT32_LBA)
    }
}

/// MBR partition entry (16 bytes)
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct PartitionEntry {
    /// Boot indicator (0x80 = bootable)
    pub boot_flag: u8,
    /// Starting CHS address (unused)
    pub start_chs: [u8; 3],
    /// Partition type
    pub partition_type: u8,
    /// Ending CHS address (unused)
    pub end_chs: [u8; 3],
    /// Starting LBA
    pub start_lba: u32,
    /// Total sectors
    pub total_sectors: u32,
}

const _: () = assert!(core::mem::size_of::<PartitionEntry>() == 16);

impl PartitionEntry {
    fn from_bytes(raw: &[u8]) -> Self {
        // Plain-old-data, every bit pattern is a valid value
        unsafe { core::ptr::read_unaligned(raw.as_ptr() as *const Self) }
    }

    /// Check if the slot describes a partition
    pub fn is_used(&self) -> bool {
        self.partition_type != partition_type::EMPTY && self.sectors() > 0
    }

    /// Check if bootable
    pub fn is_bootable(&self) -> bool {
        self.boot_flag == 0x80
    }

    /// Check if extended partition
    pub fn is_extended(&self) -> bool {
        matches!(
            self.partition_type,
            partition_type::EXTENDED | partition_type::EXTENDED_LBA
        )
    }

    /// Starting LBA (the field is unaligned)
    pub fn start(&self) -> u32 {
        self.start_lba
    }

    /// Length in sectors
    pub fn sectors(&self) -> u32 {
        self.total_sectors
    }
}

impl core::fmt::Debug for PartitionEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PartitionEntry")
            .field("type", &partition_type::name(self.partition_type))
            .field("bootable", &self.is_bootable())
            .field("start", &self.start())
            .field("sectors", &self.sectors())
            .finish()
    }
}

/// Decoded partition table of a disk
#[derive(Debug, Clone, Copy)]
pub struct MasterBootRecord {
    pub partitions: [PartitionEntry; MAX_PARTITIONS],
}

impl MasterBootRecord {
    /// Decode sector 0 of a disk. Fails with `InvalidPartitionTable` when
    /// the sector is short or lacks the 0xAA55 signature.
    pub fn parse(sector: &[u8]) -> StorageResult<Self> {
        if sector.len() < SECTOR_SIZE {
            return Err(StorageError::InvalidPartitionTable);
        }
        if u16::from_le_bytes([sector[510], sector[511]]) != MBR_SIGNATURE {
            return Err(StorageError::InvalidPartitionTable);
        }

        let mut partitions = [PartitionEntry::from_bytes(&[0u8; 16]); MAX_PARTITIONS];
        for (i, entry) in partitions.iter_mut().enumerate() {
            let offset = TABLE_OFFSET + i * 16;
            *entry = PartitionEntry::from_bytes(&sector[offset..offset + 16]);
        }

        Ok(Self { partitions })
    }

    /// Read and decode sector 0 of `device`
    pub fn read_from<D: BlockDevice + ?Sized>(device: &mut D) -> StorageResult<Self> {
        let mut sector = [0u8; SECTOR_SIZE];
        device.read_sectors(0, 1, &mut sector)?;
        Self::parse(&sector)
    }

    /// Used primary partitions, in table order
    pub fn used(&self) -> impl Iterator<Item = &PartitionEntry> {
        self.partitions.iter().filter(|p| p.is_used())
    }

    /// First partition typed as FAT32
    pub fn first_fat32(&self) -> Option<PartitionEntry> {
        self.used()
            .find(|p| partition_type::is_fat32(p.partition_type))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ramdisk::RamDisk;

    fn write_entry(sector: &mut [u8], index: usize, kind: u8, start: u32, len: u32) {
        let offset = TABLE_OFFSET + index * 16;
        sector[offset] = if index == 0 { 0x80 } else { 0 };
        sector[offset + 4] = kind;
        sector[offset + 8..offset + 12].copy_from_slice(&start.to_le_bytes());
        sector[offset + 12..offset + 16].copy_from_slice(&len.to_le_bytes());
    }

    fn mbr_image() -> [u8; SECTOR_SIZE] {
        let mut sector = [0u8; SECTOR_SIZE];
        write_entry(&mut sector, 0, partition_type::LINUX, 63, 1000);
        write_entry(&mut sector, 2, partition_type::FAT32_LBA, 2048, 65536);
        sector[510] = 0x55;
        sector[511] = 0xAA;
        sector
    }

    #[test]
    fn test_parse_table() {
        let mbr = MasterBootRecord::parse(&mbr_image()).unwrap();
        assert_eq!(mbr.used().count(), 2);
        assert!(mbr.partitions[0].is_bootable());
        assert!(!mbr.partitions[1].is_used());

        let fat = mbr.first_fat32().unwrap();
        assert_eq!(fat.start(), 2048);
        assert_eq!(fat.sectors(), 65536);
        assert!(!fat.is_extended());
    }

    #[test]
    fn test_missing_signature_rejected() {
        let mut image = mbr_image();
        image[511] = 0;
        assert!(matches!(
            MasterBootRecord::parse(&image),
            Err(StorageError::InvalidPartitionTable)
        ));
        assert!(matches!(
            MasterBootRecord::parse(&image[..100]),
            Err(StorageError::InvalidPartitionTable)
        ));
    }

    #[test]
    fn test_no_fat32_partition() {
        let mut image = [0u8; SECTOR_SIZE];
        write_entry(&mut image, 0, partition_type::NTFS, 2048, 100);
        // A FAT32 type with zero length is an unused slot
        write_entry(&mut image, 1, partition_type::FAT32, 4096, 0);
        image[510] = 0x55;
        image[511] = 0xAA;
        let mbr = MasterBootRecord::parse(&image).unwrap();
        assert!(mbr.first_fat32().is_none());
    }

    #[test]
    fn test_read_from_device() {
        let mut disk = RamDisk::new(16);
        disk.sector_mut(0).copy_from_slice(&mbr_image());
        let mbr = MasterBootRecord::read_from(&mut disk).unwrap();
        assert_eq!(mbr.first_fat32().map(|p| p.start()), Some(2048));
        assert_eq!(partition_type::name(partition_type::FAT32_LBA), "FAT32");
    }
}
