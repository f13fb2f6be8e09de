//! FAT32 BIOS Parameter Block (BPB)
//!
//! The BPB is located in the boot sector (sector 0 of the partition) and
//! contains the parameters the volume geometry is derived from.
//!
//! # Boot Sector Layout (512 bytes)
//! - Bytes 0-2: Jump instruction
//! - Bytes 3-10: OEM name
//! - Bytes 11-35: BPB (BIOS Parameter Block)
//! - Bytes 36-89: Extended BPB (FAT32 specific)
//! - Bytes 90-509: Boot code
//! - Bytes 510-511: Signature (0x55, 0xAA)

use crate::error::{StorageError, StorageResult};
use crate::io::block::{LBA28_LIMIT, SECTOR_SIZE};

/// BIOS Parameter Block (common to FAT12/16/32)
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct BiosParameterBlock {
    /// Bytes per sector (usually 512)
    pub bytes_per_sector: u16,
    /// Sectors per cluster (power of 2: 1, 2, 4, 8, 16, 32, 64, 128)
    pub sectors_per_cluster: u8,
    /// Reserved sectors (including boot sector)
    pub reserved_sectors: u16,
    /// Number of FATs (usually 2)
    pub num_fats: u8,
    /// Root directory entries (0 for FAT32)
    pub root_entry_count: u16,
    /// Total sectors (16-bit, 0 for FAT32)
    pub total_sectors_16: u16,
    /// Media type (0xF8 for fixed disk)
    pub media_type: u8,
    /// Sectors per FAT (16-bit, 0 for FAT32)
    pub sectors_per_fat_16: u16,
    /// Sectors per track
    pub sectors_per_track: u16,
    /// Number of heads
    pub num_heads: u16,
    /// Hidden sectors
    pub hidden_sectors: u32,
    /// Total sectors (32-bit)
    pub total_sectors_32: u32,
}

impl BiosParameterBlock {
    /// Get total sectors
    pub fn total_sectors(&self) -> u32 {
        if self.total_sectors_16 != 0 {
            self.total_sectors_16 as u32
        } else {
            self.total_sectors_32
        }
    }
}

/// FAT32 Extended BIOS Parameter Block
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct Fat32ExtendedBpb {
    /// Sectors per FAT (32-bit)
    pub sectors_per_fat_32: u32,
    /// Extended flags
    pub ext_flags: u16,
    /// File system version
    pub fs_version: u16,
    /// Root directory cluster
    pub root_cluster: u32,
    /// FSInfo sector number
    pub fs_info_sector: u16,
    /// Backup boot sector
    pub backup_boot_sector: u16,
    /// Reserved (must be zero)
    pub reserved: [u8; 12],
    /// Drive number
    pub drive_number: u8,
    /// Reserved
    pub reserved1: u8,
    /// Extended boot signature (0x29)
    pub boot_signature: u8,
    /// Volume serial number
    pub volume_serial: u32,
    /// Volume label (11 bytes, space-padded)
    pub volume_label: [u8; 11],
    /// File system type string ("FAT32   ")
    pub fs_type: [u8; 8],
}

/// Complete FAT32 Boot Sector
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct Fat32BootSector {
    /// Jump instruction (EB xx 90 or E9 xx xx)
    pub jump: [u8; 3],
    /// OEM name (8 bytes)
    pub oem_name: [u8; 8],
    /// BIOS Parameter Block
    pub bpb: BiosParameterBlock,
    /// FAT32 Extended BPB
    pub ext_bpb: Fat32ExtendedBpb,
    /// Boot code
    pub boot_code: [u8; 420],
    /// Boot signature (0x55, 0xAA)
    pub signature: [u8; 2],
}

const _: () = assert!(core::mem::size_of::<Fat32BootSector>() == SECTOR_SIZE);

impl Fat32BootSector {
    /// Reinterpret a raw boot sector. Returns `None` if `data` is shorter
    /// than a sector.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < SECTOR_SIZE {
            return None;
        }
        // Plain-old-data, every bit pattern is a valid value
        Some(unsafe { core::ptr::read_unaligned(data.as_ptr() as *const Self) })
    }

    /// Check the 0x55AA trailer and the "FAT32   " type string.
    ///
    /// Mounting does not require either; this is informational.
    pub fn has_fat32_signature(&self) -> bool {
        self.signature == [0x55, 0xAA] && self.ext_bpb.fs_type == *b"FAT32   "
    }

    /// Get volume label as string
    pub fn volume_label(&self) -> [u8; 11] {
        self.ext_bpb.volume_label
    }
}

/// FAT32 cluster entry values
pub mod cluster_values {
    /// Free cluster
    pub const FREE: u32 = 0x00000000;
    /// First cluster number of the data region
    pub const FIRST_DATA: u32 = 2;
    /// Bad cluster
    pub const BAD: u32 = 0x0FFFFFF7;
    /// End of chain (minimum value)
    pub const EOC_MIN: u32 = 0x0FFFFFF8;
    /// End of chain (standard value)
    pub const EOC: u32 = 0x0FFFFFFF;

    /// Mask for 28-bit cluster number
    pub const CLUSTER_MASK: u32 = 0x0FFFFFFF;
    /// Reserved top nibble, preserved on every write
    pub const RESERVED_MASK: u32 = 0xF0000000;

    /// Check if cluster is end of chain
    pub fn is_eoc(value: u32) -> bool {
        (value & CLUSTER_MASK) >= EOC_MIN
    }

    /// Check if cluster is free
    pub fn is_free(value: u32) -> bool {
        (value & CLUSTER_MASK) == FREE
    }

    /// Check if cluster is bad
    pub fn is_bad(value: u32) -> bool {
        (value & CLUSTER_MASK) == BAD
    }

    /// Check if value links to another data cluster
    pub fn is_valid(value: u32) -> bool {
        let val = value & CLUSTER_MASK;
        (FIRST_DATA..BAD).contains(&val)
    }
}

/// Volume layout derived from the boot sector at mount time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fat32Geometry {
    /// Absolute sector of the boot sector
    pub partition_start: u32,
    /// Absolute sector of the first FAT
    pub fat_start: u32,
    /// Absolute sector of cluster 2
    pub data_start: u32,
    /// First cluster of the root directory
    pub root_cluster: u32,
    pub sectors_per_cluster: u32,
    pub bytes_per_sector: u32,
    /// Sectors in one FAT copy
    pub fat_size: u32,
    pub num_fats: u32,
    /// One past the highest cluster number the volume can address
    pub cluster_limit: u32,
}

impl Fat32Geometry {
    /// Derive the geometry of a volume whose boot sector sits at
    /// `partition_start`.
    ///
    /// No signature checks are made. Only layouts that would break the
    /// sector arithmetic (non-512 sectors, zero sectors per cluster) are
    /// refused.
    pub fn from_boot_sector(partition_start: u32, boot: &Fat32BootSector) -> StorageResult<Self> {
        let bytes_per_sector = boot.bpb.bytes_per_sector as u32;
        let sectors_per_cluster = boot.bpb.sectors_per_cluster as u32;
        if bytes_per_sector != SECTOR_SIZE as u32 || sectors_per_cluster == 0 {
            return Err(StorageError::UnsupportedGeometry);
        }

        let reserved = boot.bpb.reserved_sectors as u32;
        let num_fats = boot.bpb.num_fats as u32;
        let fat_size = boot.ext_bpb.sectors_per_fat_32;

        let fat_start = partition_start
            .checked_add(reserved)
            .ok_or(StorageError::UnsupportedGeometry)?;
        let data_start = num_fats
            .checked_mul(fat_size)
            .and_then(|fats| fat_start.checked_add(fats))
            .ok_or(StorageError::UnsupportedGeometry)?;

        // Entries one FAT copy can hold, capped below the bad-cluster marker
        let fat_entries = (fat_size as u64 * bytes_per_sector as u64 / 4)
            .min(cluster_values::BAD as u64) as u32;

        // Clusters the data region can hold, if the BPB records a size
        let total = boot.bpb.total_sectors();
        let used = data_start - partition_start;
        let mut cluster_limit = if total > used {
            let data_clusters = (total - used) / sectors_per_cluster;
            fat_entries.min(data_clusters.saturating_add(cluster_values::FIRST_DATA))
        } else {
            fat_entries
        };

        // Every cluster below the limit must end inside 28-bit LBA space
        let addressable = LBA28_LIMIT.saturating_sub(data_start as u64) / sectors_per_cluster as u64;
        if addressable == 0 {
            return Err(StorageError::UnsupportedGeometry);
        }
        cluster_limit = cluster_limit.min((addressable + cluster_values::FIRST_DATA as u64) as u32);

        Ok(Self {
            partition_start,
            fat_start,
            data_start,
            root_cluster: boot.ext_bpb.root_cluster,
            sectors_per_cluster,
            bytes_per_sector,
            fat_size,
            num_fats,
            cluster_limit,
        })
    }

    /// First sector of a data cluster. `cluster` must be at least 2.
    #[inline]
    pub fn cluster_to_sector(&self, cluster: u32) -> u32 {
        debug_assert!(cluster >= cluster_values::FIRST_DATA);
        self.data_start + (cluster - cluster_values::FIRST_DATA) * self.sectors_per_cluster
    }

    /// Bytes in one cluster
    #[inline]
    pub fn cluster_size(&self) -> usize {
        (self.bytes_per_sector * self.sectors_per_cluster) as usize
    }

    /// Directory entries in one sector
    #[inline]
    pub fn entries_per_sector(&self) -> usize {
        self.bytes_per_sector as usize / super::dir::DIR_ENTRY_SIZE
    }

    /// Whether `cluster` names a data cluster on this volume
    #[inline]
    pub fn is_data_cluster(&self, cluster: u32) -> bool {
        (cluster_values::FIRST_DATA..self.cluster_limit).contains(&cluster)
    }
}
