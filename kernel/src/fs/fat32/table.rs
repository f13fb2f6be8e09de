//! File Allocation Table access
//!
//! Each FAT entry is 32 bits of which only the low 28 are meaningful; the
//! top nibble is reserved and must survive every update. Each access
//! touches exactly one FAT sector: one read, plus one write for updates.
//! Only the first FAT copy is read or written.

use super::bpb::cluster_values;
use super::Fat32Volume;
use crate::error::{StorageError, StorageResult};
use crate::io::block::{BlockDevice, SECTOR_SIZE};

/// Bytes per FAT entry
const FAT_ENTRY_SIZE: u32 = 4;

impl<D: BlockDevice> Fat32Volume<D> {
    /// Sector and byte offset of a cluster's FAT entry
    fn fat_entry_position(&self, cluster: u32) -> StorageResult<(u32, usize)> {
        let byte_offset = cluster as u64 * FAT_ENTRY_SIZE as u64;
        let sector_index = byte_offset / self.geometry.bytes_per_sector as u64;
        if sector_index >= self.geometry.fat_size as u64 {
            return Err(StorageError::InvalidCluster);
        }

        let sector = self.geometry.fat_start + sector_index as u32;
        let offset = (byte_offset % self.geometry.bytes_per_sector as u64) as usize;
        Ok((sector, offset))
    }

    /// Read the 28-bit FAT entry of `cluster`
    pub fn read_fat_entry(&mut self, cluster: u32) -> StorageResult<u32> {
        let (sector, offset) = self.fat_entry_position(cluster)?;
        let mut buf = [0u8; SECTOR_SIZE];
        self.device.read_sectors(sector, 1, &mut buf)?;

        let raw = u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]]);
        Ok(raw & cluster_values::CLUSTER_MASK)
    }

    /// Set the FAT entry of `cluster` to `value`, keeping the reserved top
    /// nibble already on disk.
    pub fn write_fat_entry(&mut self, cluster: u32, value: u32) -> StorageResult<()> {
        let (sector, offset) = self.fat_entry_position(cluster)?;
        let mut buf = [0u8; SECTOR_SIZE];
        self.device.read_sectors(sector, 1, &mut buf)?;

        let old = u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]]);
        let new = (old & cluster_values::RESERVED_MASK) | (value & cluster_values::CLUSTER_MASK);
        buf[offset..offset + 4].copy_from_slice(&new.to_le_bytes());

        self.device.write_sectors(sector, 1, &buf)
    }

    /// Lowest free cluster number, without claiming it
    pub fn find_free_cluster(&mut self) -> StorageResult<u32> {
        let entries_per_sector = self.geometry.bytes_per_sector / FAT_ENTRY_SIZE;
        let limit = self.geometry.cluster_limit;
        let mut buf = [0u8; SECTOR_SIZE];
        let mut cached_sector = None;

        // Sequential scan: fetch each FAT sector once
        for cluster in cluster_values::FIRST_DATA..limit {
            let sector_index = cluster / entries_per_sector;
            if cached_sector != Some(sector_index) {
                self.device.read_sectors(self.geometry.fat_start + sector_index, 1, &mut buf)?;
                cached_sector = Some(sector_index);
            }

            let offset = ((cluster % entries_per_sector) * FAT_ENTRY_SIZE) as usize;
            let raw = u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]]);
            if cluster_values::is_free(raw) {
                return Ok(cluster);
            }
        }

        Err(StorageError::ClusterAllocationExhausted)
    }

    /// Claim the lowest free cluster as a one-cluster chain
    pub fn allocate_cluster(&mut self) -> StorageResult<u32> {
        let cluster = self.find_free_cluster()?;
        self.write_fat_entry(cluster, cluster_values::EOC)?;
        log::trace!("fat32: allocated cluster {}", cluster);
        Ok(cluster)
    }

    /// Follow one link of a chain.
    ///
    /// Returns `None` at end of chain. Links to free, reserved, bad or
    /// out-of-volume clusters are reported as `InvalidCluster`.
    pub fn next_cluster(&mut self, cluster: u32) -> StorageResult<Option<u32>> {
        let next = self.read_fat_entry(cluster)?;
        if cluster_values::is_eoc(next) {
            return Ok(None);
        }
        if !self.geometry.is_data_cluster(next) {
            return Err(StorageError::InvalidCluster);
        }
        Ok(Some(next))
    }

    /// Number of clusters in the chain starting at `first`
    pub fn chain_length(&mut self, first: u32) -> StorageResult<u32> {
        if !self.geometry.is_data_cluster(first) {
            return Err(StorageError::InvalidCluster);
        }

        let mut length = 1;
        let mut cluster = first;
        while let Some(next) = self.next_cluster(cluster)? {
            length += 1;
            // A chain longer than the volume has a loop in it
            if length > self.geometry.cluster_limit {
                return Err(StorageError::InvalidCluster);
            }
            cluster = next;
        }
        Ok(length)
    }
}
