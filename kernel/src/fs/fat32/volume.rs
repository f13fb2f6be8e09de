//! Mounted FAT32 volume
//!
//! A `Fat32Volume` owns its block device, the geometry read from the boot
//! sector and a scratch buffer one cluster long. All operations take
//! `&mut self`; sharing a volume between callers requires a lock around
//! it (see `fs::mount`).

use alloc::vec;
use alloc::vec::Vec;

use super::bpb::{Fat32BootSector, Fat32Geometry};
use crate::error::{StorageError, StorageResult};
use crate::io::block::{BlockDevice, SECTOR_SIZE};

/// A FAT32 file system on a block device
pub struct Fat32Volume<D: BlockDevice> {
    pub(super) device: D,
    pub(super) geometry: Fat32Geometry,
    /// One cluster of scratch space for file data
    pub(super) cluster_buf: Vec<u8>,
}

impl<D: BlockDevice> Fat32Volume<D> {
    /// Mount the volume whose boot sector is at `partition_start`.
    ///
    /// Reads exactly one sector. The boot sector is trusted: only a layout
    /// that cannot be addressed is refused.
    pub fn mount(mut device: D, partition_start: u32) -> StorageResult<Self> {
        let mut sector = [0u8; SECTOR_SIZE];
        device.read_sectors(partition_start, 1, &mut sector)?;

        let boot = Fat32BootSector::from_bytes(&sector).ok_or(StorageError::UnsupportedGeometry)?;
        if !boot.has_fat32_signature() {
            log::warn!("fat32: no FAT32 signature at sector {}, mounting anyway", partition_start);
        }

        let geometry = Fat32Geometry::from_boot_sector(partition_start, &boot)?;
        log::info!(
            "fat32: mounted at {}: fat_start={} data_start={} root={} spc={} clusters<{}",
            partition_start,
            geometry.fat_start,
            geometry.data_start,
            geometry.root_cluster,
            geometry.sectors_per_cluster,
            geometry.cluster_limit
        );

        Ok(Self {
            device,
            geometry,
            cluster_buf: vec![0u8; geometry.cluster_size()],
        })
    }

    pub fn geometry(&self) -> &Fat32Geometry {
        &self.geometry
    }

    /// First cluster of the root directory
    pub fn root_cluster(&self) -> u32 {
        self.geometry.root_cluster
    }

    /// Bytes per cluster
    pub fn cluster_size(&self) -> usize {
        self.geometry.cluster_size()
    }

    /// First absolute sector of a data cluster
    pub fn cluster_to_sector(&self, cluster: u32) -> StorageResult<u32> {
        if !self.geometry.is_data_cluster(cluster) {
            return Err(StorageError::InvalidCluster);
        }
        Ok(self.geometry.cluster_to_sector(cluster))
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Unmount, handing the device back
    pub fn into_device(self) -> D {
        self.device
    }
}
