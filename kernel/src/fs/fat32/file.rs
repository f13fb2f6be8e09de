//! FAT32 File Operations
//!
//! Whole-file transfers addressed by first cluster and byte size:
//! - Reading follows the cluster chain until the size is met or the chain ends
//! - Writing follows the chain and grows it one cluster at a time on demand
//!
//! Data always moves a full cluster at a time through the volume's cluster
//! buffer.

use super::bpb::cluster_values;
use super::Fat32Volume;
use crate::error::{StorageError, StorageResult};
use crate::io::block::BlockDevice;

impl<D: BlockDevice> Fat32Volume<D> {
    /// Read up to `size` bytes of the file starting at `first_cluster`
    /// into `dst`.
    ///
    /// Returns the number of bytes produced, which is less than `size` if
    /// the chain ends first.
    pub fn read_file(&mut self, first_cluster: u32, dst: &mut [u8], size: u32) -> StorageResult<usize> {
        let size = size as usize;
        if dst.len() < size {
            return Err(StorageError::BufferTooSmall);
        }
        if size == 0 {
            return Ok(0);
        }

        let cluster_size = self.geometry.cluster_size();
        let mut cluster = first_cluster;
        let mut bytes_read = 0;

        loop {
            let lba = self.cluster_to_sector(cluster)?;
            self.device
                .read_sectors(lba, self.geometry.sectors_per_cluster, &mut self.cluster_buf)?;

            let chunk = (size - bytes_read).min(cluster_size);
            dst[bytes_read..bytes_read + chunk].copy_from_slice(&self.cluster_buf[..chunk]);
            bytes_read += chunk;

            if bytes_read == size {
                break;
            }
            match self.next_cluster(cluster)? {
                Some(next) => cluster = next,
                None => break,
            }
        }

        Ok(bytes_read)
    }

    /// Write `size` bytes from `src` into the file starting at
    /// `first_cluster`, allocating and linking clusters when the existing
    /// chain is too short.
    ///
    /// The tail of the last cluster is zero filled. Clusters already
    /// written stay written if a later step fails.
    pub fn write_file(&mut self, first_cluster: u32, src: &[u8], size: u32) -> StorageResult<usize> {
        let size = size as usize;
        if src.len() < size {
            return Err(StorageError::BufferTooSmall);
        }
        if size == 0 {
            return Ok(0);
        }

        let cluster_size = self.geometry.cluster_size();
        let mut cluster = first_cluster;
        let mut bytes_written = 0;

        loop {
            let lba = self.cluster_to_sector(cluster)?;

            let chunk = (size - bytes_written).min(cluster_size);
            self.cluster_buf[..chunk].copy_from_slice(&src[bytes_written..bytes_written + chunk]);
            self.cluster_buf[chunk..].fill(0);
            self.device
                .write_sectors(lba, self.geometry.sectors_per_cluster, &self.cluster_buf)?;
            bytes_written += chunk;

            if bytes_written == size {
                break;
            }
            cluster = match self.next_cluster(cluster)? {
                Some(next) => next,
                None => self.extend_chain(cluster)?,
            };
        }

        Ok(bytes_written)
    }

    /// Append a free cluster after `tail`, which must end its chain
    fn extend_chain(&mut self, tail: u32) -> StorageResult<u32> {
        let next = self.find_free_cluster()?;
        self.write_fat_entry(tail, next)?;
        self.write_fat_entry(next, cluster_values::EOC)?;
        log::trace!("fat32: chain {} -> {}", tail, next);
        Ok(next)
    }
}
