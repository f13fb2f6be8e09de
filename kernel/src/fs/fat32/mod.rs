//! FAT32 File System Driver
//!
//! Implements FAT32 on top of any [`BlockDevice`](crate::io::block::BlockDevice).
//! This driver provides:
//! - Volume mounting from a boot sector
//! - FAT entry access and cluster allocation
//! - Whole-file reading/writing by first cluster
//! - 8.3 directory lookup and entry creation
//!
//! # Structure
//! - `bpb` - BIOS Parameter Block, boot sector and derived geometry
//! - `volume` - The mounted volume
//! - `table` - FAT entries, allocation and chain walking
//! - `file` - File data transfer
//! - `dir` - Directory entry structures and scanning
//!
//! # Limitations
//! No long file names, no FAT12/FAT16, and directories never grow beyond
//! their existing cluster chain. Only the first FAT copy is maintained.

pub mod bpb;
pub mod dir;
pub mod file;
pub mod table;
pub mod volume;

// Re-export commonly used items
pub use bpb::cluster_values;
pub use bpb::{BiosParameterBlock, Fat32BootSector, Fat32ExtendedBpb, Fat32Geometry};
pub use dir::{entry_status, DirEntry, DirEntryLocation, FileAttributes, ShortName, DIR_ENTRY_SIZE};
pub use volume::Fat32Volume;

#[cfg(test)]
pub(crate) mod tests {
    use super::bpb::tests::boot_sector_image;
    use super::*;
    use crate::io::block::BlockDevice;
    use crate::io::ramdisk::RamDisk;

    pub(crate) type TestVolume = Fat32Volume<RamDisk>;

    /// Sectors in the test volume
    const TOTAL_SECTORS: u32 = 248;
    const RESERVED: u16 = 32;
    const FAT_SIZE: u32 = 8;

    /// A freshly formatted volume: one sector per cluster, two FATs,
    /// 200 data clusters, an empty root directory at cluster 2.
    pub(crate) fn format_volume() -> TestVolume {
        let mut disk = RamDisk::new(TOTAL_SECTORS);
        disk.sector_mut(0)
            .copy_from_slice(&boot_sector_image(1, RESERVED, 2, FAT_SIZE, TOTAL_SECTORS));

        for copy in 0..2 {
            let fat = disk.sector_mut(RESERVED as u32 + copy * FAT_SIZE);
            fat[0..4].copy_from_slice(&0x0FFF_FFF8u32.to_le_bytes());
            fat[4..8].copy_from_slice(&cluster_values::EOC.to_le_bytes());
            fat[8..12].copy_from_slice(&cluster_values::EOC.to_le_bytes());
        }

        disk.initialize().unwrap();
        Fat32Volume::mount(disk, 0).unwrap()
    }

    #[test]
    fn test_formatted_volume_layout() {
        let vol = format_volume();
        let geo = vol.geometry();
        assert_eq!(geo.fat_start, 32);
        assert_eq!(geo.data_start, 48);
        assert_eq!(geo.cluster_limit, 202);
        assert_eq!(vol.cluster_size(), 512);
    }

    #[test]
    fn test_file_created_then_found() {
        let mut vol = format_volume();
        let root = vol.root_cluster();
        let name = ShortName::parse("HELLO.TXT").unwrap();
        let body = b"hello from the disk";

        let first = vol.allocate_cluster().unwrap();
        vol.write_file(first, body, body.len() as u32).unwrap();
        vol.create_dir_entry(root, &name, first, body.len() as u32).unwrap();

        let entry = vol.find_dir_entry(root, &name).unwrap();
        let mut buf = [0u8; 64];
        let n = vol.read_file(entry.first_cluster(), &mut buf, entry.file_size).unwrap();
        assert_eq!(&buf[..n], body);
    }

    #[test]
    fn test_remount_sees_same_files() {
        let mut vol = format_volume();
        let root = vol.root_cluster();
        let name = ShortName::parse("DATA.BIN").unwrap();
        let first = vol.allocate_cluster().unwrap();
        vol.write_file(first, &[7u8; 1500], 1500).unwrap();
        vol.create_dir_entry(root, &name, first, 1500).unwrap();

        let mut vol = Fat32Volume::mount(vol.into_device(), 0).unwrap();
        let entry = vol.find_dir_entry(root, &name).unwrap();
        assert_eq!(entry.file_size, 1500);
        assert_eq!(vol.chain_length(entry.first_cluster()).unwrap(), 3);
    }
}
