//! FAT32 Directory Entry Structures
//!
//! Directory entries are 32 bytes each and contain:
//! - File name (8.3 format, space padded, no dot stored)
//! - Attributes
//! - Timestamps
//! - First cluster (split high/low halves)
//! - File size
//!
//! A directory is a cluster chain of entries, 16 per 512-byte sector.
//! A first name byte of 0x00 ends the directory: scanning stops there even
//! if later slots hold entries. 0xE5 marks a deleted, reusable slot.

use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use super::Fat32Volume;
use crate::error::{StorageError, StorageResult};
use crate::io::block::{BlockDevice, SECTOR_SIZE};

/// Directory entry size
pub const DIR_ENTRY_SIZE: usize = 32;

/// Length of an on-disk short name
pub const SHORT_NAME_LEN: usize = 11;

/// Special first byte values
pub mod entry_status {
    /// Entry is free and all following entries are free
    pub const END: u8 = 0x00;
    /// Entry was deleted
    pub const DELETED: u8 = 0xE5;
}

bitflags::bitflags! {
    /// File attributes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FileAttributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN = 0x02;
        const SYSTEM = 0x04;
        const VOLUME_ID = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE = 0x20;
    }
}

/// An 8.3 name in on-disk form: 8 name bytes and 3 extension bytes,
/// upper case, space padded.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShortName([u8; SHORT_NAME_LEN]);

impl ShortName {
    /// Wrap raw on-disk bytes without checking them. Names that are not
    /// [`storable`](Self::is_storable) are refused by `create_dir_entry`.
    pub const fn from_raw(raw: [u8; SHORT_NAME_LEN]) -> Self {
        Self(raw)
    }

    /// Check that the name can occupy a directory slot: no slot marker or
    /// space in the first byte, no control characters anywhere.
    pub fn is_storable(&self) -> bool {
        !matches!(self.0[0], entry_status::END | entry_status::DELETED | b' ')
            && self.0.iter().all(|&b| b >= 0x20)
    }

    /// Convert `NAME.EXT` to on-disk form.
    ///
    /// Lower case is folded to upper case. Empty names, parts longer than
    /// 8/3 characters, more than one dot and characters FAT does not allow
    /// in short names are rejected.
    pub fn parse(name: &str) -> StorageResult<Self> {
        let (base, ext) = match name.split_once('.') {
            Some((base, ext)) => (base, ext),
            None => (name, ""),
        };

        if base.is_empty() || base.len() > 8 || ext.len() > 3 || ext.contains('.') {
            return Err(StorageError::InvalidName);
        }

        let mut raw = [b' '; SHORT_NAME_LEN];
        for (slot, byte) in raw[..8].iter_mut().zip(base.bytes()) {
            *slot = Self::legal_byte(byte)?;
        }
        for (slot, byte) in raw[8..].iter_mut().zip(ext.bytes()) {
            *slot = Self::legal_byte(byte)?;
        }

        Ok(Self(raw))
    }

    fn legal_byte(byte: u8) -> StorageResult<u8> {
        let byte = byte.to_ascii_uppercase();
        match byte {
            b'A'..=b'Z' | b'0'..=b'9' => Ok(byte),
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'(' | b')' | b'-' | b'@' | b'^'
            | b'_' | b'`' | b'{' | b'}' | b'~' => Ok(byte),
            _ => Err(StorageError::InvalidName),
        }
    }

    pub fn as_bytes(&self) -> &[u8; SHORT_NAME_LEN] {
        &self.0
    }

    /// Name part without padding
    pub fn base(&self) -> &[u8] {
        trim_padding(&self.0[..8])
    }

    /// Extension without padding
    pub fn extension(&self) -> &[u8] {
        trim_padding(&self.0[8..])
    }
}

fn trim_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != b' ').map(|p| p + 1).unwrap_or(0);
    &bytes[..end]
}

impl FromStr for ShortName {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.base() {
            write!(f, "{}", b as char)?;
        }
        let ext = self.extension();
        if !ext.is_empty() {
            f.write_str(".")?;
            for &b in ext {
                write!(f, "{}", b as char)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShortName(\"{}\")", self)
    }
}

/// Short directory entry (8.3 format)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    /// File name and extension, space-padded
    pub name: [u8; SHORT_NAME_LEN],
    /// File attributes
    pub attr: u8,
    /// Reserved (used for lowercase flags in NT)
    pub nt_res: u8,
    /// Creation time (tenths of second)
    pub create_time_tenth: u8,
    /// Creation time
    pub create_time: u16,
    /// Creation date
    pub create_date: u16,
    /// Last access date
    pub access_date: u16,
    /// High 16 bits of first cluster
    pub cluster_hi: u16,
    /// Last modification time
    pub modify_time: u16,
    /// Last modification date
    pub modify_date: u16,
    /// Low 16 bits of first cluster
    pub cluster_lo: u16,
    /// File size in bytes
    pub file_size: u32,
}

impl DirEntry {
    /// A fresh file entry with the archive bit set and zeroed timestamps
    pub fn new_file(name: &ShortName, first_cluster: u32, file_size: u32) -> Self {
        let mut entry = Self {
            name: *name.as_bytes(),
            attr: FileAttributes::ARCHIVE.bits(),
            nt_res: 0,
            create_time_tenth: 0,
            create_time: 0,
            create_date: 0,
            access_date: 0,
            cluster_hi: 0,
            modify_time: 0,
            modify_date: 0,
            cluster_lo: 0,
            file_size,
        };
        entry.set_first_cluster(first_cluster);
        entry
    }

    /// Decode a 32-byte on-disk record
    pub fn from_bytes(raw: &[u8]) -> Self {
        let u16_at = |off: usize| u16::from_le_bytes([raw[off], raw[off + 1]]);
        let mut name = [0u8; SHORT_NAME_LEN];
        name.copy_from_slice(&raw[0..11]);
        Self {
            name,
            attr: raw[11],
            nt_res: raw[12],
            create_time_tenth: raw[13],
            create_time: u16_at(14),
            create_date: u16_at(16),
            access_date: u16_at(18),
            cluster_hi: u16_at(20),
            modify_time: u16_at(22),
            modify_date: u16_at(24),
            cluster_lo: u16_at(26),
            file_size: u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]),
        }
    }

    /// Encode into a 32-byte on-disk record
    pub fn write_to(&self, raw: &mut [u8]) {
        raw[0..11].copy_from_slice(&self.name);
        raw[11] = self.attr;
        raw[12] = self.nt_res;
        raw[13] = self.create_time_tenth;
        raw[14..16].copy_from_slice(&self.create_time.to_le_bytes());
        raw[16..18].copy_from_slice(&self.create_date.to_le_bytes());
        raw[18..20].copy_from_slice(&self.access_date.to_le_bytes());
        raw[20..22].copy_from_slice(&self.cluster_hi.to_le_bytes());
        raw[22..24].copy_from_slice(&self.modify_time.to_le_bytes());
        raw[24..26].copy_from_slice(&self.modify_date.to_le_bytes());
        raw[26..28].copy_from_slice(&self.cluster_lo.to_le_bytes());
        raw[28..32].copy_from_slice(&self.file_size.to_le_bytes());
    }

    pub fn short_name(&self) -> ShortName {
        ShortName::from_raw(self.name)
    }

    pub fn attributes(&self) -> FileAttributes {
        FileAttributes::from_bits_retain(self.attr)
    }

    /// Check if this slot ends the directory
    pub fn is_end(&self) -> bool {
        self.name[0] == entry_status::END
    }

    /// Check if this slot was deleted
    pub fn is_deleted(&self) -> bool {
        self.name[0] == entry_status::DELETED
    }

    /// Check if this is a directory
    pub fn is_directory(&self) -> bool {
        self.attributes().contains(FileAttributes::DIRECTORY)
    }

    /// Get the first cluster number
    pub fn first_cluster(&self) -> u32 {
        ((self.cluster_hi as u32) << 16) | (self.cluster_lo as u32)
    }

    /// Set the first cluster number
    pub fn set_first_cluster(&mut self, cluster: u32) {
        self.cluster_hi = (cluster >> 16) as u16;
        self.cluster_lo = (cluster & 0xFFFF) as u16;
    }
}

/// Where a directory entry lives on disk; stays valid until the slot is
/// rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntryLocation {
    /// Directory cluster holding the entry
    pub cluster: u32,
    /// Absolute sector holding the entry
    pub sector: u32,
    /// Slot index within the sector
    pub slot: usize,
}

impl DirEntryLocation {
    /// Byte offset of the entry inside its sector
    pub fn offset(&self) -> usize {
        self.slot * DIR_ENTRY_SIZE
    }
}

/// Outcome of inspecting one slot during a directory walk
enum Scan<T> {
    Continue,
    /// Stop the walk and return this value
    Done(T),
}

// ============================================================================
// Directory Operations
// ============================================================================

impl<D: BlockDevice> Fat32Volume<D> {
    /// Visit every slot of a directory in order, sector by sector, until
    /// `visit` finishes the walk or the cluster chain ends.
    fn walk_directory<T>(
        &mut self,
        dir_cluster: u32,
        mut visit: impl FnMut(DirEntryLocation, &mut [u8; SECTOR_SIZE]) -> StorageResult<Scan<T>>,
    ) -> StorageResult<Option<T>> {
        let entries_per_sector = self.geometry.entries_per_sector();
        let mut cluster = dir_cluster;
        let mut visited = 0u32;

        loop {
            let first_sector = self.cluster_to_sector(cluster)?;

            for sector_offset in 0..self.geometry.sectors_per_cluster {
                let sector = first_sector + sector_offset;
                let mut buf = [0u8; SECTOR_SIZE];
                self.device.read_sectors(sector, 1, &mut buf)?;

                for slot in 0..entries_per_sector {
                    let location = DirEntryLocation { cluster, sector, slot };
                    if let Scan::Done(value) = visit(location, &mut buf)? {
                        return Ok(Some(value));
                    }
                }
            }

            visited += 1;
            if visited >= self.geometry.cluster_limit {
                return Err(StorageError::InvalidCluster);
            }

            match self.next_cluster(cluster)? {
                Some(next) => cluster = next,
                None => return Ok(None),
            }
        }
    }

    /// Find an entry and report where it lives.
    ///
    /// Deleted slots are skipped. The scan ends at the first never-used
    /// slot, so entries placed after such a gap are not found.
    pub fn locate_dir_entry(
        &mut self,
        dir_cluster: u32,
        name: &ShortName,
    ) -> StorageResult<(DirEntryLocation, DirEntry)> {
        let found = self.walk_directory(dir_cluster, |location, buf| {
            let raw = &buf[location.offset()..location.offset() + DIR_ENTRY_SIZE];
            match raw[0] {
                entry_status::END => Err(StorageError::EntryNotFound),
                entry_status::DELETED => Ok(Scan::Continue),
                _ if raw[..SHORT_NAME_LEN] == name.as_bytes()[..] => {
                    Ok(Scan::Done((location, DirEntry::from_bytes(raw))))
                }
                _ => Ok(Scan::Continue),
            }
        })?;

        found.ok_or(StorageError::EntryNotFound)
    }

    /// Look up `name` in a directory, returning a copy of its entry
    pub fn find_dir_entry(&mut self, dir_cluster: u32, name: &ShortName) -> StorageResult<DirEntry> {
        self.locate_dir_entry(dir_cluster, name).map(|(_, entry)| entry)
    }

    /// Re-read the entry at a location returned by a lookup or create
    pub fn read_dir_entry(&mut self, location: &DirEntryLocation) -> StorageResult<DirEntry> {
        let mut buf = [0u8; SECTOR_SIZE];
        self.device.read_sectors(location.sector, 1, &mut buf)?;
        let offset = location.offset();
        Ok(DirEntry::from_bytes(&buf[offset..offset + DIR_ENTRY_SIZE]))
    }

    /// Write a new file entry into the first never-used or deleted slot.
    ///
    /// The directory is never extended: when its existing chain has no
    /// free slot the call fails with `DirectoryFull`.
    pub fn create_dir_entry(
        &mut self,
        dir_cluster: u32,
        name: &ShortName,
        first_cluster: u32,
        size: u32,
    ) -> StorageResult<DirEntryLocation> {
        if !name.is_storable() {
            return Err(StorageError::InvalidName);
        }

        let entry = DirEntry::new_file(name, first_cluster, size);
        let mut target = None;

        self.walk_directory(dir_cluster, |location, buf| {
            let offset = location.offset();
            match buf[offset] {
                entry_status::END | entry_status::DELETED => {
                    entry.write_to(&mut buf[offset..offset + DIR_ENTRY_SIZE]);
                    target = Some((location, *buf));
                    Ok(Scan::Done(()))
                }
                _ => Ok(Scan::Continue),
            }
        })?;

        let (location, sector) = target.ok_or(StorageError::DirectoryFull)?;
        self.device.write_sectors(location.sector, 1, &sector)?;
        Ok(location)
    }

    /// List the live entries of a directory up to its end marker
    pub fn read_dir(&mut self, dir_cluster: u32) -> StorageResult<Vec<DirEntry>> {
        let mut entries = Vec::new();

        self.walk_directory(dir_cluster, |location, buf| {
            let raw = &buf[location.offset()..location.offset() + DIR_ENTRY_SIZE];
            match raw[0] {
                entry_status::END => Ok(Scan::Done(())),
                entry_status::DELETED => Ok(Scan::Continue),
                _ => {
                    entries.push(DirEntry::from_bytes(raw));
                    Ok(Scan::Continue)
                }
            }
        })?;

        Ok(entries)
    }
}
