//! Storage Error Codes
//!
//! Every failure in the driver and file system layers is reported to the
//! immediate caller as a [`StorageError`]. Nothing is retried and nothing
//! is logged here; a failed multi-sector transfer leaves the sectors it
//! already moved in place.

use core::fmt;

/// Storage operation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StorageError {
    /// Status register never reached the awaited state within the poll budget
    DeviceTimeout = 1,
    /// Error or fault bit observed while waiting for data
    DeviceError = 2,
    /// Sector count outside 1..=256
    InvalidSectorCount = 3,
    /// Caller buffer shorter than the requested transfer
    BufferTooSmall = 4,
    /// Transfer runs past the 28-bit LBA range
    LbaOutOfRange = 5,
    /// No free cluster left in the FAT
    ClusterAllocationExhausted = 6,
    /// Name lookup reached the end of the directory
    EntryNotFound = 7,
    /// No free or deleted slot in the directory's cluster chain
    DirectoryFull = 8,
    /// Boot sector geometry the layer cannot address
    UnsupportedGeometry = 9,
    /// Not a valid 8.3 short name
    InvalidName = 10,
    /// Cluster number outside the data region
    InvalidCluster = 11,
    /// Root volume slot is empty
    NotMounted = 12,
    /// Partition table signature missing
    InvalidPartitionTable = 13,
}

impl StorageError {
    /// Short human readable description
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DeviceTimeout => "device timeout",
            Self::DeviceError => "device error",
            Self::InvalidSectorCount => "invalid sector count",
            Self::BufferTooSmall => "buffer too small",
            Self::LbaOutOfRange => "LBA out of range",
            Self::ClusterAllocationExhausted => "no free cluster",
            Self::EntryNotFound => "entry not found",
            Self::DirectoryFull => "directory full",
            Self::UnsupportedGeometry => "unsupported volume geometry",
            Self::InvalidName => "invalid 8.3 name",
            Self::InvalidCluster => "invalid cluster",
            Self::NotMounted => "volume not mounted",
            Self::InvalidPartitionTable => "invalid partition table",
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result type used throughout the storage stack
pub type StorageResult<T> = Result<T, StorageError>;
