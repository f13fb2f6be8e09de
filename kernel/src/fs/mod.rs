//! File System Subsystem
//!
//! Provides file system support on top of the block I/O layer:
//! - FAT32 file system driver
//! - MBR partition discovery
//! - The root volume mount slot
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Root mount slot (spin::Mutex)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  FAT32 volume (per mount)                   │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────┐            │
//! │  │  FAT table  │ │  File data  │ │ Directories │            │
//! │  └─────────────┘ └─────────────┘ └─────────────┘            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Block I/O Layer                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Supported File Systems
//! - **FAT32**: read and write of whole files, 8.3 short names

pub mod fat32;
pub mod mount;
pub mod partition;

// Re-export common types
pub use fat32::{DirEntry, DirEntryLocation, Fat32Volume, FileAttributes, ShortName};
pub use mount::{is_mounted, mount_root, unmount_root, with_root};
pub use partition::{MasterBootRecord, PartitionEntry};
