//! Root Volume Mount Slot
//!
//! Holds the kernel's single mounted root volume. The slot's lock is the
//! serialization point for every caller: sector I/O and FAT
//! read-modify-write sequences both run with it held, so no caller ever
//! observes a half-updated FAT entry.

use alloc::boxed::Box;
use spin::Mutex;

use super::fat32::Fat32Volume;
use crate::error::{StorageError, StorageResult};
use crate::io::block::BlockDevice;

/// Device type stored in the root slot
pub type RootDevice = Box<dyn BlockDevice + Send>;

/// The mounted root volume
pub type RootVolume = Fat32Volume<RootDevice>;

static ROOT: Mutex<Option<RootVolume>> = Mutex::new(None);

/// Mount the FAT32 volume at `partition_start` on `device` as root.
///
/// Any previously mounted root is unmounted and dropped.
pub fn mount_root(device: RootDevice, partition_start: u32) -> StorageResult<()> {
    let volume = Fat32Volume::mount(device, partition_start)?;
    let previous = ROOT.lock().replace(volume);
    if previous.is_some() {
        log::info!("fs: replaced root volume");
    }
    Ok(())
}

/// Unmount the root volume, returning its device
pub fn unmount_root() -> StorageResult<RootDevice> {
    ROOT.lock()
        .take()
        .map(Fat32Volume::into_device)
        .ok_or(StorageError::NotMounted)
}

/// Check if a root volume is mounted
pub fn is_mounted() -> bool {
    ROOT.lock().is_some()
}

/// Run `f` against the root volume with the slot locked
pub fn with_root<R>(f: impl FnOnce(&mut RootVolume) -> StorageResult<R>) -> StorageResult<R> {
    let mut guard = ROOT.lock();
    let volume = guard.as_mut().ok_or(StorageError::NotMounted)?;
    f(volume)
}
