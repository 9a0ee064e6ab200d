//! Core of a miniature Unix-style filesystem stored inside a single host
//! file.
//!
//! The image is laid out as a superblock, a fixed inode table, a block
//! allocation bitmap and a pool of 4096-byte data blocks, in that order,
//! contiguous and without padding between the regions. Inodes address their
//! content through a classical direct/single-indirect/double-indirect
//! pointer map. All multi-byte on-disk fields are little-endian.
//!
//! The entry point is [`FileSystem`], which owns the backing store for the
//! lifetime of the session and exposes the namespace operations consumed by
//! the interactive shell.

pub mod bitmap;
pub mod block;
pub mod dir;
pub mod error;
pub mod file;
pub mod fs;
pub mod image;
pub mod inode;
pub mod path;
pub mod sb;

pub use crate::error::{FsError, Result};
pub use crate::fs::{FileSystem, ROOT_INODE};
pub use crate::inode::FileType;

use std::mem::size_of;
use std::slice;
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current timestamp since the Unix epoch, in seconds.
pub(crate) fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System clock panic!")
        .as_secs()
}

/// Returns a view of the raw bytes of the given on-disk record.
pub(crate) fn reinterpret<T>(val: &T) -> &[u8] {
    unsafe { slice::from_raw_parts(val as *const T as *const u8, size_of::<T>()) }
}

/// Returns a mutable view of the raw bytes of the given on-disk record.
pub(crate) fn reinterpret_mut<T>(val: &mut T) -> &mut [u8] {
    unsafe { slice::from_raw_parts_mut(val as *mut T as *mut u8, size_of::<T>()) }
}
