//! Typed errors surfaced by the filesystem operations.

use std::io;
use thiserror::Error;

/// An error occurring while operating on a filesystem image.
///
/// The messages are the ones shown to the shell user, so they are full
/// sentences.
#[derive(Debug, Error)]
pub enum FsError {
    /// The inode table has no unused record left.
    #[error("No empty inodes.")]
    NoFreeInode,
    /// The image has no free data block left.
    #[error("Not enough space.")]
    OutOfSpace,
    /// The operation requires a directory.
    #[error("Not a directory.")]
    NotADirectory,
    /// The operation requires a regular file.
    #[error("Not a file.")]
    NotAFile,
    /// The requested size exceeds what one inode can address.
    #[error("File size too big to be supported.")]
    FileTooLarge,
    /// A read would cross the end of the file.
    #[error("Read position and size exceeding file bounds.")]
    ReadOutOfBounds,
    /// A path segment did not resolve to a directory entry.
    #[error("Directory not found.")]
    DirectoryNotFound,
    /// The final path segment did not resolve to an entry.
    #[error("File not found.")]
    FileNotFound,
    /// The name is already taken in the target directory.
    #[error("Name already exists.")]
    NameExists,
    /// The name exceeds the longest encodable directory record name.
    #[error("Name too long.")]
    NameTooLong,
    /// The backing store does not hold a filesystem image.
    #[error("Bad magic number in superblock.")]
    BadMagic,
    /// An error on the host file holding the image.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The result type of every fallible filesystem operation.
pub type Result<T> = std::result::Result<T, FsError>;
