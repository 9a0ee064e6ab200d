//! Inode records and the inode table.

use crate::error::{FsError, Result};
use crate::fs::FileSystem;
use crate::sb::BLOCK_SIZE;
use crate::{get_timestamp, reinterpret, reinterpret_mut};
use std::mem::{self, size_of};

/// Number of block pointers held directly in an inode.
pub const INODE_PRIMARY_TABLE_SIZE: usize = 15;
/// Number of 32-bit block pointers held in one indirect table block.
pub const INODE_BLOCK_POINTER_TABLE_SIZE: usize = BLOCK_SIZE / 4;
/// Maximum number of logical data blocks a single inode can address.
pub const MAX_INODE_BLOCK_COUNT: u64 = (INODE_PRIMARY_TABLE_SIZE
    + INODE_BLOCK_POINTER_TABLE_SIZE * (INODE_BLOCK_POINTER_TABLE_SIZE + 1))
    as u64;

/// Flag bit marking an inode as in use.
pub const INODE_USED_MASK: u8 = 0b1000_0000;
/// Flag bits encoding the inode's type.
pub const INODE_MODE_MASK: u8 = 0b0110_0000;

/// The kind of object an inode describes, encoded in the two type bits of
/// the flag byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum FileType {
    /// A regular file.
    Regular = 0b0010_0000,
    /// A directory.
    Directory = 0b0100_0000,
    /// A hard-linked file.
    Link = 0b0110_0000,
}

impl FileType {
    /// Decodes the type bits of the given flag byte.
    pub fn from_flags(flags: u8) -> Option<Self> {
        match flags & INODE_MODE_MASK {
            0b0010_0000 => Some(Self::Regular),
            0b0100_0000 => Some(Self::Directory),
            0b0110_0000 => Some(Self::Link),
            _ => None,
        }
    }
}

/// One record of the inode table.
///
/// The record has a fixed stride: the `i`th inode lives at
/// `inodes_offset + i * size_of::<Inode>()`. The explicit padding byte keeps
/// the layout free of hidden compiler padding.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Inode {
    /// Creation timestamp, in seconds since the Unix epoch.
    pub creation_time: u64,
    /// Timestamp of the last content or metadata change.
    pub last_modified: u64,
    /// Size of the content in bytes.
    pub size: u64,
    /// Direct data-block pointers.
    pub data_pointers: [u32; INODE_PRIMARY_TABLE_SIZE],
    /// Block holding the single-indirect pointer table.
    pub single_indirect: u32,
    /// Block holding the double-indirect table of pointer tables.
    pub double_indirect: u32,
    /// Number of directory records referring to this inode.
    pub reference_count: u16,
    /// `UMMxxxxx`: the in-use bit, two type bits, then reserved zero bits.
    pub flags: u8,

    /// Structure padding.
    pub _padding: u8,
}

impl Inode {
    /// Returns a fresh in-use inode of the given type holding one
    /// pre-allocated data block and a 1-byte placeholder content.
    pub fn new(ftype: FileType, first_block: u32) -> Self {
        let now = get_timestamp();
        let mut data_pointers = [0u32; INODE_PRIMARY_TABLE_SIZE];
        data_pointers[0] = first_block;
        Self {
            creation_time: now,
            last_modified: now,
            size: 1,
            data_pointers,
            single_indirect: 0,
            double_indirect: 0,
            reference_count: 1,
            flags: INODE_USED_MASK | ftype as u8,

            _padding: 0,
        }
    }

    /// Tells whether the in-use bit is set.
    pub fn is_used(&self) -> bool {
        self.flags & INODE_USED_MASK != 0
    }

    /// Returns the type encoded in the flag byte.
    pub fn file_type(&self) -> Option<FileType> {
        FileType::from_flags(self.flags)
    }
}

impl FileSystem {
    /// Reads the inode record at table index `index`.
    pub fn read_inode(&mut self, index: u32) -> Result<Inode> {
        let off = self.sb.inodes_offset() + index as u64 * size_of::<Inode>() as u64;
        let mut inode: Inode = unsafe { mem::zeroed() };
        self.img.read_at(off, reinterpret_mut(&mut inode))?;
        Ok(inode)
    }

    /// Writes the inode record at table index `index`.
    pub fn write_inode(&mut self, index: u32, inode: &Inode) -> Result<()> {
        let off = self.sb.inodes_offset() + index as u64 * size_of::<Inode>() as u64;
        self.img.write_at(off, reinterpret(inode))?;
        Ok(())
    }

    /// Returns the index of the first unused inode, scanning from index 0.
    ///
    /// The root always occupies index 0, so allocation never hands it out.
    pub fn find_unused_inode(&mut self) -> Result<u32> {
        for i in 0..self.sb.max_file_count as u32 {
            if !self.read_inode(i)?.is_used() {
                return Ok(i);
            }
        }
        Err(FsError::NoFreeInode)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn inode_layout() {
        assert_eq!(size_of::<Inode>(), 96);
        assert_eq!(MAX_INODE_BLOCK_COUNT, 1_049_615);
    }

    #[test]
    fn type_flags() {
        for ftype in [FileType::Regular, FileType::Directory, FileType::Link] {
            let inode = Inode::new(ftype, 3);
            assert!(inode.is_used());
            assert_eq!(inode.file_type(), Some(ftype));
        }
        assert_eq!(FileType::from_flags(0), None);
        assert_eq!(FileType::from_flags(INODE_USED_MASK), None);
    }
}
