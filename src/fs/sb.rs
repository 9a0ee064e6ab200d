//! The image superblock and the on-disk region layout.

use crate::error::{FsError, Result};
use crate::image::Image;
use crate::inode::Inode;
use crate::{get_timestamp, reinterpret, reinterpret_mut};
use std::mem::{self, size_of};

/// Magic identifier marking a valid image.
pub const MAGIC: u64 = 0x00BE_AFED_DEAD_BEEF;
/// Size of a data block in bytes.
pub const BLOCK_SIZE: usize = 4096;
/// Number of records in the inode table.
pub const MAX_FILE_COUNT: u16 = 256;

/// The image header, stored at offset 0 of the backing store.
///
/// The record is written to disk as is: fixed-width fields in declaration
/// order, little-endian, with an explicit padding tail so the layout has no
/// hidden compiler padding.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Superblock {
    /// Magic identifier.
    pub magic: u64,
    /// Timestamp of the last mutation, in seconds since the Unix epoch.
    pub last_modified: i64,
    /// Total number of data blocks.
    pub block_count: u32,
    /// Number of allocated data blocks.
    pub occupied_count: u32,
    /// Number of free data blocks.
    pub free_count: u32,
    /// Size of a data block in bytes.
    pub block_size: u16,
    /// Number of records in the inode table.
    pub max_file_count: u16,
    /// Number of inodes currently in use.
    pub file_count: u16,

    /// Structure padding.
    pub _padding: [u8; 6],
}

impl Superblock {
    /// Returns a fresh superblock for an image of `block_count` data blocks.
    pub fn new(block_count: u32) -> Self {
        Self {
            magic: MAGIC,
            last_modified: get_timestamp() as i64,
            block_count,
            occupied_count: 0,
            free_count: block_count,
            block_size: BLOCK_SIZE as u16,
            max_file_count: MAX_FILE_COUNT,
            file_count: 0,

            _padding: [0; 6],
        }
    }

    /// Reads the superblock from the backing store, failing with
    /// [`FsError::BadMagic`] if it does not hold an image.
    pub fn read(img: &mut Image) -> Result<Self> {
        let mut sb: Superblock = unsafe { mem::zeroed() };
        img.read_at(0, reinterpret_mut(&mut sb))?;
        if sb.magic != MAGIC {
            return Err(FsError::BadMagic);
        }
        Ok(sb)
    }

    /// Writes the superblock back at offset 0.
    pub fn write(&self, img: &mut Image) -> Result<()> {
        img.write_at(0, reinterpret(self))?;
        Ok(())
    }

    /// Offset of the inode table.
    pub fn inodes_offset(&self) -> u64 {
        size_of::<Self>() as u64
    }

    /// Offset of the block allocation bitmap.
    pub fn bitmap_offset(&self) -> u64 {
        self.inodes_offset() + self.max_file_count as u64 * size_of::<Inode>() as u64
    }

    /// Length of the block allocation bitmap in bytes.
    pub fn bitmap_len(&self) -> u64 {
        (self.block_count as u64).div_ceil(8)
    }

    /// Offset of the data-block pool.
    pub fn blocks_offset(&self) -> u64 {
        self.bitmap_offset() + self.bitmap_len()
    }

    /// Total length of the image layout in bytes.
    pub fn image_len(&self) -> u64 {
        self.blocks_offset() + self.block_count as u64 * self.block_size as u64
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn superblock_layout() {
        assert_eq!(size_of::<Superblock>(), 40);
    }

    #[test]
    fn region_offsets() {
        let sb = Superblock::new(256);
        assert_eq!(sb.occupied_count + sb.free_count, sb.block_count);
        assert_eq!(sb.inodes_offset(), 40);
        assert_eq!(sb.bitmap_offset(), 40 + 256 * 96);
        assert_eq!(sb.bitmap_len(), 32);
        assert_eq!(sb.blocks_offset(), sb.bitmap_offset() + 32);
        assert_eq!(sb.image_len(), sb.blocks_offset() + 256 * 4096);
    }

    #[test]
    fn bitmap_len_rounds_up() {
        assert_eq!(Superblock::new(1).bitmap_len(), 1);
        assert_eq!(Superblock::new(8).bitmap_len(), 1);
        assert_eq!(Superblock::new(9).bitmap_len(), 2);
    }
}
