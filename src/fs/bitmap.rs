//! The block allocation bitmap.
//!
//! One bit per data block, LSB-first within each byte: block `i` maps to
//! byte `i / 8`, bit `i % 8`. A set bit means the block is owned by exactly
//! one inode, either as data or as an indirect pointer table.

use crate::error::{FsError, Result};
use crate::fs::FileSystem;
use log::debug;

impl FileSystem {
    /// Tells whether block `index` is allocated.
    pub fn read_bit(&mut self, index: u32) -> Result<bool> {
        let off = self.sb.bitmap_offset() + (index / 8) as u64;
        let mut byte = [0u8; 1];
        self.img.read_at(off, &mut byte)?;
        Ok(byte[0] & (1 << (index % 8)) != 0)
    }

    /// Sets or clears the allocation bit of block `index`.
    pub fn write_bit(&mut self, index: u32, value: bool) -> Result<()> {
        let off = self.sb.bitmap_offset() + (index / 8) as u64;
        let mut byte = [0u8; 1];
        self.img.read_at(off, &mut byte)?;
        if value {
            byte[0] |= 1 << (index % 8);
        } else {
            byte[0] &= !(1 << (index % 8));
        }
        self.img.write_at(off, &byte)?;
        Ok(())
    }

    /// Returns the index of the first free block, scanning from block 0.
    pub fn find_unused_block(&mut self) -> Result<u32> {
        for i in 0..self.sb.block_count {
            if !self.read_bit(i)? {
                return Ok(i);
            }
        }
        Err(FsError::OutOfSpace)
    }

    /// Allocates the first free block and persists the usage counters.
    ///
    /// The block keeps whatever content it had; released blocks are
    /// zero-filled, so in practice a fresh block reads as zeros.
    pub fn allocate_block(&mut self) -> Result<u32> {
        let index = self.find_unused_block()?;
        self.write_bit(index, true)?;
        self.sb.occupied_count += 1;
        self.sb.free_count -= 1;
        self.sb.write(&mut self.img)?;
        debug!("allocated block {index}");
        Ok(index)
    }

    /// Releases block `index`: clears its bit, zero-fills its content and
    /// persists the usage counters.
    pub fn release_block(&mut self, index: u32) -> Result<()> {
        self.write_bit(index, false)?;
        self.zero_block(index)?;
        self.sb.occupied_count -= 1;
        self.sb.free_count += 1;
        self.sb.write(&mut self.img)?;
        debug!("released block {index}");
        Ok(())
    }
}
