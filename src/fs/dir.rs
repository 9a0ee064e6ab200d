//! The directory payload format.
//!
//! A directory is a regular file whose content is a packed sequence of
//! records `child_inode_id: u32 | name_len: u32 | name bytes`, in insertion
//! order. Names are raw bytes without a terminator and record headers are
//! little-endian. Records may straddle block boundaries, so every access
//! goes through the positioned file I/O rather than whole-block reads.

use crate::error::{FsError, Result};
use crate::fs::FileSystem;
use crate::inode::FileType;

/// Highest allowed length of a record name, in bytes.
pub const MAX_NAME_LENGTH: usize = 256;

/// Byte size of a record header (child inode id and name length).
const RECORD_HEADER_SIZE: u64 = 8;

/// One decoded directory record.
pub struct DirEntry {
    /// The inode the record refers to.
    pub inode_id: u32,
    /// The raw name bytes.
    pub name: Vec<u8>,
}

/// Encodes a record for the given child and name.
fn encode_record(child: u32, name: &[u8]) -> Vec<u8> {
    let mut record = Vec::with_capacity(RECORD_HEADER_SIZE as usize + name.len());
    record.extend_from_slice(&child.to_le_bytes());
    record.extend_from_slice(&(name.len() as u32).to_le_bytes());
    record.extend_from_slice(name);
    record
}

impl FileSystem {
    /// Decodes the record starting at byte `pos` of directory `dir`,
    /// returning the entry and the position of the record after it.
    fn read_dir_entry_at(&mut self, dir: u32, pos: u64) -> Result<(DirEntry, u64)> {
        let mut header = [0u8; RECORD_HEADER_SIZE as usize];
        self.read_file(dir, &mut header, pos)?;
        let inode_id = u32::from_le_bytes(header[0..4].try_into().unwrap());
        let name_len = u32::from_le_bytes(header[4..8].try_into().unwrap());
        let mut name = vec![0u8; name_len as usize];
        self.read_file(dir, &mut name, pos + RECORD_HEADER_SIZE)?;
        Ok((
            DirEntry { inode_id, name },
            pos + RECORD_HEADER_SIZE + name_len as u64,
        ))
    }

    /// Returns all records of directory `dir` in insertion order.
    pub fn read_dir(&mut self, dir: u32) -> Result<Vec<DirEntry>> {
        let size = self.read_inode(dir)?.size;
        let mut entries = Vec::new();
        let mut pos = 0;
        while pos < size {
            let (entry, next) = self.read_dir_entry_at(dir, pos)?;
            entries.push(entry);
            pos = next;
        }
        Ok(entries)
    }

    /// Writes the record `(child, name)` at byte `pos` of directory `dir`.
    pub(crate) fn write_dir_entry_at(
        &mut self,
        dir: u32,
        child: u32,
        name: &[u8],
        pos: u64,
    ) -> Result<()> {
        self.write_file(dir, &encode_record(child, name), pos)
    }

    /// Appends the record `(child, name)` at the end of directory `parent`.
    ///
    /// No duplicate check happens here; callers check uniqueness first.
    pub(crate) fn append_dir_entry(&mut self, parent: u32, child: u32, name: &[u8]) -> Result<()> {
        let size = self.read_inode(parent)?.size;
        self.write_dir_entry_at(parent, child, name, size)
    }

    /// Looks `name` up in directory `dir` and returns the child inode id.
    ///
    /// Fails with [`FsError::DirectoryNotFound`] when `dir` is not a
    /// directory or holds no record with that name.
    pub fn lookup_dir(&mut self, dir: u32, name: &[u8]) -> Result<u32> {
        let inode = self.read_inode(dir)?;
        if inode.file_type() != Some(FileType::Directory) {
            return Err(FsError::DirectoryNotFound);
        }
        let size = inode.size;
        let mut pos = 0;
        while pos < size {
            let (entry, next) = self.read_dir_entry_at(dir, pos)?;
            if entry.name == name {
                return Ok(entry.inode_id);
            }
            pos = next;
        }
        Err(FsError::DirectoryNotFound)
    }

    /// Tells whether directory `dir` holds no record named `name`.
    pub(crate) fn is_name_unique(&mut self, dir: u32, name: &[u8]) -> Result<bool> {
        match self.lookup_dir(dir, name) {
            Ok(_) => Ok(false),
            Err(FsError::DirectoryNotFound) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Removes the first record of directory `parent` referring to inode
    /// `child`, splicing the records after it over the removed one.
    ///
    /// Directories holding no such record are left untouched.
    pub(crate) fn remove_dir_entry(&mut self, parent: u32, child: u32) -> Result<()> {
        let size = self.read_inode(parent)?.size;
        let mut pos = 0;
        while pos < size {
            let (entry, next) = self.read_dir_entry_at(parent, pos)?;
            if entry.inode_id == child {
                let mut tail = vec![0u8; (size - next) as usize];
                self.read_file(parent, &mut tail, next)?;
                self.write_file(parent, &tail, pos)?;
                self.resize_file(parent, size - (next - pos))?;
                return Ok(());
            }
            pos = next;
        }
        Ok(())
    }
}
