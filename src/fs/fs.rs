//! The filesystem object and its namespace operations.

use crate::dir::MAX_NAME_LENGTH;
use crate::error::{FsError, Result};
use crate::get_timestamp;
use crate::image::Image;
use crate::inode::{FileType, INODE_USED_MASK, Inode};
use crate::path;
use crate::sb::{BLOCK_SIZE, Superblock};
use log::{debug, info};
use std::io;
use std::mem::size_of;
use std::path::Path;

/// Index of the root directory's inode.
pub const ROOT_INODE: u32 = 0;

/// A filesystem image opened for exclusive, single-threaded use.
///
/// The in-memory state is the backing-store handle and a working copy of
/// the superblock; everything else lives in the image. The backing store is
/// closed when the value is dropped.
pub struct FileSystem {
    pub(crate) img: Image,
    pub(crate) sb: Superblock,
}

impl FileSystem {
    /// Formats a fresh image at `path`, truncating any existing file.
    ///
    /// `len` is the requested data capacity in bytes; it is rounded up to a
    /// whole number of blocks. All regions are written out zeroed, then the
    /// root directory is established at inode 0.
    pub fn format(path: &Path, len: u64) -> Result<Self> {
        let block_count = len.div_ceil(BLOCK_SIZE as u64) as u32;
        let img = Image::create(path)?;
        let sb = Superblock::new(block_count);
        let mut fs = Self { img, sb };
        fs.sb.write(&mut fs.img)?;
        fs.init_inode_table()?;
        fs.init_bitmap()?;
        fs.init_blocks()?;
        fs.create_root()?;
        info!(
            "created image at {} with {block_count} blocks",
            path.display()
        );
        Ok(fs)
    }

    /// Opens an existing image at `path`.
    ///
    /// Fails with [`FsError::BadMagic`] when the file does not start with a
    /// valid superblock, and refuses backing storage smaller than the
    /// layout the superblock declares.
    pub fn open(path: &Path) -> Result<Self> {
        let mut img = Image::open(path)?;
        let sb = Superblock::read(&mut img)?;
        if img.storage_size()? < sb.image_len() {
            return Err(FsError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "backing store smaller than the image layout",
            )));
        }
        let block_count = sb.block_count;
        info!(
            "opened image at {} with {block_count} blocks",
            path.display()
        );
        Ok(Self { img, sb })
    }

    /// Returns a copy of the current superblock.
    pub fn superblock(&self) -> Superblock {
        self.sb
    }

    fn init_inode_table(&mut self) -> Result<()> {
        let zeros = vec![0u8; self.sb.max_file_count as usize * size_of::<Inode>()];
        self.img.write_at(self.sb.inodes_offset(), &zeros)?;
        Ok(())
    }

    fn init_bitmap(&mut self) -> Result<()> {
        let zeros = vec![0u8; self.sb.bitmap_len() as usize];
        self.img.write_at(self.sb.bitmap_offset(), &zeros)?;
        Ok(())
    }

    fn init_blocks(&mut self) -> Result<()> {
        let zeros = [0u8; BLOCK_SIZE];
        let base = self.sb.blocks_offset();
        for i in 0..self.sb.block_count as u64 {
            self.img.write_at(base + i * BLOCK_SIZE as u64, &zeros)?;
        }
        Ok(())
    }

    /// Establishes the root directory at inode 0 with its `.` and `..`
    /// records, both referring to the root itself.
    fn create_root(&mut self) -> Result<()> {
        let now = get_timestamp();
        let mut root = self.read_inode(ROOT_INODE)?;
        root.creation_time = now;
        root.last_modified = now;
        root.size = 0;
        root.reference_count = 1;
        root.flags = INODE_USED_MASK | FileType::Directory as u8;
        self.write_inode(ROOT_INODE, &root)?;
        self.append_dir_entry(ROOT_INODE, ROOT_INODE, b".")?;
        self.append_dir_entry(ROOT_INODE, ROOT_INODE, b"..")?;
        self.sb.file_count += 1;
        self.sb.write(&mut self.img)?;
        Ok(())
    }

    /// Resolves a slash-delimited path to an inode index.
    ///
    /// `"/"` and the empty path resolve to the root. A missing intermediate
    /// segment fails as a missing directory, a missing final segment as a
    /// missing file; looking a segment up inside a non-directory counts as
    /// missing.
    pub fn resolve(&mut self, path: &str) -> Result<u32> {
        let segments = path::components(path);
        let mut index = ROOT_INODE;
        for (i, segment) in segments.iter().enumerate() {
            index = self
                .lookup_dir(index, segment.as_bytes())
                .map_err(|e| match e {
                    FsError::DirectoryNotFound if i == segments.len() - 1 => FsError::FileNotFound,
                    e => e,
                })?;
        }
        Ok(index)
    }

    /// Creates a file, directory or link inode named `name` under the
    /// directory at `parent_path` and returns its index.
    ///
    /// The new inode starts with one pre-allocated data block and a 1-byte
    /// placeholder content; directories get their `.` and `..` records
    /// written over that placeholder so the payload is a valid record
    /// sequence from offset 0.
    pub fn create_in(&mut self, name: &str, parent_path: &str, ftype: FileType) -> Result<u32> {
        let parent = self.resolve(parent_path)?;
        if self.read_inode(parent)?.file_type() != Some(FileType::Directory) {
            return Err(FsError::NotADirectory);
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(FsError::NameTooLong);
        }
        if !self.is_name_unique(parent, name.as_bytes())? {
            return Err(FsError::NameExists);
        }

        let child = self.find_unused_inode()?;
        let first_block = self.allocate_block()?;
        self.write_inode(child, &Inode::new(ftype, first_block))?;
        if ftype == FileType::Directory {
            self.write_dir_entry_at(child, child, b".", 0)?;
            self.append_dir_entry(child, parent, b"..")?;
        }
        self.sb.file_count += 1;
        self.sb.write(&mut self.img)?;
        self.append_dir_entry(parent, child, name.as_bytes())?;
        debug!("created inode {child} ({name}) under inode {parent}");
        Ok(child)
    }

    /// Creates a file, directory or link inode at the given full path.
    pub fn create(&mut self, path: &str, ftype: FileType) -> Result<u32> {
        let (parent, name) = path::split_parent(path);
        self.create_in(&name, &parent, ftype)
    }

    /// Creates every missing directory along `path`.
    ///
    /// Prefixes that already exist are left untouched, so running the same
    /// `mkdir` twice changes nothing the second time.
    pub fn mkdir(&mut self, path: &str) -> Result<()> {
        let mut parent = String::from("/");
        for segment in path::components(path) {
            match self.resolve(&format!("{parent}{segment}")) {
                Ok(_) => {}
                Err(FsError::FileNotFound | FsError::DirectoryNotFound) => {
                    self.create_in(segment, &parent, FileType::Directory)?;
                }
                Err(e) => return Err(e),
            }
            parent.push_str(segment);
            parent.push('/');
        }
        Ok(())
    }

    /// Adds a hard link named `link_name` next to the target of
    /// `target_path` and bumps the target's reference count.
    pub fn link(&mut self, link_name: &str, target_path: &str) -> Result<()> {
        let target = self.resolve(target_path)?;
        let (parent_path, _) = path::split_parent(target_path);
        let parent = self.resolve(&parent_path)?;
        if link_name.len() > MAX_NAME_LENGTH {
            return Err(FsError::NameTooLong);
        }
        if !self.is_name_unique(parent, link_name.as_bytes())? {
            return Err(FsError::NameExists);
        }
        self.append_dir_entry(parent, target, link_name.as_bytes())?;
        let mut inode = self.read_inode(target)?;
        inode.reference_count += 1;
        self.write_inode(target, &inode)?;
        Ok(())
    }

    /// Removes the regular file or link at `path`: decrements its reference
    /// count and, when no link remains, releases its blocks, drops its
    /// parent-directory record and frees the inode.
    pub fn rm(&mut self, path: &str) -> Result<()> {
        let index = self.resolve(path)?;
        let (parent_path, _) = path::split_parent(path);
        let parent = self.resolve(&parent_path)?;
        let mut inode = self.read_inode(index)?;
        if inode.file_type() == Some(FileType::Directory) {
            return Err(FsError::NotAFile);
        }
        inode.reference_count -= 1;
        if inode.reference_count == 0 {
            self.resize_file(index, 0)?;
            self.remove_dir_entry(parent, index)?;
            let mut inode = self.read_inode(index)?;
            inode.flags = 0;
            inode.creation_time = 0;
            inode.reference_count = 0;
            self.write_inode(index, &inode)?;
            self.sb.file_count -= 1;
            debug!("released inode {index}");
        } else {
            self.write_inode(index, &inode)?;
        }
        self.sb.last_modified = get_timestamp() as i64;
        self.sb.write(&mut self.img)?;
        Ok(())
    }

    /// Grows the regular file at `path` by `bytes` bytes.
    pub fn extend(&mut self, path: &str, bytes: u64) -> Result<()> {
        let index = self.resolve(path)?;
        let inode = self.read_inode(index)?;
        if inode.file_type() != Some(FileType::Regular) {
            return Err(FsError::NotAFile);
        }
        let new_size = inode.size.checked_add(bytes).ok_or(FsError::FileTooLarge)?;
        self.resize_file(index, new_size)
    }

    /// Shrinks the regular file at `path` by `bytes` bytes, stopping at
    /// zero.
    pub fn truncate(&mut self, path: &str, bytes: u64) -> Result<()> {
        let index = self.resolve(path)?;
        let inode = self.read_inode(index)?;
        if inode.file_type() != Some(FileType::Regular) {
            return Err(FsError::NotAFile);
        }
        self.resize_file(index, inode.size.saturating_sub(bytes))
    }

    /// Renders the listing of the directory at `path`; the empty path lists
    /// the root.
    ///
    /// The first line reports the payload size of the directory itself,
    /// then one line per record: the type tag (`F`, `D` or `L`), the name
    /// (directories keep a trailing slash) and the size in bytes.
    pub fn ls(&mut self, path: &str) -> Result<String> {
        let dir = if path.is_empty() { "/" } else { path };
        let index = self.resolve(dir)?;
        let inode = self.read_inode(index)?;
        if inode.file_type() != Some(FileType::Directory) {
            return Err(FsError::NotADirectory);
        }
        let mut out = format!("{dir} size: {}\n", inode.size);
        for entry in self.read_dir(index)? {
            let child = self.read_inode(entry.inode_id)?;
            let (tag, slash) = match child.file_type() {
                Some(FileType::Directory) => ("D", "/"),
                Some(FileType::Link) => ("L", ""),
                _ => ("F", ""),
            };
            let name = String::from_utf8_lossy(&entry.name);
            out.push_str(&format!("{tag} {name}{slash} {}\n", child.size));
        }
        Ok(out)
    }

    /// Renders the usage report: block totals and inode totals.
    pub fn df(&self) -> String {
        format!(
            "Block count (used/free): {} ({} / {}).\nInode count: {} (used: {}).\n",
            self.sb.block_count,
            self.sb.occupied_count,
            self.sb.free_count,
            self.sb.max_file_count,
            self.sb.file_count
        )
    }

    /// Imports the host file at `local` as a regular file at
    /// `virtual_path`.
    pub fn upload(&mut self, local: &Path, virtual_path: &str) -> Result<()> {
        let data = std::fs::read(local)?;
        let index = self.create(virtual_path, FileType::Regular)?;
        self.write_file(index, &data, 0)?;
        Ok(())
    }

    /// Exports the virtual file at `virtual_path` into the host file at
    /// `local`, truncating it.
    pub fn extract(&mut self, virtual_path: &str, local: &Path) -> Result<()> {
        let index = self.resolve(virtual_path)?;
        let size = self.read_inode(index)?.size;
        let mut data = vec![0u8; size as usize];
        self.read_file(index, &mut data, 0)?;
        std::fs::write(local, &data)?;
        Ok(())
    }
}
