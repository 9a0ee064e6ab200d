//! Positioned I/O on the backing store holding the filesystem image.
//!
//! All higher layers compute absolute byte offsets from the region offsets
//! derived from the superblock and go through [`Image::read_at`] and
//! [`Image::write_at`]; there is no buffering above the host file.

use std::ffi::c_long;
use std::fs::{File, OpenOptions};
use std::io::{self, Error, Read, Seek, SeekFrom, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;

/// ioctl macro: Command.
macro_rules! ioc {
    ($a:expr, $b:expr, $c:expr, $d:expr) => {
        (($a) << 30) | (($b) << 8) | ($c) | (($d) << 16)
    };
}

/// ioctl macro: Read command.
macro_rules! ior {
    ($a:expr, $b:expr, $c:ty) => {
        ioc!(2, $a, $b, std::mem::size_of::<$c>() as c_long)
    };
}

/// ioctl command: Get size of a block device in bytes.
const BLKGETSIZE64: c_long = ior!(0x12, 114, u64);

/// Random-access handle on the host file backing an image.
///
/// The handle is exclusive to the running session; it is closed when the
/// value is dropped.
pub struct Image {
    file: File,
}

impl Image {
    /// Creates or truncates the backing store at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self { file })
    }

    /// Opens an existing backing store at `path` for reading and writing.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self { file })
    }

    /// Reads exactly `buf.len()` bytes at absolute byte offset `off`.
    pub fn read_at(&mut self, off: u64, buf: &mut [u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(off))?;
        self.file.read_exact(buf)
    }

    /// Writes the whole of `buf` at absolute byte offset `off`.
    pub fn write_at(&mut self, off: u64, buf: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(off))?;
        self.file.write_all(buf)
    }

    /// Returns the size of the backing storage in bytes.
    ///
    /// Block and character devices are probed with `BLKGETSIZE64`; regular
    /// files report their metadata length.
    pub fn storage_size(&self) -> io::Result<u64> {
        let metadata = self.file.metadata()?;
        let file_type = metadata.file_type();
        if file_type.is_block_device() || file_type.is_char_device() {
            let mut size = 0u64;
            let ret = unsafe { libc::ioctl(self.file.as_raw_fd(), BLKGETSIZE64 as _, &mut size) };
            if ret < 0 {
                return Err(Error::last_os_error());
            }
            Ok(size)
        } else {
            Ok(metadata.len())
        }
    }
}
