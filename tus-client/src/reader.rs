use crate::error::{Error, Result};
use once_cell::sync::OnceCell;
use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

/// Scoped access to a byte window of a local file.
///
/// The file handle is opened, seeked, read, and released within a single call to [`read`];
/// nothing is held open between calls. The total file size is read once and memoized.
#[derive(Debug)]
pub struct FileWindowReader {
    path: PathBuf,
    size: OnceCell<u64>,
}

impl FileWindowReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file's total size, read from the filesystem once and memoized.
    pub fn total_size(&self) -> Result<u64> {
        self.size
            .get_or_try_init(|| Ok(self.path.metadata()?.len()))
            .copied()
            .map_err(Error::IOFailure)
    }

    /// Reads up to `length` bytes starting at `offset`. Returns fewer than `length` bytes only at
    /// end-of-file; the caller treats that as the final chunk.
    pub fn read(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; length as usize];
        let mut filled = 0usize;
        loop {
            match file.read(&mut buf[filled..])? {
                0 => break,
                n => {
                    filled += n;
                    if filled == buf.len() {
                        break;
                    }
                }
            }
        }
        buf.truncate(filled);
        Ok(buf)
    }
}
