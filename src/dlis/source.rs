//! Random-access byte sources.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use super::error::{DlisError, Result};

/// A read-only, random-access byte source.
///
/// The reader core is written against this seam so that files and
/// in-memory fixtures are interchangeable. Reads are exact: a request
/// that cannot be filled in full fails rather than returning short.
pub trait ByteSource {
    /// Fill `dst` with bytes starting at `offset`.
    fn read_at(&mut self, dst: &mut [u8], offset: u64) -> Result<()>;

    /// Total size of the source in bytes.
    fn size(&self) -> u64;
}

/// A byte source backed by an open file.
///
/// The file handle is acquired here and released when the source is
/// dropped, so a reader that fails mid-construction does not leak it.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    size: u64,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        if size == 0 {
            return Err(DlisError::UnexpectedValue {
                offset: 0,
                reason: "non-existent or empty file".to_string(),
            });
        }
        Ok(Self { file, size })
    }
}

impl ByteSource for FileSource {
    fn read_at(&mut self, dst: &mut [u8], offset: u64) -> Result<()> {
        if offset + dst.len() as u64 > self.size {
            return Err(DlisError::Truncated {
                offset,
                needed: dst.len(),
                available: self.size.saturating_sub(offset),
            });
        }
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(dst)?;
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// In-memory source, used by tests and callers that already hold the
/// whole file.
impl ByteSource for Vec<u8> {
    fn read_at(&mut self, dst: &mut [u8], offset: u64) -> Result<()> {
        let len = self.len() as u64;
        if offset + dst.len() as u64 > len {
            return Err(DlisError::Truncated {
                offset,
                needed: dst.len(),
                available: len.saturating_sub(offset),
            });
        }
        let start = offset as usize;
        dst.copy_from_slice(&self[start..start + dst.len()]);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }
}
