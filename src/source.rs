//! Byte sources for archive inspection.
//!
//! The decoder pulls bounded ranges from the underlying file through the
//! [`ByteSource`] trait. Reads are clamped at end-of-file rather than
//! failing, so a declared range that overruns the file simply comes back
//! short and the caller reports the truncation.

use std::io::{Read, Seek, SeekFrom};

use crate::Result;

/// A random-access byte source with a known total size.
pub trait ByteSource {
    /// Total size of the underlying data in bytes.
    fn len(&mut self) -> Result<u64>;

    /// Reads up to `length` bytes starting at `offset`.
    ///
    /// Returns fewer bytes (possibly none) when the range runs past the
    /// end of the data; never reads past it.
    fn read_at(&mut self, offset: u64, length: u64) -> Result<Vec<u8>>;
}

impl ByteSource for &[u8] {
    fn len(&mut self) -> Result<u64> {
        Ok(<[u8]>::len(self) as u64)
    }

    fn read_at(&mut self, offset: u64, length: u64) -> Result<Vec<u8>> {
        let total = <[u8]>::len(self) as u64;
        let start = offset.min(total);
        let end = start.saturating_add(length).min(total);
        Ok(self[start as usize..end as usize].to_vec())
    }
}

/// Adapts any `Read + Seek` (e.g. a [`std::fs::File`]) into a [`ByteSource`].
#[derive(Debug)]
pub struct ReadSeekSource<R> {
    inner: R,
    total: Option<u64>,
}

impl<R: Read + Seek> ReadSeekSource<R> {
    /// Wraps a seekable reader.
    pub fn new(inner: R) -> Self {
        Self { inner, total: None }
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ByteSource for ReadSeekSource<R> {
    fn len(&mut self) -> Result<u64> {
        if let Some(total) = self.total {
            return Ok(total);
        }
        let total = self.inner.seek(SeekFrom::End(0))?;
        self.total = Some(total);
        Ok(total)
    }

    fn read_at(&mut self, offset: u64, length: u64) -> Result<Vec<u8>> {
        let total = self.len()?;
        let start = offset.min(total);
        let end = start.saturating_add(length).min(total);

        self.inner.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0u8; (end - start) as usize];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }
}
