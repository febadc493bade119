mod http;

pub use http::HttpRangeReader;

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use crate::error::{Result, ZipError};

/// Cursor over a seekable byte source with "read exactly N bytes or fail"
/// semantics.
///
/// Every region decoder goes through [`ByteReader::read_exact`], so a
/// short read always surfaces as [`ZipError::TruncatedRead`] with the
/// offset and byte counts involved.
pub struct ByteReader<R: Read + Seek> {
    inner: R,
    len: u64,
}

impl<R: Read + Seek> ByteReader<R> {
    /// Wrap a source, measuring its total length and rewinding to the start.
    ///
    /// # Arguments
    ///
    /// * `inner` - The byte source; local files, in-memory buffers and
    ///   [`HttpRangeReader`] all qualify
    ///
    /// # Errors
    ///
    /// Returns [`ZipError::Io`] if the source cannot seek.
    pub fn new(mut inner: R) -> Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self { inner, len })
    }

    /// Total length of the source in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the source holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current absolute position.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Seek to an absolute offset from the start of the source.
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Move the cursor back by `count` bytes relative to the current position.
    pub fn rewind(&mut self, count: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Current(-(count as i64)))?;
        Ok(())
    }

    /// Read exactly `count` bytes.
    ///
    /// Requests that run past the end of the source fail before anything
    /// is allocated, so a corrupt length field cannot force a huge buffer.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of bytes to read from the current position
    ///
    /// # Returns
    ///
    /// A buffer of exactly `count` bytes; the cursor advances by `count`.
    ///
    /// # Errors
    ///
    /// Returns [`ZipError::TruncatedRead`] with the offset, the requested
    /// count and the bytes actually available.
    pub fn read_exact(&mut self, count: usize) -> Result<Vec<u8>> {
        let offset = self.position()?;
        let available = self.len.saturating_sub(offset);
        if count as u64 > available {
            return Err(ZipError::TruncatedRead {
                offset,
                requested: count,
                received: available as usize,
            });
        }

        let mut buf = vec![0u8; count];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Read exactly `N` bytes into a fixed-size array.
    ///
    /// # Errors
    ///
    /// Returns [`ZipError::TruncatedRead`] on a short read.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Consume the reader, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let offset = self.position()?;
        let mut received = 0;

        while received < buf.len() {
            match self.inner.read(&mut buf[received..]) {
                Ok(0) => {
                    return Err(ZipError::TruncatedRead {
                        offset,
                        requested: buf.len(),
                        received,
                    });
                }
                Ok(n) => received += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }
}
