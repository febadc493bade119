//! Content decoding for local headers.

use std::io::Read;

use flate2::read::DeflateDecoder;

use crate::error::{Result, ZipError};

use super::structures::{CompressionMethod, LocalHeader};

impl LocalHeader {
    /// Decode the entry's content.
    ///
    /// Stored content is returned as is. Deflate content is inflated and
    /// must come out at exactly `uncompressed_size` bytes. Every other
    /// method fails with [`ZipError::UnsupportedCompressionMethod`].
    pub fn decompressed(&self) -> Result<Vec<u8>> {
        match self.compression_method {
            CompressionMethod::Stored => Ok(self.content.clone()),
            CompressionMethod::Deflate => {
                inflate(&self.content, self.uncompressed_size).map_err(|reason| {
                    ZipError::DecompressionFailed {
                        name: self.name.clone(),
                        reason,
                    }
                })
            }
            method => Err(ZipError::UnsupportedCompressionMethod {
                name: self.name.clone(),
                method,
            }),
        }
    }

    /// Decode the entry's content as text, replacing invalid UTF-8.
    pub fn content_text(&self) -> Result<String> {
        let bytes = self.decompressed()?;
        Ok(String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
    }
}

/// Inflate a raw DEFLATE stream of known output size.
fn inflate(data: &[u8], expected_size: u64) -> std::result::Result<Vec<u8>, String> {
    let capacity = usize::try_from(expected_size).map_err(|e| e.to_string())?;
    let mut output = Vec::with_capacity(capacity.min(data.len().saturating_mul(1032)));

    // Read one byte past the declared size so overlong streams are caught
    // without inflating all of them.
    DeflateDecoder::new(data)
        .take(expected_size.saturating_add(1))
        .read_to_end(&mut output)
        .map_err(|e| e.to_string())?;

    let produced = output.len() as u64;
    if produced > expected_size {
        return Err(format!("expected {} bytes, stream is longer", expected_size));
    }
    if produced < expected_size {
        return Err(format!("expected {} bytes, got {}", expected_size, produced));
    }

    Ok(output)
}
