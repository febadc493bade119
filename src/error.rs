//! Error types for archive parsing.

use thiserror::Error;

use crate::zip::CompressionMethod;

/// Errors that can occur while parsing a ZIP archive.
///
/// Every variant is terminal: a parse that hits one of these stops
/// immediately and no partial result is produced.
#[derive(Debug, Error)]
pub enum ZipError {
    /// I/O error from the underlying byte source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source ended before a fixed-size read could be satisfied.
    #[error("truncated read at offset {offset}: requested {requested} bytes, got {received}")]
    TruncatedRead {
        offset: u64,
        requested: usize,
        received: usize,
    },

    /// A required signature was missing.
    #[error("invalid {region} signature at offset {offset}: expected {expected:02x?}, got {found:02x?}")]
    MagicNumberMismatch {
        region: &'static str,
        offset: u64,
        expected: [u8; 4],
        found: [u8; 4],
    },

    /// No end of central directory record in the trailing search window.
    #[error("cannot find end of central directory record in the last {searched} bytes")]
    EndRecordNotFound { searched: u64 },

    /// The central directory holds fewer entries than the end record declares.
    #[error("central directory truncated: end record declares {declared} entries, found {found}")]
    CentralDirectoryTruncated { declared: usize, found: usize },

    /// A local header referenced by the central directory is missing its signature.
    #[error("corrupt local file header at offset {offset}: found {found:02x?}")]
    CorruptLocalHeader { offset: u64, found: [u8; 4] },

    /// The entry uses a compression method this crate cannot decode.
    #[error("unsupported compression method {method} for {name:?}")]
    UnsupportedCompressionMethod {
        name: String,
        method: CompressionMethod,
    },

    /// The compressed stream could not be decoded.
    #[error("failed to decompress {name:?}: {reason}")]
    DecompressionFailed { name: String, reason: String },

    /// Bytes remain after the end record in strict mode.
    #[error("unexpected {trailing} bytes after end of central directory record at offset {offset}")]
    UnexpectedTrailingData { offset: u64, trailing: u64 },
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ZipError>;
