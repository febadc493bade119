//! # zipexplore
//!
//! Read-only ZIP archive introspection.
//!
//! This library reconstructs the on-disk structure of a ZIP archive: every
//! local file header with its raw content, the central directory, and the
//! end of central directory record. Entry content stored or compressed
//! with DEFLATE can be decoded.
//!
//! ## Features
//!
//! - Parse from any `Read + Seek` source, including remote archives over
//!   HTTP Range requests
//! - End record lookup that tolerates archive comments of any length
//! - ZIP64 sizes in local headers and central directory entries
//! - Offset-directed and sequential traversal
//! - Typed errors carrying offsets and byte counts
//!
//! ## Example
//!
//! ```no_run
//! use std::fs::File;
//!
//! fn main() -> anyhow::Result<()> {
//!     let archive = zipexplore::parse(File::open("archive.zip")?)?;
//!
//!     println!("{} entries", archive.end_record().number_of_records);
//!     for header in archive.local_headers() {
//!         println!("{}: {}", header.name, header.content_text()?);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use error::{Result, ZipError};
pub use io::{ByteReader, HttpRangeReader};
pub use zip::{
    CentralDirectoryFileHeader, CompressionMethod, EndOfCentralDirectoryRecord, LocalHeader,
    ParseOptions, TraversalMode, ZipFile, ZipParser, parse, parse_with_options,
};
