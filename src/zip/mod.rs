//! ZIP archive structure parsing.
//!
//! This module reconstructs the three structural regions of a ZIP archive
//! into an in-memory [`ZipFile`].
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures for the format's records and constants
//! - [`eocd`]: End of Central Directory lookup in the archive's tail
//! - [`central_dir`]: Central Directory file header decoding
//! - [`local`]: Local file header and content decoding
//! - [`decompress`]: Content decoding for stored and deflated entries
//! - [`parser`]: Orchestration of the above into a [`ZipFile`]
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! ## Limitations
//!
//! - Read only
//! - No encryption support
//! - No multi-disk archive support
//! - No data descriptors after local headers
//! - Only STORED and DEFLATE content can be decoded

pub mod central_dir;
pub mod decompress;
pub mod eocd;
pub mod local;
pub mod parser;
pub mod structures;

pub use parser::{ParseOptions, TraversalMode, ZipParser, parse, parse_with_options, scan_local_headers};
pub use structures::*;
