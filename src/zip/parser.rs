//! Archive assembly.
//!
//! This module drives the region readers and produces a [`ZipFile`].
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) in the file's tail
//! 2. Read the Central Directory entries it declares
//! 3. Follow each entry's offset to its Local File Header and content
//!
//! A second, [`TraversalMode::Sequential`], strategy walks the archive
//! front to back instead, trusting nothing but the signatures it meets.
//! It is kept separate because it cannot validate local headers against
//! the directory's offsets.

use std::io::{Read, Seek};

use crate::error::{Result, ZipError};
use crate::io::ByteReader;

use super::central_dir::read_central_directory_entry;
use super::eocd::{find_end_record, read_end_record};
use super::local::{read_local_header_at, read_next_local_header};
use super::structures::*;

/// How the parser walks the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalMode {
    /// Locate the end record, then follow central directory offsets.
    #[default]
    CentralDirectory,
    /// Scan local headers from offset zero until the central directory begins.
    Sequential,
}

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    pub mode: TraversalMode,
    /// Reject bytes after the end record's comment.
    pub strict: bool,
}

impl ParseOptions {
    /// Options for a lenient, central-directory-driven parse.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the traversal strategy.
    pub fn with_mode(mut self, mode: TraversalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable whole-file validation.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// ZIP archive parser.
///
/// Owns a cursor over one byte source for the duration of a parse. Parses
/// over separate sources share nothing and may run on separate threads.
///
/// ## Example
///
/// ```no_run
/// use std::fs::File;
/// use zipexplore::ZipParser;
///
/// let archive = ZipParser::new(File::open("archive.zip")?)?.parse()?;
/// for (entry, local) in archive.entries() {
///     println!("{} ({} bytes)", entry.file_name, local.uncompressed_size);
/// }
/// # Ok::<(), zipexplore::ZipError>(())
/// ```
pub struct ZipParser<R: Read + Seek> {
    reader: ByteReader<R>,
    options: ParseOptions,
}

impl<R: Read + Seek> ZipParser<R> {
    /// Create a parser with default options.
    ///
    /// # Arguments
    ///
    /// * `source` - Any seekable byte source; its current position is ignored
    ///
    /// # Errors
    ///
    /// Returns [`ZipError::Io`] if the source cannot be measured.
    pub fn new(source: R) -> Result<Self> {
        Self::with_options(source, ParseOptions::default())
    }

    /// Create a parser with explicit options.
    ///
    /// # Arguments
    ///
    /// * `source` - Any seekable byte source; its current position is ignored
    /// * `options` - Traversal mode and strictness for [`ZipParser::parse`]
    ///
    /// # Returns
    ///
    /// A parser positioned at the start of the source.
    ///
    /// # Errors
    ///
    /// Returns [`ZipError::Io`] if the source cannot be measured.
    pub fn with_options(source: R, options: ParseOptions) -> Result<Self> {
        Ok(Self {
            reader: ByteReader::new(source)?,
            options,
        })
    }

    /// Parse the whole archive.
    ///
    /// Either every region decodes and a complete [`ZipFile`] is returned,
    /// or the first error aborts the parse.
    ///
    /// # Errors
    ///
    /// * [`ZipError::EndRecordNotFound`] or [`ZipError::MagicNumberMismatch`]
    ///   when the end record is missing
    /// * [`ZipError::CentralDirectoryTruncated`] when the directory holds
    ///   fewer entries than declared
    /// * [`ZipError::CorruptLocalHeader`] when a directory offset does not
    ///   point at a local header
    /// * [`ZipError::TruncatedRead`] when any region runs past end of file
    /// * [`ZipError::UnexpectedTrailingData`] in strict mode
    pub fn parse(mut self) -> Result<ZipFile> {
        match self.options.mode {
            TraversalMode::CentralDirectory => self.parse_from_central_directory(),
            TraversalMode::Sequential => self.parse_sequential(),
        }
    }

    fn parse_from_central_directory(&mut self) -> Result<ZipFile> {
        let end_record = find_end_record(&mut self.reader, self.options.strict)?;

        let declared = end_record.number_of_records as usize;
        self.reader
            .seek_to(end_record.central_directory_offset as u64)?;

        let mut central_directory = Vec::with_capacity(declared);
        while central_directory.len() < declared {
            match read_central_directory_entry(&mut self.reader)? {
                Some(entry) => central_directory.push(entry),
                None => {
                    return Err(ZipError::CentralDirectoryTruncated {
                        declared,
                        found: central_directory.len(),
                    });
                }
            }
        }

        let mut local_headers = Vec::with_capacity(declared);
        for entry in &central_directory {
            local_headers.push(read_local_header_at(
                &mut self.reader,
                entry.local_header_offset,
            )?);
        }

        log::debug!(
            "parsed {} entries via central directory at {}",
            central_directory.len(),
            end_record.central_directory_offset
        );

        Ok(ZipFile::new(local_headers, central_directory, end_record))
    }

    fn parse_sequential(&mut self) -> Result<ZipFile> {
        self.reader.seek_to(0)?;
        let local_headers = scan_local_headers(&mut self.reader)?;

        let mut central_directory = Vec::new();
        while let Some(entry) = read_central_directory_entry(&mut self.reader)? {
            central_directory.push(entry);
        }

        let end_record = read_end_record(&mut self.reader)?;

        let declared = end_record.number_of_records as usize;
        if central_directory.len() < declared {
            return Err(ZipError::CentralDirectoryTruncated {
                declared,
                found: central_directory.len(),
            });
        }
        if central_directory.len() > declared {
            log::warn!(
                "end record declares {} entries but the directory holds {}",
                declared,
                central_directory.len()
            );
        }
        if local_headers.len() != central_directory.len() {
            log::warn!(
                "scanned {} local headers for {} directory entries",
                local_headers.len(),
                central_directory.len()
            );
        }

        if self.options.strict && end_record.end_offset() != self.reader.len() {
            return Err(ZipError::UnexpectedTrailingData {
                offset: end_record.offset,
                trailing: self.reader.len() - end_record.end_offset(),
            });
        }

        Ok(ZipFile::new(local_headers, central_directory, end_record))
    }
}

/// Read local headers back to back from the reader's position until the
/// signature stops matching.
///
/// The cursor is left on the first byte that is not a local header.
///
/// # Returns
///
/// The headers in file order, possibly none.
///
/// # Errors
///
/// Returns [`ZipError::TruncatedRead`] if a header's name, extra field or
/// content runs past end of file.
pub fn scan_local_headers<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<Vec<LocalHeader>> {
    let mut headers = Vec::new();
    while let Some(header) = read_next_local_header(reader)? {
        headers.push(header);
    }

    log::debug!("sequential scan found {} local headers", headers.len());
    Ok(headers)
}

/// Parse an archive with default options.
///
/// Shorthand for `ZipParser::new(source)?.parse()`; see [`ZipParser::parse`]
/// for the errors.
pub fn parse<R: Read + Seek>(source: R) -> Result<ZipFile> {
    ZipParser::new(source)?.parse()
}

/// Parse an archive with explicit options.
pub fn parse_with_options<R: Read + Seek>(source: R, options: ParseOptions) -> Result<ZipFile> {
    ZipParser::with_options(source, options)?.parse()
}
