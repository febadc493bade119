use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Shrunk,
    /// Reduced with compression factor 1-4.
    Reduced(u8),
    Imploded,
    Deflate,
    Deflate64,
    PkwareImploding,
    Bzip2,
    Lzma,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            1 => CompressionMethod::Shrunk,
            2..=5 => CompressionMethod::Reduced((value - 1) as u8),
            6 => CompressionMethod::Imploded,
            8 => CompressionMethod::Deflate,
            9 => CompressionMethod::Deflate64,
            10 => CompressionMethod::PkwareImploding,
            12 => CompressionMethod::Bzip2,
            14 => CompressionMethod::Lzma,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Shrunk => 1,
            CompressionMethod::Reduced(factor) => *factor as u16 + 1,
            CompressionMethod::Imploded => 6,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Deflate64 => 9,
            CompressionMethod::PkwareImploding => 10,
            CompressionMethod::Bzip2 => 12,
            CompressionMethod::Lzma => 14,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionMethod::Stored => write!(f, "stored"),
            CompressionMethod::Shrunk => write!(f, "shrunk"),
            CompressionMethod::Reduced(factor) => write!(f, "reduced:{}", factor),
            CompressionMethod::Imploded => write!(f, "imploded"),
            CompressionMethod::Deflate => write!(f, "deflate"),
            CompressionMethod::Deflate64 => write!(f, "deflate64"),
            CompressionMethod::PkwareImploding => write!(f, "pkware-imploding"),
            CompressionMethod::Bzip2 => write!(f, "bzip2"),
            CompressionMethod::Lzma => write!(f, "lzma"),
            CompressionMethod::Unknown(v) => write!(f, "unknown({})", v),
        }
    }
}

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8; 4] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Size marker that defers local header sizes to the ZIP64 block.
pub const ZIP64_SIZE_MARKER: [u8; 8] = [0xFF; 8];
/// ZIP64 block that follows a local header's extra field when sizes are marked.
pub const ZIP64_BLOCK_SIZE: usize = 20;

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8; 4] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// ZIP64 extended information extra field ID.
pub const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Decode a packed DOS date and time into a UTC timestamp.
///
/// DOS time stores seconds divided by two. Returns `None` when the packed
/// fields do not form a valid calendar date and time.
pub fn dos_datetime(dos_date: u16, dos_time: u16) -> Option<DateTime<Utc>> {
    let second = ((dos_time & 0x1F) * 2) as u32;
    let minute = ((dos_time >> 5) & 0x3F) as u32;
    let hour = ((dos_time >> 11) & 0x1F) as u32;

    let day = (dos_date & 0x1F) as u32;
    let month = ((dos_date >> 5) & 0x0F) as u32;
    let year = ((dos_date >> 9) & 0x7F) as i32 + 1980;

    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(hour, minute, second)
        .map(|naive| naive.and_utc())
}

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectoryRecord {
    /// Absolute offset of the record's signature.
    pub offset: u64,
    pub disk_number: u16,
    pub disk_with_central_directory: u16,
    pub disk_entries: u16,
    /// Total number of central directory entries.
    pub number_of_records: u16,
    pub central_directory_size: u32,
    pub central_directory_offset: u32,
    /// Declared comment length in bytes.
    pub comment_length: u16,
    pub comment: String,
}

impl EndOfCentralDirectoryRecord {
    pub const SIGNATURE: &'static [u8; 4] = b"PK\x05\x06";
    pub const SIZE: usize = 22;
    /// Largest possible record: fixed part plus a maximal comment.
    pub const MAX_SIZE: usize = Self::SIZE + (1 << 16);

    /// Absolute offset one past the record's comment.
    pub fn end_offset(&self) -> u64 {
        self.offset + Self::SIZE as u64 + self.comment_length as u64
    }
}

impl fmt::Display for EndOfCentralDirectoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EndOfCentralDirectoryRecord{{records: {}, directory: {} bytes at {}, comment: {:?}}}",
            self.number_of_records,
            self.central_directory_size,
            self.central_directory_offset,
            self.comment
        )
    }
}

/// One central directory file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryFileHeader {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: [u8; 2],
    pub compression_method: CompressionMethod,
    pub last_modified: Option<DateTime<Utc>>,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub disk_number_start: u16,
    pub internal_attributes: u16,
    pub external_attributes: u32,
    /// Absolute offset of the matching local file header.
    pub local_header_offset: u64,
    pub file_name: String,
    pub extra_field: Vec<u8>,
    pub comment: String,
}

impl CentralDirectoryFileHeader {
    /// Directory entries end with '/'
    pub fn is_directory(&self) -> bool {
        self.file_name.ends_with('/')
    }
}

impl fmt::Display for CentralDirectoryFileHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CentralDirectoryFileHeader{{name: {:?}, size: {}->{}, compression: {}, local header: {}}}",
            self.file_name,
            self.uncompressed_size,
            self.compressed_size,
            self.compression_method,
            self.local_header_offset
        )
    }
}

/// One local file header together with its raw content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalHeader {
    /// Absolute offset of the header's signature.
    pub offset: u64,
    pub version: u16,
    pub flags: [u8; 2],
    pub is_zip64: bool,
    pub name: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub compression_method: CompressionMethod,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub extra_field: Vec<u8>,
    /// Raw, possibly compressed, bytes. Always `compressed_size` long.
    pub content: Vec<u8>,
}

impl fmt::Display for LocalHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LocalHeader{{name: {:?}, size: {}->{}, compression: {}}}",
            self.name, self.uncompressed_size, self.compressed_size, self.compression_method
        )
    }
}

/// A fully parsed archive.
///
/// Built once by the parser and read-only afterwards. When parsed through
/// the central directory, `local_headers()[i]` is the header that
/// `central_directory()[i]` points at.
#[derive(Debug, Clone)]
pub struct ZipFile {
    local_headers: Vec<LocalHeader>,
    central_directory: Vec<CentralDirectoryFileHeader>,
    end_record: EndOfCentralDirectoryRecord,
}

impl ZipFile {
    pub(crate) fn new(
        local_headers: Vec<LocalHeader>,
        central_directory: Vec<CentralDirectoryFileHeader>,
        end_record: EndOfCentralDirectoryRecord,
    ) -> Self {
        Self {
            local_headers,
            central_directory,
            end_record,
        }
    }

    pub fn local_headers(&self) -> &[LocalHeader] {
        &self.local_headers
    }

    pub fn central_directory(&self) -> &[CentralDirectoryFileHeader] {
        &self.central_directory
    }

    pub fn end_record(&self) -> &EndOfCentralDirectoryRecord {
        &self.end_record
    }

    /// Pairs of central directory entry and matching local header, in archive order.
    pub fn entries(&self) -> impl Iterator<Item = (&CentralDirectoryFileHeader, &LocalHeader)> {
        self.central_directory.iter().zip(self.local_headers.iter())
    }

    pub fn len(&self) -> usize {
        self.central_directory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.central_directory.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_dos_epoch() {
        let ts = dos_datetime(0x0021, 0x0000).unwrap();
        assert_eq!(ts.to_rfc3339(), "1980-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_dos_datetime_fields() {
        // 2023-06-15 13:45:58
        let date = ((2023 - 1980) << 9) | (6 << 5) | 15;
        let time = (13 << 11) | (45 << 5) | (58 / 2);
        let ts = dos_datetime(date, time).unwrap();

        assert_eq!((ts.year(), ts.month(), ts.day()), (2023, 6, 15));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (13, 45, 58));
    }

    #[test]
    fn test_dos_datetime_invalid() {
        // Month zero
        assert!(dos_datetime(0x0001, 0).is_none());
        // Seconds field 30 decodes to 60
        assert!(dos_datetime(0x0021, 30).is_none());
    }

    #[test]
    fn test_record_display() {
        let entry = CentralDirectoryFileHeader {
            version_made_by: 0x031E,
            version_needed: 20,
            flags: [0, 0],
            compression_method: CompressionMethod::Deflate,
            last_modified: None,
            crc32: 0,
            compressed_size: 12,
            uncompressed_size: 40,
            disk_number_start: 0,
            internal_attributes: 0,
            external_attributes: 0,
            local_header_offset: 128,
            file_name: "docs/a.txt".to_string(),
            extra_field: Vec::new(),
            comment: String::new(),
        };
        assert_eq!(
            entry.to_string(),
            "CentralDirectoryFileHeader{name: \"docs/a.txt\", size: 40->12, compression: deflate, local header: 128}"
        );

        let end = EndOfCentralDirectoryRecord {
            offset: 300,
            disk_number: 0,
            disk_with_central_directory: 0,
            disk_entries: 2,
            number_of_records: 2,
            central_directory_size: 90,
            central_directory_offset: 210,
            comment_length: 2,
            comment: "hi".to_string(),
        };
        assert_eq!(
            end.to_string(),
            "EndOfCentralDirectoryRecord{records: 2, directory: 90 bytes at 210, comment: \"hi\"}"
        );
    }

    #[test]
    fn test_compression_method_codes() {
        for code in [0u16, 1, 2, 5, 6, 8, 9, 10, 12, 14, 99] {
            assert_eq!(CompressionMethod::from_u16(code).as_u16(), code);
        }
        assert_eq!(
            CompressionMethod::from_u16(3),
            CompressionMethod::Reduced(2)
        );
        assert_eq!(CompressionMethod::Bzip2.to_string(), "bzip2");
    }
}
