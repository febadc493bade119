//! End of central directory record lookup.
//!
//! The record ends with a comment of up to 65535 bytes, so it cannot be
//! found at a fixed distance from either end of the archive. Instead the
//! whole trailing window that could hold it is read and searched from the
//! right.

use byteorder::{ByteOrder, LittleEndian};
use std::io::{Read, Seek};

use crate::error::{Result, ZipError};
use crate::io::ByteReader;

use super::structures::EndOfCentralDirectoryRecord;

type Eocd = EndOfCentralDirectoryRecord;

/// Find and decode the end of central directory record.
///
/// Signatures whose record would run past end of file are skipped, and so
/// are signatures lying inside another candidate's comment. Of the rest, the
/// rightmost one whose comment ends exactly at end of file wins. Otherwise
/// the rightmost one is used, or rejected with
/// [`ZipError::UnexpectedTrailingData`] when `strict` is set.
///
/// # Errors
///
/// * [`ZipError::EndRecordNotFound`] if no candidate fits.
/// * [`ZipError::TruncatedRead`] if the source shrinks while being read.
pub fn find_end_record<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    strict: bool,
) -> Result<EndOfCentralDirectoryRecord> {
    let file_len = reader.len();
    let window_len = (Eocd::MAX_SIZE as u64).min(file_len);
    let window_start = file_len - window_len;

    reader.seek_to(window_start)?;
    let window = reader.read_exact(window_len as usize)?;

    let offset = match locate_signature(&window, window_start, file_len) {
        Some(Candidate::Exact(offset)) => offset,
        Some(Candidate::Trailing(offset, trailing)) => {
            if strict {
                return Err(ZipError::UnexpectedTrailingData { offset, trailing });
            }
            log::warn!(
                "end of central directory record at {} is followed by {} unexpected bytes",
                offset,
                trailing
            );
            offset
        }
        None => {
            return Err(ZipError::EndRecordNotFound {
                searched: window_len,
            });
        }
    };

    reader.seek_to(offset)?;
    let record = read_end_record(reader)?;

    log::debug!(
        "end of central directory at {}: {} records, directory at {}",
        record.offset,
        record.number_of_records,
        record.central_directory_offset
    );

    Ok(record)
}

/// Decode an end record at the reader's current position.
///
/// Returns [`ZipError::MagicNumberMismatch`] if the signature is absent.
pub fn read_end_record<R: Read + Seek>(
    reader: &mut ByteReader<R>,
) -> Result<EndOfCentralDirectoryRecord> {
    let offset = reader.position()?;
    let block: [u8; Eocd::SIZE] = reader.read_array()?;

    if &block[0..4] != Eocd::SIGNATURE {
        return Err(ZipError::MagicNumberMismatch {
            region: "end of central directory",
            offset,
            expected: *Eocd::SIGNATURE,
            found: [block[0], block[1], block[2], block[3]],
        });
    }

    let comment_length = LittleEndian::read_u16(&block[20..22]);
    let comment = reader.read_exact(comment_length as usize)?;

    Ok(EndOfCentralDirectoryRecord {
        offset,
        disk_number: LittleEndian::read_u16(&block[4..6]),
        disk_with_central_directory: LittleEndian::read_u16(&block[6..8]),
        disk_entries: LittleEndian::read_u16(&block[8..10]),
        number_of_records: LittleEndian::read_u16(&block[10..12]),
        central_directory_size: LittleEndian::read_u32(&block[12..16]),
        central_directory_offset: LittleEndian::read_u32(&block[16..20]),
        comment_length,
        comment: String::from_utf8_lossy(&comment).into_owned(),
    })
}

#[derive(Debug, PartialEq, Eq)]
enum Candidate {
    /// Record and comment end exactly at end of file.
    Exact(u64),
    /// Record fits but is followed by this many extra bytes.
    Trailing(u64, u64),
}

fn locate_signature(window: &[u8], window_start: u64, file_len: u64) -> Option<Candidate> {
    // (offset, end) of every signature whose record fits, in file order
    let fitting: Vec<(u64, u64)> = (0..window.len().saturating_sub(Eocd::SIZE - 1))
        .filter(|&i| &window[i..i + 4] == Eocd::SIGNATURE)
        .map(|i| {
            let offset = window_start + i as u64;
            let comment_len = LittleEndian::read_u16(&window[i + 20..i + 22]) as u64;
            (offset, offset + Eocd::SIZE as u64 + comment_len)
        })
        .filter(|&(_, end)| end <= file_len)
        .collect();

    // A signature inside an earlier candidate's record is part of its comment.
    let mut outer = Vec::with_capacity(fitting.len());
    let mut covered_until = 0u64;
    for (offset, end) in fitting {
        if offset < covered_until {
            log::debug!("ignoring signature at {} inside an end record comment", offset);
            continue;
        }
        covered_until = covered_until.max(end);
        outer.push((offset, end));
    }

    if let Some(&(offset, _)) = outer.iter().rev().find(|&&(_, end)| end == file_len) {
        return Some(Candidate::Exact(offset));
    }
    outer
        .last()
        .map(|&(offset, end)| Candidate::Trailing(offset, file_len - end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn record(comment: &[u8], records: u16, cd_offset: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(Eocd::SIGNATURE);
        buf.extend_from_slice(&[0, 0, 0, 0]);
        buf.extend_from_slice(&records.to_le_bytes());
        buf.extend_from_slice(&records.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&cd_offset.to_le_bytes());
        buf.extend_from_slice(&(comment.len() as u16).to_le_bytes());
        buf.extend_from_slice(comment);
        buf
    }

    #[test]
    fn test_find_minimal_record() {
        let data = record(b"", 0, 0);
        let mut reader = ByteReader::new(Cursor::new(data)).unwrap();
        let eocd = find_end_record(&mut reader, true).unwrap();

        assert_eq!(eocd.offset, 0);
        assert_eq!(eocd.number_of_records, 0);
        assert_eq!(eocd.comment, "");
        assert_eq!(eocd.end_offset(), 22);
    }

    #[test]
    fn test_skips_signature_inside_comment() {
        let mut comment = b"decoy ".to_vec();
        comment.extend_from_slice(Eocd::SIGNATURE);
        comment.extend_from_slice(b" inside comment");

        let mut data = vec![0xAAu8; 100];
        data.extend(record(&comment, 3, 7));
        let mut reader = ByteReader::new(Cursor::new(data)).unwrap();
        let eocd = find_end_record(&mut reader, true).unwrap();

        assert_eq!(eocd.offset, 100);
        assert_eq!(eocd.number_of_records, 3);
        assert_eq!(eocd.central_directory_offset, 7);
        assert_eq!(eocd.comment.as_bytes(), &comment[..]);
    }

    #[test]
    fn test_trailing_data() {
        let mut data = record(b"hi", 1, 0);
        data.extend_from_slice(b"garbage");

        let mut reader = ByteReader::new(Cursor::new(data.clone())).unwrap();
        match find_end_record(&mut reader, true) {
            Err(ZipError::UnexpectedTrailingData { offset, trailing }) => {
                assert_eq!(offset, 0);
                assert_eq!(trailing, 7);
            }
            other => panic!("expected UnexpectedTrailingData, got {:?}", other),
        }

        let mut reader = ByteReader::new(Cursor::new(data)).unwrap();
        let eocd = find_end_record(&mut reader, false).unwrap();
        assert_eq!(eocd.comment, "hi");
    }

    #[test]
    fn test_decoy_in_comment_with_trailing_data() {
        let mut comment = b"note ".to_vec();
        comment.extend_from_slice(Eocd::SIGNATURE);
        comment.extend_from_slice(&[0u8; 18]);

        let mut data = vec![0xAAu8; 40];
        data.extend(record(&comment, 2, 0));
        data.extend_from_slice(b"xyz");

        let mut reader = ByteReader::new(Cursor::new(data.clone())).unwrap();
        let eocd = find_end_record(&mut reader, false).unwrap();
        assert_eq!(eocd.offset, 40);
        assert_eq!(eocd.number_of_records, 2);

        let mut reader = ByteReader::new(Cursor::new(data)).unwrap();
        assert!(matches!(
            find_end_record(&mut reader, true),
            Err(ZipError::UnexpectedTrailingData {
                offset: 40,
                trailing: 3
            })
        ));
    }

    #[test]
    fn test_decoy_ending_at_end_of_file() {
        // The decoy is the last 22 bytes, so both records end at EOF.
        let mut comment = b"tail".to_vec();
        comment.extend_from_slice(Eocd::SIGNATURE);
        comment.extend_from_slice(&[0u8; 18]);

        let data = record(&comment, 4, 9);
        let mut reader = ByteReader::new(Cursor::new(data)).unwrap();
        let eocd = find_end_record(&mut reader, true).unwrap();
        assert_eq!(eocd.offset, 0);
        assert_eq!(eocd.number_of_records, 4);
    }

    #[test]
    fn test_missing_record() {
        let mut reader = ByteReader::new(Cursor::new(vec![0u8; 64])).unwrap();
        assert!(matches!(
            find_end_record(&mut reader, false),
            Err(ZipError::EndRecordNotFound { searched: 64 })
        ));

        let mut reader = ByteReader::new(Cursor::new(Vec::new())).unwrap();
        assert!(matches!(
            find_end_record(&mut reader, false),
            Err(ZipError::EndRecordNotFound { searched: 0 })
        ));
    }
}
