//! Local file header decoding.

use byteorder::{ByteOrder, LittleEndian};
use std::io::{Read, Seek};

use crate::error::{Result, ZipError};
use crate::io::ByteReader;

use super::structures::*;

/// Decode the local header that the central directory places at `offset`.
///
/// The offset comes from a trusted directory record, so a missing
/// signature is reported as [`ZipError::CorruptLocalHeader`].
pub fn read_local_header_at<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    offset: u64,
) -> Result<LocalHeader> {
    reader.seek_to(offset)?;

    let sig: [u8; 4] = reader.read_array()?;
    if &sig != LFH_SIGNATURE {
        return Err(ZipError::CorruptLocalHeader { offset, found: sig });
    }

    read_header_body(reader, offset)
}

/// Decode the next local header during a sequential scan.
///
/// Returns `Ok(None)` once the signature stops matching, leaving the
/// cursor where it was so the central directory reader can take over.
pub fn read_next_local_header<R: Read + Seek>(
    reader: &mut ByteReader<R>,
) -> Result<Option<LocalHeader>> {
    let offset = reader.position()?;

    let sig: [u8; 4] = reader.read_array()?;
    if &sig != LFH_SIGNATURE {
        reader.rewind(sig.len() as u64)?;
        return Ok(None);
    }

    read_header_body(reader, offset).map(Some)
}

/// Decode the header after its signature, followed by name, extra field,
/// the optional ZIP64 block and the raw content.
fn read_header_body<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    offset: u64,
) -> Result<LocalHeader> {
    let rest = reader.read_exact(LFH_SIZE - LFH_SIGNATURE.len())?;
    let mut block = [0u8; LFH_SIZE];
    block[..4].copy_from_slice(LFH_SIGNATURE);
    block[4..].copy_from_slice(&rest);

    let is_zip64 = block[18..26] == ZIP64_SIZE_MARKER;
    let (mut compressed_size, mut uncompressed_size) = if is_zip64 {
        (0, 0)
    } else {
        (
            LittleEndian::read_u32(&block[18..22]) as u64,
            LittleEndian::read_u32(&block[22..26]) as u64,
        )
    };

    let file_name_length = LittleEndian::read_u16(&block[26..28]) as usize;
    let extra_field_length = LittleEndian::read_u16(&block[28..30]) as usize;

    let name = reader.read_exact(file_name_length)?;
    let extra_field = reader.read_exact(extra_field_length)?;

    if is_zip64 {
        let zip64: [u8; ZIP64_BLOCK_SIZE] = reader.read_array()?;
        uncompressed_size = LittleEndian::read_u64(&zip64[4..12]);
        compressed_size = LittleEndian::read_u64(&zip64[12..20]);
    }

    let content = reader.read_exact(usize::try_from(compressed_size).unwrap_or(usize::MAX))?;

    Ok(LocalHeader {
        offset,
        version: LittleEndian::read_u16(&block[4..6]),
        flags: [block[6], block[7]],
        is_zip64,
        name: String::from_utf8_lossy(&name).into_owned(),
        last_modified: dos_datetime(
            LittleEndian::read_u16(&block[12..14]),
            LittleEndian::read_u16(&block[10..12]),
        ),
        compression_method: CompressionMethod::from_u16(LittleEndian::read_u16(&block[8..10])),
        crc32: LittleEndian::read_u32(&block[14..18]),
        compressed_size,
        uncompressed_size,
        extra_field,
        content,
    })
}
