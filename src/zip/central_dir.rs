//! Central directory file header decoding.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek};

use crate::error::Result;
use crate::io::ByteReader;

use super::structures::*;

/// Decode one central directory file header at the reader's position.
///
/// Returns `Ok(None)` when the next four bytes are not a central directory
/// signature, which marks the end of the directory. The cursor is restored
/// in that case so the following read starts on the same bytes.
pub fn read_central_directory_entry<R: Read + Seek>(
    reader: &mut ByteReader<R>,
) -> Result<Option<CentralDirectoryFileHeader>> {
    let sig: [u8; 4] = reader.read_array()?;
    if &sig != CDFH_SIGNATURE {
        reader.rewind(sig.len() as u64)?;
        return Ok(None);
    }

    let rest = reader.read_exact(CDFH_MIN_SIZE - sig.len())?;
    let mut block = [0u8; CDFH_MIN_SIZE];
    block[..4].copy_from_slice(&sig);
    block[4..].copy_from_slice(&rest);

    let file_name_length = LittleEndian::read_u16(&block[28..30]) as usize;
    let extra_field_length = LittleEndian::read_u16(&block[30..32]) as usize;
    let comment_length = LittleEndian::read_u16(&block[32..34]) as usize;

    let file_name = reader.read_exact(file_name_length)?;
    let extra_field = reader.read_exact(extra_field_length)?;
    let comment = reader.read_exact(comment_length)?;

    let mut compressed_size = LittleEndian::read_u32(&block[20..24]) as u64;
    let mut uncompressed_size = LittleEndian::read_u32(&block[24..28]) as u64;
    let mut local_header_offset = LittleEndian::read_u32(&block[42..46]) as u64;
    apply_zip64_extra(
        &extra_field,
        &mut uncompressed_size,
        &mut compressed_size,
        &mut local_header_offset,
    )?;

    let header = CentralDirectoryFileHeader {
        version_made_by: LittleEndian::read_u16(&block[4..6]),
        version_needed: LittleEndian::read_u16(&block[6..8]),
        flags: [block[8], block[9]],
        compression_method: CompressionMethod::from_u16(LittleEndian::read_u16(&block[10..12])),
        last_modified: dos_datetime(
            LittleEndian::read_u16(&block[14..16]),
            LittleEndian::read_u16(&block[12..14]),
        ),
        crc32: LittleEndian::read_u32(&block[16..20]),
        compressed_size,
        uncompressed_size,
        disk_number_start: LittleEndian::read_u16(&block[34..36]),
        internal_attributes: LittleEndian::read_u16(&block[36..38]),
        external_attributes: LittleEndian::read_u32(&block[38..42]),
        local_header_offset,
        // Use lossy conversion to handle non-UTF8 filenames gracefully
        file_name: String::from_utf8_lossy(&file_name).into_owned(),
        extra_field,
        comment: String::from_utf8_lossy(&comment).into_owned(),
    };

    Ok(Some(header))
}

/// Replace sentinel sizes and offset with values from the ZIP64 extra field.
///
/// Fields are present only if the corresponding header field is 0xFFFFFFFF,
/// in the order uncompressed size, compressed size, local header offset.
fn apply_zip64_extra(
    extra_field: &[u8],
    uncompressed_size: &mut u64,
    compressed_size: &mut u64,
    local_header_offset: &mut u64,
) -> Result<()> {
    const SENTINEL: u64 = 0xFFFFFFFF;

    let extra_len = extra_field.len() as u64;
    let mut cursor = Cursor::new(extra_field);

    while cursor.position() + 4 <= extra_len {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()? as u64;
        let field_end = (cursor.position() + field_size).min(extra_len);

        if header_id == ZIP64_EXTRA_ID {
            for value in [uncompressed_size, compressed_size, local_header_offset] {
                if *value == SENTINEL && cursor.position() + 8 <= field_end {
                    *value = cursor.read_u64::<LittleEndian>()?;
                }
            }
            break;
        }

        cursor.set_position(field_end);
    }

    Ok(())
}
