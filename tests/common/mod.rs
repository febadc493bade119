//! In-memory ZIP archive builder for integration tests.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

pub const METHOD_STORED: u16 = 0;
pub const METHOD_DEFLATE: u16 = 8;
pub const METHOD_BZIP2: u16 = 12;

/// 2023-06-15 13:45:58
pub const DOS_DATE: u16 = ((2023 - 1980) << 9) | (6 << 5) | 15;
pub const DOS_TIME: u16 = (13 << 11) | (45 << 5) | (58 / 2);

pub struct Entry {
    pub name: String,
    pub method: u16,
    pub data: Vec<u8>,
    pub zip64: bool,
    pub comment: String,
}

impl Entry {
    pub fn stored(name: &str, data: &[u8]) -> Self {
        Self::with_method(name, METHOD_STORED, data)
    }

    pub fn deflated(name: &str, data: &[u8]) -> Self {
        Self::with_method(name, METHOD_DEFLATE, data)
    }

    pub fn with_method(name: &str, method: u16, data: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            method,
            data: data.to_vec(),
            zip64: false,
            comment: String::new(),
        }
    }

    pub fn zip64(mut self) -> Self {
        self.zip64 = true;
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_string();
        self
    }

    fn payload(&self) -> Vec<u8> {
        if self.method == METHOD_DEFLATE {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&self.data).unwrap();
            encoder.finish().unwrap()
        } else {
            self.data.clone()
        }
    }
}

#[derive(Default)]
pub struct ArchiveBuilder {
    entries: Vec<Entry>,
    comment: Vec<u8>,
    declared_records: Option<u16>,
    trailing: Vec<u8>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, entry: Entry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    /// Override the entry count written to the end record.
    pub fn declare_records(mut self, count: u16) -> Self {
        self.declared_records = Some(count);
        self
    }

    /// Append bytes after the end record.
    pub fn trailing(mut self, data: &[u8]) -> Self {
        self.trailing = data.to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut offsets = Vec::new();
        let mut payloads = Vec::new();

        for entry in &self.entries {
            let payload = entry.payload();
            offsets.push(out.len() as u32);

            out.extend_from_slice(b"PK\x03\x04");
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(entry.method).unwrap();
            out.write_u16::<LittleEndian>(DOS_TIME).unwrap();
            out.write_u16::<LittleEndian>(DOS_DATE).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            if entry.zip64 {
                out.extend_from_slice(&[0xFF; 8]);
            } else {
                out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
                out.write_u32::<LittleEndian>(entry.data.len() as u32).unwrap();
            }
            out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.extend_from_slice(entry.name.as_bytes());
            if entry.zip64 {
                out.write_u16::<LittleEndian>(0x0001).unwrap();
                out.write_u16::<LittleEndian>(16).unwrap();
                out.write_u64::<LittleEndian>(entry.data.len() as u64).unwrap();
                out.write_u64::<LittleEndian>(payload.len() as u64).unwrap();
            }
            out.extend_from_slice(&payload);
            payloads.push(payload);
        }

        let cd_offset = out.len() as u32;
        for ((entry, payload), offset) in self.entries.iter().zip(&payloads).zip(&offsets) {
            out.extend_from_slice(b"PK\x01\x02");
            out.write_u16::<LittleEndian>(0x031E).unwrap();
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(entry.method).unwrap();
            out.write_u16::<LittleEndian>(DOS_TIME).unwrap();
            out.write_u16::<LittleEndian>(DOS_DATE).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(entry.data.len() as u32).unwrap();
            out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(entry.comment.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(0o100644 << 16).unwrap();
            out.write_u32::<LittleEndian>(*offset).unwrap();
            out.extend_from_slice(entry.name.as_bytes());
            out.extend_from_slice(entry.comment.as_bytes());
        }
        let cd_size = out.len() as u32 - cd_offset;

        let records = self
            .declared_records
            .unwrap_or(self.entries.len() as u16);
        out.extend_from_slice(b"PK\x05\x06");
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(records).unwrap();
        out.write_u16::<LittleEndian>(records).unwrap();
        out.write_u32::<LittleEndian>(cd_size).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16).unwrap();
        out.extend_from_slice(&self.comment);
        out.extend_from_slice(&self.trailing);

        out
    }
}
