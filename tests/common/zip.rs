//! Minimal ZIP reader used to check what the server streamed.
//!
//! Reads the End of Central Directory record, walks the Central Directory,
//! then decodes each entry from its local header. Only STORED and DEFLATE
//! entries are supported, which is all `zip` produces.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;

const EOCD_SIGNATURE: &[u8] = b"PK\x05\x06";
const EOCD_SIZE: usize = 22;
const CENTRAL_SIGNATURE: &[u8] = b"PK\x01\x02";
const CENTRAL_SIZE: usize = 46;
const LOCAL_SIGNATURE: &[u8] = b"PK\x03\x04";
const LOCAL_SIZE: usize = 30;
const ZIP64_EXTRA_ID: u16 = 0x0001;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    pub name: String,
    pub data: Vec<u8>,
}

impl ZipEntry {
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }
}

/// Decode every entry of `archive`, checking CRCs along the way.
pub fn read_entries(archive: &[u8]) -> Vec<ZipEntry> {
    let eocd = find_eocd(archive).expect("no End of Central Directory record");
    let mut cursor = Cursor::new(&archive[eocd + 10..]);
    let total_entries = cursor.read_u16::<LittleEndian>().unwrap();
    let _cd_size = cursor.read_u32::<LittleEndian>().unwrap();
    let cd_offset = cursor.read_u32::<LittleEndian>().unwrap() as usize;

    let mut entries = Vec::with_capacity(total_entries as usize);
    let mut pos = cd_offset;
    for _ in 0..total_entries {
        let (entry, header_len) = read_central_entry(archive, pos);
        entries.push(entry);
        pos += header_len;
    }
    entries
}

/// Only the file entries, as `(name, data)` pairs.
pub fn read_files(archive: &[u8]) -> Vec<(String, Vec<u8>)> {
    read_entries(archive)
        .into_iter()
        .filter(|entry| !entry.is_directory())
        .map(|entry| (entry.name, entry.data))
        .collect()
}

fn find_eocd(archive: &[u8]) -> Option<usize> {
    if archive.len() < EOCD_SIZE {
        return None;
    }
    (0..=archive.len() - EOCD_SIZE)
        .rev()
        .find(|&i| &archive[i..i + 4] == EOCD_SIGNATURE)
}

fn read_central_entry(archive: &[u8], pos: usize) -> (ZipEntry, usize) {
    let header = &archive[pos..];
    assert_eq!(&header[..4], CENTRAL_SIGNATURE, "bad central directory header");

    let mut cursor = Cursor::new(&header[10..]);
    let method = cursor.read_u16::<LittleEndian>().unwrap();
    let _mod_time = cursor.read_u16::<LittleEndian>().unwrap();
    let _mod_date = cursor.read_u16::<LittleEndian>().unwrap();
    let crc32 = cursor.read_u32::<LittleEndian>().unwrap();
    let mut compressed_size = cursor.read_u32::<LittleEndian>().unwrap() as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>().unwrap() as u64;
    let name_len = cursor.read_u16::<LittleEndian>().unwrap() as usize;
    let extra_len = cursor.read_u16::<LittleEndian>().unwrap() as usize;
    let comment_len = cursor.read_u16::<LittleEndian>().unwrap() as usize;

    let mut cursor = Cursor::new(&header[42..]);
    let mut local_offset = cursor.read_u32::<LittleEndian>().unwrap() as u64;

    let name_start = CENTRAL_SIZE;
    let name = String::from_utf8_lossy(&header[name_start..name_start + name_len]).into_owned();
    let extra = &header[name_start + name_len..name_start + name_len + extra_len];

    // ZIP64 values appear only for the fields saturated in the fixed header,
    // in this order.
    if let Some(mut zip64) = find_extra(extra, ZIP64_EXTRA_ID).map(Cursor::new) {
        if uncompressed_size == 0xFFFF_FFFF {
            uncompressed_size = zip64.read_u64::<LittleEndian>().unwrap();
        }
        if compressed_size == 0xFFFF_FFFF {
            compressed_size = zip64.read_u64::<LittleEndian>().unwrap();
        }
        if local_offset == 0xFFFF_FFFF {
            local_offset = zip64.read_u64::<LittleEndian>().unwrap();
        }
    }

    let data = read_local_data(archive, local_offset as usize, compressed_size as usize, method);
    assert_eq!(data.len() as u64, uncompressed_size, "size mismatch for {name}");

    let mut crc = flate2::Crc::new();
    crc.update(&data);
    assert_eq!(crc.sum(), crc32, "CRC mismatch for {name}");

    let header_len = CENTRAL_SIZE + name_len + extra_len + comment_len;
    (ZipEntry { name, data }, header_len)
}

fn read_local_data(archive: &[u8], offset: usize, compressed_size: usize, method: u16) -> Vec<u8> {
    let header = &archive[offset..];
    assert_eq!(&header[..4], LOCAL_SIGNATURE, "bad local file header");

    let mut cursor = Cursor::new(&header[26..]);
    let name_len = cursor.read_u16::<LittleEndian>().unwrap() as usize;
    let extra_len = cursor.read_u16::<LittleEndian>().unwrap() as usize;

    let start = LOCAL_SIZE + name_len + extra_len;
    let raw = &header[start..start + compressed_size];

    match method {
        0 => raw.to_vec(),
        8 => {
            let mut data = Vec::new();
            DeflateDecoder::new(raw).read_to_end(&mut data).unwrap();
            data
        }
        other => panic!("unsupported compression method {other}"),
    }
}

fn find_extra(mut extra: &[u8], id: u16) -> Option<&[u8]> {
    while extra.len() >= 4 {
        let header_id = u16::from_le_bytes([extra[0], extra[1]]);
        let len = u16::from_le_bytes([extra[2], extra[3]]) as usize;
        let body = extra.get(4..4 + len)?;
        if header_id == id {
            return Some(body);
        }
        extra = &extra[4 + len..];
    }
    None
}
