//! Shared fixture builders for integration tests.
//!
//! Archives are assembled byte-by-byte so each test controls exactly what
//! the decoder sees; no external 7z tool is involved.

#![allow(dead_code)]

use sevenz_inspect::format::property_id;
use sevenz_inspect::format::reader::write_number;
use sevenz_inspect::format::SIGNATURE;

/// Builds a complete archive file: signature header, payload bytes, then
/// the next header, with both CRCs computed for real.
pub fn build_archive(payload: &[u8], next_header: &[u8]) -> Vec<u8> {
    let mut tail = Vec::new();
    tail.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    tail.extend_from_slice(&(next_header.len() as u64).to_le_bytes());
    tail.extend_from_slice(&crc32fast::hash(next_header).to_le_bytes());

    let mut data = Vec::new();
    data.extend_from_slice(SIGNATURE);
    data.extend_from_slice(&[0x00, 0x04]);
    data.extend_from_slice(&crc32fast::hash(&tail).to_le_bytes());
    data.extend_from_slice(&tail);
    data.extend_from_slice(payload);
    data.extend_from_slice(next_header);
    data
}

/// Builds a signature header that declares an arbitrary (possibly bogus)
/// next header location.
pub fn build_prologue(offset: u64, size: u64, next_crc: u32) -> Vec<u8> {
    let mut tail = Vec::new();
    tail.extend_from_slice(&offset.to_le_bytes());
    tail.extend_from_slice(&size.to_le_bytes());
    tail.extend_from_slice(&next_crc.to_le_bytes());

    let mut data = Vec::new();
    data.extend_from_slice(SIGNATURE);
    data.extend_from_slice(&[0x00, 0x04]);
    data.extend_from_slice(&crc32fast::hash(&tail).to_le_bytes());
    data.extend_from_slice(&tail);
    data
}

/// A next header with one pack stream, one single-coder folder, and an
/// optional file table.
pub fn build_single_folder_header(
    pack_size: u64,
    coder_id: &[u8],
    props: Option<&[u8]>,
    unpack_size: u64,
    names: &[&str],
) -> Vec<u8> {
    let mut data = vec![property_id::HEADER];

    data.push(property_id::MAIN_STREAMS_INFO);
    data.push(property_id::PACK_INFO);
    write_number(&mut data, 0); // pack pos
    write_number(&mut data, 1); // num pack streams
    data.push(property_id::SIZE);
    write_number(&mut data, pack_size);
    data.push(property_id::END);

    data.push(property_id::UNPACK_INFO);
    data.push(property_id::FOLDER);
    data.push(0x00); // external
    write_number(&mut data, 1); // num folders
    write_number(&mut data, 1); // num coders
    let mut flags = coder_id.len() as u8;
    if props.is_some() {
        flags |= 0x20;
    }
    data.push(flags);
    data.extend_from_slice(coder_id);
    if let Some(props) = props {
        write_number(&mut data, props.len() as u64);
        data.extend_from_slice(props);
    }
    data.push(property_id::CODERS_UNPACK_SIZE);
    write_number(&mut data, unpack_size);
    data.push(property_id::END);

    data.push(property_id::END); // end MainStreamsInfo
    if !names.is_empty() {
        push_files_info(&mut data, names);
    }
    data.push(property_id::END); // end Header
    data
}

/// Appends a FilesInfo record with the given names.
pub fn push_files_info(data: &mut Vec<u8>, names: &[&str]) {
    data.push(property_id::FILES_INFO);
    write_number(data, names.len() as u64);

    let mut body = vec![0x00u8]; // external
    for name in names {
        for unit in name.encode_utf16() {
            body.extend_from_slice(&unit.to_le_bytes());
        }
        body.extend_from_slice(&[0, 0]);
    }
    data.push(property_id::NAME);
    write_number(data, body.len() as u64);
    data.extend_from_slice(&body);
    data.push(property_id::END);
}
