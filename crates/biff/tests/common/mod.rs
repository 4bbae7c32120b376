//! Minimal `.xls` writers for integration tests: just enough BIFF inside a
//! compound file to exercise the reader end to end.

#![allow(dead_code)]

use std::io::{Cursor, Write};

pub const BIFF8: u16 = 0x0600;
pub const BIFF5: u16 = 0x0500;

pub fn record(id: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = id.to_le_bytes().to_vec();
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

pub fn bof(version: u16, kind: u16) -> Vec<u8> {
    let mut payload = version.to_le_bytes().to_vec();
    payload.extend_from_slice(&kind.to_le_bytes());
    record(0x0809, &payload)
}

pub fn eof() -> Vec<u8> {
    record(0x000A, &[])
}

pub fn number(row: u16, col: u16, value: f64) -> Vec<u8> {
    let mut payload: Vec<u8> = [row, col, 0].iter().flat_map(|v| v.to_le_bytes()).collect();
    payload.extend_from_slice(&value.to_le_bytes());
    record(0x0203, &payload)
}

pub fn label_sst(row: u16, col: u16, index: u32) -> Vec<u8> {
    let mut payload: Vec<u8> = [row, col, 0].iter().flat_map(|v| v.to_le_bytes()).collect();
    payload.extend_from_slice(&index.to_le_bytes());
    record(0x00FD, &payload)
}

/// LABEL cell in BIFF5 layout: 16-bit length then codepage bytes.
pub fn legacy_label(row: u16, col: u16, bytes: &[u8]) -> Vec<u8> {
    let mut payload: Vec<u8> = [row, col, 0].iter().flat_map(|v| v.to_le_bytes()).collect();
    payload.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
    payload.extend_from_slice(bytes);
    record(0x0204, &payload)
}

/// SST whose single string is split across the SST and a CONTINUE record.
pub fn split_sst(first: &str, rest: &str) -> Vec<u8> {
    let mut payload = 1u32.to_le_bytes().to_vec();
    payload.extend_from_slice(&1u32.to_le_bytes());
    payload.extend_from_slice(&((first.len() + rest.len()) as u16).to_le_bytes());
    payload.push(0x00);
    payload.extend_from_slice(first.as_bytes());

    let mut out = record(0x00FC, &payload);
    let mut cont = vec![0x00];
    cont.extend_from_slice(rest.as_bytes());
    out.extend(record(0x003C, &cont));
    out
}

fn boundsheet(version: u16, offset: u32, name: &[u8]) -> Vec<u8> {
    let mut payload = offset.to_le_bytes().to_vec();
    payload.extend_from_slice(&[0x00, 0x00, name.len() as u8]);
    if version == BIFF8 {
        payload.push(0x00);
    }
    payload.extend_from_slice(name);
    record(0x0085, &payload)
}

/// Globals (with `globals` records) followed by one substream per sheet.
pub fn workbook_stream(
    version: u16,
    globals: &[Vec<u8>],
    sheets: &[(Vec<u8>, Vec<Vec<u8>>)],
) -> Vec<u8> {
    let mut out = bof(version, 0x0005);
    for r in globals {
        out.extend_from_slice(r);
    }

    let directory: usize = sheets
        .iter()
        .map(|(name, _)| boundsheet(version, 0, name).len())
        .sum();
    let mut offset = out.len() + directory + eof().len();

    let mut bodies = Vec::new();
    for (name, records) in sheets {
        let mut body = bof(version, 0x0010);
        for r in records {
            body.extend_from_slice(r);
        }
        body.extend(eof());
        out.extend(boundsheet(version, offset as u32, name));
        offset += body.len();
        bodies.extend(body);
    }

    out.extend(eof());
    out.extend(bodies);
    out
}

/// Wrap streams into a compound file.
pub fn compound_file(streams: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let cursor = Cursor::new(Vec::new());
    let mut ole = cfb::CompoundFile::create(cursor).expect("create cfb");
    for (name, bytes) in streams {
        let mut stream = ole.create_stream(name).expect("create stream");
        stream.write_all(bytes).expect("write stream");
    }
    ole.into_inner().into_inner()
}
