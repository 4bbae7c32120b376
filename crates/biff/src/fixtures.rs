//! In-memory BIFF8 stream builders for unit tests.

use crate::record::{record_ids, BIFF8_VERSION};

/// BOF substream types.
pub const GLOBALS: u16 = 0x0005;
pub const WORKSHEET: u16 = 0x0010;

pub fn frame(id: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = id.to_le_bytes().to_vec();
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

pub fn bof(version: u16, kind: u16) -> Vec<u8> {
    let mut payload = version.to_le_bytes().to_vec();
    payload.extend_from_slice(&kind.to_le_bytes());
    frame(record_ids::BOF, &payload)
}

pub fn eof() -> Vec<u8> {
    frame(record_ids::EOF, &[])
}

pub fn cell_header(row: u16, col: u16, style: u16) -> Vec<u8> {
    [row, col, style].iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn number(row: u16, col: u16, style: u16, value: f64) -> Vec<u8> {
    let mut payload = cell_header(row, col, style);
    payload.extend_from_slice(&value.to_le_bytes());
    frame(record_ids::NUMBER, &payload)
}

pub fn rk(row: u16, col: u16, style: u16, rk: u32) -> Vec<u8> {
    let mut payload = cell_header(row, col, style);
    payload.extend_from_slice(&rk.to_le_bytes());
    frame(record_ids::RK, &payload)
}

pub fn label_sst(row: u16, col: u16, index: u32) -> Vec<u8> {
    let mut payload = cell_header(row, col, 0);
    payload.extend_from_slice(&index.to_le_bytes());
    frame(record_ids::LABELSST, &payload)
}

/// BIFF8 XF record using the given number format.
pub fn xf(format: u16) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&0u16.to_le_bytes());
    payload.extend_from_slice(&format.to_le_bytes());
    payload.extend_from_slice(&[0u8; 16]);
    frame(record_ids::XF, &payload)
}

pub fn format(index: u16, pattern: &str) -> Vec<u8> {
    let mut payload = index.to_le_bytes().to_vec();
    payload.extend_from_slice(&(pattern.len() as u16).to_le_bytes());
    payload.push(0x00);
    payload.extend_from_slice(pattern.as_bytes());
    frame(record_ids::FORMAT, &payload)
}

/// SST record holding compressed strings.
pub fn sst(strings: &[&str]) -> Vec<u8> {
    let mut payload = (strings.len() as u32).to_le_bytes().to_vec();
    payload.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    for s in strings {
        payload.extend_from_slice(&(s.len() as u16).to_le_bytes());
        payload.push(0x00);
        payload.extend_from_slice(s.as_bytes());
    }
    frame(record_ids::SST, &payload)
}

pub fn boundsheet(offset: u32, name: &str) -> Vec<u8> {
    let mut payload = offset.to_le_bytes().to_vec();
    payload.extend_from_slice(&[0x00, 0x00, name.len() as u8, 0x00]);
    payload.extend_from_slice(name.as_bytes());
    frame(record_ids::BOUNDSHEET, &payload)
}

/// A complete BIFF8 stream: globals BOF, `globals` records, one BOUNDSHEET
/// per sheet, EOF, then each sheet's BOF, records and EOF.
pub fn build_stream(globals: &[Vec<u8>], sheets: &[(&str, Vec<Vec<u8>>)]) -> Vec<u8> {
    let mut out = bof(BIFF8_VERSION, GLOBALS);
    for record in globals {
        out.extend_from_slice(record);
    }

    let directory_len: usize = sheets
        .iter()
        .map(|(name, _)| boundsheet(0, name).len())
        .sum();
    let mut offset = out.len() + directory_len + eof().len();

    let mut bodies = Vec::new();
    for (name, records) in sheets {
        let mut body = bof(BIFF8_VERSION, WORKSHEET);
        for record in records {
            body.extend_from_slice(record);
        }
        body.extend(eof());

        out.extend(boundsheet(offset as u32, name));
        offset += body.len();
        bodies.extend(body);
    }

    out.extend(eof());
    out.extend(bodies);
    out
}
