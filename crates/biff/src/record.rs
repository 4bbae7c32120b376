//! BIFF record framing.
//!
//! A BIFF stream is a flat sequence of records, each a 4-byte header
//! (16-bit id, 16-bit payload size) followed by exactly `size` payload bytes.
//! [`RecordReader`] yields whole records; [`ByteReader`] decodes fields from
//! one payload without ever reading past it.

use std::io::Read;
use xls_core::{Error, Result};

/// Record ids handled by the decoders.
pub mod record_ids {
    pub const BOF: u16 = 0x0809;
    pub const EOF: u16 = 0x000A;
    pub const CODEPAGE: u16 = 0x0042;
    pub const DATEMODE: u16 = 0x0022;
    pub const FONT: u16 = 0x0031;
    pub const FORMAT: u16 = 0x041E;
    pub const XF: u16 = 0x00E0;
    pub const BOUNDSHEET: u16 = 0x0085;
    pub const SST: u16 = 0x00FC;
    pub const CONTINUE: u16 = 0x003C;
    pub const ROW: u16 = 0x0208;
    pub const MULRK: u16 = 0x00BD;
    pub const MULBLANK: u16 = 0x00BE;
    pub const NUMBER: u16 = 0x0203;
    pub const FORMULA: u16 = 0x0006;
    pub const RK: u16 = 0x027E;
    pub const LABELSST: u16 = 0x00FD;
    pub const LABEL: u16 = 0x0204;
    pub const BLANK: u16 = 0x0201;
    pub const HLINK: u16 = 0x01B8;
}

/// BOF version field of BIFF8 streams. Anything else is decoded as BIFF5.
pub const BIFF8_VERSION: u16 = 0x0600;

const HEADER_SIZE: usize = 4;

/// One framed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: u16,
    pub data: Vec<u8>,
}

impl Record {
    /// Cursor over the payload.
    pub fn reader(&self) -> ByteReader<'_> {
        ByteReader::new(self.id, &self.data)
    }
}

/// Reads framed records from a byte stream.
pub struct RecordReader<R> {
    inner: R,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read the next record.
    ///
    /// Returns `Ok(None)` at end of stream. A header cut short is treated as
    /// end of stream; a payload cut short is an error.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let mut header = [0u8; HEADER_SIZE];
        let got = read_full(&mut self.inner, &mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_SIZE {
            log::warn!("Stream ends inside a record header ({} of 4 bytes)", got);
            return Ok(None);
        }

        let id = read_u16_le(&header, 0);
        let size = read_u16_le(&header, 2) as usize;

        let mut data = vec![0u8; size];
        let got = read_full(&mut self.inner, &mut data)?;
        if got < size {
            return Err(Error::TruncatedRecord {
                record_id: id,
                expected: size,
                found: got,
            });
        }

        Ok(Some(Record { id, data }))
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Fill `buf` as far as the stream allows, returning the byte count read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Bounds-checked little-endian cursor over a record payload.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    record_id: u16,
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(record_id: u16, data: &'a [u8]) -> Self {
        Self {
            record_id,
            data,
            pos: 0,
        }
    }

    pub fn record_id(&self) -> u16 {
        self.record_id
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::TruncatedRecord {
                record_id: self.record_id,
                expected: self.pos + len,
                found: self.data.len(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Take up to `len` bytes, fewer if the payload ends first.
    pub fn take_up_to(&mut self, len: usize) -> &'a [u8] {
        let len = len.min(self.remaining());
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        bytes
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Everything left in the payload.
    pub fn rest(&mut self) -> &'a [u8] {
        self.take_up_to(self.remaining())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Build a malformed-record error for the current payload.
    pub fn malformed(&self, message: impl Into<String>) -> Error {
        Error::MalformedRecord {
            record_id: self.record_id,
            message: message.into(),
        }
    }
}

/// Read a little-endian u16 from a byte slice at the given offset.
fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}
