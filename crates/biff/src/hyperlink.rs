//! HLINK record decoding.

use crate::record::ByteReader;
use crate::strings::{decode_cp1251, decode_utf16le};
use xls_core::{CellRange, Hyperlink, LinkKind, Result};

/// URL moniker CLSID as stored in the file, read big-endian.
pub const URL_MONIKER: u128 = 0xE0C9_EA79_F9BA_CE11_8C82_00AA_004B_A90B;

/// File moniker CLSID as stored in the file, read big-endian.
pub const FILE_MONIKER: u128 = 0x0303_0000_0000_0000_C000_0000_0000_0046;

/// Bytes between the cell range and the option flags: the hyperlink CLSID
/// and the stream version.
const HEADER_SKIP: usize = 20;

/// Bytes between a file moniker's short path and its extended path size.
const FILE_MONIKER_RESERVED: usize = 24;

mod flags {
    pub const HAS_MONIKER: u32 = 0x01;
    pub const HAS_LOCATION: u32 = 0x08;
    pub const HAS_DESCRIPTION: u32 = 0x14;
    pub const HAS_FRAME: u32 = 0x80;
}

/// Decode an HLINK payload.
pub fn decode_hyperlink(r: &mut ByteReader<'_>) -> Result<Hyperlink> {
    let range = CellRange::new(r.read_u16()?, r.read_u16()?, r.read_u16()?, r.read_u16()?);
    if range.first_row > range.last_row || range.first_col > range.last_col {
        return Err(r.malformed(format!(
            "inverted hyperlink range rows {}..{} cols {}..{}",
            range.first_row, range.last_row, range.first_col, range.last_col
        )));
    }

    r.skip(HEADER_SKIP)?;
    let options = r.read_u32()?;

    let mut link = Hyperlink {
        range,
        ..Default::default()
    };

    if options & flags::HAS_DESCRIPTION != 0 {
        let chars = r.read_u32()?;
        link.description = read_utf16(r, chars)?;
    }
    if options & flags::HAS_FRAME != 0 {
        let chars = r.read_u32()?;
        link.target_frame = read_utf16(r, chars)?;
    }
    if options & flags::HAS_MONIKER != 0 {
        let guid = u128::from_be_bytes(r.read_array()?);
        match guid {
            URL_MONIKER => {
                link.kind = LinkKind::Url;
                let bytes = r.read_u32()?;
                link.url = read_utf16(r, bytes / 2)?;
            }
            FILE_MONIKER => {
                link.kind = LinkKind::File;
                read_file_moniker(r, &mut link)?;
            }
            other => {
                log::debug!("Unknown hyperlink moniker {:032X}", other);
                return Ok(link);
            }
        }
    }
    if options & flags::HAS_LOCATION != 0 {
        let chars = r.read_u32()?;
        link.text_mark = read_utf16(r, chars)?;
    }

    Ok(link)
}

fn read_file_moniker(r: &mut ByteReader<'_>, link: &mut Hyperlink) -> Result<()> {
    let _up_levels = r.read_u16()?;
    let short_len = r.read_u32()? as usize;
    link.short_file_path = decode_cp1251(r.read_bytes(short_len)?)
        .trim_end_matches('\0')
        .to_string();

    r.skip(FILE_MONIKER_RESERVED)?;
    let extended_size = r.read_u32()?;
    if extended_size > 0 {
        let bytes = r.read_u32()?;
        let _key = r.read_u16()?;
        link.extended_file_path = read_utf16(r, bytes / 2)?;
    }
    Ok(())
}

/// Read `chars` UTF-16 units, dropping the NUL terminator.
fn read_utf16(r: &mut ByteReader<'_>, chars: u32) -> Result<String> {
    let bytes = r.read_bytes(chars as usize * 2)?;
    Ok(decode_utf16le(bytes).trim_end_matches('\0').to_string())
}
