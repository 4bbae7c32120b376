//! Worksheet substream decoding.
//!
//! A sheet's records start at the offset recorded by its BOUNDSHEET entry and
//! run until the EOF that closes the sheet's own BOF. Charts and other
//! embedded substreams nest their own BOF/EOF pairs; their records are
//! skipped.

use crate::hyperlink::decode_hyperlink;
use crate::record::{record_ids, ByteReader, Record, RecordReader};
use crate::strings::StringCodec;
use std::io::{Read, Seek, SeekFrom};
use xls_core::{Cell, Result, RkValue, RowInfo, Worksheet};

/// Row, column and style: the 6-byte header shared by single-cell records.
struct CellHeader {
    row: u16,
    col: u16,
    style: u16,
}

impl CellHeader {
    fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            row: r.read_u16()?,
            col: r.read_u16()?,
            style: r.read_u16()?,
        })
    }
}

/// Decode the sheet whose BOF starts at `offset`.
pub fn parse_sheet<R: Read + Seek>(
    stream: &mut R,
    offset: u32,
    codec: StringCodec,
) -> Result<Worksheet> {
    stream.seek(SeekFrom::Start(u64::from(offset)))?;
    let mut reader = RecordReader::new(stream);
    let mut decoder = SheetDecoder::new(codec);

    while let Some(record) = reader.next_record()? {
        if decoder.handle(&record)? {
            return Ok(decoder.sheet);
        }
    }

    log::warn!("Sheet at offset {} ends without an EOF record", offset);
    Ok(decoder.sheet)
}

struct SheetDecoder {
    sheet: Worksheet,
    codec: StringCodec,
    /// Open BOF records, the sheet's own included.
    depth: usize,
}

impl SheetDecoder {
    fn new(codec: StringCodec) -> Self {
        Self {
            sheet: Worksheet::new(),
            codec,
            depth: 0,
        }
    }

    /// Handle one record. Returns true once the sheet is closed.
    fn handle(&mut self, record: &Record) -> Result<bool> {
        match record.id {
            record_ids::BOF => {
                self.depth += 1;
                if self.depth > 1 {
                    log::debug!("Skipping embedded substream (depth {})", self.depth);
                }
                return Ok(false);
            }
            record_ids::EOF => {
                if self.depth <= 1 {
                    return Ok(true);
                }
                self.depth -= 1;
                return Ok(false);
            }
            _ if self.depth > 1 => return Ok(false),
            _ => {}
        }

        let mut r = record.reader();
        match record.id {
            record_ids::ROW => self.handle_row(&mut r)?,
            record_ids::MULRK => self.handle_mulrk(&mut r)?,
            record_ids::MULBLANK => self.handle_mulblank(&mut r)?,
            record_ids::NUMBER => {
                let h = CellHeader::read(&mut r)?;
                let value = r.read_f64()?;
                self.sheet.add_cell(
                    h.row,
                    Cell::Number {
                        col: h.col,
                        style: h.style,
                        value,
                    },
                );
            }
            record_ids::FORMULA => {
                let h = CellHeader::read(&mut r)?;
                let cached: [u8; 8] = r.read_array()?;
                let flags = r.read_u16()?;
                r.skip(4)?;
                let tokens = r.rest().to_vec();
                self.sheet.add_cell(
                    h.row,
                    Cell::Formula {
                        col: h.col,
                        style: h.style,
                        cached,
                        flags,
                        tokens,
                    },
                );
            }
            record_ids::RK => {
                let h = CellHeader::read(&mut r)?;
                let rk = r.read_u32()?;
                self.sheet.add_cell(
                    h.row,
                    Cell::Rk {
                        col: h.col,
                        value: RkValue::new(h.style, rk),
                    },
                );
            }
            record_ids::LABELSST => {
                let h = CellHeader::read(&mut r)?;
                let index = r.read_u32()?;
                self.sheet.add_cell(
                    h.row,
                    Cell::LabelSst {
                        col: h.col,
                        style: h.style,
                        index,
                    },
                );
            }
            record_ids::LABEL => {
                let h = CellHeader::read(&mut r)?;
                let text = self.codec.read_long_string(&mut r)?;
                self.sheet.add_cell(
                    h.row,
                    Cell::Label {
                        col: h.col,
                        style: h.style,
                        text,
                    },
                );
            }
            record_ids::BLANK => {
                let h = CellHeader::read(&mut r)?;
                self.sheet.add_cell(
                    h.row,
                    Cell::Blank {
                        col: h.col,
                        style: h.style,
                    },
                );
            }
            record_ids::HLINK => {
                let link = decode_hyperlink(&mut r)?;
                self.sheet.add_hyperlink(link);
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_row(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        let index = r.read_u16()?;
        let first_col = r.read_u16()?;
        let last_col = r.read_u16()?;
        let height = r.read_u16()?;
        r.skip(4)?;
        let flags = r.read_u16()?;
        self.sheet.add_row(RowInfo {
            index,
            first_col,
            last_col,
            height,
            flags,
        });
        Ok(())
    }

    fn handle_mulrk(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        let row = r.read_u16()?;
        let first_col = r.read_u16()?;
        let count = span_entries(r, 6)?;

        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            let style = r.read_u16()?;
            let rk = r.read_u32()?;
            values.push(RkValue::new(style, rk));
        }
        check_last_col(r, first_col, count)?;

        self.sheet.add_cell(row, Cell::MultiRk { first_col, values });
        Ok(())
    }

    fn handle_mulblank(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        let row = r.read_u16()?;
        let first_col = r.read_u16()?;
        let count = span_entries(r, 2)?;

        let mut styles = Vec::with_capacity(count);
        for _ in 0..count {
            styles.push(r.read_u16()?);
        }
        check_last_col(r, first_col, count)?;

        self.sheet.add_cell(row, Cell::MultiBlank { first_col, styles });
        Ok(())
    }
}

/// Number of `entry_size` entries between the header and the trailing
/// last-column field.
fn span_entries(r: &ByteReader<'_>, entry_size: usize) -> Result<usize> {
    let body = r.remaining().saturating_sub(2);
    if body == 0 || body % entry_size != 0 {
        return Err(r.malformed(format!(
            "{} payload bytes is not a whole number of {}-byte entries",
            body, entry_size
        )));
    }
    Ok(body / entry_size)
}

fn check_last_col(r: &mut ByteReader<'_>, first_col: u16, count: usize) -> Result<()> {
    let last_col = r.read_u16()?;
    if usize::from(last_col) + 1 != usize::from(first_col) + count {
        return Err(r.malformed(format!(
            "last column {} does not match {} entries from column {}",
            last_col, count, first_col
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{bof, cell_header as cell, eof, frame, WORKSHEET};
    use crate::record::BIFF8_VERSION;
    use std::io::Cursor;
    use xls_core::WorkbookContext;

    fn sheet_bof() -> Vec<u8> {
        bof(BIFF8_VERSION, WORKSHEET)
    }

    fn number(row: u16, col: u16, value: f64) -> Vec<u8> {
        crate::fixtures::number(row, col, 0, value)
    }

    fn rk(row: u16, col: u16, rk: u32) -> Vec<u8> {
        crate::fixtures::rk(row, col, 0, rk)
    }

    fn mulrk(row: u16, first_col: u16, values: &[u32], last_col: u16) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&row.to_le_bytes());
        payload.extend_from_slice(&first_col.to_le_bytes());
        for value in values {
            payload.extend_from_slice(&0u16.to_le_bytes());
            payload.extend_from_slice(&value.to_le_bytes());
        }
        payload.extend_from_slice(&last_col.to_le_bytes());
        frame(record_ids::MULRK, &payload)
    }

    fn url_hyperlink(range: [u16; 4], description: &str, url: &str) -> Vec<u8> {
        let utf16z = |text: &str| -> Vec<u8> {
            text.encode_utf16()
                .chain(std::iter::once(0))
                .flat_map(u16::to_le_bytes)
                .collect()
        };
        let mut payload: Vec<u8> = range.iter().flat_map(|v| v.to_le_bytes()).collect();
        payload.extend_from_slice(&[0u8; 20]);
        payload.extend_from_slice(&0x17u32.to_le_bytes());
        payload.extend_from_slice(&((description.len() + 1) as u32).to_le_bytes());
        payload.extend(utf16z(description));
        payload.extend_from_slice(&crate::hyperlink::URL_MONIKER.to_be_bytes());
        let url_bytes = utf16z(url);
        payload.extend_from_slice(&(url_bytes.len() as u32).to_le_bytes());
        payload.extend(url_bytes);
        frame(record_ids::HLINK, &payload)
    }

    fn parse(records: &[Vec<u8>]) -> Result<Worksheet> {
        let mut stream = Cursor::new(records.concat());
        parse_sheet(&mut stream, 0, StringCodec::new(false))
    }

    #[test]
    fn test_cells_and_rows() {
        let mut label = cell(1, 0, 0);
        label.extend_from_slice(&3u16.to_le_bytes());
        label.push(0x00);
        label.extend_from_slice(b"abc");

        let mut row = Vec::new();
        for field in [1u16, 0, 4, 300, 0, 0, 0x0100, 0x000F] {
            row.extend_from_slice(&field.to_le_bytes());
        }

        let sheet = parse(&[
            sheet_bof(),
            frame(record_ids::ROW, &row),
            number(0, 0, 1.25),
            rk(0, 1, (7 << 2) | 0x2),
            frame(record_ids::LABEL, &label),
            frame(record_ids::BLANK, &cell(1, 1, 15)),
            eof(),
        ])
        .unwrap();

        let ctx = WorkbookContext::new();
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.row(0).unwrap().flatten(&ctx), vec!["1.25", "7"]);
        assert_eq!(sheet.row(1).unwrap().flatten(&ctx), vec!["abc", ""]);
        let info = sheet.row(1).unwrap().info.unwrap();
        assert_eq!((info.first_col, info.last_col, info.height), (0, 4, 300));
        assert_eq!(info.flags, 0x0100);
    }

    #[test]
    fn test_mulrk_expands_to_span() {
        let sheet = parse(&[
            sheet_bof(),
            mulrk(2, 1, &[(1 << 2) | 0x2, (2 << 2) | 0x2, (150 << 2) | 0x3], 3),
            eof(),
        ])
        .unwrap();

        let ctx = WorkbookContext::new();
        assert_eq!(sheet.row(2).unwrap().flatten(&ctx), vec!["", "1", "2", "1.5"]);
        assert_eq!(sheet.row_count(), 3);
    }

    #[test]
    fn test_mulrk_last_column_mismatch_is_malformed() {
        let err = parse(&[sheet_bof(), mulrk(0, 1, &[2, 6], 5)]).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_mulblank_partial_entry_is_malformed() {
        let payload = [0, 0, 0, 0, 15, 0, 15, 1, 0];
        let err = parse(&[sheet_bof(), frame(record_ids::MULBLANK, &payload)]).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_formula_keeps_cached_value() {
        let mut payload = cell(0, 2, 0);
        payload.extend_from_slice(&6.5f64.to_le_bytes());
        payload.extend_from_slice(&0x0002u16.to_le_bytes());
        payload.extend_from_slice(&[0u8; 4]);
        payload.extend_from_slice(&[0x03, 0x00, 0x1E, 0x05, 0x00]);

        let sheet = parse(&[sheet_bof(), frame(record_ids::FORMULA, &payload), eof()])
            .unwrap();
        let formula = sheet.row(0).unwrap().cell(2).unwrap();
        assert_eq!(formula.cached_number(), Some(6.5));
        assert_eq!(formula.render(&WorkbookContext::new()), vec!["#FORMULA"]);
    }

    #[test]
    fn test_hyperlink_overwrites_numbers() {
        let sheet = parse(&[
            sheet_bof(),
            number(0, 2, 10.0),
            rk(0, 3, (5 << 2) | 0x2),
            number(0, 5, 99.0),
            url_hyperlink([0, 0, 2, 4], "Docs", "http://example.com/"),
            eof(),
        ])
        .unwrap();

        let ctx = WorkbookContext::new();
        let row = sheet.row(0).unwrap();
        let expected = "Docs(http://example.com/)";
        for col in 2..=4 {
            assert_eq!(row.col(col, &ctx).as_deref(), Some(expected));
        }
        assert_eq!(row.col(5, &ctx).as_deref(), Some("99"));
    }

    #[test]
    fn test_embedded_substream_is_skipped() {
        let sheet = parse(&[
            sheet_bof(),
            number(0, 0, 1.0),
            sheet_bof(),
            number(9, 9, 2.0),
            eof(),
            number(1, 0, 3.0),
            eof(),
            number(7, 0, 4.0),
        ])
        .unwrap();

        assert_eq!(sheet.row_count(), 2);
        assert!(sheet.row(9).is_none());
    }

    #[test]
    fn test_missing_eof_keeps_decoded_cells() {
        let sheet = parse(&[sheet_bof(), number(0, 0, 1.0)]).unwrap();
        assert_eq!(sheet.row_count(), 1);
    }

    #[test]
    fn test_truncated_number_is_structural() {
        let payload = cell(0, 0, 0);
        let err = parse(&[sheet_bof(), frame(record_ids::NUMBER, &payload)]).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_sheet_starts_at_offset() {
        let mut bytes = number(4, 4, 4.0);
        let offset = bytes.len() as u32;
        bytes.extend(sheet_bof());
        bytes.extend(number(0, 0, 1.0));
        bytes.extend(eof());

        let sheet = parse_sheet(&mut Cursor::new(bytes), offset, StringCodec::new(false)).unwrap();
        assert_eq!(sheet.row_count(), 1);
    }
}
