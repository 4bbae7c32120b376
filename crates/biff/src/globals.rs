//! Workbook globals decoder.
//!
//! Walks the whole BIFF stream once, collecting the tables every sheet needs
//! (fonts, formats, styles, shared strings, date system) and the sheet
//! directory. Sheet content is skipped here and decoded lazily later.

use crate::record::{record_ids, ByteReader, Record, RecordReader, BIFF8_VERSION};
use crate::strings::{ContinuationDebt, StringCodec};
use crate::workbook::{SheetDescriptor, SheetKind, SheetVisibility};
use std::io::Read;
use xls_core::{
    CurrentStyle, DateSystem, Font, LegacyStyle, NumberFormat, Result, Style, WorkbookContext,
};

/// Codepage the legacy string decoder is fixed to.
const SUPPORTED_LEGACY_CODEPAGE: u16 = 1251;

/// Decoder state for one pass over the workbook globals.
pub(crate) struct GlobalsDecoder {
    context: WorkbookContext,
    sheets: Vec<SheetDescriptor>,
    codec: StringCodec,
    seen_bof: bool,
    stream_len: u64,
    /// Id of the last record that was not a CONTINUE.
    previous: Option<u16>,
    /// Number of fully decoded shared strings.
    sst_filled: usize,
    debt: ContinuationDebt,
}

impl GlobalsDecoder {
    pub(crate) fn new(stream_len: u64) -> Self {
        Self {
            context: WorkbookContext::new(),
            sheets: Vec::new(),
            codec: StringCodec::default(),
            seen_bof: false,
            stream_len,
            previous: None,
            sst_filled: 0,
            debt: ContinuationDebt::default(),
        }
    }

    /// Decode every record of the stream.
    pub(crate) fn run<R: Read>(
        mut self,
        reader: &mut RecordReader<R>,
    ) -> Result<(WorkbookContext, Vec<SheetDescriptor>)> {
        while let Some(record) = reader.next_record()? {
            self.handle(&record)?;
        }
        Ok(self.finish())
    }

    pub(crate) fn handle(&mut self, record: &Record) -> Result<()> {
        let mut r = record.reader();
        match record.id {
            record_ids::BOF => self.handle_bof(&mut r)?,
            record_ids::CODEPAGE => self.handle_codepage(&mut r)?,
            record_ids::DATEMODE => {
                self.context.date_system = DateSystem::from_datemode(r.read_u16()?);
            }
            record_ids::FONT => self.handle_font(&mut r)?,
            record_ids::FORMAT => self.handle_format(&mut r)?,
            record_ids::XF => self.handle_xf(&mut r)?,
            record_ids::BOUNDSHEET => self.handle_boundsheet(&mut r)?,
            record_ids::SST => self.handle_sst(&mut r)?,
            record_ids::CONTINUE => self.handle_continue(&mut r)?,
            _ => {}
        }

        if record.id != record_ids::CONTINUE {
            self.previous = Some(record.id);
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> (WorkbookContext, Vec<SheetDescriptor>) {
        if !self.debt.is_settled() {
            log::warn!(
                "Shared string {} incomplete at end of stream ({} chars, {} bytes owed)",
                self.sst_filled,
                self.debt.chars,
                self.debt.skip_bytes
            );
        }
        (self.context, self.sheets)
    }

    fn handle_bof(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        if self.seen_bof {
            return Ok(());
        }
        let version = r.read_u16()?;
        let kind = r.read_u16()?;
        self.seen_bof = true;
        self.context.legacy = version != BIFF8_VERSION;
        self.context.kind = kind;
        self.codec = StringCodec::new(self.context.legacy);
        log::debug!(
            "Globals BOF: version=0x{:04X}, type=0x{:04X}, legacy={}",
            version,
            kind,
            self.context.legacy
        );
        Ok(())
    }

    fn handle_codepage(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        let codepage = r.read_u16()?;
        if self.context.legacy && codepage != SUPPORTED_LEGACY_CODEPAGE {
            log::debug!(
                "Codepage {} not supported, decoding 8-bit strings as {}",
                codepage,
                SUPPORTED_LEGACY_CODEPAGE
            );
        }
        self.context.codepage = Some(codepage);
        Ok(())
    }

    fn handle_font(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        let height = r.read_u16()?;
        let flags = r.read_u16()?;
        let color = r.read_u16()?;
        let weight = r.read_u16()?;
        let escapement = r.read_u16()?;
        let underline = r.read_u8()?;
        let family = r.read_u8()?;
        let charset = r.read_u8()?;
        r.skip(1)?;
        let name = self.codec.read_short_string(r)?;

        self.context.add_font(Font {
            height,
            flags,
            color,
            weight,
            escapement,
            underline,
            family,
            charset,
            name,
        });
        Ok(())
    }

    fn handle_format(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        let index = r.read_u16()?;
        let pattern = if self.codec.is_legacy() {
            self.codec.read_short_string(r)?
        } else {
            self.codec.read_long_string(r)?
        };
        self.context.add_format(NumberFormat::new(index, pattern));
        Ok(())
    }

    fn handle_xf(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        let style = if self.context.legacy {
            Style::Legacy(LegacyStyle {
                font: r.read_u16()?,
                format: r.read_u16()?,
                kind: r.read_u16()?,
                align: r.read_u16()?,
                color: r.read_u16()?,
                fill: r.read_u16()?,
                border: r.read_u16()?,
                line_style: r.read_u16()?,
            })
        } else {
            Style::Current(CurrentStyle {
                font: r.read_u16()?,
                format: r.read_u16()?,
                kind: r.read_u16()?,
                align: r.read_u8()?,
                rotation: r.read_u8()?,
                indent: r.read_u8()?,
                used_attributes: r.read_u8()?,
                line_style: r.read_u32()?,
                line_color: r.read_u32()?,
                fill_color: r.read_u16()?,
            })
        };
        self.context.add_style(style);
        Ok(())
    }

    fn handle_boundsheet(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        let offset = r.read_u32()?;
        let visibility = SheetVisibility::from_u8(r.read_u8()?);
        let kind = SheetKind::from_u8(r.read_u8()?);
        let name = self.codec.read_short_string(r)?;

        log::debug!("Sheet '{}' at offset {} ({:?})", name, offset, kind);
        self.sheets.push(SheetDescriptor {
            name,
            offset,
            visibility,
            kind,
        });
        Ok(())
    }

    fn handle_sst(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        let total = r.read_u32()?;
        let unique = r.read_u32()?;
        if u64::from(unique) > self.stream_len {
            return Err(r.malformed(format!(
                "{} unique strings declared in a {}-byte stream",
                unique, self.stream_len
            )));
        }

        log::debug!("SST: {} references, {} unique strings", total, unique);
        self.context.shared_strings = vec![String::new(); unique as usize];
        self.sst_filled = 0;
        self.debt.clear();
        self.fill_shared_strings(r)
    }

    fn handle_continue(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        if self.previous != Some(record_ids::SST) {
            log::debug!(
                "Dropping CONTINUE after record 0x{:04X}",
                self.previous.unwrap_or_default()
            );
            return Ok(());
        }

        if self.debt.owes_chars() {
            let decoded = self.codec.resume(r, &mut self.debt)?;
            let complete = decoded.is_complete();
            if let Some(slot) = self.context.shared_strings.get_mut(self.sst_filled) {
                slot.push_str(decoded.text());
            }
            if !complete {
                return Ok(());
            }
            self.sst_filled += 1;
        }

        if self.debt.skip_bytes > 0 {
            self.codec.pay_skip(r, &mut self.debt);
            if self.debt.skip_bytes > 0 {
                return Ok(());
            }
        }

        self.fill_shared_strings(r)
    }

    /// Decode fresh strings until the table is full or the payload ends.
    fn fill_shared_strings(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        while self.sst_filled < self.context.shared_strings.len() && !r.is_empty() {
            let chars = r.read_u16()?;
            let decoded = self.codec.decode(r, chars, &mut self.debt)?;
            let complete = decoded.is_complete();
            self.context.shared_strings[self.sst_filled] = decoded.into_text();
            if !complete {
                break;
            }
            self.sst_filled += 1;
        }
        Ok(())
    }
}
