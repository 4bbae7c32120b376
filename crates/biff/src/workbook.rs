//! Workbook container with lazily decoded sheets.

use crate::globals::GlobalsDecoder;
use crate::record::RecordReader;
use crate::strings::StringCodec;
use crate::worksheet::parse_sheet;
use serde::Serialize;
use std::io::{Cursor, Read, Seek, SeekFrom};
use xls_core::{Error, Result, Row, Worksheet, WorkbookContext};

/// Sheet visibility from the BOUNDSHEET record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SheetVisibility {
    #[default]
    Visible,
    Hidden,
    /// Hidden and only unhideable programmatically.
    VeryHidden,
}

impl SheetVisibility {
    pub fn from_u8(value: u8) -> Self {
        match value & 0x03 {
            1 => SheetVisibility::Hidden,
            2 => SheetVisibility::VeryHidden,
            _ => SheetVisibility::Visible,
        }
    }
}

/// Sheet type from the BOUNDSHEET record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SheetKind {
    #[default]
    Worksheet,
    MacroSheet,
    Chart,
    VisualBasicModule,
    Other(u8),
}

impl SheetKind {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x00 => SheetKind::Worksheet,
            0x01 => SheetKind::MacroSheet,
            0x02 => SheetKind::Chart,
            0x06 => SheetKind::VisualBasicModule,
            other => SheetKind::Other(other),
        }
    }
}

/// A sheet as declared in the workbook globals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetDescriptor {
    pub name: String,
    /// Stream offset of the sheet's BOF record.
    pub offset: u32,
    pub visibility: SheetVisibility,
    pub kind: SheetKind,
}

/// Decode progress of one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseState {
    Unparsed,
    Parsed,
    Failed,
}

#[derive(Debug)]
enum SheetSlot {
    Unparsed,
    Parsed(Worksheet),
    Failed(String),
}

#[derive(Debug)]
struct SheetEntry {
    descriptor: SheetDescriptor,
    slot: SheetSlot,
}

/// A decoded sheet together with the workbook tables needed to render it.
#[derive(Debug, Clone, Copy)]
pub struct SheetView<'a> {
    descriptor: &'a SheetDescriptor,
    worksheet: &'a Worksheet,
    context: &'a WorkbookContext,
}

impl<'a> SheetView<'a> {
    pub fn name(&self) -> &'a str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &'a SheetDescriptor {
        self.descriptor
    }

    pub fn worksheet(&self) -> &'a Worksheet {
        self.worksheet
    }

    pub fn context(&self) -> &'a WorkbookContext {
        self.context
    }

    pub fn row(&self, index: u16) -> Option<&'a Row> {
        self.worksheet.row(index)
    }

    /// Rows this sheet contributes to a dense grid.
    pub fn row_count(&self) -> usize {
        self.worksheet.row_count()
    }

    /// Rendered text of the cell covering (`row`, `col`).
    pub fn cell_text(&self, row: u16, col: u16) -> Option<String> {
        self.worksheet.row(row)?.col(col, self.context)
    }

    /// Dense rendering of one row; empty for rows with no record.
    pub fn row_text(&self, index: u16) -> Vec<String> {
        self.worksheet
            .row(index)
            .map(|row| row.flatten(self.context))
            .unwrap_or_default()
    }
}

/// A legacy XLS workbook over a seekable BIFF stream.
///
/// Globals are decoded up front; each sheet is decoded on first access and
/// cached.
pub struct Workbook<R> {
    context: WorkbookContext,
    sheets: Vec<SheetEntry>,
    stream: R,
}

impl<R: Read + Seek> Workbook<R> {
    /// Decode the workbook globals of a raw BIFF stream.
    pub fn from_stream(mut stream: R) -> Result<Self> {
        let stream_len = stream.seek(SeekFrom::End(0))?;
        stream.seek(SeekFrom::Start(0))?;

        let mut reader = RecordReader::new(&mut stream);
        let (context, descriptors) = GlobalsDecoder::new(stream_len).run(&mut reader)?;

        log::debug!(
            "Workbook globals: {} sheets, {} styles, {} fonts, {} formats, {} shared strings",
            descriptors.len(),
            context.styles.len(),
            context.fonts.len(),
            context.formats.len(),
            context.shared_strings.len()
        );

        let sheets = descriptors
            .into_iter()
            .map(|descriptor| SheetEntry {
                descriptor,
                slot: SheetSlot::Unparsed,
            })
            .collect();

        Ok(Self {
            context,
            sheets,
            stream,
        })
    }

    /// Access a sheet by position, decoding it on first access.
    ///
    /// Returns `Ok(None)` for an out-of-range index. A sheet that failed to
    /// decode returns the same error on every access.
    pub fn sheet(&mut self, index: usize) -> Result<Option<SheetView<'_>>> {
        if index >= self.sheets.len() {
            return Ok(None);
        }
        self.ensure_parsed(index)?;
        Ok(self.view(index))
    }

    /// Access the first sheet with the given name.
    pub fn sheet_by_name(&mut self, name: &str) -> Result<Option<SheetView<'_>>> {
        match self.sheets.iter().position(|s| s.descriptor.name == name) {
            Some(index) => self.sheet(index),
            None => Ok(None),
        }
    }

    pub(crate) fn ensure_parsed(&mut self, index: usize) -> Result<()> {
        let entry = &mut self.sheets[index];
        match &entry.slot {
            SheetSlot::Parsed(_) => return Ok(()),
            SheetSlot::Failed(message) => {
                return Err(Error::SheetParseError {
                    name: entry.descriptor.name.clone(),
                    message: message.clone(),
                })
            }
            SheetSlot::Unparsed => {}
        }

        let codec = StringCodec::new(self.context.legacy);
        match parse_sheet(&mut self.stream, entry.descriptor.offset, codec) {
            Ok(worksheet) => {
                log::debug!(
                    "Parsed sheet '{}': {} rows",
                    entry.descriptor.name,
                    worksheet.row_count()
                );
                entry.slot = SheetSlot::Parsed(worksheet);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                log::warn!("Sheet '{}' failed to parse: {}", entry.descriptor.name, message);
                entry.slot = SheetSlot::Failed(message.clone());
                Err(Error::SheetParseError {
                    name: entry.descriptor.name.clone(),
                    message,
                })
            }
        }
    }
}

impl<R> Workbook<R> {
    pub fn context(&self) -> &WorkbookContext {
        &self.context
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Sheet descriptors in discovery order.
    pub fn sheets(&self) -> impl Iterator<Item = &SheetDescriptor> {
        self.sheets.iter().map(|s| &s.descriptor)
    }

    pub fn sheet_state(&self, index: usize) -> Option<ParseState> {
        self.sheets.get(index).map(|s| match s.slot {
            SheetSlot::Unparsed => ParseState::Unparsed,
            SheetSlot::Parsed(_) => ParseState::Parsed,
            SheetSlot::Failed(_) => ParseState::Failed,
        })
    }

    /// The underlying stream.
    pub fn into_inner(self) -> R {
        self.stream
    }

    /// View of an already parsed sheet.
    pub(crate) fn view(&self, index: usize) -> Option<SheetView<'_>> {
        let entry = self.sheets.get(index)?;
        match &entry.slot {
            SheetSlot::Parsed(worksheet) => Some(SheetView {
                descriptor: &entry.descriptor,
                worksheet,
                context: &self.context,
            }),
            _ => None,
        }
    }
}

impl Workbook<Cursor<Vec<u8>>> {
    /// A workbook with no sheets and empty tables.
    pub fn empty() -> Self {
        Self {
            context: WorkbookContext::new(),
            sheets: Vec::new(),
            stream: Cursor::new(Vec::new()),
        }
    }
}
