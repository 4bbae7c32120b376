//! Style (XF) and font records.
//!
//! Both are kept as read; only the number-format index of a style takes part
//! in rendering.

use serde::Serialize;

/// BIFF5 XF record: eight 16-bit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LegacyStyle {
    pub font: u16,
    pub format: u16,
    pub kind: u16,
    pub align: u16,
    pub color: u16,
    pub fill: u16,
    pub border: u16,
    pub line_style: u16,
}

/// BIFF8 XF record: ten fields of mixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CurrentStyle {
    pub font: u16,
    pub format: u16,
    pub kind: u16,
    pub align: u8,
    pub rotation: u8,
    pub indent: u8,
    pub used_attributes: u8,
    pub line_style: u32,
    pub line_color: u32,
    pub fill_color: u16,
}

/// An entry of the workbook style table. Its position in the table is the
/// style index cells refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Style {
    Legacy(LegacyStyle),
    Current(CurrentStyle),
}

impl Style {
    /// Index into the font table.
    pub fn font_index(&self) -> u16 {
        match self {
            Style::Legacy(s) => s.font,
            Style::Current(s) => s.font,
        }
    }

    /// Number format index (built-in or custom).
    pub fn format_index(&self) -> u16 {
        match self {
            Style::Legacy(s) => s.format,
            Style::Current(s) => s.format,
        }
    }
}

/// A FONT record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Font {
    /// Height in twips (1/20 pt).
    pub height: u16,
    pub flags: u16,
    pub color: u16,
    pub weight: u16,
    pub escapement: u16,
    pub underline: u8,
    pub family: u8,
    pub charset: u8,
    pub name: String,
}

impl Font {
    pub fn is_italic(&self) -> bool {
        self.flags & 0x0002 != 0
    }

    pub fn is_bold(&self) -> bool {
        self.weight >= 700
    }

    /// Size in points.
    pub fn points(&self) -> f64 {
        f64::from(self.height) / 20.0
    }
}
