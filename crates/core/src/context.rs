//! Workbook-level tables shared by every sheet.
//!
//! Cells only carry indices (style, shared string); rendering them to text
//! needs the tables collected from the workbook globals.

use crate::date::{DateSystem, ExcelDateTime};
use crate::format::{self, NumberFormat, FIRST_CUSTOM_FORMAT};
use crate::rk::Numeric;
use crate::style::{Font, Style};
use serde::Serialize;
use std::collections::BTreeMap;

/// Shared tables decoded from the workbook globals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkbookContext {
    /// BIFF5 (or older) stream: 8-bit strings and 8-field styles.
    pub legacy: bool,

    /// Substream type from the globals BOF record.
    pub kind: u16,

    /// Value of the CODEPAGE record, if present.
    pub codepage: Option<u16>,

    pub date_system: DateSystem,

    /// Style table in file order.
    pub styles: Vec<Style>,

    /// Font table in file order.
    pub fonts: Vec<Font>,

    /// Number formats keyed by format index.
    pub formats: BTreeMap<u16, NumberFormat>,

    /// Shared string table. Its length is fixed by the SST header.
    pub shared_strings: Vec<String>,
}

impl WorkbookContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_style(&mut self, style: Style) {
        self.styles.push(style);
    }

    pub fn add_font(&mut self, font: Font) {
        self.fonts.push(font);
    }

    /// Register a format, replacing any earlier one with the same index.
    pub fn add_format(&mut self, format: NumberFormat) {
        self.formats.insert(format.index, format);
    }

    /// Look up a shared string by index.
    pub fn shared_string(&self, index: u32) -> Option<&str> {
        self.shared_strings.get(index as usize).map(String::as_str)
    }

    /// Number format index used by a style, if the style exists.
    pub fn format_index(&self, style: u16) -> Option<u16> {
        self.styles.get(style as usize).map(Style::format_index)
    }

    /// Render a numeric cell value according to its style.
    ///
    /// Custom formats render as plain numbers when they look numeric and as
    /// dates otherwise; built-in date formats render as ISO-8601; anything
    /// else renders the value itself.
    pub fn render_numeric(&self, style: u16, value: Numeric) -> String {
        let Some(format_index) = self.format_index(style) else {
            return value.to_string();
        };

        if format_index >= FIRST_CUSTOM_FORMAT {
            if let Some(number_format) = self.formats.get(&format_index) {
                if number_format.is_numeric_pattern() {
                    return value.to_string();
                }
                if let Some(dt) = ExcelDateTime::from_serial(value.as_f64(), self.date_system) {
                    return format::format_date(&number_format.pattern, &dt);
                }
            }
        } else if format::is_builtin_date_format(format_index) {
            if let Some(dt) = ExcelDateTime::from_serial(value.as_f64(), self.date_system) {
                return dt.to_iso8601();
            }
        }

        value.to_string()
    }
}
