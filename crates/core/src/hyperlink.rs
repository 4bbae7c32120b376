//! Hyperlink descriptors attached to cell ranges.

use serde::Serialize;

/// An inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CellRange {
    pub first_row: u16,
    pub last_row: u16,
    pub first_col: u16,
    pub last_col: u16,
}

impl CellRange {
    pub fn new(first_row: u16, last_row: u16, first_col: u16, last_col: u16) -> Self {
        Self {
            first_row,
            last_row,
            first_col,
            last_col,
        }
    }

    pub fn contains(&self, row: u16, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }
}

/// What a hyperlink's moniker points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LinkKind {
    /// No moniker, or one of an unrecognised type.
    #[default]
    None,
    /// URL moniker.
    Url,
    /// File moniker (local or UNC path).
    File,
}

/// A decoded HLINK record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Hyperlink {
    pub range: CellRange,
    pub kind: LinkKind,
    pub description: String,
    pub target_frame: String,
    pub url: String,
    /// 8-bit path of a file moniker.
    pub short_file_path: String,
    /// UTF-16 path of a file moniker, when present.
    pub extended_file_path: String,
    /// Location inside the target (`#Sheet1!A1` style anchor).
    pub text_mark: String,
}

impl Hyperlink {
    /// Text shown for every cell the link covers: `description(url)` for URL
    /// links, the extended path otherwise.
    pub fn display_text(&self) -> String {
        match self.kind {
            LinkKind::Url => format!("{}({})", self.description, self.url),
            _ => self.extended_file_path.clone(),
        }
    }
}
