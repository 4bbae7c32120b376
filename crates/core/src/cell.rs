//! Cell contents.
//!
//! Each sheet record that produces content maps to one `Cell` variant. A
//! cell knows its column span and renders one string per covered column
//! given the workbook tables.

use crate::context::WorkbookContext;
use crate::hyperlink::Hyperlink;
use crate::rk::{decode_rk, Numeric};
use serde::Serialize;
use std::sync::Arc;

/// Text rendered for formula cells. Formulas are not evaluated.
pub const FORMULA_PLACEHOLDER: &str = "#FORMULA";

/// A style index paired with an RK-encoded number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RkValue {
    pub style: u16,
    pub rk: u32,
}

impl RkValue {
    pub fn new(style: u16, rk: u32) -> Self {
        Self { style, rk }
    }

    pub fn value(&self) -> Numeric {
        decode_rk(self.rk)
    }

    pub fn render(&self, ctx: &WorkbookContext) -> String {
        ctx.render_numeric(self.style, self.value())
    }
}

/// The content of one cell record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    /// MULRK: consecutive RK numbers starting at `first_col`.
    MultiRk { first_col: u16, values: Vec<RkValue> },
    /// MULBLANK: consecutive styled empty cells starting at `first_col`.
    MultiBlank { first_col: u16, styles: Vec<u16> },
    /// NUMBER: rendered as a plain decimal whatever its style.
    Number { col: u16, style: u16, value: f64 },
    /// FORMULA: cached result and flags kept, token bytes kept opaque.
    Formula {
        col: u16,
        style: u16,
        cached: [u8; 8],
        flags: u16,
        tokens: Vec<u8>,
    },
    Rk { col: u16, value: RkValue },
    /// LABELSST: index into the shared string table.
    LabelSst { col: u16, style: u16, index: u32 },
    Label { col: u16, style: u16, text: String },
    Blank { col: u16, style: u16 },
    /// One row of a hyperlink range, spanning the range's columns.
    Hyperlink { first_col: u16, link: Arc<Hyperlink> },
}

impl Cell {
    pub fn first_col(&self) -> u16 {
        match self {
            Cell::MultiRk { first_col, .. }
            | Cell::MultiBlank { first_col, .. }
            | Cell::Hyperlink { first_col, .. } => *first_col,
            Cell::Number { col, .. }
            | Cell::Formula { col, .. }
            | Cell::Rk { col, .. }
            | Cell::LabelSst { col, .. }
            | Cell::Label { col, .. }
            | Cell::Blank { col, .. } => *col,
        }
    }

    /// Number of columns this cell covers (at least 1).
    pub fn span(&self) -> usize {
        match self {
            Cell::MultiRk { values, .. } => values.len().max(1),
            Cell::MultiBlank { styles, .. } => styles.len().max(1),
            Cell::Hyperlink { first_col, link } => {
                usize::from(link.range.last_col.saturating_sub(*first_col)) + 1
            }
            _ => 1,
        }
    }

    pub fn last_col(&self) -> u16 {
        self.first_col().saturating_add((self.span() - 1) as u16)
    }

    /// Style index of the first covered column, if the record carries one.
    pub fn style(&self) -> Option<u16> {
        match self {
            Cell::MultiRk { values, .. } => values.first().map(|v| v.style),
            Cell::MultiBlank { styles, .. } => styles.first().copied(),
            Cell::Number { style, .. }
            | Cell::Formula { style, .. }
            | Cell::LabelSst { style, .. }
            | Cell::Label { style, .. }
            | Cell::Blank { style, .. } => Some(*style),
            Cell::Rk { value, .. } => Some(value.style),
            Cell::Hyperlink { .. } => None,
        }
    }

    /// Cached numeric result of a formula cell.
    ///
    /// The cached result holds a double unless its last two bytes are
    /// 0xFFFF, which marks a string, boolean, error, or empty result.
    pub fn cached_number(&self) -> Option<f64> {
        match self {
            Cell::Formula { cached, .. } if cached[6..8] != [0xFF, 0xFF] => {
                Some(f64::from_le_bytes(*cached))
            }
            _ => None,
        }
    }

    /// Render one string per covered column.
    pub fn render(&self, ctx: &WorkbookContext) -> Vec<String> {
        match self {
            Cell::MultiRk { values, .. } => values.iter().map(|v| v.render(ctx)).collect(),
            Cell::MultiBlank { styles, .. } => vec![String::new(); styles.len().max(1)],
            Cell::Number { value, .. } => vec![Numeric::Float(*value).to_string()],
            Cell::Formula { .. } => vec![FORMULA_PLACEHOLDER.to_string()],
            Cell::Rk { value, .. } => vec![value.render(ctx)],
            Cell::LabelSst { index, .. } => match ctx.shared_string(*index) {
                Some(text) => vec![text.to_string()],
                None => {
                    log::debug!("Shared string index {} out of range", index);
                    vec![String::new()]
                }
            },
            Cell::Label { text, .. } => vec![text.clone()],
            Cell::Blank { .. } => vec![String::new()],
            Cell::Hyperlink { link, .. } => vec![link.display_text(); self.span()],
        }
    }

    /// Rendered text of one covered column.
    pub fn text_at(&self, col: u16, ctx: &WorkbookContext) -> Option<String> {
        let offset = col.checked_sub(self.first_col())? as usize;
        if offset >= self.span() {
            return None;
        }
        match self {
            Cell::MultiRk { values, .. } => values.get(offset).map(|v| v.render(ctx)),
            Cell::MultiBlank { .. } => Some(String::new()),
            Cell::Hyperlink { link, .. } => Some(link.display_text()),
            _ => self.render(ctx).into_iter().next(),
        }
    }
}
