//! Sparse worksheet model.

use crate::cell::Cell;
use crate::context::WorkbookContext;
use crate::hyperlink::Hyperlink;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A ROW record: row extent and height as declared by the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RowInfo {
    pub index: u16,
    pub first_col: u16,
    /// One past the last used column.
    pub last_col: u16,
    /// Height in twips.
    pub height: u16,
    pub flags: u16,
}

/// A worksheet row: optional ROW metadata plus cells keyed by first column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Row {
    pub index: u16,
    pub info: Option<RowInfo>,
    pub cells: BTreeMap<u16, Cell>,
}

impl Row {
    pub fn new(index: u16) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    /// Cell starting exactly at `col`.
    pub fn cell(&self, col: u16) -> Option<&Cell> {
        self.cells.get(&col)
    }

    /// Cell whose span covers `col`. Later-starting cells win.
    pub fn cell_covering(&self, col: u16) -> Option<&Cell> {
        self.cells
            .range(..=col)
            .rev()
            .map(|(_, cell)| cell)
            .find(|cell| cell.last_col() >= col)
    }

    /// Rendered text at `col`, or `None` if no cell covers it.
    pub fn col(&self, col: u16, ctx: &WorkbookContext) -> Option<String> {
        self.cell_covering(col).and_then(|cell| cell.text_at(col, ctx))
    }

    /// Last column covered by any cell in the row.
    pub fn last_col(&self) -> Option<u16> {
        self.cells.values().map(Cell::last_col).max()
    }

    /// Dense rendering of the row: one string per column from 0 to the last
    /// covered column, empty where no cell exists.
    pub fn flatten(&self, ctx: &WorkbookContext) -> Vec<String> {
        let mut out = Vec::new();
        for (&first, cell) in &self.cells {
            let first = first as usize;
            for (offset, text) in cell.render(ctx).into_iter().enumerate() {
                let col = first + offset;
                if out.len() <= col {
                    out.resize(col + 1, String::new());
                }
                out[col] = text;
            }
        }
        out
    }
}

/// Sparse rows of a worksheet, keyed by row index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Worksheet {
    pub rows: BTreeMap<u16, Row>,
}

impl Worksheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record ROW metadata, creating the row if needed.
    pub fn add_row(&mut self, info: RowInfo) {
        self.rows
            .entry(info.index)
            .or_insert_with(|| Row::new(info.index))
            .info = Some(info);
    }

    /// Insert a cell, replacing any cell that starts at the same column.
    pub fn add_cell(&mut self, row: u16, cell: Cell) {
        self.rows
            .entry(row)
            .or_insert_with(|| Row::new(row))
            .cells
            .insert(cell.first_col(), cell);
    }

    /// Overlay a hyperlink onto its range: one cell per row spanning the
    /// range's columns, replacing cells that start inside it.
    pub fn add_hyperlink(&mut self, link: Hyperlink) {
        let range = link.range;
        let link = Arc::new(link);
        for index in range.first_row..=range.last_row {
            let row = self.rows.entry(index).or_insert_with(|| Row::new(index));
            row.cells
                .retain(|&col, _| col < range.first_col || col > range.last_col);
            row.cells.insert(
                range.first_col,
                Cell::Hyperlink {
                    first_col: range.first_col,
                    link: Arc::clone(&link),
                },
            );
        }
    }

    /// Highest row index present.
    pub fn max_row(&self) -> Option<u16> {
        self.rows.keys().next_back().copied()
    }

    /// Rows the sheet contributes to a dense grid: `max_row + 1`, or 0 when
    /// the sheet is empty.
    pub fn row_count(&self) -> usize {
        self.max_row().map_or(0, |max| max as usize + 1)
    }

    pub fn row(&self, index: u16) -> Option<&Row> {
        self.rows.get(&index)
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
