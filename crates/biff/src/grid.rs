//! Dense row extraction across sheets.

use crate::workbook::Workbook;
use std::io::{Read, Seek};

impl<R: Read + Seek> Workbook<R> {
    /// Render up to `max_rows` rows across all sheets in discovery order.
    ///
    /// Each sheet contributes rows `0..=max_row`; a row index with no record
    /// yields an empty vector. Every row is left-padded with empty strings up
    /// to its first cell, and multi-column cells expand to one string per
    /// column. Sheets are decoded on demand; a sheet that fails to decode is
    /// logged and skipped, and stays in the failed state.
    pub fn read_all_cells(&mut self, max_rows: usize) -> Vec<Vec<String>> {
        let mut out = Vec::new();

        for index in 0..self.sheet_count() {
            if out.len() >= max_rows {
                break;
            }
            let sheet = match self.sheet(index) {
                Ok(Some(sheet)) => sheet,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("Skipping sheet {}: {}", index, e);
                    continue;
                }
            };
            for row in 0..sheet.row_count() {
                if out.len() >= max_rows {
                    break;
                }
                out.push(sheet.row_text(row as u16));
            }
        }

        out
    }
}
