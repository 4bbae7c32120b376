//! Legacy XLS (OLE/CFB) reader.
//!
//! Reads Excel 95 (BIFF5) and Excel 97-2003 (BIFF8) workbooks stored in a
//! Compound File Binary container. Workbook globals are decoded when the file
//! is opened; sheets are decoded on first access.

mod globals;
mod grid;
pub mod hyperlink;
pub mod parser;
pub mod record;
pub mod strings;
pub mod workbook;
mod worksheet;

#[cfg(test)]
mod fixtures;

pub use parser::{open, XlsParser};
pub use workbook::{ParseState, SheetDescriptor, SheetKind, SheetView, SheetVisibility, Workbook};
pub use xls_core::{Error, Result};
