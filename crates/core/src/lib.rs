//! Core domain types for legacy Excel (BIFF) workbook decoding: numeric
//! encodings, date serials, number formats, styles, and the sparse sheet
//! model.

pub mod cell;
pub mod context;
pub mod date;
pub mod error;
pub mod format;
pub mod hyperlink;
pub mod rk;
pub mod sheet;
pub mod style;

pub use cell::{Cell, RkValue, FORMULA_PLACEHOLDER};
pub use context::WorkbookContext;
pub use date::{DateSystem, ExcelDateTime};
pub use error::{Error, Result};
pub use format::NumberFormat;
pub use hyperlink::{CellRange, Hyperlink, LinkKind};
pub use rk::{decode_rk, Numeric};
pub use sheet::{Row, RowInfo, Worksheet};
pub use style::{CurrentStyle, Font, LegacyStyle, Style};
