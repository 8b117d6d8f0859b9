//! # closeout-xlsx
//!
//! OOXML container I/O for the closeout processor.
//!
//! The design goal is surgical editing: a workbook is loaded as raw zip
//! parts, only the sheets the engine touches are parsed and re-serialized,
//! and every other part is written back byte-for-byte. Styling, charts, and
//! layout of untouched sheets survive by construction.

mod error;
mod escape;
mod package;
mod sheet;
mod workbook;

pub mod test_fixture;

pub use error::{XlsxError, XlsxResult};
pub use package::Package;
pub use sheet::{CellContent, SheetCell, SheetRow, Worksheet};
pub use workbook::Workbook;
