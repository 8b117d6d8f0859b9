//! # closeout-core
//!
//! Core data types shared by the closeout crates: cell references in A1
//! notation, resolved cell values, and the label-text normalization used to
//! locate cells by their visible text instead of by fixed coordinates.

mod cellref;
mod error;
mod normalize;
mod value;

pub use cellref::CellRef;
pub use error::{Error, Result};
pub use normalize::normalize_label;
pub use value::CellValue;

/// Maximum number of rows in a sheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a sheet (Excel limit, column XFD)
pub const MAX_COLS: u16 = 16_384;
