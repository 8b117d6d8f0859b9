//! # closeout-engine
//!
//! Row classification and sheet rederivation for payroll/benefits closing
//! workbooks.
//!
//! The engine takes a closing workbook as bytes, partitions the detail
//! sheet's rows by establishment category and checkout presence, rebuilds
//! the company-cost and payroll-discount sheets, and patches the summary
//! sheet's labeled cells with aggregate formulas. Everything else in the
//! workbook is preserved byte-for-byte.
//!
//! ```no_run
//! let bytes = std::fs::read("fechamento.xlsx")?;
//! let out = closeout_engine::process(&bytes)?;
//! std::fs::write("processed_fechamento.xlsx", out)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod classify;
pub mod compose;
pub mod config;
pub mod error;
pub mod formula;
pub mod summary;

mod process;

pub use config::{ArgSeparator, CostSheetPolicy, ProcessConfig};
pub use error::{ProcessError, ProcessResult};
pub use process::{process, process_with_config};

// Re-exported so hosting layers can inspect workbooks without depending on
// the I/O crate directly.
pub use closeout_xlsx::Workbook;
