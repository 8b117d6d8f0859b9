//! Error types for closeout-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in closeout-core
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell reference format
    #[error("Invalid cell reference: {0}")]
    InvalidRef(String),

    /// Row index out of bounds
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u16, u16),
}
