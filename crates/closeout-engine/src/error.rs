//! Engine error types

use closeout_xlsx::XlsxError;
use thiserror::Error;

/// Errors raised while processing a closing workbook
///
/// Validation errors (missing sheets, columns, labels, bad configuration)
/// are the caller's fault and should never be retried; the hosting layer
/// maps them to its "bad input" channel via [`ProcessError::is_validation`].
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("required sheet '{sheet}' not found (available: {})", .available.join(", "))]
    MissingSheet {
        sheet: String,
        available: Vec<String>,
    },

    #[error(
        "required column '{column}' not found on sheet '{sheet}' (available: {})",
        .available.join(", ")
    )]
    MissingColumn {
        column: String,
        sheet: String,
        available: Vec<String>,
    },

    #[error("label '{label}' not found on sheet '{sheet}'")]
    LabelNotFound { label: String, sheet: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Xlsx(#[from] XlsxError),
}

impl ProcessError {
    /// Whether this is a validation failure of the input rather than an
    /// unexpected fault
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Xlsx(_))
    }
}

/// Convenience alias for engine results
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;
