use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarksheetError {
    /// Request rejected before any build was attempted.
    #[error("{0}")]
    Validation(String),
    #[error("failed to build marksheet: {0}")]
    Build(String),
    #[error("failed to save marksheet to {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MarksheetError {
    pub fn code(&self) -> &'static str {
        match self {
            MarksheetError::Validation(_) => "validation_failed",
            MarksheetError::Build(_) => "build_failed",
            MarksheetError::Persistence { .. } => "save_failed",
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for MarksheetError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        MarksheetError::Build(e.to_string())
    }
}
