//! Error types for the treesheet export pipeline

use thiserror::Error;

/// Result type alias for treesheet operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Main error type for all export operations
#[derive(Error, Debug)]
pub enum ExportError {
    /// The data source failed to load its records
    #[error("Failed to load records: {0}")]
    LoadError(String),

    /// The data source failed with an underlying error
    #[error("Data source error: {source}")]
    SourceError {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred while writing to the worksheet or the output file
    #[error("Failed to write worksheet: {0}")]
    WriteError(String),

    /// Error occurred while appending a row
    #[error("Failed to write row {row} to sheet '{sheet}': {source}")]
    WriteRowError {
        row: u32,
        sheet: String,
        #[source]
        source: Box<ExportError>,
    },

    /// Invalid cell reference
    #[error("Invalid cell reference: {0}")]
    InvalidCell(String),

    /// Export options that cannot be used together
    #[error("Invalid export configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// ZIP container error
    #[error("ZIP error: {0}")]
    ZipError(String),
}

impl ExportError {
    /// Wrap an arbitrary data source failure
    pub fn from_source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ExportError::SourceError {
            source: Box::new(err),
        }
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::LoadError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_source_error_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "backend timed out");
        let err = ExportError::from_source(io);
        assert_eq!(err.to_string(), "Data source error: backend timed out");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_row_error_message() {
        let err = ExportError::WriteRowError {
            row: 7,
            sheet: "Tree".to_string(),
            source: Box::new(ExportError::InvalidCell("A7".to_string())),
        };
        assert_eq!(
            err.to_string(),
            "Failed to write row 7 to sheet 'Tree': Invalid cell reference: A7"
        );
    }
}
