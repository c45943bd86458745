//! Unified error type for the gridcim crates
//!
//! [`GridError`] covers loading network snapshots and export configuration. The exporter has its
//! own fatal error channel (`gridcim_io::ExportError`); both convert into `anyhow::Error` at the
//! CLI boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type GridResult<T> = Result<T, GridError>;

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GridError::Config("unknown field `cim_versoin`".into());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("cim_versoin"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GridError = io_err.into();
        assert!(matches!(err, GridError::Io(_)));
    }

    #[test]
    fn test_json_error_is_parse() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: GridError = json_err.into();
        assert!(matches!(err, GridError::Parse(_)));
    }
}
