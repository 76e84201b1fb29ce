//! Error types for tfmap

use crate::types::Diagnostics;

/// Error type for tfmap operations
#[derive(Debug, thiserror::Error)]
pub enum TfmapError {
    #[error("Validation failed: {0}")]
    Validation(Diagnostics),

    #[error("Type mismatch at {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("{0}")]
    Custom(String),
}

impl TfmapError {
    /// Diagnostics carried by a validation failure, if any
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            TfmapError::Validation(diags) => Some(diags),
            _ => None,
        }
    }
}

/// Result type alias for tfmap operations
pub type Result<T> = std::result::Result<T, TfmapError>;

impl From<String> for TfmapError {
    fn from(s: String) -> Self {
        TfmapError::Custom(s)
    }
}

impl From<&str> for TfmapError {
    fn from(s: &str) -> Self {
        TfmapError::Custom(s.to_string())
    }
}
