//! Error types for certscan.
//!
//! System errors (IO) bubble up unchanged; application errors are wrapped
//! with context. "Field not found" is never an error: it is the first-class
//! `None` outcome of a field search.

use crate::ocr::OcrError;
use thiserror::Error;

/// Result type alias using `CertScanError`.
pub type Result<T> = std::result::Result<T, CertScanError>;

/// Main error type for all certscan operations.
#[derive(Debug, Error)]
pub enum CertScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Parsing error: {message}")]
    Parsing { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Template error: {message}")]
    Template { message: String },
}

impl CertScanError {
    /// Create a Validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a Parsing error.
    pub fn parsing<S: Into<String>>(message: S) -> Self {
        Self::Parsing {
            message: message.into(),
        }
    }

    /// Create a Template error.
    pub fn template<S: Into<String>>(message: S) -> Self {
        Self::Template {
            message: message.into(),
        }
    }
}
