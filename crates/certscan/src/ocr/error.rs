//! OCR-specific errors.

use thiserror::Error;

/// Errors from the OCR session layer.
///
/// Absence of recognizable text is not an error anywhere in this crate;
/// these variants cover engine and caller failures only.
#[derive(Debug, Clone, Error)]
pub enum OcrError {
    /// The engine could not start (missing language data, resource
    /// exhaustion). Fatal for the current document, not retried.
    #[error("OCR engine initialization failed: {0}")]
    EngineInit(String),

    /// Use after `close` — a programming error in the caller.
    #[error("OCR session is closed")]
    SessionClosed,

    /// The image bytes could not be decoded.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// A configuration value the engine rejected.
    #[error("invalid OCR configuration: {0}")]
    InvalidConfiguration(String),

    /// The engine failed during a recognize call. Aborts the whole field
    /// search; never reinterpreted as "not found".
    #[error("OCR recognition failed: {0}")]
    Recognition(String),
}
