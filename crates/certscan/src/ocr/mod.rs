//! OCR (Optical Character Recognition) subsystem.
//!
//! Wraps the Tesseract engine behind a session abstraction: open a session
//! for a language plus optional character whitelist, run any number of
//! region-restricted recognize calls against it, close it exactly once.
//! Recognized text comes back as ordered lines with bounding boxes in
//! source-image pixel coordinates, parsed from Tesseract's TSV output.

pub mod error;
pub mod session;
pub mod tsv;

pub use error::OcrError;
pub use session::{OcrSession, SessionConfig};
