//! certscan — certificate number extraction from scanned images.
//!
//! Extracts fixed-format numeric identifiers (a mandatory registration
//! number and an optional voucher number) from a scanned certificate image,
//! using Tesseract OCR as a black-box engine. The heart of the crate is an
//! iterative region search with a cheap consensus check: recognize over a
//! growing window, track candidate numbers by their digit string, and accept
//! a number only once two different windows agree on it.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use certscan::{CertScanner, ScanConfig};
//!
//! # fn main() -> certscan::Result<()> {
//! let config = ScanConfig::from_toml_file("certscan.toml")?;
//! let scanner = CertScanner::new(config)?;
//!
//! let image = std::fs::read("certificate.jpg")?;
//! match scanner.process_sync(&image)? {
//!     Some(document) => println!("registration: {}", document.fields["registration"].number),
//!     None => println!("no usable data"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `ocr` — Tesseract session management; region-restricted recognition
//!   returning ordered lines with bounding boxes
//! - `matcher` — rule-based matching of digit runs against a length/prefix
//!   rule
//! - `search` — the region search controller (window expansion, candidate
//!   tracking, accept/exhaust decision)
//! - `scanner` — per-document orchestration, configuration, mandatory-field
//!   policy
//! - `template`, `overlay` — DOCX certificate generation and visual
//!   debugging, used by the CLI

#![deny(unsafe_code)]

pub mod error;
pub mod matcher;
pub mod ocr;
pub mod overlay;
pub mod scanner;
pub mod search;
pub mod template;
pub mod types;

pub use error::{CertScanError, Result};
pub use ocr::{OcrError, OcrSession, SessionConfig};
pub use scanner::{CertScanner, FieldSpec, ScanConfig, scan_document};
pub use search::{RegionRecognizer, SearchOptions, search_field};
pub use template::render_template;
pub use types::{DocumentResult, NumberResult, NumberRule, NumberStatus, OcrLine, Rectangle};
