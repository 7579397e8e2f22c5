//! Field extraction orchestration and configuration.
//!
//! A [`CertScanner`] runs the region search once per configured field over a
//! single shared OCR session, applies the mandatory-field policy, and
//! assembles the per-document result.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{CertScanError, Result};
use crate::ocr::{OcrError, OcrSession, SessionConfig};
use crate::search::{RegionRecognizer, SearchOptions, search_field};
use crate::types::{DocumentResult, NumberRule, Rectangle};

/// One configured field: the number shape to look for and where to start
/// looking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub rule: NumberRule,
    pub region: Rectangle,
}

/// Scanner configuration.
///
/// Loadable from a `certscan.toml` file or built programmatically. The
/// default field set is empty; callers configure one entry per number
/// printed on the certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Tesseract language code.
    #[serde(default = "default_language")]
    pub language: String,

    /// Character whitelist biasing the engine toward the expected symbols.
    #[serde(default = "default_whitelist")]
    pub whitelist: String,

    /// Let the engine correct page orientation.
    #[serde(default = "default_true")]
    pub auto_rotate: bool,

    /// Name of the field that decides whether the document has usable data.
    #[serde(default = "default_mandatory_field")]
    pub mandatory_field: String,

    /// Field name → search rule and start region.
    #[serde(default)]
    pub fields: HashMap<String, FieldSpec>,

    /// Region search tuning, shared by all fields.
    #[serde(default)]
    pub search: SearchOptions,
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_whitelist() -> String {
    "0123456789".to_string()
}

fn default_true() -> bool {
    true
}

fn default_mandatory_field() -> String {
    "registration".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            whitelist: default_whitelist(),
            auto_rotate: true,
            mandatory_field: default_mandatory_field(),
            fields: HashMap::new(),
            search: SearchOptions::default(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CertScanError::validation(format!(
                "failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content)
            .map_err(|e| CertScanError::validation(format!("invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Discover `certscan.toml` in the current directory or any parent.
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(CertScanError::Io)?;

        loop {
            let candidate = current.join("certscan.toml");
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }
            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Reject configurations the scanner cannot act on.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(CertScanError::validation("no fields configured"));
        }
        if !self.fields.contains_key(&self.mandatory_field) {
            return Err(CertScanError::validation(format!(
                "mandatory field '{}' is not configured",
                self.mandatory_field
            )));
        }
        for (name, spec) in &self.fields {
            if spec.rule.length == 0 {
                return Err(CertScanError::validation(format!(
                    "field '{name}': rule length must be positive"
                )));
            }
            if !spec.region.is_valid() {
                return Err(CertScanError::validation(format!(
                    "field '{name}': region must have positive width and height"
                )));
            }
        }
        Ok(())
    }
}

/// Certificate scanner: one instance per field configuration, reusable
/// across documents. Each `process` call owns its own OCR session, so
/// separate documents can be processed concurrently from separate tasks.
#[derive(Debug, Clone)]
pub struct CertScanner {
    config: ScanConfig,
}

impl CertScanner {
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Extract all configured fields from one document image.
    ///
    /// Returns `Ok(None)` when the document has no usable data (mandatory
    /// field not found). OCR work is blocking and runs on a dedicated
    /// blocking task so the async runtime is not stalled.
    pub async fn process(&self, image_bytes: Vec<u8>) -> Result<Option<DocumentResult>> {
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || process_document(&config, &image_bytes))
            .await
            .map_err(|e| CertScanError::Ocr(OcrError::Recognition(format!("OCR task panicked: {e}"))))?
    }

    /// Synchronous variant of [`CertScanner::process`] for callers without a
    /// runtime. Blocks for the full document, potentially seconds per field.
    pub fn process_sync(&self, image_bytes: &[u8]) -> Result<Option<DocumentResult>> {
        process_document(&self.config, image_bytes)
    }
}

fn process_document(config: &ScanConfig, image_bytes: &[u8]) -> Result<Option<DocumentResult>> {
    let session_config = SessionConfig {
        language: config.language.clone(),
        whitelist: (!config.whitelist.is_empty()).then(|| config.whitelist.clone()),
        auto_rotate: config.auto_rotate,
    };

    let mut session = OcrSession::open(&session_config)?;
    // Field searches share the session and therefore run strictly
    // sequentially; the engine is single-threaded per session.
    let scan = scan_document(&mut session, config, image_bytes);
    session.close()?;
    Ok(scan?)
}

/// Run the region search for every configured field and apply the
/// mandatory-field policy.
///
/// Public seam over [`RegionRecognizer`] so alternative engines (and tests)
/// can drive the same orchestration.
pub fn scan_document<R: RegionRecognizer + ?Sized>(
    recognizer: &mut R,
    config: &ScanConfig,
    image_bytes: &[u8],
) -> std::result::Result<Option<DocumentResult>, OcrError> {
    let mut document = DocumentResult::default();

    for (name, spec) in &config.fields {
        tracing::debug!(field = %name, region = ?spec.region, "searching field");
        match search_field(recognizer, image_bytes, &spec.rule, spec.region, &config.search)? {
            Some(result) => {
                tracing::info!(
                    field = %name,
                    number = %result.number,
                    status = ?result.status,
                    "field recognized"
                );
                document.fields.insert(name.clone(), result);
            }
            None => {
                tracing::debug!(field = %name, "field not found");
            }
        }
    }

    // Product policy: a document without its mandatory field has no usable
    // data, regardless of what the optional fields produced.
    if !document.fields.contains_key(&config.mandatory_field) {
        tracing::info!(mandatory_field = %config.mandatory_field, "mandatory field missing, discarding document");
        return Ok(None);
    }

    Ok(Some(document))
}
