//! OCR engine session management.
//!
//! One [`OcrSession`] wraps one initialized Tesseract instance for a language
//! and optional character whitelist. Initialization is expensive (language
//! data is loaded from disk), so a session is opened once per document and
//! reused for every recognize call; it is never shared across concurrently
//! processed documents. `recognize` is blocking and long-latency — callers
//! that must not stall run it on a dedicated worker.

use std::env;
use std::path::Path;

use kreuzberg_tesseract::{TessPageSegMode, TesseractAPI};

use super::error::OcrError;
use super::tsv;
use crate::search::RegionRecognizer;
use crate::types::{OcrLine, Rectangle};

/// Candidate tessdata locations checked when `TESSDATA_PREFIX` is unset.
const TESSDATA_FALLBACK_PATHS: &[&str] = &[
    "/opt/homebrew/share/tessdata",
    "/opt/homebrew/opt/tesseract/share/tessdata",
    "/usr/local/opt/tesseract/share/tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    r#"C:\Program Files\Tesseract-OCR\tessdata"#,
    r#"C:\ProgramData\Tesseract-OCR\tessdata"#,
];

/// How a session is opened.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Tesseract language code, e.g. "eng" or "eng+rus".
    pub language: String,
    /// Restrict the recognized character set, e.g. digits only.
    pub whitelist: Option<String>,
    /// Let the engine detect and correct page orientation.
    pub auto_rotate: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            whitelist: None,
            auto_rotate: true,
        }
    }
}

/// A reusable, stateful OCR engine session.
///
/// `close` releases the engine exactly once; `recognize` after `close` fails
/// with [`OcrError::SessionClosed`]. Dropping an unclosed session releases
/// the engine as well, so failure paths cannot leak it.
pub struct OcrSession {
    api: Option<TesseractAPI>,
    language: String,
}

impl std::fmt::Debug for OcrSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrSession")
            .field("language", &self.language)
            .field("closed", &self.api.is_none())
            .finish()
    }
}

impl OcrSession {
    /// Initialize the engine for the configured language and whitelist.
    pub fn open(config: &SessionConfig) -> Result<Self, OcrError> {
        if config.language.trim().is_empty() {
            return Err(OcrError::EngineInit(
                "language cannot be empty; specify a valid language code (e.g. 'eng')".to_string(),
            ));
        }

        let tessdata_path = resolve_tessdata_path();

        // The engine can crash instead of erroring when a traineddata file is
        // missing, so check up front while the path is known.
        if !tessdata_path.is_empty() {
            for lang in config.language.split('+') {
                let lang = lang.trim();
                if lang.is_empty() {
                    continue;
                }
                let traineddata = Path::new(&tessdata_path).join(format!("{lang}.traineddata"));
                if !traineddata.exists() {
                    return Err(OcrError::EngineInit(format!(
                        "language '{}' not found: {} does not exist",
                        lang,
                        traineddata.display()
                    )));
                }
            }
        }

        let api = TesseractAPI::new()
            .map_err(|e| OcrError::EngineInit(format!("failed to create engine: {e}")))?;
        api.init(&tessdata_path, &config.language)
            .map_err(|e| OcrError::EngineInit(format!("failed to initialize language '{}': {}", config.language, e)))?;

        let psm = if config.auto_rotate {
            // Automatic segmentation with orientation/script detection.
            TessPageSegMode::from_int(1)
        } else {
            TessPageSegMode::from_int(3)
        };
        api.set_page_seg_mode(psm)
            .map_err(|e| OcrError::InvalidConfiguration(format!("failed to set page segmentation mode: {e}")))?;

        api.set_variable("preserve_interword_spaces", "1")
            .map_err(|e| OcrError::InvalidConfiguration(format!("failed to set preserve_interword_spaces: {e}")))?;

        if let Some(whitelist) = config.whitelist.as_deref().filter(|w| !w.is_empty()) {
            api.set_variable("tessedit_char_whitelist", whitelist)
                .map_err(|e| OcrError::InvalidConfiguration(format!("failed to set character whitelist: {e}")))?;
        }

        tracing::debug!(
            language = %config.language,
            whitelist = ?config.whitelist,
            tessdata = %tessdata_path,
            "OCR session opened"
        );

        Ok(Self {
            api: Some(api),
            language: config.language.clone(),
        })
    }

    /// Recognize text inside `rect`, returning ordered lines with boxes in
    /// source-image coordinates.
    ///
    /// A window that lies entirely outside the image yields no lines, which
    /// is a normal outcome, not an error.
    pub fn recognize(&mut self, image_bytes: &[u8], rect: Rectangle) -> Result<Vec<OcrLine>, OcrError> {
        let api = self.api.as_ref().ok_or(OcrError::SessionClosed)?;

        if !rect.is_valid() {
            return Err(OcrError::InvalidConfiguration(format!(
                "degenerate search window {}x{}",
                rect.width, rect.height
            )));
        }

        let img = image::load_from_memory(image_bytes)
            .map_err(|e| OcrError::InvalidImage(format!("failed to decode image: {e}")))?;
        let rgb_image = img.to_rgb8();
        let (image_width, image_height) = rgb_image.dimensions();

        let Some(window) = rect.clamped(image_width, image_height) else {
            tracing::debug!(?rect, image_width, image_height, "search window outside image");
            return Ok(Vec::new());
        };

        let region = image::imageops::crop_imm(
            &rgb_image,
            window.left as u32,
            window.top as u32,
            window.width as u32,
            window.height as u32,
        )
        .to_image();

        let bytes_per_pixel = 3;
        let bytes_per_line = window.width * bytes_per_pixel;
        api.set_image(
            region.as_raw(),
            window.width,
            window.height,
            bytes_per_pixel,
            bytes_per_line,
        )
        .map_err(|e| OcrError::Recognition(format!("failed to set image region: {e}")))?;

        api.recognize()
            .map_err(|e| OcrError::Recognition(format!("recognition failed: {e}")))?;

        let tsv_data = api
            .get_tsv_text(0)
            .map_err(|e| OcrError::Recognition(format!("failed to extract TSV output: {e}")))?;

        let lines = tsv::parse_lines(&tsv_data, window.left, window.top);
        tracing::debug!(
            language = %self.language,
            window = ?window,
            line_count = lines.len(),
            "region recognized"
        );
        Ok(lines)
    }

    /// Release the engine. Exactly-once: a second close fails with
    /// [`OcrError::SessionClosed`].
    pub fn close(&mut self) -> Result<(), OcrError> {
        match self.api.take() {
            Some(api) => {
                drop(api);
                tracing::debug!(language = %self.language, "OCR session closed");
                Ok(())
            }
            None => Err(OcrError::SessionClosed),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.api.is_none()
    }
}

impl RegionRecognizer for OcrSession {
    fn recognize(&mut self, image: &[u8], rect: Rectangle) -> Result<Vec<OcrLine>, OcrError> {
        OcrSession::recognize(self, image, rect)
    }
}

fn resolve_tessdata_path() -> String {
    env::var("TESSDATA_PREFIX").ok().unwrap_or_else(|| {
        TESSDATA_FALLBACK_PATHS
            .iter()
            .find(|p| Path::new(p).exists())
            .map(|p| (*p).to_string())
            .unwrap_or_default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.language, "eng");
        assert!(config.whitelist.is_none());
        assert!(config.auto_rotate);
    }

    #[test]
    fn test_open_rejects_empty_language() {
        let config = SessionConfig {
            language: "  ".to_string(),
            ..Default::default()
        };
        let err = OcrSession::open(&config).unwrap_err();
        assert!(matches!(err, OcrError::EngineInit(_)));
    }
}
