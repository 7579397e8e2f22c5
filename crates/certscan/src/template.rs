//! DOCX certificate template substitution.
//!
//! Fills `{{Key}}` placeholders inside a DOCX template's `word/document.xml`
//! with caller-provided values: plain find/replace over the markup, no
//! templating engine. All other archive entries are copied through
//! unchanged.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{CertScanError, Result};

const DOCUMENT_XML: &str = "word/document.xml";

/// Apply `values` to a DOCX template and return the rebuilt archive.
///
/// Fails with a Template error when the archive is not a DOCX, when
/// `word/document.xml` is missing, or when placeholders remain unresolved
/// after substitution. Keys that never occur in the document are logged and
/// ignored.
pub fn render_template(docx_bytes: &[u8], values: &HashMap<String, String>) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(docx_bytes))
        .map_err(|e| CertScanError::parsing(format!("failed to open DOCX as ZIP: {e}")))?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut document_seen = false;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| CertScanError::parsing(format!("failed to read DOCX entry: {e}")))?;
        let name = entry.name().to_string();

        if entry.is_dir() {
            writer
                .add_directory(name.as_str(), options)
                .map_err(|e| CertScanError::parsing(format!("failed to write DOCX entry '{name}': {e}")))?;
            continue;
        }

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(|e| CertScanError::parsing(format!("failed to read DOCX entry '{name}': {e}")))?;

        if name == DOCUMENT_XML {
            document_seen = true;
            let xml = String::from_utf8(content)
                .map_err(|e| CertScanError::parsing(format!("document.xml is not valid UTF-8: {e}")))?;
            content = substitute(&xml, values)?.into_bytes();
        }

        writer
            .start_file(name.as_str(), options)
            .map_err(|e| CertScanError::parsing(format!("failed to write DOCX entry '{name}': {e}")))?;
        writer
            .write_all(&content)
            .map_err(|e| CertScanError::parsing(format!("failed to write DOCX entry '{name}': {e}")))?;
    }

    if !document_seen {
        return Err(CertScanError::template("word/document.xml not found in DOCX"));
    }

    let cursor = writer
        .finish()
        .map_err(|e| CertScanError::parsing(format!("failed to finalize DOCX: {e}")))?;
    Ok(cursor.into_inner())
}

fn substitute(xml: &str, values: &HashMap<String, String>) -> Result<String> {
    let mut output = xml.to_string();

    for (key, value) in values {
        let placeholder = format!("{{{{{key}}}}}");
        if output.contains(&placeholder) {
            output = output.replace(&placeholder, &escape_xml(value));
        } else {
            tracing::warn!(key = %key, "template value has no matching placeholder");
        }
    }

    let unresolved = unresolved_placeholders(&output);
    if !unresolved.is_empty() {
        return Err(CertScanError::template(format!(
            "unresolved placeholders: {}",
            unresolved.join(", ")
        )));
    }

    Ok(output)
}

/// Placeholders still present after substitution, in document order.
fn unresolved_placeholders(xml: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = xml;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                names.push(after[..end].to_string());
                rest = &after[end + 2..];
            }
            None => break,
        }
    }

    names
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_docx(document_xml: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file("[Content_Types].xml", options).unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer.start_file(DOCUMENT_XML, options).unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn read_document_xml(docx: &[u8]) -> String {
        let mut archive = ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut entry = archive.by_name(DOCUMENT_XML).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        content
    }

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_replaces_placeholders() {
        let docx = build_docx("<w:t>{{RegNumber}}</w:t><w:t>{{FullName}}</w:t>");
        let vals = values(&[("RegNumber", "002123456789"), ("FullName", "JANE DOE")]);

        let rendered = render_template(&docx, &vals).unwrap();
        let xml = read_document_xml(&rendered);

        assert_eq!(xml, "<w:t>002123456789</w:t><w:t>JANE DOE</w:t>");
    }

    #[test]
    fn test_escapes_xml_in_values() {
        let docx = build_docx("<w:t>{{Company}}</w:t>");
        let vals = values(&[("Company", "A & B <Ltd>")]);

        let rendered = render_template(&docx, &vals).unwrap();
        let xml = read_document_xml(&rendered);

        assert_eq!(xml, "<w:t>A &amp; B &lt;Ltd&gt;</w:t>");
    }

    #[test]
    fn test_unresolved_placeholder_is_an_error() {
        let docx = build_docx("<w:t>{{RegNumber}}</w:t><w:t>{{Level}}</w:t>");
        let vals = values(&[("RegNumber", "002123456789")]);

        let err = render_template(&docx, &vals).unwrap_err();
        assert!(err.to_string().contains("Level"));
    }

    #[test]
    fn test_missing_document_xml_is_an_error() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.start_file("other.xml", options).unwrap();
        writer.write_all(b"<x/>").unwrap();
        let not_a_docx = writer.finish().unwrap().into_inner();

        let err = render_template(&not_a_docx, &HashMap::new()).unwrap_err();
        assert!(matches!(err, CertScanError::Template { .. }));
    }

    #[test]
    fn test_not_a_zip_is_a_parsing_error() {
        let err = render_template(b"definitely not a zip", &HashMap::new()).unwrap_err();
        assert!(matches!(err, CertScanError::Parsing { .. }));
    }

    #[test]
    fn test_other_entries_are_copied_through() {
        let docx = build_docx("<w:t>no placeholders</w:t>");

        let rendered = render_template(&docx, &HashMap::new()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(rendered.as_slice())).unwrap();
        let mut entry = archive.by_name("[Content_Types].xml").unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();

        assert_eq!(content, "<Types/>");
    }

    #[test]
    fn test_unresolved_placeholder_scan() {
        assert_eq!(
            unresolved_placeholders("a {{One}} b {{Two}} c"),
            vec!["One".to_string(), "Two".to_string()]
        );
        assert!(unresolved_placeholders("no placeholders {{unclosed").is_empty());
    }
}
