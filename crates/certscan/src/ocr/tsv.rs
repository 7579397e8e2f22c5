//! Parsing of Tesseract TSV output into ordered lines with bounding boxes.
//!
//! Tesseract emits one record per layout element (page, block, paragraph,
//! line, word). Only word records carry text; lines are reassembled by
//! grouping words on their (page, block, paragraph, line) key in emission
//! order, with the line box as the union of its word boxes.

use crate::types::{OcrLine, Rectangle};

/// TSV record level for words.
const TSV_WORD_LEVEL: u32 = 5;
/// Minimum fields in a well-formed TSV record.
const TSV_MIN_FIELDS: usize = 12;

/// Parse TSV text into lines, shifting all boxes by `(offset_x, offset_y)`.
///
/// The offset translates region-local coordinates (Tesseract saw a cropped
/// region) back into source-image coordinates. Malformed records are skipped.
pub fn parse_lines(tsv_data: &str, offset_x: i32, offset_y: i32) -> Vec<OcrLine> {
    let mut lines: Vec<OcrLine> = Vec::new();
    let mut current_key: Option<(u32, u32, u32, u32)> = None;

    for (record_num, record) in tsv_data.lines().enumerate() {
        if record_num == 0 {
            // header row
            continue;
        }
        let record = record.trim();
        if record.is_empty() {
            continue;
        }

        let fields: Vec<&str> = record.split('\t').collect();
        if fields.len() < TSV_MIN_FIELDS {
            continue;
        }

        let level = fields[0].parse::<u32>().unwrap_or(0);
        if level != TSV_WORD_LEVEL {
            continue;
        }

        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        let (Ok(left), Ok(top), Ok(width), Ok(height)) = (
            fields[6].parse::<i32>(),
            fields[7].parse::<i32>(),
            fields[8].parse::<i32>(),
            fields[9].parse::<i32>(),
        ) else {
            continue;
        };
        let bbox = Rectangle::new(left + offset_x, top + offset_y, width, height);

        let key = (
            fields[1].parse::<u32>().unwrap_or(0),
            fields[2].parse::<u32>().unwrap_or(0),
            fields[3].parse::<u32>().unwrap_or(0),
            fields[4].parse::<u32>().unwrap_or(0),
        );

        match lines.last_mut() {
            Some(line) if current_key == Some(key) => {
                line.text.push(' ');
                line.text.push_str(text);
                line.bbox = line.bbox.union(&bbox);
            }
            _ => {
                lines.push(OcrLine {
                    text: text.to_string(),
                    bbox,
                });
                current_key = Some(key);
            }
        }
    }

    lines
}
