//! Rule-based matching of OCR lines against a number shape.

use crate::types::{NumberRule, OcrLine, Rectangle};

/// A qualifying digit run together with the box of the line that held it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    pub number: String,
    pub bbox: Rectangle,
}

/// Find the first line (in OCR order) containing a digit run that satisfies
/// the rule.
///
/// A run is a maximal contiguous sequence of ASCII digits; it qualifies only
/// when its length equals `rule.length` exactly and it starts with
/// `rule.prefix`. Lines whose digit runs all fail the rule are not matches.
pub fn find_matching_line(lines: &[OcrLine], rule: &NumberRule) -> Option<LineMatch> {
    lines.iter().find_map(|line| {
        qualifying_run(&line.text, rule).map(|number| LineMatch {
            number: number.to_string(),
            bbox: line.bbox,
        })
    })
}

/// First digit run in `text` satisfying the rule, if any.
fn qualifying_run<'a>(text: &'a str, rule: &NumberRule) -> Option<&'a str> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() == rule.length && run.starts_with(&rule.prefix))
}
