//! Iterative region search with consensus.
//!
//! One field search repeatedly recognizes a growing window around the
//! expected field location. Each qualifying digit string becomes a candidate;
//! seeing the same string again from a different (larger) window is taken as
//! agreement and accepted immediately. When the iteration budget runs out,
//! the first-seen candidate is returned unconfirmed, and a search that never
//! produced a candidate yields `None` — a normal outcome, not an error.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::matcher::find_matching_line;
use crate::ocr::OcrError;
use crate::types::{Candidate, NumberResult, NumberRule, NumberStatus, OcrLine, Rectangle};

/// Recognition seam the search controller drives.
///
/// Implemented by [`crate::ocr::OcrSession`]; tests substitute scripted
/// recognizers. A recognize call is blocking and may take seconds.
pub trait RegionRecognizer {
    fn recognize(&mut self, image: &[u8], rect: Rectangle) -> Result<Vec<OcrLine>, OcrError>;
}

/// Tuning for one field search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Upper bound on engine calls per field.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Base outward growth in pixels; growth accelerates with the iteration
    /// index to compensate for unknown scan misalignment while keeping early
    /// windows tight.
    #[serde(default = "default_expand_step")]
    pub expand_step: i32,
}

fn default_max_iterations() -> u32 {
    5
}

fn default_expand_step() -> i32 {
    30
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            expand_step: default_expand_step(),
        }
    }
}

/// Grow `rect` symmetrically about its center by `step * n` pixels per side.
///
/// After k expansions the cumulative per-side shift is `step * k * (k+1) / 2`.
pub fn expand(rect: Rectangle, n: i32, step: i32) -> Rectangle {
    let shift = step * n;
    Rectangle::new(
        rect.left - shift,
        rect.top - shift,
        rect.width + 2 * shift,
        rect.height + 2 * shift,
    )
}

/// Search one field: iterate over growing windows, track candidates, and
/// decide accept/exhaust.
///
/// Makes at most `options.max_iterations` engine calls and is deterministic
/// given deterministic recognizer output. Engine errors abort the search and
/// propagate; they are never softened into "not found".
pub fn search_field<R: RegionRecognizer + ?Sized>(
    recognizer: &mut R,
    image: &[u8],
    rule: &NumberRule,
    initial_rect: Rectangle,
    options: &SearchOptions,
) -> Result<Option<NumberResult>, OcrError> {
    let mut candidates: AHashMap<String, Candidate> = AHashMap::new();
    let mut first_seen: Option<String> = None;
    let mut rect = initial_rect;

    for iteration in 0..options.max_iterations {
        let lines = recognizer.recognize(image, rect)?;

        if let Some(m) = find_matching_line(&lines, rule) {
            if candidates.contains_key(&m.number) {
                tracing::debug!(
                    number = %m.number,
                    iteration,
                    window = ?rect,
                    "candidate confirmed by a second window"
                );
                return Ok(Some(NumberResult {
                    number: m.number,
                    text_box: m.bbox,
                    search_rect: rect,
                    status: NumberStatus::Accepted,
                }));
            }
            tracing::debug!(number = %m.number, iteration, window = ?rect, "new candidate");
            if first_seen.is_none() {
                first_seen = Some(m.number.clone());
            }
            candidates.insert(
                m.number,
                Candidate {
                    text_box: m.bbox,
                    search_rect: rect,
                },
            );
        }

        // The window grows whether or not this iteration matched.
        rect = expand(rect, iteration as i32 + 1, options.expand_step);
    }

    if let Some(number) = first_seen {
        if let Some(candidate) = candidates.remove(&number) {
            tracing::debug!(number = %number, "iterations exhausted, returning unconfirmed candidate");
            return Ok(Some(NumberResult {
                number,
                text_box: candidate.text_box,
                search_rect: candidate.search_rect,
                status: NumberStatus::NotAccepted,
            }));
        }
    }

    tracing::debug!(?initial_rect, "no qualifying number in any window");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scripted recognizer: one canned line list per call, in order.
    struct ScriptedRecognizer {
        outputs: Vec<Result<Vec<OcrLine>, OcrError>>,
        calls: Vec<Rectangle>,
    }

    impl ScriptedRecognizer {
        fn new(outputs: Vec<Result<Vec<OcrLine>, OcrError>>) -> Self {
            Self {
                outputs,
                calls: Vec::new(),
            }
        }
    }

    impl RegionRecognizer for ScriptedRecognizer {
        fn recognize(&mut self, _image: &[u8], rect: Rectangle) -> Result<Vec<OcrLine>, OcrError> {
            self.calls.push(rect);
            if self.calls.len() > self.outputs.len() {
                return Ok(Vec::new());
            }
            self.outputs[self.calls.len() - 1].clone()
        }
    }

    fn digit_line(text: &str) -> Vec<OcrLine> {
        vec![OcrLine {
            text: text.to_string(),
            bbox: Rectangle::new(800, 670, 260, 40),
        }]
    }

    fn rule() -> NumberRule {
        NumberRule::new(12, "002")
    }

    const INITIAL: Rectangle = Rectangle {
        left: 750,
        top: 650,
        width: 400,
        height: 80,
    };

    #[test]
    fn test_expansion_formula() {
        let step = 30;
        let mut rect = INITIAL;
        for n in 1..=4 {
            rect = expand(rect, n, step);
            let shift = step * n * (n + 1) / 2;
            assert_eq!(rect.left, INITIAL.left - shift);
            assert_eq!(rect.top, INITIAL.top - shift);
            assert_eq!(rect.width, INITIAL.width + 2 * shift);
            assert_eq!(rect.height, INITIAL.height + 2 * shift);
        }
    }

    #[test]
    fn test_confirmation_accepts_on_second_sighting() {
        // Same number recognized on iterations 0 and 1.
        let mut recognizer = ScriptedRecognizer::new(vec![
            Ok(digit_line("002123456789")),
            Ok(digit_line("002123456789")),
        ]);

        let result = search_field(&mut recognizer, &[], &rule(), INITIAL, &SearchOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(result.number, "002123456789");
        assert_eq!(result.status, NumberStatus::Accepted);
        assert_eq!(result.search_rect, Rectangle::new(720, 620, 460, 140));
        assert_eq!(recognizer.calls.len(), 2);
    }

    #[test]
    fn test_exhaustion_returns_first_seen_not_accepted() {
        let mut recognizer = ScriptedRecognizer::new(vec![
            Ok(digit_line("002111111111")),
            Ok(digit_line("002222222222")),
            Ok(digit_line("002333333333")),
            Ok(digit_line("002444444444")),
            Ok(digit_line("002555555555")),
        ]);

        let result = search_field(&mut recognizer, &[], &rule(), INITIAL, &SearchOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(result.number, "002111111111");
        assert_eq!(result.status, NumberStatus::NotAccepted);
        // The candidate keeps the window it was first seen in.
        assert_eq!(result.search_rect, INITIAL);
        assert_eq!(recognizer.calls.len(), 5);
    }

    #[test]
    fn test_empty_result_after_exactly_max_iterations() {
        let mut recognizer = ScriptedRecognizer::new(vec![]);

        let result = search_field(&mut recognizer, &[], &rule(), INITIAL, &SearchOptions::default()).unwrap();

        assert!(result.is_none());
        assert_eq!(recognizer.calls.len(), 5);
    }

    #[test]
    fn test_windows_grow_every_iteration_regardless_of_matches() {
        let mut recognizer = ScriptedRecognizer::new(vec![Ok(digit_line("002111111111")), Ok(Vec::new())]);

        search_field(&mut recognizer, &[], &rule(), INITIAL, &SearchOptions::default()).unwrap();

        let step = 30;
        let mut expected = INITIAL;
        for (n, call) in recognizer.calls.iter().enumerate() {
            assert_eq!(*call, expected);
            expected = expand(expected, n as i32 + 1, step);
        }
    }

    #[test]
    fn test_late_confirmation_still_accepted() {
        let mut recognizer = ScriptedRecognizer::new(vec![
            Ok(digit_line("002111111111")),
            Ok(Vec::new()),
            Ok(digit_line("002222222222")),
            Ok(digit_line("002111111111")),
        ]);

        let result = search_field(&mut recognizer, &[], &rule(), INITIAL, &SearchOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(result.number, "002111111111");
        assert_eq!(result.status, NumberStatus::Accepted);
        assert_eq!(recognizer.calls.len(), 4);
    }

    #[test]
    fn test_non_qualifying_lines_are_ignored() {
        let mut recognizer = ScriptedRecognizer::new(vec![
            Ok(digit_line("00211111")),
            Ok(digit_line("002123456789123456")),
        ]);

        let result = search_field(&mut recognizer, &[], &rule(), INITIAL, &SearchOptions::default()).unwrap();

        assert!(result.is_none());
        assert_eq!(recognizer.calls.len(), 5);
    }

    #[test]
    fn test_engine_error_aborts_search() {
        let mut recognizer = ScriptedRecognizer::new(vec![
            Ok(digit_line("002111111111")),
            Err(OcrError::Recognition("engine fault".to_string())),
        ]);

        let err = search_field(&mut recognizer, &[], &rule(), INITIAL, &SearchOptions::default()).unwrap_err();

        assert!(matches!(err, OcrError::Recognition(_)));
        assert_eq!(recognizer.calls.len(), 2);
    }

    #[test]
    fn test_deterministic_given_same_outputs() {
        let script = || {
            ScriptedRecognizer::new(vec![
                Ok(digit_line("002111111111")),
                Ok(digit_line("002222222222")),
                Ok(digit_line("002111111111")),
            ])
        };

        let mut a = script();
        let mut b = script();
        let ra = search_field(&mut a, &[], &rule(), INITIAL, &SearchOptions::default()).unwrap();
        let rb = search_field(&mut b, &[], &rule(), INITIAL, &SearchOptions::default()).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(a.calls, b.calls);
    }

    #[test]
    fn test_custom_options_respected() {
        let options = SearchOptions {
            max_iterations: 2,
            expand_step: 10,
        };
        let mut recognizer = ScriptedRecognizer::new(vec![]);

        let result = search_field(&mut recognizer, &[], &rule(), INITIAL, &options).unwrap();

        assert!(result.is_none());
        assert_eq!(recognizer.calls.len(), 2);
        assert_eq!(recognizer.calls[1], Rectangle::new(740, 640, 420, 100));
    }
}
