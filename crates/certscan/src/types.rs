//! Core data types shared across the crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Axis-aligned rectangle in source-image pixel coordinates.
///
/// `left`/`top` may become negative while a search window expands; cropping
/// clamps the window to the image bounds at recognition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Smallest rectangle covering `self` and `other`.
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rectangle::new(left, top, right - left, bottom - top)
    }

    /// Intersect with an image of the given dimensions.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the image.
    pub fn clamped(&self, image_width: u32, image_height: u32) -> Option<Rectangle> {
        let left = self.left.max(0);
        let top = self.top.max(0);
        let right = self.right().min(image_width as i32);
        let bottom = self.bottom().min(image_height as i32);
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rectangle::new(left, top, right - left, bottom - top))
    }
}

/// Shape rule a recognized number must satisfy.
///
/// A digit run qualifies only when its length equals `length` exactly and it
/// starts with `prefix`. Exact length deliberately rejects OCR misreads that
/// insert or drop a digit; an empty prefix matches anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRule {
    pub length: usize,
    #[serde(default)]
    pub prefix: String,
}

impl NumberRule {
    pub fn new(length: usize, prefix: impl Into<String>) -> Self {
        Self {
            length,
            prefix: prefix.into(),
        }
    }
}

/// One recognized text line with its bounding box, in source-image pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrLine {
    pub text: String,
    pub bbox: Rectangle,
}

/// Candidate number tracked during a single field search.
///
/// Keyed by its recognized digit string; lives only for the duration of one
/// `search_field` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub text_box: Rectangle,
    pub search_rect: Rectangle,
}

/// Whether a found number was confirmed by a second, independent window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberStatus {
    /// The same digit string was recognized from two different windows.
    Accepted,
    /// Seen once only; the search exhausted its iterations without agreement.
    NotAccepted,
}

/// Outcome of one field search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberResult {
    pub number: String,
    pub text_box: Rectangle,
    pub search_rect: Rectangle,
    pub status: NumberStatus,
}

/// Per-document extraction result: one entry per field that was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentResult {
    pub fields: HashMap<String, NumberResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_edges() {
        let rect = Rectangle::new(10, 20, 30, 40);
        assert_eq!(rect.right(), 40);
        assert_eq!(rect.bottom(), 60);
        assert!(rect.is_valid());
        assert!(!Rectangle::new(0, 0, 0, 10).is_valid());
    }

    #[test]
    fn test_rectangle_union() {
        let a = Rectangle::new(10, 10, 20, 10);
        let b = Rectangle::new(25, 5, 10, 10);
        assert_eq!(a.union(&b), Rectangle::new(10, 5, 25, 15));
    }

    #[test]
    fn test_rectangle_clamped_inside() {
        let rect = Rectangle::new(10, 10, 50, 50);
        assert_eq!(rect.clamped(100, 100), Some(rect));
    }

    #[test]
    fn test_rectangle_clamped_negative_origin() {
        let rect = Rectangle::new(-30, -20, 100, 80);
        assert_eq!(rect.clamped(200, 200), Some(Rectangle::new(0, 0, 70, 60)));
    }

    #[test]
    fn test_rectangle_clamped_overflow() {
        let rect = Rectangle::new(150, 150, 100, 100);
        assert_eq!(rect.clamped(200, 200), Some(Rectangle::new(150, 150, 50, 50)));
    }

    #[test]
    fn test_rectangle_clamped_outside() {
        let rect = Rectangle::new(300, 300, 50, 50);
        assert_eq!(rect.clamped(200, 200), None);
        let rect = Rectangle::new(-100, 0, 50, 50);
        assert_eq!(rect.clamped(200, 200), None);
    }

    #[test]
    fn test_number_status_serde() {
        let json = serde_json::to_string(&NumberStatus::Accepted).unwrap();
        assert_eq!(json, "\"accepted\"");
        let status: NumberStatus = serde_json::from_str("\"not_accepted\"").unwrap();
        assert_eq!(status, NumberStatus::NotAccepted);
    }

    #[test]
    fn test_number_rule_default_prefix() {
        let rule: NumberRule = toml::from_str("length = 12").unwrap();
        assert_eq!(rule.length, 12);
        assert!(rule.prefix.is_empty());
    }
}
