//! Shared domain models for the untriseptium workspace.
//!
//! This crate centralizes the lightweight value types passed between the OCR,
//! matcher, and session crates: rectangles in image pixels, recognized word
//! records, and colors. Keep it free of image and process dependencies so every
//! crate can depend on it cheaply.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Axis-aligned rectangle in image pixel coordinates.
///
/// Constructors normalize the corners so that `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Length from the top-left to the bottom-right corner.
    pub fn diagonal(&self) -> f32 {
        self.width().hypot(self.height())
    }

    /// Shortest distance between any point of `self` and any point of `other`.
    ///
    /// Zero when the rectangles overlap or touch.
    pub fn distance_to(&self, other: &Rect) -> f32 {
        let dx = axis_gap(self.x0, self.x1, other.x0, other.x1);
        let dy = axis_gap(self.y0, self.y1, other.y0, other.y1);
        dx.hypot(dy)
    }

    /// Smallest rectangle enclosing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|value| value.is_finite())
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {} {})", self.x0, self.y0, self.x1, self.y1)
    }
}

impl From<PixelBounds> for Rect {
    fn from(bounds: PixelBounds) -> Self {
        Rect::from_xywh(
            bounds.x as f32,
            bounds.y as f32,
            bounds.width as f32,
            bounds.height as f32,
        )
    }
}

fn axis_gap(a0: f32, a1: f32, b0: f32, b1: f32) -> f32 {
    if b0 > a1 {
        b0 - a1
    } else if a0 > b1 {
        a0 - b1
    } else {
        0.0
    }
}

/// Integer pixel region of an image, used to address OCR sub-regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelBounds {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    /// Clamp a floating rectangle to an image of the given size.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the image or a
    /// corner is not finite.
    pub fn clamped(rect: &Rect, image_width: u32, image_height: u32) -> Option<Self> {
        if !rect.is_finite() {
            return None;
        }
        let max_x = image_width as f32;
        let max_y = image_height as f32;
        let left = rect.x0.floor().clamp(0.0, max_x);
        let top = rect.y0.floor().clamp(0.0, max_y);
        let right = rect.x1.ceil().clamp(left, max_x);
        let bottom = rect.y1.ceil().clamp(top, max_y);
        let bounds = PixelBounds::new(
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        );
        if bounds.is_empty() { None } else { Some(bounds) }
    }
}

/// Position of a record inside the OCR layout hierarchy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordPosition {
    pub level: u32,
    pub page: u32,
    pub block: u32,
    pub paragraph: u32,
    pub line: u32,
    pub word: u32,
}

impl WordPosition {
    /// Identifies the line a word belongs to.
    pub fn line_key(&self) -> (u32, u32, u32, u32) {
        (self.page, self.block, self.paragraph, self.line)
    }
}

/// Confidence carried by synthesized boundary records.
pub const BOUNDARY_CONFIDENCE: f32 = -1.0;

/// One OCR-recognized token in absolute image coordinates.
///
/// A negative confidence marks a structural boundary (end of a line, paragraph,
/// or block) rather than a recognized word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    pub text: String,
    pub confidence: f32,
    pub rect: Rect,
    #[serde(default)]
    pub position: WordPosition,
}

impl WordRecord {
    pub fn new(text: impl Into<String>, confidence: f32, rect: Rect) -> Self {
        Self {
            text: text.into(),
            confidence,
            rect,
            position: WordPosition::default(),
        }
    }

    pub fn boundary(rect: Rect) -> Self {
        Self::new(String::new(), BOUNDARY_CONFIDENCE, rect)
    }

    pub fn with_position(mut self, position: WordPosition) -> Self {
        self.position = position;
        self
    }

    pub fn is_boundary(&self) -> bool {
        self.confidence < 0.0
    }

    /// True for records that carry recognized text.
    pub fn is_word(&self) -> bool {
        !self.is_boundary() && !self.text.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

pub fn has_recognized_text(records: &[WordRecord]) -> bool {
    records.iter().any(|record| !record.text.is_empty())
}

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Mean absolute per-channel difference, normalized to `[0, 1]`.
    pub fn difference(&self, other: &Rgb) -> f32 {
        let total: u32 = self
            .channels()
            .iter()
            .zip(other.channels())
            .map(|(a, b)| u32::from(a.abs_diff(b)))
            .sum();
        total as f32 / (3.0 * 255.0)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(value: [u8; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color '{value}': expected #rrggbb")]
pub struct ParseColorError {
    pub value: String,
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError {
            value: s.to_string(),
        };
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(err());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| err())
        };
        Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}
