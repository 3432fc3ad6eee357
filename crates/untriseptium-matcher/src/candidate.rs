use std::fmt;

use image::{RgbImage, imageops};
use untriseptium_types::{PixelBounds, Rect};

/// A run of consecutive OCR words that approximates the target text.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Word texts joined with single spaces.
    pub text: String,
    /// Fused text confidence in `[0, 1]`.
    pub confidence: f32,
    /// Union of the word rectangles.
    pub rect: Rect,
    pub word_count: usize,
    /// Set by [`crate::rank`] when a location hint was given.
    pub location_confidence: Option<f32>,
    /// Set by [`crate::rank`] when a color hint was given.
    pub color_confidence: Option<f32>,
    snapshot: Option<RgbImage>,
}

impl Candidate {
    pub fn new(text: String, confidence: f32, rect: Rect, word_count: usize) -> Self {
        Self {
            text,
            confidence,
            rect,
            word_count,
            location_confidence: None,
            color_confidence: None,
            snapshot: None,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        self.rect.center()
    }

    /// Text confidence multiplied by every hint confidence computed so far.
    pub fn ranking_score(&self) -> f32 {
        self.confidence
            * self.location_confidence.unwrap_or(1.0)
            * self.color_confidence.unwrap_or(1.0)
    }

    /// Pixels under the candidate, if they were cropped during ranking.
    pub fn snapshot(&self) -> Option<&RgbImage> {
        self.snapshot.as_ref()
    }

    /// Crop the candidate from `image` on first use and keep the copy.
    ///
    /// Returns `None` when the rectangle lies outside the image.
    pub fn snapshot_from(&mut self, image: &RgbImage) -> Option<&RgbImage> {
        if self.snapshot.is_none() {
            let bounds = PixelBounds::clamped(&self.rect, image.width(), image.height())?;
            let crop =
                imageops::crop_imm(image, bounds.x, bounds.y, bounds.width, bounds.height);
            self.snapshot = Some(crop.to_image());
        }
        self.snapshot.as_ref()
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
