use std::f32::consts::PI;
use std::str::FromStr;

use image::RgbImage;
use thiserror::Error;
use tracing::debug;
use untriseptium_types::Rgb;

use crate::candidate::Candidate;
use crate::color::{ColorProfile, extract_profile};

/// Expected position of the text, in fractions of the image size.
///
/// `radius` is a fraction of the image diagonal; beyond it the location
/// confidence is zero. Without a radius the whole diagonal is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationHint {
    pub x: f32,
    pub y: f32,
    pub radius: Option<f32>,
}

impl LocationHint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, radius: None }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid location '{value}': expected x,y or x,y,radius with fractions in [0, 1]")]
pub struct ParseHintError {
    pub value: String,
}

impl FromStr for LocationHint {
    type Err = ParseHintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseHintError {
            value: s.to_string(),
        };
        let parts = s
            .split(',')
            .map(|part| part.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| err())?;
        if parts.iter().any(|value| !(0.0..=1.0).contains(value)) {
            return Err(err());
        }
        match parts[..] {
            [x, y] => Ok(LocationHint::new(x, y)),
            [x, y, radius] if radius > 0.0 => Ok(LocationHint::new(x, y).with_radius(radius)),
            _ => Err(err()),
        }
    }
}

/// Expected text color, with an optional background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorHint {
    pub foreground: Rgb,
    pub background: Option<Rgb>,
}

/// Raised-cosine falloff from the hinted point to the edge of its radius.
pub fn location_confidence(
    center: (f32, f32),
    hint: &LocationHint,
    image_width: u32,
    image_height: u32,
) -> f32 {
    let width = image_width as f32;
    let height = image_height as f32;
    let diagonal = width.hypot(height);
    let radius = hint.radius.unwrap_or(1.0) * diagonal;
    if radius <= 0.0 {
        return 0.0;
    }
    let distance = (center.0 - hint.x * width).hypot(center.1 - hint.y * height);
    if distance >= radius {
        return 0.0;
    }
    ((distance * PI / radius).cos() * 0.5 + 0.5).clamp(0.0, 1.0)
}

pub fn color_confidence(profile: &ColorProfile, hint: &ColorHint) -> f32 {
    let foreground = 1.0 - profile.foreground.difference(&hint.foreground);
    match hint.background {
        Some(background) => (foreground + 1.0 - profile.background.difference(&background)) / 2.0,
        None => foreground,
    }
}

/// Re-order candidates by text confidence times the requested hint confidences.
///
/// Without hints the order is left as is. With a color hint, each candidate's
/// pixels are cropped from `image` and kept as its snapshot.
pub fn rank(
    mut candidates: Vec<Candidate>,
    image: &RgbImage,
    location: Option<&LocationHint>,
    color: Option<&ColorHint>,
) -> Vec<Candidate> {
    if location.is_none() && color.is_none() {
        return candidates;
    }
    for candidate in &mut candidates {
        if let Some(hint) = location {
            candidate.location_confidence = Some(location_confidence(
                candidate.center(),
                hint,
                image.width(),
                image.height(),
            ));
        }
        if let Some(hint) = color {
            let confidence = match candidate.snapshot_from(image).map(extract_profile) {
                Some(Ok(profile)) => color_confidence(&profile, hint),
                Some(Err(err)) => {
                    debug!(text = %candidate.text, error = %err, "color extraction failed");
                    0.0
                }
                None => {
                    debug!(
                        text = %candidate.text,
                        rect = %candidate.rect,
                        "candidate outside image"
                    );
                    0.0
                }
            };
            candidate.color_confidence = Some(confidence);
        }
    }
    candidates.sort_by(|a, b| b.ranking_score().total_cmp(&a.ranking_score()));
    candidates
}
