//! Fuzzy location of a target string inside OCR word records.
//!
//! [`TextMatcher`] turns a stream of independently recognized words into ranked
//! multi-word [`Candidate`] spans, and [`rank`] re-orders them with optional
//! location and color hints.

mod align;
mod candidate;
mod color;
mod config;
mod confidence;
mod matcher;
mod paragraph;
mod ranking;

pub use candidate::Candidate;
pub use color::{ColorError, ColorProfile, extract_profile};
pub use config::{MatchStrategy, MatcherConfig, MatcherConfigError, Preset};
pub use confidence::{TargetText, text_confidence, text_similarity};
pub use matcher::TextMatcher;
pub use ranking::{
    ColorHint, LocationHint, ParseHintError, color_confidence, location_confidence, rank,
};
