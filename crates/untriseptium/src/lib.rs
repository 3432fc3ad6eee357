//! Find text on screen by OCR and click it.
//!
//! [`Untriseptium`] ties a [`Frontend`] (screen capture and pointer) to an
//! [`OcrEngine`](untriseptium_ocr::OcrEngine) and a configured matcher.

pub mod cli;
mod error;
mod frontend;
pub mod report;
mod session;
pub mod settings;

pub use error::Error;
pub use frontend::{Frontend, FrontendError, ImageFileFrontend};
pub use session::{Point, SessionSettings, Untriseptium, find_texts_in};

pub use untriseptium_matcher::{
    Candidate, ColorHint, LocationHint, MatchStrategy, MatcherConfig, Preset, TextMatcher,
};
pub use untriseptium_ocr::{NoopOcrEngine, OcrEngine, OcrError, PyramidConfig};
#[cfg(feature = "engine-tesseract")]
pub use untriseptium_ocr::TesseractCliEngine;
pub use untriseptium_types::{Rect, Rgb, WordRecord};
