mod backends;
mod engine;
mod error;
mod pass;
mod region;
mod request;
mod table;

#[cfg(feature = "engine-tesseract")]
pub use backends::tesseract::TesseractCliEngine;
pub use engine::{NoopOcrEngine, OcrEngine};
pub use error::OcrError;
pub use pass::{OcrPass, PyramidConfig};
pub use region::ImageRegion;
pub use request::OcrRequest;
pub use table::{TABLE_HEADER, parse_table};
