use crate::error::OcrError;
use crate::request::OcrRequest;
use crate::table::TABLE_HEADER;

/// Common interface for all OCR engines.
///
/// `recognize` returns the engine's raw word table: a tab-separated header line
/// followed by one row per layout element, with boxes relative to the requested
/// region. See [`crate::parse_table`] for the columns.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn warm_up(&self) -> Result<(), OcrError> {
        Ok(())
    }

    fn recognize(&self, request: &OcrRequest<'_>) -> Result<String, OcrError>;
}

/// Engine that never recognizes anything.
#[derive(Debug, Default)]
pub struct NoopOcrEngine;

impl OcrEngine for NoopOcrEngine {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn recognize(&self, _: &OcrRequest<'_>) -> Result<String, OcrError> {
        Ok(format!("{TABLE_HEADER}\n"))
    }
}
