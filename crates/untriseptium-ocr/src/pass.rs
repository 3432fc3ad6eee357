use std::collections::HashSet;

use image::RgbImage;
use tracing::debug;
use untriseptium_types::{PixelBounds, Rect, WordRecord, has_recognized_text};

use crate::engine::OcrEngine;
use crate::error::OcrError;
use crate::region::ImageRegion;
use crate::request::OcrRequest;
use crate::table::parse_table;

/// Limits for the strip search used when a full-image pass finds nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PyramidConfig {
    /// Strips are never split below this height in pixels.
    pub min_strip_height: u32,
    /// Number of times a region may be halved.
    pub max_recursion_depth: u32,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            min_strip_height: 32,
            max_recursion_depth: 3,
        }
    }
}

/// One OCR pass over an image.
///
/// Some engines return nothing at all for large images. When the full-image pass
/// yields no text, the image is re-recognized as overlapping horizontal strips of
/// half the height, and each empty strip is split again until the pyramid limits
/// are reached. Whatever the strips produced is returned, possibly nothing; each
/// strip's records are preceded by a boundary record covering the strip.
pub struct OcrPass<'e> {
    engine: &'e dyn OcrEngine,
    language: Option<String>,
    pyramid: PyramidConfig,
}

impl<'e> OcrPass<'e> {
    pub fn new(engine: &'e dyn OcrEngine) -> Self {
        Self {
            engine,
            language: None,
            pyramid: PyramidConfig::default(),
        }
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn with_pyramid(mut self, pyramid: PyramidConfig) -> Self {
        self.pyramid = pyramid;
        self
    }

    pub fn run(&self, image: &RgbImage) -> Result<Vec<WordRecord>, OcrError> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(Vec::new());
        }
        let full = PixelBounds::full(image.width(), image.height());
        let records = self.recognize(image, full)?;
        if has_recognized_text(&records) {
            debug!(
                engine = self.engine.name(),
                records = records.len(),
                "ocr pass complete"
            );
            return Ok(records);
        }

        debug!(
            engine = self.engine.name(),
            width = image.width(),
            height = image.height(),
            "full-image ocr returned no text; searching strips"
        );
        let mut found = Vec::new();
        self.search_strips(image, full, 1, &mut found)?;
        let found = dedup_words(found);
        debug!(
            engine = self.engine.name(),
            records = found.len(),
            "strip search complete"
        );
        Ok(found)
    }

    fn recognize(
        &self,
        image: &RgbImage,
        bounds: PixelBounds,
    ) -> Result<Vec<WordRecord>, OcrError> {
        let region = ImageRegion::new(image, bounds)?;
        let request = OcrRequest::new(region, self.language.as_deref());
        let raw = self.engine.recognize(&request)?;
        parse_table(&raw, region.origin())
    }

    fn search_strips(
        &self,
        image: &RgbImage,
        region: PixelBounds,
        depth: u32,
        found: &mut Vec<WordRecord>,
    ) -> Result<(), OcrError> {
        if depth > self.pyramid.max_recursion_depth {
            return Ok(());
        }
        let strip_height = region.height / 2;
        if strip_height == 0 || strip_height < self.pyramid.min_strip_height {
            return Ok(());
        }

        for top in strip_offsets(region, strip_height) {
            let strip = PixelBounds::new(region.x, top, region.width, strip_height);
            let records = self.recognize(image, strip)?;
            if has_recognized_text(&records) {
                debug!(depth, top, strip_height, records = records.len(), "strip hit");
                found.push(WordRecord::boundary(Rect::from(strip)));
                found.extend(records);
            } else {
                self.search_strips(image, strip, depth + 1, found)?;
            }
        }
        Ok(())
    }
}

/// Top edges of strips stepped by half a strip, the last one flush with the
/// bottom of the region.
fn strip_offsets(region: PixelBounds, strip_height: u32) -> Vec<u32> {
    let step = (strip_height / 2).max(1);
    let last = region.y + (region.height - strip_height);
    let mut offsets: Vec<u32> = (region.y..=last).step_by(step as usize).collect();
    if offsets.last() != Some(&last) {
        offsets.push(last);
    }
    offsets
}

fn dedup_words(records: Vec<WordRecord>) -> Vec<WordRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            if !record.is_word() {
                return true;
            }
            let rect = record.rect;
            seen.insert((
                record.text.clone(),
                [rect.x0, rect.y0, rect.x1, rect.y1].map(f32::to_bits),
            ))
        })
        .collect()
}
