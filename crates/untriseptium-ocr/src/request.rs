use crate::region::ImageRegion;

/// OCR invocation metadata.
#[derive(Debug)]
pub struct OcrRequest<'a> {
    region: ImageRegion<'a>,
    language: Option<&'a str>,
}

impl<'a> OcrRequest<'a> {
    pub fn new(region: ImageRegion<'a>, language: Option<&'a str>) -> Self {
        Self { region, language }
    }

    pub fn region(&self) -> &ImageRegion<'a> {
        &self.region
    }

    /// Engine-specific language selector, e.g. `eng` or `jpn`.
    pub fn language(&self) -> Option<&'a str> {
        self.language
    }
}
