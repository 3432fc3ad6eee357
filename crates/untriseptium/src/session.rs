use image::RgbImage;
use tracing::{debug, info};
use untriseptium_matcher::{
    Candidate, ColorHint, LocationHint, MatcherConfig, Preset, TextMatcher, rank,
};
use untriseptium_ocr::{OcrEngine, OcrPass, PyramidConfig};
use untriseptium_types::WordRecord;

use crate::error::Error;
use crate::frontend::Frontend;

/// Everything a session needs besides its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Passed to the OCR engine; `None` leaves the engine default.
    pub language: Option<String>,
    pub matcher: MatcherConfig,
    pub pyramid: PyramidConfig,
}

impl SessionSettings {
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            language: Some(preset.language.to_string()),
            matcher: MatcherConfig {
                strategy: preset.strategy,
                ..MatcherConfig::default()
            },
            pyramid: PyramidConfig::default(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_preset(Preset::default())
    }
}

/// A pixel position on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<&Candidate> for Point {
    fn from(candidate: &Candidate) -> Self {
        candidate.center().into()
    }
}

/// Screenshot, OCR and matching bound to one frontend and one engine.
///
/// The screenshot and its OCR records are cached until the next
/// [`capture`](Self::capture) or [`click`](Self::click).
pub struct Untriseptium<F> {
    frontend: F,
    engine: Box<dyn OcrEngine>,
    settings: SessionSettings,
    matcher: TextMatcher,
    screenshot: Option<RgbImage>,
    records: Option<Vec<WordRecord>>,
}

impl<F: Frontend> Untriseptium<F> {
    pub fn new(
        frontend: F,
        engine: Box<dyn OcrEngine>,
        settings: SessionSettings,
    ) -> Result<Self, Error> {
        let matcher = TextMatcher::new(settings.matcher)?;
        Ok(Self {
            frontend,
            engine,
            settings,
            matcher,
            screenshot: None,
            records: None,
        })
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    /// Take a fresh screenshot, dropping cached OCR records.
    pub fn capture(&mut self) -> Result<&RgbImage, Error> {
        let image = self.frontend.screenshot()?;
        debug!(width = image.width(), height = image.height(), "captured screen");
        self.records = None;
        Ok(&*self.screenshot.insert(image))
    }

    /// OCR records of the current screenshot, capturing one if needed.
    pub fn ocr(&mut self) -> Result<&[WordRecord], Error> {
        let (_, records) = self.load()?;
        Ok(records)
    }

    /// Candidates for `target` on the current screen, best first.
    pub fn find_texts(
        &mut self,
        target: &str,
        location: Option<&LocationHint>,
        color: Option<&ColorHint>,
    ) -> Result<Vec<Candidate>, Error> {
        let matcher = self.matcher.clone();
        let (image, records) = self.load()?;
        Ok(find_texts_in(records, image, target, location, color, &matcher))
    }

    /// Best candidate for `target`, or [`Error::NotFound`].
    pub fn find_text(
        &mut self,
        target: &str,
        location: Option<&LocationHint>,
        color: Option<&ColorHint>,
    ) -> Result<Candidate, Error> {
        self.find_texts(target, location, color)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                target: target.to_string(),
            })
    }

    /// Click at `point` and forget the screenshot, since the screen is
    /// expected to change.
    pub fn click(&mut self, point: impl Into<Point>) -> Result<(), Error> {
        let point = point.into();
        info!(x = point.x, y = point.y, "click");
        self.screenshot = None;
        self.records = None;
        self.frontend.click(point.x, point.y)?;
        Ok(())
    }

    pub fn move_to(&mut self, point: impl Into<Point>) -> Result<(), Error> {
        let point = point.into();
        debug!(x = point.x, y = point.y, "move pointer");
        self.frontend.move_to(point.x, point.y)?;
        Ok(())
    }

    fn load(&mut self) -> Result<(&RgbImage, &[WordRecord]), Error> {
        let image = match self.screenshot.take() {
            Some(image) => image,
            None => {
                self.records = None;
                self.frontend.screenshot()?
            }
        };
        let image = self.screenshot.insert(image);
        let records = match self.records.take() {
            Some(records) => records,
            None => OcrPass::new(self.engine.as_ref())
                .with_language(self.settings.language.clone())
                .with_pyramid(self.settings.pyramid)
                .run(image)?,
        };
        let records = self.records.insert(records);
        Ok((&*image, records.as_slice()))
    }
}

/// Match and rank `target` against OCR records the caller already holds.
pub fn find_texts_in(
    records: &[WordRecord],
    image: &RgbImage,
    target: &str,
    location: Option<&LocationHint>,
    color: Option<&ColorHint>,
    matcher: &TextMatcher,
) -> Vec<Candidate> {
    rank(matcher.find_texts(records, target), image, location, color)
}
