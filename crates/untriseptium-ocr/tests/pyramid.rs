use std::sync::Mutex;

use image::RgbImage;
use untriseptium_ocr::{
    NoopOcrEngine, OcrEngine, OcrError, OcrPass, OcrRequest, PyramidConfig, TABLE_HEADER,
};
use untriseptium_types::{PixelBounds, Rect};

/// Recognizes a single word, but only in regions no taller than `max_height`.
struct ShortRegionEngine {
    max_height: u32,
    calls: Mutex<Vec<PixelBounds>>,
}

impl ShortRegionEngine {
    fn new(max_height: u32) -> Self {
        Self {
            max_height,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl OcrEngine for ShortRegionEngine {
    fn name(&self) -> &'static str {
        "short-region"
    }

    fn recognize(&self, request: &OcrRequest<'_>) -> Result<String, OcrError> {
        let bounds = request.region().bounds();
        self.calls.lock().unwrap().push(bounds);
        let mut raw = format!(
            "{TABLE_HEADER}\n1\t1\t0\t0\t0\t0\t0\t0\t{}\t{}\t-1\t\n",
            bounds.width, bounds.height
        );
        if bounds.height <= self.max_height {
            raw.push_str("5\t1\t1\t1\t1\t1\t2\t3\t10\t8\t90\thello\n");
        }
        Ok(raw)
    }
}

#[test]
fn half_height_strips_surface_words() {
    let image = RgbImage::new(40, 100);
    let engine = ShortRegionEngine::new(50);
    let records = OcrPass::new(&engine).run(&image).unwrap();

    let words: Vec<_> = records.iter().filter(|r| r.is_word()).collect();
    assert_eq!(words.len(), 3);
    assert_eq!(words[0].text, "hello");
    assert_eq!(words[0].rect, Rect::new(2.0, 3.0, 12.0, 11.0));
    assert_eq!(words[1].rect.y0, 28.0);
    assert_eq!(words[2].rect.y0, 53.0);
    assert!((words[0].confidence - 0.9).abs() < 1e-6);
}

/// Like [`ShortRegionEngine`], but emits word rows only, never a `-1` row.
struct WordsOnlyEngine {
    max_height: u32,
}

impl OcrEngine for WordsOnlyEngine {
    fn name(&self) -> &'static str {
        "words-only"
    }

    fn recognize(&self, request: &OcrRequest<'_>) -> Result<String, OcrError> {
        let mut raw = format!("{TABLE_HEADER}\n");
        if request.region().bounds().height <= self.max_height {
            raw.push_str("5\t1\t1\t1\t1\t1\t2\t3\t10\t8\t90\thello\n");
        }
        Ok(raw)
    }
}

#[test]
fn strips_are_separated_by_boundaries() {
    let image = RgbImage::new(40, 100);
    let engine = WordsOnlyEngine { max_height: 50 };
    let records = OcrPass::new(&engine).run(&image).unwrap();

    let layout: Vec<String> = records
        .iter()
        .map(|r| {
            if r.is_boundary() {
                format!("|{}", r.rect.y0)
            } else {
                format!("{}@{}", r.text, r.rect.y0)
            }
        })
        .collect();
    assert_eq!(layout, ["|0", "hello@3", "|25", "hello@28", "|50", "hello@53"]);
    assert_eq!(records[2].rect, Rect::new(0.0, 25.0, 40.0, 75.0));
}

#[test]
fn full_image_hit_skips_strip_search() {
    let image = RgbImage::new(40, 40);
    let engine = ShortRegionEngine::new(100);
    let records = OcrPass::new(&engine).run(&image).unwrap();
    assert_eq!(records.iter().filter(|r| r.is_word()).count(), 1);
    assert_eq!(engine.calls.lock().unwrap().len(), 1);
}

#[test]
fn recursion_stops_at_depth_limit() {
    let image = RgbImage::new(40, 256);
    let engine = ShortRegionEngine::new(10);
    let pyramid = PyramidConfig {
        min_strip_height: 1,
        max_recursion_depth: 2,
    };
    let records = OcrPass::new(&engine).with_pyramid(pyramid).run(&image).unwrap();
    assert!(records.iter().all(|r| !r.is_word()));
    let calls = engine.calls.lock().unwrap();
    assert!(calls.iter().all(|bounds| bounds.height >= 64));
    // full pass, three strips of 128, three strips of 64 under each
    assert_eq!(calls.len(), 1 + 3 + 9);
}

#[test]
fn recursion_stops_at_min_strip_height() {
    let image = RgbImage::new(40, 100);
    let engine = ShortRegionEngine::new(10);
    let pyramid = PyramidConfig {
        min_strip_height: 30,
        max_recursion_depth: 10,
    };
    let records = OcrPass::new(&engine).with_pyramid(pyramid).run(&image).unwrap();
    assert!(records.iter().all(|r| !r.is_word()));
    let calls = engine.calls.lock().unwrap();
    assert!(calls.iter().all(|bounds| bounds.height >= 30));
}

#[test]
fn noop_engine_yields_nothing() {
    let image = RgbImage::new(64, 64);
    let records = OcrPass::new(&NoopOcrEngine).run(&image).unwrap();
    assert!(records.is_empty());
}

#[test]
fn empty_image_yields_nothing() {
    let image = RgbImage::new(0, 0);
    let engine = ShortRegionEngine::new(100);
    assert!(OcrPass::new(&engine).run(&image).unwrap().is_empty());
    assert!(engine.calls.lock().unwrap().is_empty());
}
