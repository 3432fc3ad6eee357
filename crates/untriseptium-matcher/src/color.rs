use std::collections::BTreeMap;

use image::RgbImage;
use thiserror::Error;
use untriseptium_types::Rgb;

/// Colors dominating a text snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorProfile {
    pub foreground: Rgb,
    pub background: Rgb,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("snapshot has no pixels")]
    EmptyRegion,
    #[error("no pixel differs from background {background}")]
    NoForeground { background: Rgb },
}

/// Channels are bucketed to 5 bits so antialiasing noise lands in one bin.
const QUANT_SHIFT: u8 = 3;

#[derive(Default)]
struct Bin {
    count: u32,
    sum: [u64; 3],
}

impl Bin {
    fn add(&mut self, pixel: [u8; 3]) {
        self.count += 1;
        for (sum, channel) in self.sum.iter_mut().zip(pixel) {
            *sum += u64::from(channel);
        }
    }

    fn mean(&self) -> Rgb {
        let count = u64::from(self.count.max(1));
        let [r, g, b] = self.sum.map(|sum| (sum / count) as u8);
        Rgb::new(r, g, b)
    }
}

fn quantize(pixel: [u8; 3]) -> [u8; 3] {
    pixel.map(|channel| channel >> QUANT_SHIFT)
}

/// Estimate background and foreground colors of a cropped text region.
///
/// The background is the mean of the most common quantized color on the crop
/// border. The foreground is the histogram peak of the remaining pixels, each
/// weighted by its difference from the background, so that a few strongly
/// contrasting glyph pixels win over many faint antialiased ones.
pub fn extract_profile(snapshot: &RgbImage) -> Result<ColorProfile, ColorError> {
    let (width, height) = snapshot.dimensions();
    if width == 0 || height == 0 {
        return Err(ColorError::EmptyRegion);
    }

    let on_border = |x: u32, y: u32| x == 0 || y == 0 || x + 1 == width || y + 1 == height;

    let mut border: BTreeMap<[u8; 3], Bin> = BTreeMap::new();
    for (x, y, pixel) in snapshot.enumerate_pixels() {
        if on_border(x, y) {
            border.entry(quantize(pixel.0)).or_default().add(pixel.0);
        }
    }
    let background = most_common(&border).map(Bin::mean).ok_or(ColorError::EmptyRegion)?;

    let mut inner: BTreeMap<[u8; 3], (f32, Bin)> = BTreeMap::new();
    for (x, y, pixel) in snapshot.enumerate_pixels() {
        if on_border(x, y) && width > 2 && height > 2 {
            continue;
        }
        let weight = background.difference(&Rgb::from(pixel.0));
        if weight <= 0.0 {
            continue;
        }
        let entry = inner.entry(quantize(pixel.0)).or_default();
        entry.0 += weight;
        entry.1.add(pixel.0);
    }

    let mut best: Option<&(f32, Bin)> = None;
    for entry in inner.values() {
        if best.is_none_or(|current| entry.0 > current.0) {
            best = Some(entry);
        }
    }
    match best {
        Some((_, bin)) => Ok(ColorProfile {
            foreground: bin.mean(),
            background,
        }),
        None => Err(ColorError::NoForeground { background }),
    }
}

/// First bin with the highest count, in key order.
fn most_common(bins: &BTreeMap<[u8; 3], Bin>) -> Option<&Bin> {
    let mut best: Option<&Bin> = None;
    for bin in bins.values() {
        if best.is_none_or(|current| bin.count > current.count) {
            best = Some(bin);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use image::Rgb as Pixel;

    use super::*;

    fn glyph(width: u32, height: u32, background: [u8; 3], foreground: [u8; 3]) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let inside = x > 1 && y > 1 && x + 2 < width && y + 2 < height;
            if inside && (x + y) % 2 == 0 {
                Pixel(foreground)
            } else {
                Pixel(background)
            }
        })
    }

    #[test]
    fn separates_text_from_background() {
        let image = glyph(20, 10, [250, 250, 250], [10, 20, 30]);
        let profile = extract_profile(&image).unwrap();
        assert_eq!(profile.background, Rgb::new(250, 250, 250));
        assert_eq!(profile.foreground, Rgb::new(10, 20, 30));
    }

    #[test]
    fn strong_contrast_beats_many_faint_pixels() {
        let mut image = glyph(20, 10, [255, 255, 255], [0, 0, 0]);
        // light-gray halo around every black pixel
        for y in 2..8 {
            for x in 2..18 {
                if (x + y) % 2 == 1 {
                    image.put_pixel(x, y, Pixel([232, 232, 232]));
                }
            }
        }
        let profile = extract_profile(&image).unwrap();
        assert_eq!(profile.foreground, Rgb::new(0, 0, 0));
    }

    #[test]
    fn flat_region_has_no_foreground() {
        let image = RgbImage::from_pixel(6, 6, Pixel([40, 40, 40]));
        assert_eq!(
            extract_profile(&image),
            Err(ColorError::NoForeground {
                background: Rgb::new(40, 40, 40)
            })
        );
    }

    #[test]
    fn empty_region_is_an_error() {
        assert_eq!(
            extract_profile(&RgbImage::new(0, 4)),
            Err(ColorError::EmptyRegion)
        );
    }
}
