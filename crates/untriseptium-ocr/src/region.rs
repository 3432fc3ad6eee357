use std::fmt;

use image::{RgbImage, imageops};
use untriseptium_types::PixelBounds;

use crate::error::OcrError;

/// Validated view over a rectangular part of an RGB image.
#[derive(Clone, Copy)]
pub struct ImageRegion<'a> {
    image: &'a RgbImage,
    bounds: PixelBounds,
}

impl<'a> ImageRegion<'a> {
    pub fn new(image: &'a RgbImage, bounds: PixelBounds) -> Result<Self, OcrError> {
        let fits = bounds.right() <= u64::from(image.width())
            && bounds.bottom() <= u64::from(image.height());
        if bounds.is_empty() || !fits {
            return Err(OcrError::RegionOutOfBounds {
                x: bounds.x,
                y: bounds.y,
                width: bounds.width,
                height: bounds.height,
                image_width: image.width(),
                image_height: image.height(),
            });
        }
        Ok(Self { image, bounds })
    }

    /// The full image the region was cut from.
    pub fn image(&self) -> &'a RgbImage {
        self.image
    }

    pub fn bounds(&self) -> PixelBounds {
        self.bounds
    }

    /// Top-left corner of the region in full-image coordinates.
    pub fn origin(&self) -> (u32, u32) {
        (self.bounds.x, self.bounds.y)
    }

    /// Copy the region into its own image buffer.
    pub fn crop(&self) -> RgbImage {
        let PixelBounds {
            x,
            y,
            width,
            height,
        } = self.bounds;
        imageops::crop_imm(self.image, x, y, width, height).to_image()
    }
}

impl fmt::Debug for ImageRegion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageRegion")
            .field("image_width", &self.image.width())
            .field("image_height", &self.image.height())
            .field("bounds", &self.bounds)
            .finish()
    }
}
