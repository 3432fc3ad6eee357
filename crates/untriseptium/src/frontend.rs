use std::path::{Path, PathBuf};

use image::RgbImage;
use image::imageops;
use thiserror::Error;
use tracing::info;
use untriseptium_types::PixelBounds;

/// Screen capture and pointer control.
///
/// Coordinates are absolute pixels of the captured image.
pub trait Frontend {
    fn screenshot(&mut self) -> Result<RgbImage, FrontendError>;

    fn click(&mut self, x: f32, y: f32) -> Result<(), FrontendError>;

    fn move_to(&mut self, x: f32, y: f32) -> Result<(), FrontendError>;
}

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("failed to load screenshot {path}: {source}")]
    Load {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("capture region {region:?} lies outside the {width}x{height} screen")]
    RegionOutOfBounds {
        region: PixelBounds,
        width: u32,
        height: u32,
    },
    #[error("pointer position ({x}, {y}) is not a finite point")]
    InvalidPoint { x: f32, y: f32 },
}

/// Frontend backed by a still image on disk.
///
/// Every screenshot reloads the file, so a file rewritten between captures is
/// picked up. Pointer actions are only recorded and logged.
#[derive(Debug, Clone)]
pub struct ImageFileFrontend {
    path: PathBuf,
    region: Option<PixelBounds>,
    pointer: Option<(f32, f32)>,
    clicks: Vec<(f32, f32)>,
}

impl ImageFileFrontend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            region: None,
            pointer: None,
            clicks: Vec::new(),
        }
    }

    /// Capture only `region` of the image.
    pub fn with_region(mut self, region: PixelBounds) -> Self {
        self.region = Some(region);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last position the pointer was moved or clicked to.
    pub fn pointer(&self) -> Option<(f32, f32)> {
        self.pointer
    }

    pub fn clicks(&self) -> &[(f32, f32)] {
        &self.clicks
    }
}

fn check_point(x: f32, y: f32) -> Result<(), FrontendError> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(FrontendError::InvalidPoint { x, y })
    }
}

impl Frontend for ImageFileFrontend {
    fn screenshot(&mut self) -> Result<RgbImage, FrontendError> {
        let image = image::open(&self.path)
            .map_err(|source| FrontendError::Load {
                path: self.path.clone(),
                source,
            })?
            .to_rgb8();
        let Some(region) = self.region else {
            return Ok(image);
        };
        let (width, height) = image.dimensions();
        if region.is_empty()
            || region.right() > u64::from(width)
            || region.bottom() > u64::from(height)
        {
            return Err(FrontendError::RegionOutOfBounds {
                region,
                width,
                height,
            });
        }
        Ok(imageops::crop_imm(&image, region.x, region.y, region.width, region.height).to_image())
    }

    fn click(&mut self, x: f32, y: f32) -> Result<(), FrontendError> {
        check_point(x, y)?;
        info!(x, y, image = %self.path.display(), "click");
        self.pointer = Some((x, y));
        self.clicks.push((x, y));
        Ok(())
    }

    fn move_to(&mut self, x: f32, y: f32) -> Result<(), FrontendError> {
        check_point(x, y)?;
        info!(x, y, image = %self.path.display(), "move pointer");
        self.pointer = Some((x, y));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path) -> PathBuf {
        let path = dir.join("screen.png");
        let image = RgbImage::from_fn(8, 6, |x, y| image::Rgb([x as u8 * 10, y as u8 * 10, 0]));
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn loads_whole_image_or_region() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path());
        let mut frontend = ImageFileFrontend::new(&path);
        assert_eq!(frontend.screenshot().unwrap().dimensions(), (8, 6));

        let mut frontend = ImageFileFrontend::new(&path).with_region(PixelBounds::new(2, 1, 4, 3));
        let shot = frontend.screenshot().unwrap();
        assert_eq!(shot.dimensions(), (4, 3));
        assert_eq!(shot.get_pixel(0, 0).0, [20, 10, 0]);
    }

    #[test]
    fn rejects_region_outside_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path());
        let mut frontend = ImageFileFrontend::new(path).with_region(PixelBounds::new(6, 0, 4, 3));
        assert!(matches!(
            frontend.screenshot(),
            Err(FrontendError::RegionOutOfBounds { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let mut frontend = ImageFileFrontend::new("/nonexistent/screen.png");
        assert!(matches!(
            frontend.screenshot(),
            Err(FrontendError::Load { .. })
        ));
    }

    #[test]
    fn pointer_actions_are_recorded() {
        let mut frontend = ImageFileFrontend::new("unused.png");
        frontend.move_to(1.0, 2.0).unwrap();
        assert_eq!(frontend.pointer(), Some((1.0, 2.0)));
        frontend.click(3.0, 4.0).unwrap();
        assert_eq!(frontend.clicks(), &[(3.0, 4.0)]);
        assert!(frontend.click(f32::NAN, 0.0).is_err());
    }
}
