use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use tracing::debug;

use crate::{OcrEngine, OcrError, OcrRequest};

const DEFAULT_BINARY: &str = "tesseract";

/// Runs the `tesseract` command line tool and returns its `tsv` output.
///
/// The region is PNG-encoded and piped through stdin, so no temporary files are
/// created.
#[derive(Debug, Clone)]
pub struct TesseractCliEngine {
    binary: PathBuf,
    page_segmentation_mode: Option<u32>,
    thread_limit: Option<u32>,
}

impl Default for TesseractCliEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractCliEngine {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            page_segmentation_mode: None,
            thread_limit: None,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_page_segmentation_mode(mut self, psm: Option<u32>) -> Self {
        self.page_segmentation_mode = psm;
        self
    }

    /// Limit the OpenMP threads used by the child process.
    ///
    /// Some tesseract builds saturate every core and can stall the machine; a
    /// limit of 1 avoids that. Only the spawned process sees the variable.
    pub fn with_thread_limit(mut self, limit: Option<u32>) -> Self {
        self.thread_limit = limit;
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        if let Some(limit) = self.thread_limit {
            command.env("OMP_THREAD_LIMIT", limit.to_string());
        }
        command
    }
}

impl OcrEngine for TesseractCliEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn warm_up(&self) -> Result<(), OcrError> {
        let output = self
            .command()
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|err| {
                OcrError::backend(format!(
                    "failed to run '{}' (is tesseract installed?): {err}",
                    self.binary.display()
                ))
            })?;
        if !output.status.success() {
            return Err(OcrError::backend(format!(
                "'{} --version' exited with {}",
                self.binary.display(),
                output.status
            )));
        }
        Ok(())
    }

    fn recognize(&self, request: &OcrRequest<'_>) -> Result<String, OcrError> {
        let region = request.region();
        let crop = region.crop();
        let mut encoded = Vec::new();
        PngEncoder::new(&mut encoded).write_image(
            crop.as_raw(),
            crop.width(),
            crop.height(),
            ColorType::Rgb8,
        )?;

        let mut command = self.command();
        command.arg("stdin").arg("stdout");
        if let Some(language) = request.language() {
            command.arg("-l").arg(language);
        }
        if let Some(psm) = self.page_segmentation_mode {
            command.arg("--psm").arg(psm.to_string());
        }
        command
            .arg("tsv")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(
            bounds = ?region.bounds(),
            language = request.language(),
            bytes = encoded.len(),
            "invoking tesseract"
        );
        let mut child = command.spawn().map_err(|err| {
            OcrError::backend(format!("failed to spawn '{}': {err}", self.binary.display()))
        })?;
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&encoded),
            None => Ok(()),
        };
        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::backend(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        written?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use image::RgbImage;
    use untriseptium_types::PixelBounds;

    use super::*;
    use crate::ImageRegion;

    /// Incompressible pixels, so the PNG overflows a pipe buffer.
    fn noise(width: u32, height: u32) -> RgbImage {
        let mut state: u32 = 0x2545_f491;
        RgbImage::from_fn(width, height, |_, _| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let [_, r, g, b] = state.to_le_bytes();
            image::Rgb([r, g, b])
        })
    }

    #[test]
    fn missing_binary_is_a_backend_error() {
        let engine = TesseractCliEngine::new().with_binary("/nonexistent/tesseract");
        let image = RgbImage::new(8, 8);
        let region = ImageRegion::new(&image, PixelBounds::full(8, 8)).unwrap();
        let result = engine.recognize(&OcrRequest::new(region, None));
        assert!(matches!(result, Err(OcrError::Backend { .. })));
        assert!(engine.warm_up().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn child_that_ignores_stdin_is_reaped() {
        let image = noise(320, 320);
        let region = ImageRegion::new(&image, PixelBounds::full(320, 320)).unwrap();
        let request = OcrRequest::new(region, None);

        let silent = TesseractCliEngine::new().with_binary("true");
        assert!(matches!(silent.recognize(&request), Err(OcrError::Io(_))));

        let failing = TesseractCliEngine::new().with_binary("false");
        assert!(matches!(
            failing.recognize(&request),
            Err(OcrError::Backend { .. })
        ));
    }
}
