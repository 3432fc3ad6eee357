use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("region {width}x{height}@({x},{y}) exceeds the {image_width}x{image_height} image")]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },
    #[error(
        "failed to parse row {row}: column '{column}' has invalid value '{value}' in \"{line}\""
    )]
    Parse {
        row: usize,
        column: &'static str,
        value: String,
        line: String,
    },
    #[error("backend error: {message}")]
    Backend { message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

impl OcrError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
