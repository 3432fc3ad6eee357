use thiserror::Error;
use untriseptium_matcher::MatcherConfigError;
use untriseptium_ocr::OcrError;

use crate::frontend::FrontendError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("text '{target}' was not found on screen")]
    NotFound { target: String },
    #[error(transparent)]
    Ocr(#[from] OcrError),
    #[error(transparent)]
    Frontend(#[from] FrontendError),
    #[error(transparent)]
    Config(#[from] MatcherConfigError),
}
