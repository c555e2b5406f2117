use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocLensError {
    #[error("The image file was not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    #[error("Error opening image file: {0}")]
    Image(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),

    #[error("Correction error: {0}")]
    Correction(String),

    #[error("Correction unavailable: {0}")]
    CorrectionUnavailable(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },

    #[error("Output error: {0}")]
    Output(String),
}

impl DocLensError {
    /// True for failures caused by a missing or unusable external collaborator
    /// rather than by the input itself.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DocLensError::OcrUnavailable(_)
                | DocLensError::CorrectionUnavailable(_)
                | DocLensError::LlmUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DocLensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_not_found_message_names_path() {
        let error = DocLensError::ImageNotFound(PathBuf::from("/tmp/missing.jpg"));
        assert_eq!(
            error.to_string(),
            "The image file was not found: /tmp/missing.jpg"
        );
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(DocLensError::OcrUnavailable("no tesseract".into()).is_unavailable());
        assert!(DocLensError::LlmUnavailable("no key".into()).is_unavailable());
        assert!(!DocLensError::Ocr("boom".into()).is_unavailable());
        assert!(!DocLensError::LlmRateLimit { retry_after: None }.is_unavailable());
    }
}
