use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::correction::AppliedEdit;
use crate::loader::LoadedImage;

#[derive(Debug, Clone, Serialize)]
pub struct ImageSummary {
    pub path: PathBuf,
    pub format: String,
    pub width: u32,
    pub height: u32,
}

impl From<&LoadedImage> for ImageSummary {
    fn from(image: &LoadedImage) -> Self {
        Self {
            path: image.path.clone(),
            format: image.format_name().to_string(),
            width: image.width,
            height: image.height,
        }
    }
}

/// Machine-readable record of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub image: ImageSummary,
    pub ocr_backend: String,
    pub correction_backend: String,
    pub summarizer: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub extracted_words: usize,
    pub corrected_words: usize,
    pub summary_words: usize,
    pub corrections: Vec<AppliedEdit>,
}
