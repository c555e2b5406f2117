//! Persists pipeline artifacts as UTF-8 files in an output directory.

mod report;

use std::path::PathBuf;

use tracing::info;

use crate::error::{DocLensError, Result};

pub use report::{ImageSummary, PipelineReport};

/// Files the pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    ExtractedText,
    CorrectedText,
    SummarizedText,
    Hocr,
    Report,
}

impl Artifact {
    pub fn file_name(self) -> &'static str {
        match self {
            Artifact::ExtractedText => "extracted_text.txt",
            Artifact::CorrectedText => "corrected_text.txt",
            Artifact::SummarizedText => "summarized_text.txt",
            Artifact::Hocr => "output.hocr",
            Artifact::Report => "report.json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, artifact: Artifact) -> PathBuf {
        self.dir.join(artifact.file_name())
    }

    /// Write `contents` to the artifact's file, creating the directory first.
    pub async fn write(&self, artifact: Artifact, contents: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            DocLensError::Output(format!(
                "Failed to create output directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let path = self.path_for(artifact);
        tokio::fs::write(&path, contents.as_bytes())
            .await
            .map_err(|e| DocLensError::Output(format!("Failed to write {}: {e}", path.display())))?;

        info!(path = %path.display(), bytes = contents.len(), "Artifact written");
        Ok(path)
    }

    pub async fn write_report(&self, report: &PipelineReport) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(report)?;
        self.write(Artifact::Report, &json).await
    }
}
