//! OCR → correction → summary orchestration.
//!
//! Stages run strictly in sequence. Each artifact is written as soon as its
//! stage completes, so a failure in a later stage leaves the earlier results
//! on disk.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

use crate::config::Config;
use crate::correction::{CorrectionResult, TextCorrector};
use crate::error::{DocLensError, Result};
use crate::loader::{load_image, LoadedImage};
use crate::ocr::{OcrOutput, OcrProvider};
use crate::output::{Artifact, ImageSummary, OutputWriter, PipelineReport};
use crate::summarize::Summarizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extracted,
    Corrected,
    Summarized,
}

impl Stage {
    pub fn title(self) -> &'static str {
        match self {
            Stage::Extracted => "Extracted Text",
            Stage::Corrected => "Corrected Text",
            Stage::Summarized => "Summarized Text",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub write_hocr: bool,
    pub write_report: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineArtifacts {
    pub image: ImageSummary,
    pub extracted: OcrOutput,
    pub correction: CorrectionResult,
    pub summary: String,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// OCR found nothing but whitespace; later stages were skipped.
    NoText { image: ImageSummary },
    Completed(PipelineArtifacts),
}

/// Result of the OCR stage on its own.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub image: LoadedImage,
    pub output: OcrOutput,
}

pub struct Pipeline {
    ocr: OcrProvider,
    corrector: TextCorrector,
    summarizer: Summarizer,
    writer: OutputWriter,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        ocr: OcrProvider,
        corrector: TextCorrector,
        summarizer: Summarizer,
        writer: OutputWriter,
        options: PipelineOptions,
    ) -> Self {
        Self {
            ocr,
            corrector,
            summarizer,
            writer,
            options,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            OcrProvider::new(&config.ocr)?,
            TextCorrector::new(&config.correction),
            Summarizer::new(&config.summarizer),
            OutputWriter::new(&config.output.dir),
            PipelineOptions {
                write_hocr: config.output.write_hocr,
                write_report: config.output.write_report,
            },
        ))
    }

    pub fn writer(&self) -> &OutputWriter {
        &self.writer
    }

    /// Load the image and run OCR without writing anything.
    pub async fn extract(&self, path: &Path, with_hocr: bool) -> Result<Extraction> {
        let image = load_image(path).await?;
        let output = self.ocr.extract(&image, with_hocr).await?;
        info!(
            chars = output.text.len(),
            backend = %self.ocr.backend_name(),
            "Text extracted"
        );
        Ok(Extraction { image, output })
    }

    /// Run every stage on the image at `path`.
    ///
    /// `on_stage` is called with each stage's text as soon as it is available.
    pub async fn run<F>(&self, path: &Path, mut on_stage: F) -> Result<PipelineOutcome>
    where
        F: FnMut(Stage, &str),
    {
        if !self.summarizer.is_available() {
            return Err(DocLensError::LlmUnavailable(
                self.summarizer.unavailable_reason(),
            ));
        }
        if let Some(reason) = self.corrector.unavailable_reason() {
            return Err(DocLensError::CorrectionUnavailable(reason.to_string()));
        }

        let started_at = Utc::now();
        let mut files = Vec::new();

        let want_hocr = self.options.write_hocr && self.ocr.supports_hocr();
        if self.options.write_hocr && !want_hocr {
            warn!("hOCR requested but the configured OCR backend cannot produce it");
        }

        let Extraction { image, output } = self.extract(path, want_hocr).await?;
        let image_summary = ImageSummary::from(&image);

        if output.is_empty() {
            info!(path = %path.display(), "No text found in the image");
            return Ok(PipelineOutcome::NoText {
                image: image_summary,
            });
        }

        on_stage(Stage::Extracted, &output.text);
        files.push(self.writer.write(Artifact::ExtractedText, &output.text).await?);
        if let Some(hocr) = &output.hocr {
            files.push(self.writer.write(Artifact::Hocr, hocr).await?);
        }

        let correction = self.corrector.correct(&output.text).await?;
        on_stage(Stage::Corrected, &correction.text);
        files.push(self.writer.write(Artifact::CorrectedText, &correction.text).await?);

        let summary = self.summarizer.summarize(&correction.text).await?;
        on_stage(Stage::Summarized, &summary);
        files.push(self.writer.write(Artifact::SummarizedText, &summary).await?);

        if self.options.write_report {
            let report = PipelineReport {
                image: image_summary.clone(),
                ocr_backend: self.ocr.backend_name(),
                correction_backend: self.corrector.backend_name().to_string(),
                summarizer: self.summarizer.describe(),
                started_at,
                finished_at: Utc::now(),
                extracted_words: word_count(&output.text),
                corrected_words: word_count(&correction.text),
                summary_words: word_count(&summary),
                corrections: correction.applied.clone(),
            };
            files.push(self.writer.write_report(&report).await?);
        }

        Ok(PipelineOutcome::Completed(PipelineArtifacts {
            image: image_summary,
            extracted: output,
            correction,
            summary,
            files,
        }))
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
