//! OCR (Optical Character Recognition) Module
//!
//! Extracts text from images using either a local Tesseract engine or a
//! vision-capable chat model.
//!
//! # Architecture
//!
//! - `OcrProvider` selects a backend from `OcrConfig::model`
//! - `local/...` runs Tesseract via leptess and can also emit hOCR
//! - `openai/...`, `mistral/...`, `ollama/...` send the image to a
//!   `/chat/completions` endpoint as a base64 data URL
//!
//! A backend that cannot initialise is kept as `Unavailable` so the failure
//! surfaces when OCR is actually requested.
//!
//! # Usage
//!
//! ```rust,ignore
//! let ocr = OcrProvider::new(&config.ocr)?;
//! let output = ocr.extract(&image, false).await?;
//! ```

mod api;
mod preprocessing;
mod provider;

pub use api::{VisionOcrClient, VisionVendor};
pub use preprocessing::preprocess_image;
pub use provider::{wrap_hocr_document, OcrOutput, OcrProvider};
