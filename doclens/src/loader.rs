//! Image loading and validation.
//!
//! Confirms the path points at a readable file, sniffs the content type and
//! decodes the image header so a bad input is rejected before any external
//! OCR engine is invoked.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader};
use tracing::debug;

use crate::error::{DocLensError, Result};

/// An image read from disk, ready to hand to an OCR backend.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

impl LoadedImage {
    pub fn format_name(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("unknown")
    }
}

/// Load an image from `path`.
///
/// Returns [`DocLensError::ImageNotFound`] when the path is missing or is not
/// a regular file, and [`DocLensError::Image`] when the bytes cannot be
/// decoded as an image.
pub async fn load_image(path: impl AsRef<Path>) -> Result<LoadedImage> {
    let path = path.as_ref();

    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DocLensError::ImageNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(DocLensError::Io(e)),
    };

    if !metadata.is_file() {
        return Err(DocLensError::ImageNotFound(path.to_path_buf()));
    }

    let bytes = tokio::fs::read(path).await?;
    let image = decode_image(path, bytes)?;

    debug!(
        path = %image.path.display(),
        format = image.format_name(),
        width = image.width,
        height = image.height,
        "Image loaded"
    );

    Ok(image)
}

/// Validate in-memory image bytes, attributing them to `path`.
pub fn decode_image(path: &Path, bytes: Vec<u8>) -> Result<LoadedImage> {
    if bytes.is_empty() {
        return Err(DocLensError::Image("file is empty".to_string()));
    }

    let mime_type = match infer::get(&bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => {
            kind.mime_type().to_string()
        }
        Some(kind) => {
            return Err(DocLensError::Image(format!(
                "unsupported content type {}",
                kind.mime_type()
            )));
        }
        None => "application/octet-stream".to_string(),
    };

    let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
        .with_guessed_format()
        .map_err(|e| DocLensError::Image(format!("failed to read image: {e}")))?;

    let format = reader
        .format()
        .ok_or_else(|| DocLensError::Image("unrecognized image format".to_string()))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| DocLensError::Image(format!("failed to decode image: {e}")))?;

    let mime_type = if mime_type == "application/octet-stream" {
        format.to_mime_type().to_string()
    } else {
        mime_type
    };

    Ok(LoadedImage {
        path: path.to_path_buf(),
        bytes,
        format,
        mime_type,
        width,
        height,
    })
}
