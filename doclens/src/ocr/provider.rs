use std::sync::Arc;
use std::time::Duration;

use leptess::LepTess;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::{parse_ocr_provider_model, OcrConfig};
use crate::error::{DocLensError, Result};
use crate::loader::LoadedImage;

use super::api::{VisionOcrClient, VisionVendor};
use super::preprocessing::preprocess_image;

/// Text recognised in an image, plus the layout-aware hOCR document when
/// one was requested and the backend can produce it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcrOutput {
    pub text: String,
    pub hocr: Option<String>,
}

impl OcrOutput {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

enum OcrBackend {
    Local { tesseract: Arc<Mutex<LepTess>> },
    Api { client: VisionOcrClient },
    Unavailable { reason: String },
}

pub struct OcrProvider {
    backend: OcrBackend,
    config: OcrConfig,
}

fn create_tesseract(languages: &str) -> std::result::Result<LepTess, String> {
    LepTess::new(None, languages).map_err(|e| e.to_string())
}

impl OcrProvider {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let (provider, _model) = parse_ocr_provider_model(&config.model);

        let backend = match VisionVendor::from_prefix(provider) {
            Some(vendor) => match VisionOcrClient::new(vendor, config) {
                Ok(client) => {
                    info!(model = client.model(), "{} OCR API backend initialized", vendor.name());
                    OcrBackend::Api { client }
                }
                Err(e) => {
                    let reason = format!("{} OCR backend unavailable: {e}", vendor.name());
                    warn!("{}", reason);
                    OcrBackend::Unavailable { reason }
                }
            },
            None => match create_tesseract(&config.languages) {
                Ok(lt) => {
                    info!(languages = %config.languages, "Tesseract OCR initialized");
                    OcrBackend::Local {
                        tesseract: Arc::new(Mutex::new(lt)),
                    }
                }
                Err(e) => {
                    let reason = format!(
                        "Tesseract OCR not available ({e}). Please ensure it is installed and its language data is present."
                    );
                    warn!("{}", reason);
                    OcrBackend::Unavailable { reason }
                }
            },
        };

        Ok(Self {
            backend,
            config: config.clone(),
        })
    }

    pub fn unavailable(reason: &str, config: &OcrConfig) -> Self {
        Self {
            backend: OcrBackend::Unavailable {
                reason: reason.to_string(),
            },
            config: config.clone(),
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, OcrBackend::Unavailable { .. })
    }

    pub fn supports_hocr(&self) -> bool {
        matches!(self.backend, OcrBackend::Local { .. })
    }

    pub fn backend_name(&self) -> String {
        match &self.backend {
            OcrBackend::Local { .. } => "tesseract".to_string(),
            OcrBackend::Api { client } => format!("{}:{}", client.vendor().name(), client.model()),
            OcrBackend::Unavailable { .. } => "unavailable".to_string(),
        }
    }

    /// Run OCR on `image`, bounded by the configured timeout.
    pub async fn extract(&self, image: &LoadedImage, with_hocr: bool) -> Result<OcrOutput> {
        if let OcrBackend::Unavailable { reason } = &self.backend {
            return Err(DocLensError::OcrUnavailable(reason.clone()));
        }

        let prepared;
        let image = if self.config.preprocess {
            prepared = preprocess_image(image, &self.config)?;
            &prepared
        } else {
            image
        };

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result =
            tokio::time::timeout(timeout_duration, self.extract_internal(image, with_hocr)).await;

        match result {
            Ok(inner_result) => inner_result,
            Err(_) => Err(DocLensError::Ocr(format!(
                "OCR operation timed out after {} seconds",
                self.config.timeout_secs
            ))),
        }
    }

    async fn extract_internal(&self, image: &LoadedImage, with_hocr: bool) -> Result<OcrOutput> {
        match &self.backend {
            OcrBackend::Local { tesseract } => {
                let bytes = image.bytes.clone();
                let dpi = self.config.dpi;
                let tesseract = Arc::clone(tesseract);

                let (text, hocr) = tokio::task::spawn_blocking(move || {
                    let mut lt = tesseract.blocking_lock();
                    lt.set_image_from_mem(&bytes)
                        .map_err(|e| DocLensError::Ocr(format!("Failed to set image: {e}")))?;
                    if let Some(dpi) = dpi {
                        lt.set_source_resolution(dpi);
                    }
                    let text = lt
                        .get_utf8_text()
                        .map_err(|e| DocLensError::Ocr(format!("Failed to extract text: {e}")))?;
                    let hocr = if with_hocr {
                        let body = lt.get_hocr_text(0).map_err(|e| {
                            DocLensError::Ocr(format!("Failed to extract hOCR: {e}"))
                        })?;
                        Some(wrap_hocr_document(&body))
                    } else {
                        None
                    };
                    Ok::<_, DocLensError>((text, hocr))
                })
                .await
                .map_err(|e| DocLensError::Ocr(format!("OCR task panicked: {e}")))??;

                Ok(OcrOutput {
                    text: text.trim().to_string(),
                    hocr,
                })
            }
            OcrBackend::Api { client } => {
                if with_hocr {
                    warn!(
                        backend = %self.backend_name(),
                        "hOCR output is only produced by the local Tesseract backend"
                    );
                }
                let text = client.ocr(image).await?;
                Ok(OcrOutput { text, hocr: None })
            }
            OcrBackend::Unavailable { reason } => Err(DocLensError::OcrUnavailable(reason.clone())),
        }
    }
}

/// Tesseract's hOCR renderer emits page fragments; wrap them in a standalone
/// XHTML document.
pub fn wrap_hocr_document(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="en" lang="en">
 <head>
  <title></title>
  <meta http-equiv="Content-Type" content="text/html;charset=utf-8"/>
  <meta name="ocr-system" content="tesseract"/>
  <meta name="ocr-capabilities" content="ocr_page ocr_carea ocr_par ocr_line ocrx_word"/>
 </head>
 <body>
{body} </body>
</html>
"#
    )
}
