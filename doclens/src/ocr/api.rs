use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::{parse_ocr_provider_model, OcrConfig};
use crate::error::{DocLensError, Result};
use crate::loader::LoadedImage;

const OCR_INSTRUCTION: &str = "Extract all text from this image. Return only the extracted text without any explanations or formatting.";
const MAX_RETRIES: u32 = 3;

/// Hosted or self-hosted vision models reachable over an OpenAI-compatible
/// chat completions endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisionVendor {
    OpenAi,
    Mistral,
    Ollama,
}

impl VisionVendor {
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "mistral" => Some(Self::Mistral),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Mistral => "https://api.mistral.ai/v1",
            Self::Ollama => "http://localhost:11434/v1",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o",
            Self::Mistral => "pixtral-12b-2409",
            Self::Ollama => "llava",
        }
    }

    fn requires_api_key(self) -> bool {
        !matches!(self, Self::Ollama)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI Vision",
            Self::Mistral => "Mistral",
            Self::Ollama => "Ollama",
        }
    }
}

#[derive(Clone, Debug)]
pub struct VisionOcrClient {
    client: Client,
    vendor: VisionVendor,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

impl VisionOcrClient {
    pub fn new(vendor: VisionVendor, config: &OcrConfig) -> Result<Self> {
        if vendor.requires_api_key() && config.api_key.is_none() {
            return Err(DocLensError::Ocr(format!(
                "API key required for {} OCR",
                vendor.name()
            )));
        }

        let (_, model) = parse_ocr_provider_model(&config.model);
        let model = if model.is_empty() {
            vendor.default_model().to_string()
        } else {
            model.to_string()
        };

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| vendor.default_base_url().to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DocLensError::Ocr(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            vendor,
            api_key: config.api_key.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn vendor(&self) -> VisionVendor {
        self.vendor
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn ocr(&self, image: &LoadedImage) -> Result<String> {
        let data_url = format!(
            "data:{};base64,{}",
            image.mime_type,
            STANDARD.encode(&image.bytes)
        );

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: OCR_INSTRUCTION.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
            max_tokens: 4096,
        };

        self.make_request(&request).await
    }

    async fn make_request(&self, request: &ChatRequest) -> Result<String> {
        let mut retries = 0;

        loop {
            let mut builder = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .json(request);
            if let Some(api_key) = &self.api_key {
                builder = builder.bearer_auth(api_key);
            }

            match builder.send().await {
                Ok(resp) if resp.status().is_success() => {
                    let chat_response: ChatResponse = resp.json().await.map_err(|e| {
                        DocLensError::Ocr(format!("Failed to parse response: {e}"))
                    })?;

                    return chat_response
                        .choices
                        .into_iter()
                        .next()
                        .map(|c| c.message.content.unwrap_or_default().trim().to_string())
                        .ok_or_else(|| DocLensError::Ocr("No response from API".to_string()));
                }
                Ok(resp) if resp.status().as_u16() == 429 || resp.status().is_server_error() => {
                    retries += 1;
                    if retries >= MAX_RETRIES {
                        return Err(DocLensError::Ocr(format!(
                            "API request failed after {} retries: {}",
                            MAX_RETRIES,
                            resp.status()
                        )));
                    }
                    debug!(status = %resp.status(), attempt = retries, "Retrying OCR request");
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(DocLensError::Ocr(format!(
                        "API request failed: {status} - {body}"
                    )));
                }
                // The request timeout is the whole OCR budget; nothing is left to retry with.
                Err(e) if e.is_timeout() => {
                    return Err(DocLensError::Ocr(format!("OCR request timed out: {e}")));
                }
                Err(e) => {
                    retries += 1;
                    if retries >= MAX_RETRIES {
                        return Err(DocLensError::Ocr(format!(
                            "API request failed after {MAX_RETRIES} retries: {e}"
                        )));
                    }
                }
            }

            let delay = Duration::from_millis(100 * 2_u64.pow(retries));
            tokio::time::sleep(delay).await;
        }
    }
}
