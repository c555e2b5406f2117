use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{parse_llm_provider_model, SummarizerConfig};
use crate::error::{DocLensError, Result};
use crate::llm::provider::CompletionOptions;

pub(crate) const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Google Generative Language `generateContent` endpoint.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_retries: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &SummarizerConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                DocLensError::Llm(
                    "Google Gemini API key not found (set SUMMARY_API_KEY or GEMINI_API_KEY)"
                        .to_string(),
                )
            })?;

        let (_, model) = parse_llm_provider_model(&config.model);
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| GEMINI_BASE_URL.to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DocLensError::Llm(format!("Failed to create Gemini HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_retries: config.max_retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(DocLensError::Validation("Prompt cannot be empty".to_string()));
        }

        let options = options.cloned().unwrap_or_default();
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: system_prompt
                .filter(|value| !value.trim().is_empty())
                .map(|value| Content {
                    role: None,
                    parts: vec![Part {
                        text: value.to_string(),
                    }],
                }),
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_tokens,
                response_mime_type: "text/plain",
            },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                let delay_ms = 100 * 2_u64.pow(attempt - 1);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let sent = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request)
                .send()
                .await;

            let resp = match sent {
                Ok(resp) => resp,
                Err(e) if attempt < self.max_retries => {
                    debug!(attempt, error = %e, "Retrying Gemini request");
                    attempt += 1;
                    continue;
                }
                Err(e) => return Err(DocLensError::Llm(format!("LLM request failed: {e}"))),
            };

            let status = resp.status();
            if status.is_success() {
                let body: GenerateResponse = resp.json().await.map_err(|e| {
                    tracing::error!(error = %e, "Failed to parse Gemini response");
                    DocLensError::Llm(format!("Failed to parse LLM response: {e}"))
                })?;
                return Self::extract_text(body);
            }

            let body = resp.text().await.unwrap_or_default();
            let message = Self::error_message(&body);

            match status {
                StatusCode::TOO_MANY_REQUESTS => {
                    return Err(DocLensError::LlmRateLimit { retry_after: None });
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    return Err(DocLensError::Llm(format!(
                        "LLM authentication failed: {message}"
                    )));
                }
                // Gemini reports an invalid key as 400 INVALID_ARGUMENT.
                StatusCode::BAD_REQUEST if message.to_lowercase().contains("api key") => {
                    return Err(DocLensError::Llm(format!(
                        "LLM authentication failed: {message}"
                    )));
                }
                s if s.is_server_error() && attempt < self.max_retries => {
                    debug!(attempt, status = %s, "Retrying Gemini request");
                    attempt += 1;
                }
                s => {
                    return Err(DocLensError::Llm(format!("LLM API error: {s} - {message}")));
                }
            }
        }
    }

    fn extract_text(response: GenerateResponse) -> Result<String> {
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(DocLensError::Llm(format!("Prompt was blocked: {reason}")));
        }

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| DocLensError::Llm("LLM response contained no candidates".to_string()))?;

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
            return Err(DocLensError::Llm(format!(
                "LLM response contained empty content (finish reason: {reason})"
            )));
        }

        Ok(text)
    }

    fn error_message(body: &str) -> String {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => match envelope.error.status {
                Some(status) => format!("{status}: {}", envelope.error.message),
                None => envelope.error.message,
            },
            Err(_) => body.trim().to_string(),
        }
    }
}
