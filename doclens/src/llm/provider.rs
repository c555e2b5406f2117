use std::sync::Arc;

use crate::config::{parse_llm_provider_model, SummarizerConfig};
use crate::error::{DocLensError, Result};
use crate::llm::api::{default_base_url, LlmApiClient};
use crate::llm::gemini::{GeminiClient, GEMINI_BASE_URL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmBackend {
    Gemini,
    OpenAI,
    OpenRouter,
    Ollama,
    LmStudio,
    OpenAICompatible { base_url: String },
    Unavailable { reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    pub fn from_config(config: &SummarizerConfig) -> Self {
        Self {
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmProvider {
    backend: LlmBackend,
    config: Option<Arc<SummarizerConfig>>,
}

impl LlmProvider {
    pub fn new(config: Option<&SummarizerConfig>) -> Self {
        let Some(config) = config else {
            return Self::unavailable("No LLM configuration provided");
        };

        let (provider, _model) = parse_llm_provider_model(&config.model);

        let backend = match provider.to_lowercase().as_str() {
            "gemini" => LlmBackend::Gemini,
            "openai" => LlmBackend::OpenAI,
            "openrouter" => LlmBackend::OpenRouter,
            "ollama" => LlmBackend::Ollama,
            "lmstudio" => LlmBackend::LmStudio,
            _ => {
                if let Some(base_url) = &config.base_url {
                    LlmBackend::OpenAICompatible {
                        base_url: base_url.clone(),
                    }
                } else {
                    LlmBackend::Unavailable {
                        reason: format!("Unknown provider in model: {}", config.model),
                    }
                }
            }
        };

        // Hosted backends cannot work without a key; report that up front.
        let backend = match backend {
            LlmBackend::Gemini | LlmBackend::OpenAI | LlmBackend::OpenRouter
                if config.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) =>
            {
                LlmBackend::Unavailable {
                    reason: format!("API key required for model: {}", config.model),
                }
            }
            other => other,
        };

        if let LlmBackend::Unavailable { reason } = &backend {
            tracing::warn!("{}", reason);
        }

        Self {
            backend,
            config: Some(Arc::new(config.clone())),
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: LlmBackend::Unavailable {
                reason: reason.to_string(),
            },
            config: None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, LlmBackend::Unavailable { .. })
    }

    pub fn backend(&self) -> &LlmBackend {
        &self.backend
    }

    pub fn config(&self) -> Option<&SummarizerConfig> {
        self.config.as_deref()
    }

    pub fn base_url(&self) -> Option<&str> {
        let config = self.config()?;
        if let Some(base_url) = config.base_url.as_deref() {
            return Some(base_url);
        }
        match &self.backend {
            LlmBackend::Gemini => Some(GEMINI_BASE_URL),
            LlmBackend::OpenAI => Some(default_base_url("openai")),
            LlmBackend::OpenRouter => Some(default_base_url("openrouter")),
            LlmBackend::Ollama => Some(default_base_url("ollama")),
            LlmBackend::LmStudio => Some(default_base_url("lmstudio")),
            LlmBackend::OpenAICompatible { base_url } => Some(base_url.as_str()),
            LlmBackend::Unavailable { .. } => None,
        }
    }

    /// Human-readable backend and model, e.g. `gemini:gemini-1.5-flash`.
    pub fn describe(&self) -> String {
        match (&self.backend, self.config()) {
            (LlmBackend::Unavailable { .. }, _) | (_, None) => "unavailable".to_string(),
            (backend, Some(config)) => {
                let (_, model) = parse_llm_provider_model(&config.model);
                let name = match backend {
                    LlmBackend::Gemini => "gemini",
                    LlmBackend::OpenAI => "openai",
                    LlmBackend::OpenRouter => "openrouter",
                    LlmBackend::Ollama => "ollama",
                    LlmBackend::LmStudio => "lmstudio",
                    _ => "openai-compatible",
                };
                format!("{name}:{model}")
            }
        }
    }

    pub async fn complete_with_system(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        if !self.is_available() {
            return Err(DocLensError::LlmUnavailable(self.unavailable_reason()));
        }

        let config = self
            .config()
            .ok_or_else(|| DocLensError::LlmUnavailable("No config available".to_string()))?;

        match self.backend {
            LlmBackend::Gemini => {
                GeminiClient::new(config)?
                    .complete(prompt, system_prompt, options)
                    .await
            }
            _ => {
                LlmApiClient::new(config)?
                    .complete(prompt, system_prompt, options)
                    .await
            }
        }
    }

    pub fn unavailable_reason(&self) -> String {
        match &self.backend {
            LlmBackend::Unavailable { reason } => reason.clone(),
            _ => "LLM backend is available".to_string(),
        }
    }
}
