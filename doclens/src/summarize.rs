//! Abstractive summarization over an [`LlmProvider`].

use tracing::{debug, info};
use unicode_segmentation::UnicodeSegmentation;

use crate::config::SummarizerConfig;
use crate::error::{DocLensError, Result};
use crate::llm::prompts::{summary_prompt, DEFAULT_SUMMARY_TEMPLATE, SUMMARY_SYSTEM_PROMPT};
use crate::llm::{CompletionOptions, LlmProvider};

#[derive(Debug, Clone)]
pub struct Summarizer {
    llm: LlmProvider,
    options: CompletionOptions,
    max_input_words: usize,
    template: String,
}

impl Summarizer {
    pub fn new(config: &SummarizerConfig) -> Self {
        Self::with_provider(LlmProvider::new(Some(config)), config)
    }

    pub fn with_provider(llm: LlmProvider, config: &SummarizerConfig) -> Self {
        Self {
            llm,
            options: CompletionOptions::from_config(config),
            max_input_words: config.max_input_words,
            template: config
                .prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SUMMARY_TEMPLATE.to_string()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.llm.is_available()
    }

    pub fn unavailable_reason(&self) -> String {
        self.llm.unavailable_reason()
    }

    pub fn describe(&self) -> String {
        self.llm.describe()
    }

    pub async fn summarize(&self, text: &str) -> Result<String> {
        let normalized = normalize_whitespace(text);
        let prepared = truncate_words(&normalized, self.max_input_words);
        if prepared.is_empty() {
            return Err(DocLensError::Validation("Prompt cannot be empty".to_string()));
        }

        debug!(
            input_chars = prepared.len(),
            backend = %self.llm.describe(),
            "Requesting summary"
        );

        let prompt = summary_prompt(&self.template, prepared);
        let summary = self
            .llm
            .complete_with_system(&prompt, Some(SUMMARY_SYSTEM_PROMPT), Some(&self.options))
            .await?;

        let summary = summary.trim().to_string();
        if summary.is_empty() {
            return Err(DocLensError::Llm("Summary was empty".to_string()));
        }

        info!(summary_chars = summary.len(), "Summary generated");
        Ok(summary)
    }
}

/// Trim and collapse every whitespace run, line breaks included, into one space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep at most `max_words` words of `text`; zero means no limit.
pub fn truncate_words(text: &str, max_words: usize) -> &str {
    if max_words == 0 {
        return text;
    }

    let mut end = text.len();
    let mut words = 0;
    for (idx, word) in text.split_word_bound_indices() {
        if word.chars().any(char::is_alphanumeric) {
            if words == max_words {
                end = idx;
                break;
            }
            words += 1;
        }
    }

    text[..end].trim_end()
}
