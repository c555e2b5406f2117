use serde::Serialize;
use tracing::{info, warn};

use crate::config::CorrectionConfig;
use crate::error::{DocLensError, Result};

use super::edits::{apply_matches, split_into_chunks, AppliedEdit, GrammarMatch};
use super::languagetool::LanguageToolClient;

/// Outcome of the grammar/spelling stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionResult {
    pub text: String,
    /// Every match the checker reported, offsets relative to the whole input.
    pub matches: Vec<GrammarMatch>,
    /// Edits that were applied, byte offsets relative to the whole input.
    pub applied: Vec<AppliedEdit>,
}

impl CorrectionResult {
    pub fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            matches: Vec::new(),
            applied: Vec::new(),
        }
    }
}

enum CorrectionBackend {
    LanguageTool { client: LanguageToolClient },
    Disabled,
    Unavailable { reason: String },
}

pub struct TextCorrector {
    backend: CorrectionBackend,
    max_request_bytes: usize,
}

impl TextCorrector {
    pub fn new(config: &CorrectionConfig) -> Self {
        let backend = if !config.enabled {
            info!("Text correction disabled");
            CorrectionBackend::Disabled
        } else {
            match LanguageToolClient::new(config) {
                Ok(client) => {
                    info!(
                        url = %client.check_url(),
                        language = client.language(),
                        "LanguageTool backend initialized"
                    );
                    CorrectionBackend::LanguageTool { client }
                }
                Err(e) => {
                    let reason = format!("LanguageTool backend unavailable: {e}");
                    warn!("{}", reason);
                    CorrectionBackend::Unavailable { reason }
                }
            }
        };

        Self {
            backend,
            max_request_bytes: config.max_request_bytes,
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: CorrectionBackend::Disabled,
            max_request_bytes: 0,
        }
    }

    /// Why the configured checker cannot run, if it cannot.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.backend {
            CorrectionBackend::Unavailable { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.backend, CorrectionBackend::Disabled)
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            CorrectionBackend::LanguageTool { .. } => "languagetool",
            CorrectionBackend::Disabled => "disabled",
            CorrectionBackend::Unavailable { .. } => "unavailable",
        }
    }

    pub async fn correct(&self, text: &str) -> Result<CorrectionResult> {
        let client = match &self.backend {
            CorrectionBackend::LanguageTool { client } => client,
            CorrectionBackend::Disabled => return Ok(CorrectionResult::unchanged(text)),
            CorrectionBackend::Unavailable { reason } => {
                return Err(DocLensError::CorrectionUnavailable(reason.clone()));
            }
        };

        let mut result = CorrectionResult {
            text: String::with_capacity(text.len()),
            matches: Vec::new(),
            applied: Vec::new(),
        };
        let mut utf16_base = 0;
        let mut byte_base = 0;

        for chunk in split_into_chunks(text, self.max_request_bytes) {
            if chunk.trim().is_empty() {
                result.text.push_str(chunk);
            } else {
                let matches = client.check(chunk).await?;
                let (corrected, applied) = apply_matches(chunk, &matches);

                result.text.push_str(&corrected);
                result
                    .matches
                    .extend(matches.into_iter().map(|mut m| {
                        m.offset += utf16_base;
                        m
                    }));
                result.applied.extend(applied.into_iter().map(|mut e| {
                    e.offset += byte_base;
                    e
                }));
            }

            utf16_base += chunk.encode_utf16().count();
            byte_base += chunk.len();
        }

        info!(
            matches = result.matches.len(),
            applied = result.applied.len(),
            "Text correction completed"
        );
        Ok(result)
    }
}
