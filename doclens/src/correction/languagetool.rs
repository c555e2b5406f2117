use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::CorrectionConfig;
use crate::error::{DocLensError, Result};

use super::edits::GrammarMatch;

/// Client for the LanguageTool HTTP API (`/v2/check`).
#[derive(Clone, Debug)]
pub struct LanguageToolClient {
    client: Client,
    check_url: Url,
    language: String,
    username: Option<String>,
    api_key: Option<String>,
    disabled_rules: Vec<String>,
    max_retries: u32,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    #[serde(default)]
    message: String,
    offset: usize,
    length: usize,
    #[serde(default)]
    replacements: Vec<Replacement>,
    #[serde(default)]
    rule: Option<Rule>,
}

#[derive(Debug, Deserialize)]
struct Replacement {
    value: String,
}

#[derive(Debug, Deserialize)]
struct Rule {
    id: String,
}

impl From<RawMatch> for GrammarMatch {
    fn from(raw: RawMatch) -> Self {
        Self {
            offset: raw.offset,
            length: raw.length,
            message: raw.message,
            replacements: raw.replacements.into_iter().map(|r| r.value).collect(),
            rule_id: raw.rule.map(|r| r.id).unwrap_or_default(),
        }
    }
}

impl LanguageToolClient {
    pub fn new(config: &CorrectionConfig) -> Result<Self> {
        if config.api_key.is_some() != config.username.is_some() {
            return Err(DocLensError::Correction(
                "LanguageTool username and API key must be set together".to_string(),
            ));
        }

        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let check_url = Url::parse(&base)?.join("check")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DocLensError::Correction(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            check_url,
            language: config.language.clone(),
            username: config.username.clone(),
            api_key: config.api_key.clone(),
            disabled_rules: config.disabled_rules.clone(),
            max_retries: config.max_retries,
        })
    }

    pub fn check_url(&self) -> &Url {
        &self.check_url
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Check `text` and return every match LanguageTool reports.
    pub async fn check(&self, text: &str) -> Result<Vec<GrammarMatch>> {
        let mut form: Vec<(&str, String)> = vec![
            ("text", text.to_string()),
            ("language", self.language.clone()),
        ];
        if let (Some(username), Some(api_key)) = (&self.username, &self.api_key) {
            form.push(("username", username.clone()));
            form.push(("apiKey", api_key.clone()));
        }
        if !self.disabled_rules.is_empty() {
            form.push(("disabledRules", self.disabled_rules.join(",")));
        }

        let response = self.post_with_retries(&form).await?;
        let matches: Vec<GrammarMatch> = response.matches.into_iter().map(Into::into).collect();

        debug!(
            matches = matches.len(),
            text_len = text.len(),
            "LanguageTool check completed"
        );
        Ok(matches)
    }

    async fn post_with_retries(&self, form: &[(&str, String)]) -> Result<CheckResponse> {
        let mut attempt = 0;

        loop {
            let response = self
                .client
                .post(self.check_url.clone())
                .header("Accept", "application/json")
                .form(form)
                .send()
                .await;

            let retry_reason = match response {
                Ok(resp) if resp.status().is_success() => {
                    return resp.json::<CheckResponse>().await.map_err(|e| {
                        DocLensError::Correction(format!("Failed to parse LanguageTool response: {e}"))
                    });
                }
                Ok(resp) if resp.status().as_u16() == 429 || resp.status().is_server_error() => {
                    resp.status().to_string()
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(DocLensError::Correction(format!(
                        "LanguageTool request failed: {status} - {}",
                        body.trim()
                    )));
                }
                Err(e) => e.to_string(),
            };

            if attempt >= self.max_retries {
                return Err(DocLensError::Correction(format!(
                    "LanguageTool request failed after {} retries: {retry_reason}",
                    self.max_retries
                )));
            }

            attempt += 1;
            debug!(attempt, reason = %retry_reason, "Retrying LanguageTool request");
            let delay = Duration::from_millis(100 * 2_u64.pow(attempt - 1));
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_url_joins_base_path() {
        let client = LanguageToolClient::new(&CorrectionConfig::default()).unwrap();
        assert_eq!(
            client.check_url().as_str(),
            "https://api.languagetool.org/v2/check"
        );
    }

    #[test]
    fn test_check_url_tolerates_trailing_slash() {
        let config = CorrectionConfig {
            base_url: "http://localhost:8081/v2/".to_string(),
            ..CorrectionConfig::default()
        };
        let client = LanguageToolClient::new(&config).unwrap();
        assert_eq!(client.check_url().as_str(), "http://localhost:8081/v2/check");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = CorrectionConfig {
            base_url: "not a url".to_string(),
            ..CorrectionConfig::default()
        };
        assert!(matches!(
            LanguageToolClient::new(&config),
            Err(DocLensError::UrlParse(_))
        ));
    }

    #[test]
    fn test_premium_credentials_must_be_paired() {
        let config = CorrectionConfig {
            api_key: Some("key".to_string()),
            ..CorrectionConfig::default()
        };
        assert!(matches!(
            LanguageToolClient::new(&config),
            Err(DocLensError::Correction(_))
        ));
    }

    #[test]
    fn test_raw_match_conversion() {
        let raw: RawMatch = serde_json::from_value(serde_json::json!({
            "message": "Possible spelling mistake found.",
            "offset": 8,
            "length": 5,
            "replacements": [{"value": "simple"}, {"value": "sample"}],
            "rule": {"id": "MORFOLOGIK_RULE_EN_US", "description": "Spelling"}
        }))
        .unwrap();

        let m: GrammarMatch = raw.into();

        assert_eq!(m.offset, 8);
        assert_eq!(m.replacements, vec!["simple", "sample"]);
        assert_eq!(m.rule_id, "MORFOLOGIK_RULE_EN_US");
    }
}
