use serde::Deserialize;
use std::env;
use std::path::PathBuf;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

/// Parse a comma-separated env var into trimmed, non-empty items.
fn parse_env_list(var: &str) -> Vec<String> {
    env::var(var)
        .map(|val| {
            val.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ocr: OcrConfig,
    pub correction: CorrectionConfig,
    pub summarizer: SummarizerConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub languages: String,
    /// Source resolution handed to Tesseract when the image carries none.
    pub dpi: Option<i32>,
    pub preprocess: bool,
    pub timeout_secs: u64,
    pub max_image_dimension: u32,
    pub min_image_dimension: u32,
}

/// LanguageTool settings for the grammar/spelling stage
#[derive(Debug, Clone, Deserialize)]
pub struct CorrectionConfig {
    pub enabled: bool,
    pub base_url: String,
    pub language: String,
    pub username: Option<String>,
    pub api_key: Option<String>,
    pub disabled_rules: Vec<String>,
    pub max_request_bytes: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Language model configuration for the summarization stage
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizerConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_input_words: usize,
    /// Custom prompt template; `{text}` is replaced with the document.
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub write_hocr: bool,
    pub write_report: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model: "local/tesseract".to_string(),
            api_key: None,
            base_url: None,
            languages: "eng".to_string(),
            dpi: None,
            preprocess: false,
            timeout_secs: 60,
            max_image_dimension: 4096,
            min_image_dimension: 50,
        }
    }
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_LANGUAGETOOL_URL.to_string(),
            language: "en-US".to_string(),
            username: None,
            api_key: None,
            disabled_rules: Vec::new(),
            max_request_bytes: 20_000,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_SUMMARY_MODEL.to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 60,
            max_retries: 3,
            temperature: 0.5,
            max_tokens: 200,
            max_input_words: 1024,
            prompt: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            write_hocr: false,
            write_report: false,
        }
    }
}

pub const DEFAULT_LANGUAGETOOL_URL: &str = "https://api.languagetool.org/v2";
pub const DEFAULT_SUMMARY_MODEL: &str = "gemini/gemini-1.5-flash";

impl Config {
    pub fn from_env() -> Self {
        let ocr_defaults = OcrConfig::default();
        let correction_defaults = CorrectionConfig::default();
        let summary_defaults = SummarizerConfig::default();

        Self {
            ocr: OcrConfig {
                model: env::var("OCR_MODEL").unwrap_or(ocr_defaults.model),
                api_key: env::var("OCR_API_KEY").ok(),
                base_url: env::var("OCR_BASE_URL").ok(),
                languages: env::var("OCR_LANGUAGES").unwrap_or(ocr_defaults.languages),
                dpi: parse_env_opt("OCR_DPI"),
                preprocess: parse_env_or("OCR_PREPROCESS", ocr_defaults.preprocess),
                timeout_secs: parse_env_or("OCR_TIMEOUT", ocr_defaults.timeout_secs),
                max_image_dimension: parse_env_or(
                    "OCR_MAX_DIMENSION",
                    ocr_defaults.max_image_dimension,
                ),
                min_image_dimension: parse_env_or(
                    "OCR_MIN_DIMENSION",
                    ocr_defaults.min_image_dimension,
                ),
            },
            correction: CorrectionConfig {
                enabled: parse_env_or("CORRECTION_ENABLED", correction_defaults.enabled),
                base_url: env::var("LANGUAGETOOL_URL").unwrap_or(correction_defaults.base_url),
                language: env::var("LANGUAGETOOL_LANGUAGE")
                    .unwrap_or(correction_defaults.language),
                username: env::var("LANGUAGETOOL_USERNAME").ok(),
                api_key: env::var("LANGUAGETOOL_API_KEY").ok(),
                disabled_rules: parse_env_list("LANGUAGETOOL_DISABLED_RULES"),
                max_request_bytes: parse_env_or(
                    "LANGUAGETOOL_MAX_REQUEST_BYTES",
                    correction_defaults.max_request_bytes,
                ),
                timeout_secs: parse_env_or(
                    "LANGUAGETOOL_TIMEOUT",
                    correction_defaults.timeout_secs,
                ),
                max_retries: parse_env_or(
                    "LANGUAGETOOL_MAX_RETRIES",
                    correction_defaults.max_retries,
                ),
            },
            summarizer: SummarizerConfig {
                model: env::var("SUMMARY_MODEL").unwrap_or(summary_defaults.model),
                api_key: env::var("SUMMARY_API_KEY")
                    .or_else(|_| env::var("GEMINI_API_KEY"))
                    .ok(),
                base_url: env::var("SUMMARY_BASE_URL").ok(),
                timeout_secs: parse_env_or("SUMMARY_TIMEOUT", summary_defaults.timeout_secs),
                max_retries: parse_env_or("SUMMARY_MAX_RETRIES", summary_defaults.max_retries),
                temperature: parse_env_or("SUMMARY_TEMPERATURE", summary_defaults.temperature),
                max_tokens: parse_env_or("SUMMARY_MAX_TOKENS", summary_defaults.max_tokens),
                max_input_words: parse_env_or(
                    "SUMMARY_MAX_INPUT_WORDS",
                    summary_defaults.max_input_words,
                ),
                prompt: env::var("SUMMARY_PROMPT").ok(),
            },
            output: OutputConfig {
                dir: env::var("OUTPUT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(".")),
                write_hocr: parse_env_or("OUTPUT_HOCR", false),
                write_report: parse_env_or("OUTPUT_REPORT", false),
            },
        }
    }
}

/// Known summarization providers
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio", "gemini"];

/// Known OCR providers; anything else routes to local Tesseract
pub const KNOWN_OCR_PROVIDERS: &[&str] = &["local", "openai", "mistral", "ollama"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    split_known_prefix(model, KNOWN_LLM_PROVIDERS)
}

/// Parse an OCR model name into (provider, model) tuple.
pub fn parse_ocr_provider_model(model: &str) -> (&str, &str) {
    split_known_prefix(model, KNOWN_OCR_PROVIDERS)
}

fn split_known_prefix<'a>(model: &'a str, known: &[&str]) -> (&'a str, &'a str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if known.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_parse_env_or_valid_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        std::env::set_var("__TEST_PARSE_TIMEOUT", "90");
        let result: u64 = parse_env_or("__TEST_PARSE_TIMEOUT", 60);
        assert_eq!(result, 90);
        std::env::remove_var("__TEST_PARSE_TIMEOUT");
    }

    #[test]
    fn test_parse_env_or_invalid_value_uses_default() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        std::env::set_var("__TEST_PARSE_BAD", "not-a-number");
        let result: u32 = parse_env_or("__TEST_PARSE_BAD", 3);
        assert_eq!(result, 3);
        std::env::remove_var("__TEST_PARSE_BAD");
    }

    #[test]
    fn test_parse_env_opt_missing_is_none() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        std::env::remove_var("__TEST_PARSE_DPI");
        let result: Option<i32> = parse_env_opt("__TEST_PARSE_DPI");
        assert!(result.is_none());
    }

    #[test]
    fn test_parse_env_list_trims_and_skips_empty() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        std::env::set_var("__TEST_RULES", " WHITESPACE_RULE, ,UPPERCASE_SENTENCE_START ");
        let rules = parse_env_list("__TEST_RULES");
        assert_eq!(rules, vec!["WHITESPACE_RULE", "UPPERCASE_SENTENCE_START"]);
        std::env::remove_var("__TEST_RULES");
    }

    #[test]
    fn test_ocr_model_prefix_routing() {
        assert_eq!(parse_ocr_provider_model("local/tesseract"), ("local", "tesseract"));
        assert_eq!(parse_ocr_provider_model("mistral/pixtral-12b"), ("mistral", "pixtral-12b"));
        assert_eq!(parse_ocr_provider_model("tesseract"), ("local", "tesseract"));
    }

    #[test]
    fn test_llm_model_prefix_routing() {
        assert_eq!(
            parse_llm_provider_model("gemini/gemini-1.5-flash"),
            ("gemini", "gemini-1.5-flash")
        );
        assert_eq!(
            parse_llm_provider_model("openrouter/google/pegasus"),
            ("openrouter", "google/pegasus")
        );
        assert_eq!(parse_llm_provider_model("t5-small"), ("local", "t5-small"));
    }
}
