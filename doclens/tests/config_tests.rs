use serial_test::serial;
use std::env;
use std::path::PathBuf;

use doclens::config::{
    parse_llm_provider_model, parse_ocr_provider_model, Config, DEFAULT_LANGUAGETOOL_URL,
    DEFAULT_SUMMARY_MODEL, KNOWN_LLM_PROVIDERS, KNOWN_OCR_PROVIDERS,
};

const ENV_VARS: &[&str] = &[
    "OCR_MODEL",
    "OCR_API_KEY",
    "OCR_BASE_URL",
    "OCR_LANGUAGES",
    "OCR_DPI",
    "OCR_PREPROCESS",
    "OCR_TIMEOUT",
    "CORRECTION_ENABLED",
    "LANGUAGETOOL_URL",
    "LANGUAGETOOL_LANGUAGE",
    "LANGUAGETOOL_USERNAME",
    "LANGUAGETOOL_API_KEY",
    "LANGUAGETOOL_DISABLED_RULES",
    "SUMMARY_MODEL",
    "SUMMARY_API_KEY",
    "GEMINI_API_KEY",
    "SUMMARY_BASE_URL",
    "SUMMARY_TEMPERATURE",
    "SUMMARY_MAX_TOKENS",
    "SUMMARY_PROMPT",
    "OUTPUT_DIR",
    "OUTPUT_HOCR",
    "OUTPUT_REPORT",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_llm_config_gemini() {
    let (provider, model) = parse_llm_provider_model("gemini/gemini-1.5-flash");
    assert_eq!(provider, "gemini");
    assert_eq!(model, "gemini-1.5-flash");
}

#[test]
fn test_llm_config_openrouter_keeps_nested_model() {
    let (provider, model) = parse_llm_provider_model("openrouter/anthropic/claude-3.5-sonnet");
    assert_eq!(provider, "openrouter");
    assert_eq!(model, "anthropic/claude-3.5-sonnet");
}

#[test]
fn test_llm_config_unknown_prefix_defaults_to_local() {
    let (provider, model) = parse_llm_provider_model("unknown/model-name");
    assert_eq!(provider, "local");
    assert_eq!(model, "unknown/model-name");
}

#[test]
fn test_ocr_config_mistral() {
    let (provider, model) = parse_ocr_provider_model("mistral/pixtral-12b-2409");
    assert_eq!(provider, "mistral");
    assert_eq!(model, "pixtral-12b-2409");
}

#[test]
fn test_ocr_config_bare_name_is_local() {
    let (provider, model) = parse_ocr_provider_model("tesseract");
    assert_eq!(provider, "local");
    assert_eq!(model, "tesseract");
}

#[test]
fn test_known_providers_constants() {
    assert!(KNOWN_LLM_PROVIDERS.contains(&"gemini"));
    assert!(KNOWN_LLM_PROVIDERS.contains(&"ollama"));
    assert!(KNOWN_OCR_PROVIDERS.contains(&"local"));
    assert!(!KNOWN_OCR_PROVIDERS.contains(&"gemini"));
}

#[test]
#[serial]
fn test_defaults_when_env_is_empty() {
    clear_env();

    let config = Config::from_env();

    assert_eq!(config.ocr.model, "local/tesseract");
    assert_eq!(config.ocr.languages, "eng");
    assert!(config.ocr.dpi.is_none());
    assert!(!config.ocr.preprocess);
    assert!(config.correction.enabled);
    assert_eq!(config.correction.base_url, DEFAULT_LANGUAGETOOL_URL);
    assert_eq!(config.correction.language, "en-US");
    assert_eq!(config.summarizer.model, DEFAULT_SUMMARY_MODEL);
    assert!(config.summarizer.api_key.is_none());
    assert_eq!(config.summarizer.max_tokens, 200);
    assert_eq!(config.output.dir, PathBuf::from("."));
    assert!(!config.output.write_hocr);
    assert!(!config.output.write_report);
}

#[test]
#[serial]
fn test_gemini_api_key_is_used_as_fallback() {
    clear_env();
    env::set_var("GEMINI_API_KEY", "gemini-key");

    let config = Config::from_env();
    assert_eq!(config.summarizer.api_key.as_deref(), Some("gemini-key"));

    env::set_var("SUMMARY_API_KEY", "summary-key");
    let config = Config::from_env();
    assert_eq!(config.summarizer.api_key.as_deref(), Some("summary-key"));

    clear_env();
}

#[test]
#[serial]
fn test_env_overrides_are_applied() {
    clear_env();
    env::set_var("OCR_MODEL", "ollama/llava");
    env::set_var("OCR_DPI", "300");
    env::set_var("OCR_PREPROCESS", "true");
    env::set_var("CORRECTION_ENABLED", "false");
    env::set_var("LANGUAGETOOL_DISABLED_RULES", "UPPERCASE_SENTENCE_START, ,WHITESPACE_RULE");
    env::set_var("SUMMARY_MODEL", "ollama/llama3.2");
    env::set_var("SUMMARY_TEMPERATURE", "0.2");
    env::set_var("OUTPUT_DIR", "/tmp/doclens-out");
    env::set_var("OUTPUT_REPORT", "true");

    let config = Config::from_env();

    assert_eq!(config.ocr.model, "ollama/llava");
    assert_eq!(config.ocr.dpi, Some(300));
    assert!(config.ocr.preprocess);
    assert!(!config.correction.enabled);
    assert_eq!(
        config.correction.disabled_rules,
        vec!["UPPERCASE_SENTENCE_START", "WHITESPACE_RULE"]
    );
    assert_eq!(config.summarizer.model, "ollama/llama3.2");
    assert!((config.summarizer.temperature - 0.2).abs() < f32::EPSILON);
    assert_eq!(config.output.dir, PathBuf::from("/tmp/doclens-out"));
    assert!(config.output.write_report);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_numbers_fall_back_to_defaults() {
    clear_env();
    env::set_var("OCR_TIMEOUT", "soon");
    env::set_var("SUMMARY_MAX_TOKENS", "-5");
    env::set_var("OCR_DPI", "high");

    let config = Config::from_env();

    assert_eq!(config.ocr.timeout_secs, 60);
    assert_eq!(config.summarizer.max_tokens, 200);
    assert!(config.ocr.dpi.is_none());

    clear_env();
}
