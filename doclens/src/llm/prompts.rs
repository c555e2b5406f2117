//! Prompt templates for the summarization stage
//!
//! Templates use a single `{text}` placeholder.

/// Placeholder substituted with the document text.
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Default instruction; asks for a plain-language summary.
pub const DEFAULT_SUMMARY_TEMPLATE: &str =
    "Refer and analyze the given text and draw a simple summary out of this text in simpler words:\n\n{text}";

/// System prompt sent alongside the summary request.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You summarize documents that were scanned and run through OCR. Keep names, dates, amounts and obligations accurate. Reply with the summary only.";

/// Build a summary prompt from `template`.
///
/// A template without `{text}` gets the document appended after a blank line,
/// so a custom instruction never silently drops the input.
///
/// # Example
/// ```
/// use doclens::llm::prompts::{summary_prompt, DEFAULT_SUMMARY_TEMPLATE};
///
/// let prompt = summary_prompt(DEFAULT_SUMMARY_TEMPLATE, "The lease ends in May.");
/// assert!(prompt.ends_with("The lease ends in May."));
/// ```
pub fn summary_prompt(template: &str, text: &str) -> String {
    if template.contains(TEXT_PLACEHOLDER) {
        template.replace(TEXT_PLACEHOLDER, text)
    } else {
        format!("{}\n\n{text}", template.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_places_text_last() {
        let prompt = summary_prompt(DEFAULT_SUMMARY_TEMPLATE, "Agreement for services.");
        assert!(prompt.starts_with("Refer and analyze"));
        assert!(prompt.ends_with("\n\nAgreement for services."));
    }

    #[test]
    fn test_custom_template_with_placeholder() {
        let prompt = summary_prompt("TL;DR of <<{text}>>", "abc");
        assert_eq!(prompt, "TL;DR of <<abc>>");
    }

    #[test]
    fn test_custom_template_without_placeholder_appends_text() {
        let prompt = summary_prompt("summarize: ", "the body");
        assert_eq!(prompt, "summarize:\n\nthe body");
    }
}
