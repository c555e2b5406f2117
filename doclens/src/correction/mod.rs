//! Grammar and spelling correction backed by LanguageTool.
//!
//! The checker only reports findings; edits are applied locally so the result
//! does not depend on any particular client library's patching rules.

mod edits;
mod languagetool;
mod provider;

pub use edits::{apply_matches, split_into_chunks, AppliedEdit, GrammarMatch};
pub use languagetool::LanguageToolClient;
pub use provider::{CorrectionResult, TextCorrector};
