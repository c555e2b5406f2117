mod api;
mod gemini;
pub mod prompts;
mod provider;

pub use api::LlmApiClient;
pub use gemini::GeminiClient;
pub use provider::{CompletionOptions, LlmBackend, LlmProvider};
