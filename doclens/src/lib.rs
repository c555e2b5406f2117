pub mod config;
pub mod correction;
pub mod error;
pub mod llm;
pub mod loader;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod summarize;
