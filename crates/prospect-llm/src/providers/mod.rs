//! LLM provider implementations.

pub mod common;
pub mod openai;

pub use openai::OpenAiProvider;
