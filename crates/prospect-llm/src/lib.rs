//! Prospect LLM - natural-language query translation.
//!
//! Turns a loosely-structured search request ("marketing directors in
//! California at tech startups") into the structured [`prospect_core::Query`]
//! the extraction engine compiles into search locators.
//!
//! # Example
//!
//! ```rust,no_run
//! use prospect_core::LlmConfig;
//! use prospect_llm::{translator_from_config, QueryTranslator};
//!
//! # async fn example() {
//! let translator = translator_from_config(&LlmConfig::default());
//! let query = translator.translate("rust developers in Berlin").await;
//! assert!(!query.is_blank());
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod provider;
pub mod providers;
pub mod translator;

// Re-export commonly used types
pub use error::{LlmError, Result};
pub use provider::{CompletionRequest, CompletionResponse, LlmProvider, Message, Role, Usage};
pub use providers::OpenAiProvider;
pub use translator::{
    parse_query_output, translator_from_config, KeywordTranslator, LlmQueryTranslator,
    QueryTranslator, SYSTEM_PROMPT,
};
