//! Agentic LLM - LLM Gateway
//!
//! This crate provides the language-model capability used by the agentic
//! service:
//! - Router: provider trait, two-tier model selection and the `LlmGateway`
//! - OpenAI: any OpenAI-compatible chat completions endpoint
//! - JSON: tiered, never-panicking JSON extraction from free-form model output
//! - Mock: scripted provider for tests and local development

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod error;
pub mod json;
pub mod message;
pub mod openai;
pub mod router;
pub mod util;

pub use completion::{CompletionRequest, CompletionResponse, TokenUsage};
pub use error::{Error, Result};
pub use json::{decode_json, decode_object, decode_or};
pub use message::{Message, MessageRole};
pub use openai::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};
pub use router::{
    GatewayConfig, LlmGateway, LlmProvider, MockProvider, ModelTier, TaskType, TokenBudget,
};
