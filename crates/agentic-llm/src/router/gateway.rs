//! LlmGateway - the single language-model entry point used by the core

use super::config::GatewayConfig;
use super::provider::LlmProvider;
use super::types::{ModelTier, TaskType, TokenBudget};
use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::{Error, Result};
use crate::json::decode_json;
use crate::message::Message;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const JSON_ONLY_INSTRUCTION: &str =
    "Respond with JSON only. Do not add explanations, comments or markdown.";

/// Two-tier gateway over a single provider
///
/// Every call is bounded by the configured timeout; an elapsed timer
/// surfaces as [`Error::Timeout`].
#[derive(Clone)]
pub struct LlmGateway {
    provider: Arc<dyn LlmProvider>,
    config: GatewayConfig,
}

impl LlmGateway {
    /// Create a gateway
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, config: GatewayConfig) -> Self {
        Self { provider, config }
    }

    /// Name of the underlying provider
    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Gateway configuration
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Generate text on the given tier
    pub async fn generate(&self, tier: ModelTier, prompt: &str) -> Result<String> {
        self.complete(tier, vec![Message::user(prompt)], TokenBudget::default())
            .await
            .map(|r| r.content)
    }

    /// Generate text, choosing tier and budget from the task type
    pub async fn generate_for(&self, task: TaskType, prompt: &str) -> Result<String> {
        self.complete(
            task.recommended_tier(),
            vec![Message::user(prompt)],
            task.default_token_budget(),
        )
        .await
        .map(|r| r.content)
    }

    /// Generate with a system instruction, choosing tier and budget from the task type
    pub async fn generate_with_system(
        &self,
        task: TaskType,
        system: &str,
        prompt: &str,
    ) -> Result<String> {
        self.complete(
            task.recommended_tier(),
            vec![Message::system(system), Message::user(prompt)],
            task.default_token_budget(),
        )
        .await
        .map(|r| r.content)
    }

    /// Generate and decode a JSON object or array
    ///
    /// The schema hint is appended to the prompt together with a JSON-only
    /// instruction. Output that survives none of the decode tiers is
    /// reported as [`Error::Parse`].
    pub async fn generate_structured(
        &self,
        tier: ModelTier,
        prompt: &str,
        schema_hint: &str,
    ) -> Result<Value> {
        let full_prompt = if schema_hint.trim().is_empty() {
            format!("{prompt}\n\n{JSON_ONLY_INSTRUCTION}")
        } else {
            format!("{prompt}\n\nOutput schema:\n{schema_hint}\n\n{JSON_ONLY_INSTRUCTION}")
        };

        let content = self
            .complete(
                tier,
                vec![Message::user(full_prompt)],
                TaskType::Extraction.default_token_budget(),
            )
            .await?
            .content;

        decode_json(&content).ok_or_else(|| {
            let preview: String = content.chars().take(120).collect();
            warn!(tier = %tier, "Structured output could not be decoded");
            Error::Parse(format!("no JSON in model output: {preview}"))
        })
    }

    #[instrument(skip(self, messages, budget), fields(provider = %self.provider.name(), tier = %tier))]
    async fn complete(
        &self,
        tier: ModelTier,
        messages: Vec<Message>,
        budget: TokenBudget,
    ) -> Result<CompletionResponse> {
        let mut request = CompletionRequest::new(self.config.model_for(tier))
            .with_max_tokens(budget.max_tokens)
            .with_temperature(budget.temperature);
        request.messages = messages;

        let timeout = self.config.timeout();
        debug!(model = %request.model, "LLM completion");

        match tokio::time::timeout(timeout, self.provider.complete(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "LLM completion timed out");
                Err(Error::Timeout(timeout.as_millis() as u64))
            }
        }
    }
}
