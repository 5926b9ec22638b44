//! Mock LLM Provider for testing
//!
//! Replies come from, in order: prompt rules (first rule whose needle occurs
//! in the prompt), the FIFO queue, and finally an echo of the last message.

use super::provider::LlmProvider;
use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::Result;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A scripted provider that records every request it receives.
#[derive(Clone, Default)]
pub struct MockProvider {
    rules: Arc<Mutex<Vec<(String, String)>>>,
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before every reply (for timeout tests).
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Reply with `response` whenever the prompt contains `needle`.
    pub fn on_prompt_containing(&self, needle: impl Into<String>, response: impl Into<String>) {
        self.rules
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((needle.into(), response.into()));
    }

    /// Add a response to the queue.
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(response.into()));
    }

    /// Add a failure to the queue.
    pub fn push_error(&self, error: crate::error::Error) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(error));
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Prompt texts received so far.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(CompletionRequest::prompt_text)
            .collect()
    }

    /// Number of completions served.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn next_reply(&self, request: &CompletionRequest) -> Result<String> {
        let prompt = request.prompt_text();

        let ruled = self
            .rules
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, response)| response.clone());
        if let Some(response) = ruled {
            return Ok(response);
        }

        if let Some(queued) = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
        {
            return queued;
        }

        Ok(request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_else(|| "mock response".to_string()))
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let content = self.next_reply(&request)?;
        Ok(CompletionResponse {
            content,
            usage: None,
            finish_reason: Some("stop".to_string()),
            model: if request.model.is_empty() {
                "mock-model".to_string()
            } else {
                request.model
            },
        })
    }
}
